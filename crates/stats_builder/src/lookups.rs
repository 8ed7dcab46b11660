//! Lookup table loading - 이름/타입/색상 테이블
//!
//! Reads the three JSON tables from the data directory and, when a game
//! master database is given, the per-card training colours. A missing or
//! malformed table is logged and left empty; names then fall back to
//! their `Skill_<id>` style placeholders.

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use stats_core::LookupTables;
use std::fs;
use std::path::Path;

pub const SKILLS_FILE: &str = "skills.json";
pub const CARDS_FILE: &str = "support-cards-db.json";
pub const CHARACTERS_FILE: &str = "character.json";

const COLOR_QUERY: &str = "\
SELECT DISTINCT cd.id, chr.ui_training_color_1
FROM card_data cd
LEFT JOIN chara_data chr ON cd.chara_id = chr.id
WHERE chr.ui_training_color_1 IS NOT NULL";

/// Load every lookup table available.
///
/// # Arguments
///
/// * `data_dir` - directory holding `skills.json`, `support-cards-db.json`
///   and `character.json`
/// * `game_db` - optional game master database for character colours
pub fn load_lookup_tables(data_dir: &Path, game_db: Option<&Path>) -> LookupTables {
    let mut tables = LookupTables::new();

    load_table(&data_dir.join(SKILLS_FILE), "skills", |json| {
        tables.load_skill_table(json)
    });
    load_table(&data_dir.join(CARDS_FILE), "support cards", |json| {
        tables.load_card_table(json)
    });
    load_table(&data_dir.join(CHARACTERS_FILE), "characters", |json| {
        tables.load_character_table(json)
    });

    if let Some(db) = game_db {
        match load_character_colors(&mut tables, db) {
            Ok(n) => log::info!("Loaded {n} character colours from {}", db.display()),
            Err(e) => log::warn!("Character colours unavailable: {e:#}"),
        }
    }

    tables
}

fn load_table<F>(path: &Path, label: &str, load: F)
where
    F: FnOnce(&str) -> stats_core::Result<usize>,
{
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) => {
            log::warn!("No {label} table at {}: {e}", path.display());
            return;
        }
    };
    match load(&json) {
        Ok(n) => log::info!("Loaded {n} {label} from {}", path.display()),
        Err(e) => log::warn!("Ignoring malformed {label} table {}: {e}", path.display()),
    }
}

/// Read `card id → training colour` from the game master database.
pub fn load_character_colors(tables: &mut LookupTables, game_db: &Path) -> Result<usize> {
    let conn = Connection::open_with_flags(game_db, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .with_context(|| format!("Failed to open game database: {}", game_db.display()))?;
    let mut stmt = conn
        .prepare(COLOR_QUERY)
        .context("Failed to prepare colour query")?;

    let pairs = stmt
        .query_map([], |row| {
            let id: i64 = row.get(0)?;
            let color: String = row.get(1)?;
            Ok((id, color))
        })
        .context("Failed to run colour query")?;

    let mut added = 0;
    for pair in pairs {
        let (id, color) = pair.context("Failed to read colour row")?;
        tables.insert_color(id.to_string(), color);
        added += 1;
    }
    Ok(added)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_loads_tables_and_colors() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(
            dir.path().join(SKILLS_FILE),
            r#"[{"skill_id": 200101, "name": "Corner Adept", "icon": "utx_ico_skill_20011.png"}]"#,
        )?;
        fs::write(
            dir.path().join(CARDS_FILE),
            r#"[{"id": 30020, "name": "Kitasan Black", "type": "speed"}]"#,
        )?;

        let db = dir.path().join("master.mdb");
        {
            let conn = Connection::open(&db)?;
            conn.execute_batch(
                "CREATE TABLE card_data (id INTEGER, chara_id INTEGER);
                 CREATE TABLE chara_data (id INTEGER, ui_training_color_1 TEXT);
                 INSERT INTO card_data VALUES (100101, 1001), (100201, 1002);
                 INSERT INTO chara_data VALUES (1001, 'FF66AA'), (1002, NULL);",
            )?;
        }

        let tables = load_lookup_tables(dir.path(), Some(&db));
        assert_eq!(tables.skill_count(), 1);
        assert_eq!(tables.card_count(), 1);
        assert_eq!(tables.character_count(), 0);
        assert_eq!(tables.card_type("30020"), "Speed");
        assert_eq!(tables.color_count(), 1);
        assert_eq!(tables.character_color("100101").as_deref(), Some("FF66AA"));
        assert_eq!(tables.character_color("100201"), None);
        Ok(())
    }

    #[test]
    fn test_malformed_table_is_skipped() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join(CHARACTERS_FILE), "{not json")?;
        let tables = load_lookup_tables(dir.path(), Some(&dir.path().join("missing.mdb")));
        assert_eq!(tables.character_count(), 0);
        assert_eq!(tables.character_name("100101"), "Character_100101");
        Ok(())
    }
}
