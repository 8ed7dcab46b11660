//! Row Sources - 원본 학습 기록 로더
//!
//! CSV export, JSON / JSON Lines dump, or the SQLite database itself.
//! Every source yields [`RawRow`]s in source order; normalization happens
//! later in `stats_core`.

use anyhow::{bail, Context, Result};
use rusqlite::{types::Value as SqlValue, Connection, OpenFlags};
use serde::Serialize;
use serde_json::{Map, Value};
use stats_core::RawRow;
use std::fs;
use std::path::{Path, PathBuf};

/// Relational query over the collected data: every team member joined with
/// its trainer, ordered by trainer, distance and member slot.
pub const TEAM_STADIUM_QUERY: &str = "\
SELECT ts.*,
       t.team_class,
       t.best_team_class,
       t.name AS trainer_name,
       t.fans AS trainer_fans,
       t.follower_num
FROM team_stadium ts
LEFT JOIN trainer t ON ts.trainer_id = t.account_id
ORDER BY ts.trainer_id, ts.distance_type, ts.member_id";

/// Row parsing statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub total_rows: u32,
    pub parsed: u32,
    pub failed: u32,
}

impl ParseStats {
    fn ok(&mut self) {
        self.total_rows += 1;
        self.parsed += 1;
    }

    fn fail(&mut self) {
        self.total_rows += 1;
        self.failed += 1;
    }
}

/// A place raw rows come from.
pub trait RowSource {
    /// Human-readable origin, for progress output.
    fn describe(&self) -> String;

    /// Load every row. Rows that cannot be read as a [`RawRow`] are counted
    /// in [`ParseStats::failed`] and skipped; I/O failures abort.
    fn load(&self) -> Result<(Vec<RawRow>, ParseStats)>;
}

/// Pick a source by file extension.
pub fn open_source(path: &Path) -> Result<Box<dyn RowSource>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let source: Box<dyn RowSource> = match ext.as_str() {
        "csv" => Box::new(CsvRowSource::new(path)),
        "json" | "jsonl" | "ndjson" => Box::new(JsonRowSource::new(path)),
        "db" | "sqlite" | "sqlite3" => Box::new(SqliteRowSource::new(path)),
        other => bail!(
            "Unsupported input format '{}' for {} (expected csv, json, jsonl or sqlite)",
            other,
            path.display()
        ),
    };
    Ok(source)
}

/// Push one JSON object through [`RawRow`]'s deserializer.
fn row_from_object(object: Map<String, Value>, line: usize, stats: &mut ParseStats) -> Option<RawRow> {
    match serde_json::from_value::<RawRow>(Value::Object(object)) {
        Ok(row) => {
            stats.ok();
            Some(row)
        }
        Err(e) => {
            stats.fail();
            log::warn!("Row {line} skipped: {e}");
            None
        }
    }
}

// ============================================================================
// CSV
// ============================================================================

/// CSV export with a header row. List columns hold JSON text.
pub struct CsvRowSource {
    path: PathBuf,
}

impl CsvRowSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Typed value of one CSV cell: empty → null, numbers → numbers.
fn csv_cell(cell: &str) -> Value {
    let cell = cell.trim();
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(n) = cell.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(f) = cell.parse::<f64>() {
        if f.is_finite() {
            return Value::from(f);
        }
    }
    Value::String(cell.to_string())
}

impl RowSource for CsvRowSource {
    fn describe(&self) -> String {
        format!("CSV {}", self.path.display())
    }

    fn load(&self) -> Result<(Vec<RawRow>, ParseStats)> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .with_context(|| format!("Failed to open CSV file: {}", self.path.display()))?;

        let headers = reader
            .headers()
            .with_context(|| format!("Failed to read CSV header: {}", self.path.display()))?
            .clone();

        let mut rows = Vec::new();
        let mut stats = ParseStats::default();

        for (i, record) in reader.records().enumerate() {
            let line = i + 2;
            let record = match record {
                Ok(r) => r,
                Err(e) => {
                    stats.fail();
                    log::warn!("Line {line} - unreadable CSV record: {e}");
                    continue;
                }
            };
            let object: Map<String, Value> = headers
                .iter()
                .zip(record.iter())
                .map(|(name, cell)| (name.trim().to_string(), csv_cell(cell)))
                .collect();
            rows.extend(row_from_object(object, line, &mut stats));
        }

        Ok((rows, stats))
    }
}

// ============================================================================
// JSON / JSON Lines
// ============================================================================

/// Either one JSON array of row objects or one object per line.
pub struct JsonRowSource {
    path: PathBuf,
}

impl JsonRowSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RowSource for JsonRowSource {
    fn describe(&self) -> String {
        format!("JSON {}", self.path.display())
    }

    fn load(&self) -> Result<(Vec<RawRow>, ParseStats)> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read JSON file: {}", self.path.display()))?;

        let mut rows = Vec::new();
        let mut stats = ParseStats::default();

        if text.trim_start().starts_with('[') {
            let items: Vec<Value> = serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse JSON array: {}", self.path.display()))?;
            for (i, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(object) => rows.extend(row_from_object(object, i + 1, &mut stats)),
                    _ => {
                        stats.fail();
                        log::warn!("Row {} skipped: not an object", i + 1);
                    }
                }
            }
        } else {
            for (i, line) in text.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<Value>(line) {
                    Ok(Value::Object(object)) => rows.extend(row_from_object(object, i + 1, &mut stats)),
                    Ok(_) => {
                        stats.fail();
                        log::warn!("Line {} skipped: not an object", i + 1);
                    }
                    Err(e) => {
                        stats.fail();
                        log::warn!("Line {} skipped: {e}", i + 1);
                    }
                }
            }
        }

        Ok((rows, stats))
    }
}

// ============================================================================
// SQLite
// ============================================================================

/// The collection database, read with [`TEAM_STADIUM_QUERY`] by default.
pub struct SqliteRowSource {
    path: PathBuf,
    query: String,
}

impl SqliteRowSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            query: TEAM_STADIUM_QUERY.to_string(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }
}

fn sql_to_json(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::from(i),
        SqlValue::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        SqlValue::Text(s) => Value::String(s),
        SqlValue::Blob(b) => Value::String(String::from_utf8_lossy(&b).into_owned()),
    }
}

impl RowSource for SqliteRowSource {
    fn describe(&self) -> String {
        format!("SQLite {}", self.path.display())
    }

    fn load(&self) -> Result<(Vec<RawRow>, ParseStats)> {
        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("Failed to open database: {}", self.path.display()))?;

        let mut stmt = conn
            .prepare(&self.query)
            .context("Failed to prepare row query")?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let objects = stmt
            .query_map([], |row| {
                let mut object = Map::with_capacity(columns.len());
                for (i, name) in columns.iter().enumerate() {
                    let value: SqlValue = row.get(i)?;
                    object.insert(name.clone(), sql_to_json(value));
                }
                Ok(object)
            })
            .context("Failed to run row query")?;

        let mut rows = Vec::new();
        let mut stats = ParseStats::default();
        for (i, object) in objects.enumerate() {
            let object = object.context("Failed to read row")?;
            rows.extend(row_from_object(object, i + 1, &mut stats));
        }

        Ok((rows, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stats_core::{normalize_rows, Distance};
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_csv_source() -> Result<()> {
        let mut file = NamedTempFile::with_suffix(".csv")?;
        writeln!(file, "trainer_id,card_id,distance_type,team_class,speed,skills,support_cards")?;
        writeln!(file, r#"1001,100101,2,7,1150.5,"[""2001011""]","[""300204"",""300214""]""#)?;
        writeln!(file, "1002,100201,9,,900,,")?;
        file.flush()?;

        let source = open_source(file.path())?;
        let (rows, stats) = source.load()?;
        assert_eq!(stats.parsed, 2);
        assert_eq!(stats.failed, 0);

        let (records, _) = normalize_rows(&rows);
        assert_eq!(records[0].trainer_id, "1001");
        assert_eq!(records[0].distance, Some(Distance::Mile));
        assert_eq!(records[0].team_tier, Some(7));
        assert_eq!(records[0].support_cards, ["300204", "300214"]);
        assert_eq!(records[0].skills, ["2001011"]);
        assert_eq!(records[1].distance, None);
        assert_eq!(records[1].team_tier, None);
        assert!(records[1].skills.is_empty());
        Ok(())
    }

    #[test]
    fn test_json_array_and_lines() -> Result<()> {
        let dir = TempDir::new()?;
        let array = dir.path().join("rows.json");
        fs::write(
            &array,
            r#"[{"trainer_id": 1, "card_id": 100101, "skills": ["2001011"]}, 42]"#,
        )?;
        let (rows, stats) = JsonRowSource::new(&array).load()?;
        assert_eq!(rows.len(), 1);
        assert_eq!(stats.failed, 1);

        let lines = dir.path().join("rows.jsonl");
        fs::write(
            &lines,
            "{\"trainer_id\": 1, \"card_id\": 100101}\n\n{broken\n{\"trainer_id\": 2, \"card_id\": 100201}\n",
        )?;
        let (rows, stats) = open_source(&lines)?.load()?;
        assert_eq!(rows.len(), 2);
        assert_eq!(stats.total_rows, 3);
        assert_eq!(stats.failed, 1);
        Ok(())
    }

    #[test]
    fn test_sqlite_source_joins_trainers() -> Result<()> {
        let dir = TempDir::new()?;
        let db = dir.path().join("stadium.db");
        {
            let conn = Connection::open(&db)?;
            conn.execute_batch(
                "CREATE TABLE team_stadium (
                    trainer_id TEXT, member_id INTEGER, card_id INTEGER,
                    distance_type INTEGER, running_style INTEGER,
                    speed INTEGER, stamina INTEGER, power INTEGER, guts INTEGER, wiz INTEGER,
                    rank_score INTEGER, skills TEXT, support_cards TEXT
                 );
                 CREATE TABLE trainer (
                    account_id TEXT, team_class INTEGER, best_team_class INTEGER,
                    name TEXT, fans INTEGER, follower_num INTEGER
                 );
                 INSERT INTO team_stadium VALUES
                    ('b', 1, 100201, 3, 2, 1000, 900, 800, 400, 500, 14000, '[\"2001011\"]', '[\"300204\"]'),
                    ('a', 2, 100101, 1, 1, 1100, 700, 900, 300, 600, 15000, '[]', '[]'),
                    ('a', 1, 100101, 1, 1, 1200, 800, 950, 350, 650, 16000, NULL, NULL);
                 INSERT INTO trainer VALUES ('a', 6, 7, 'Alice', 1200000, 3);",
            )?;
        }

        let (rows, stats) = open_source(&db)?.load()?;
        assert_eq!(stats.parsed, 3);
        let (records, _) = normalize_rows(&rows);

        let order: Vec<_> = records
            .iter()
            .map(|r| (r.trainer_id.as_str(), r.stats.get(stats_core::records::StatField::Speed)))
            .collect();
        assert_eq!(order, [("a", Some(1200.0)), ("a", Some(1100.0)), ("b", Some(1000.0))]);
        assert_eq!(records[0].team_tier, Some(6));
        assert_eq!(records[0].trainer_name.as_deref(), Some("Alice"));
        assert_eq!(records[2].team_tier, None);
        assert_eq!(records[2].support_cards, ["300204"]);
        Ok(())
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(open_source(Path::new("rows.parquet")).is_err());
    }
}
