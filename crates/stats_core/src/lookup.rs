//! # Lookup Resolver
//!
//! Static id → name/type/colour tables built once per run and shared
//! read-only by every analyzer. A miss is never an error: it degrades to a
//! placeholder name, the literal type `"Unknown"`, or no colour.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::records::LooseValue;

/// Skill icon used when the table has none.
pub const DEFAULT_SKILL_ICON: &str = "utx_ico_skill_10011.png";

/// Type reported for cards missing from the table.
pub const UNKNOWN_TYPE: &str = "Unknown";

/// Leading digit of inherited skill ids, and the digit of their base skill.
const INHERITED_MARKER: char = '9';
const BASE_MARKER: char = '1';

/// Which table an item id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Skill,
    SupportCard,
    Character,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillInfo {
    pub name: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardInfo {
    pub name: String,
    /// Capitalized, e.g. `"Speed"`; `None` when the table carries no type.
    pub card_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SkillRow {
    #[serde(default)]
    skill_id: Option<LooseValue>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    icon: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CardRow {
    #[serde(default)]
    id: Option<LooseValue>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "type")]
    card_type: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CharacterRow {
    #[serde(default)]
    id: Option<LooseValue>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LookupTables {
    skills: FxHashMap<String, SkillInfo>,
    cards: FxHashMap<String, CardInfo>,
    characters: FxHashMap<String, String>,
    colors: FxHashMap<String, String>,
}

impl LookupTables {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Construction
    // =========================================================================

    pub fn insert_skill(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        icon: Option<String>,
    ) {
        self.skills.insert(
            id.into(),
            SkillInfo {
                name: name.into(),
                icon: icon.unwrap_or_else(|| DEFAULT_SKILL_ICON.to_string()),
            },
        );
    }

    pub fn insert_card(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        card_type: Option<&str>,
    ) {
        self.cards.insert(
            id.into(),
            CardInfo {
                name: name.into(),
                card_type: card_type.filter(|t| !t.is_empty()).map(capitalize),
            },
        );
    }

    pub fn insert_character(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.characters.insert(id.into(), name.into());
    }

    pub fn insert_color(&mut self, card_id: impl Into<String>, color: impl Into<String>) {
        self.colors.insert(card_id.into(), color.into());
    }

    /// Load a `skills.json` document (array of `{skill_id, name, icon}`).
    ///
    /// Returns the number of entries added.
    pub fn load_skill_table(&mut self, json: &str) -> Result<usize> {
        let rows: Vec<SkillRow> = serde_json::from_str(json)?;
        let mut added = 0;
        for row in rows {
            let Some(id) = row.skill_id.as_ref().and_then(LooseValue::truthy_key) else {
                continue;
            };
            let name = row.name.unwrap_or_else(|| format!("Skill_{id}"));
            self.insert_skill(id, name, row.icon);
            added += 1;
        }
        Ok(added)
    }

    /// Load a `support-cards-db.json` document (array of `{id, name, type}`).
    pub fn load_card_table(&mut self, json: &str) -> Result<usize> {
        let rows: Vec<CardRow> = serde_json::from_str(json)?;
        let mut added = 0;
        for row in rows {
            let Some(id) = row.id.as_ref().and_then(LooseValue::truthy_key) else {
                continue;
            };
            let name = row.name.unwrap_or_else(|| format!("Card_{id}"));
            let card_type = row.card_type.as_ref().and_then(json_scalar_text);
            self.insert_card(id, name, card_type.as_deref());
            added += 1;
        }
        Ok(added)
    }

    /// Load a `character.json` document (array of `{id, name}`).
    pub fn load_character_table(&mut self, json: &str) -> Result<usize> {
        let rows: Vec<CharacterRow> = serde_json::from_str(json)?;
        let mut added = 0;
        for row in rows {
            let Some(id) = row.id.as_ref().and_then(LooseValue::truthy_key) else {
                continue;
            };
            let name = row.name.unwrap_or_else(|| format!("Character_{id}"));
            self.insert_character(id, name);
            added += 1;
        }
        Ok(added)
    }

    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    pub fn character_count(&self) -> usize {
        self.characters.len()
    }

    pub fn color_count(&self) -> usize {
        self.colors.len()
    }

    // =========================================================================
    // Resolution
    // =========================================================================

    /// Skill name; inherited ids (`9xxxx`) resolve through their base skill
    /// (`1xxxx`) and gain an `(Inherited)` suffix.
    pub fn skill_name(&self, id: &str) -> String {
        if let Some(base) = inherited_base_id(id) {
            if let Some(info) = self.skills.get(&base) {
                return format!("{} (Inherited)", info.name);
            }
        }
        match self.skills.get(id) {
            Some(info) => info.name.clone(),
            None => format!("Skill_{id}"),
        }
    }

    pub fn skill_icon(&self, id: &str) -> String {
        if let Some(base) = inherited_base_id(id) {
            if let Some(info) = self.skills.get(&base) {
                return info.icon.clone();
            }
        }
        match self.skills.get(id) {
            Some(info) => info.icon.clone(),
            None => DEFAULT_SKILL_ICON.to_string(),
        }
    }

    pub fn card_name(&self, id: &str) -> String {
        match self.cards.get(id) {
            Some(info) => info.name.clone(),
            None => format!("Card_{id}"),
        }
    }

    /// Capitalized card type, or `"Unknown"`.
    pub fn card_type(&self, id: &str) -> &str {
        self.cards
            .get(id)
            .and_then(|info| info.card_type.as_deref())
            .unwrap_or(UNKNOWN_TYPE)
    }

    pub fn character_name(&self, id: &str) -> String {
        match self.characters.get(id) {
            Some(name) => name.clone(),
            None => format!("Character_{id}"),
        }
    }

    pub fn character_color(&self, id: &str) -> Option<String> {
        self.colors.get(id).cloned()
    }

    pub fn name_of(&self, kind: ItemKind, id: &str) -> String {
        match kind {
            ItemKind::Skill => self.skill_name(id),
            ItemKind::SupportCard => self.card_name(id),
            ItemKind::Character => self.character_name(id),
            ItemKind::Other => id.to_string(),
        }
    }

    pub fn type_of(&self, kind: ItemKind, id: &str) -> &str {
        match kind {
            ItemKind::SupportCard => self.card_type(id),
            _ => UNKNOWN_TYPE,
        }
    }

    pub fn color_of(&self, id: &str) -> Option<String> {
        self.character_color(id)
    }
}

fn inherited_base_id(id: &str) -> Option<String> {
    let mut chars = id.chars();
    if chars.next() == Some(INHERITED_MARKER) && id.len() > 1 {
        Some(format!("{BASE_MARKER}{}", chars.as_str()))
    } else {
        None
    }
}

/// `"speed"` → `"Speed"`, `"POWER"` → `"Power"`.
pub fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => {
            let rest = chars.as_str().to_lowercase();
            first.to_uppercase().chain(rest.chars()).collect()
        }
        None => String::new(),
    }
}

fn json_scalar_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(true) => Some("True".to_string()),
        _ => None,
    }
}
