//! Training records: the raw row shape a source yields and the normalized,
//! read-only record every analyzer consumes.

use std::fmt;

use serde::{Deserialize, Serialize};

// =============================================================================
// Loose scalar values
// =============================================================================

/// A scalar column that may arrive as an integer, a float, or numeric text
/// depending on the source (JSON dump, CSV export, SQLite).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl LooseValue {
    /// String key form: integral floats lose their fraction, text is trimmed.
    pub fn as_key(&self) -> Option<String> {
        match self {
            LooseValue::Int(n) => Some(n.to_string()),
            LooseValue::Float(f) if f.is_finite() && f.fract() == 0.0 => {
                Some((*f as i64).to_string())
            }
            LooseValue::Float(f) if f.is_finite() => Some(f.to_string()),
            LooseValue::Float(_) => None,
            LooseValue::Bool(_) => None,
            LooseValue::Text(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| s.to_string())
            }
        }
    }

    /// Like [`as_key`](Self::as_key) but zero counts as absent.
    pub fn truthy_key(&self) -> Option<String> {
        match self {
            LooseValue::Int(0) => None,
            LooseValue::Float(f) if *f == 0.0 => None,
            other => other.as_key(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            LooseValue::Int(n) => *n as f64,
            LooseValue::Float(f) => *f,
            LooseValue::Bool(_) => return None,
            LooseValue::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            LooseValue::Int(n) => Some(*n),
            _ => self.as_f64().map(|f| f.trunc() as i64),
        }
    }
}

/// A list column: a native list, JSON text holding a list, or absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListField {
    List(Vec<serde_json::Value>),
    Text(String),
}

impl ListField {
    /// Normalize to encoded strings, dropping null, empty and zero entries.
    pub fn to_strings(&self) -> Vec<String> {
        let items = match self {
            ListField::List(items) => items.clone(),
            ListField::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    return Vec::new();
                }
                match serde_json::from_str::<serde_json::Value>(text) {
                    Ok(serde_json::Value::Array(items)) => items,
                    Ok(serde_json::Value::Null) => return Vec::new(),
                    Ok(_) | Err(_) => {
                        log::warn!("Unparseable list column, treating as empty: {text:.60}");
                        return Vec::new();
                    }
                }
            }
        };
        items.iter().filter_map(list_item_text).collect()
    }
}

fn list_item_text(item: &serde_json::Value) -> Option<String> {
    use serde_json::Value;
    match item {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(true) => Some("True".to_string()),
        other => Some(other.to_string()),
    }
}

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Distance {
    Sprint,
    Mile,
    Medium,
    Long,
    Dirt,
}

impl Distance {
    pub const ALL: [Distance; 5] = [
        Distance::Sprint,
        Distance::Mile,
        Distance::Medium,
        Distance::Long,
        Distance::Dirt,
    ];

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Distance::Sprint),
            2 => Some(Distance::Mile),
            3 => Some(Distance::Medium),
            4 => Some(Distance::Long),
            5 => Some(Distance::Dirt),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Distance::Sprint => 1,
            Distance::Mile => 2,
            Distance::Medium => 3,
            Distance::Long => 4,
            Distance::Dirt => 5,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Distance::Sprint => "Sprint",
            Distance::Mile => "Mile",
            Distance::Medium => "Medium",
            Distance::Long => "Long",
            Distance::Dirt => "Dirt",
        }
    }

    /// File stem of the per-distance report (`sprint`, `mile`, ...).
    pub fn file_stem(self) -> String {
        self.name().to_lowercase()
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunningStyle {
    FrontRunner,
    PaceChaser,
    LateSurger,
    EndCloser,
}

impl RunningStyle {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(RunningStyle::FrontRunner),
            2 => Some(RunningStyle::PaceChaser),
            3 => Some(RunningStyle::LateSurger),
            4 => Some(RunningStyle::EndCloser),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RunningStyle::FrontRunner => "Front Runner",
            RunningStyle::PaceChaser => "Pace Chaser",
            RunningStyle::LateSurger => "Late Surger",
            RunningStyle::EndCloser => "End Closer",
        }
    }
}

impl fmt::Display for RunningStyle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Numeric stat columns, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatField {
    Speed,
    Power,
    Stamina,
    Wiz,
    Guts,
    RankScore,
}

impl StatField {
    pub const ALL: [StatField; 6] = [
        StatField::Speed,
        StatField::Power,
        StatField::Stamina,
        StatField::Wiz,
        StatField::Guts,
        StatField::RankScore,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StatField::Speed => "speed",
            StatField::Power => "power",
            StatField::Stamina => "stamina",
            StatField::Wiz => "wiz",
            StatField::Guts => "guts",
            StatField::RankScore => "rank_score",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

// =============================================================================
// Rows and records
// =============================================================================

/// One row as delivered by a row source, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    #[serde(default)]
    pub trainer_id: Option<LooseValue>,
    #[serde(default)]
    pub card_id: Option<LooseValue>,
    #[serde(default)]
    pub distance_type: Option<LooseValue>,
    #[serde(default)]
    pub running_style: Option<LooseValue>,
    #[serde(default)]
    pub team_class: Option<LooseValue>,
    #[serde(default)]
    pub trainer_name: Option<LooseValue>,
    #[serde(default)]
    pub trainer_fans: Option<LooseValue>,
    #[serde(default)]
    pub speed: Option<LooseValue>,
    #[serde(default)]
    pub stamina: Option<LooseValue>,
    #[serde(default)]
    pub power: Option<LooseValue>,
    #[serde(default)]
    pub guts: Option<LooseValue>,
    #[serde(default)]
    pub wiz: Option<LooseValue>,
    #[serde(default)]
    pub rank_score: Option<LooseValue>,
    #[serde(default)]
    pub skills: Option<ListField>,
    #[serde(default)]
    pub support_cards: Option<ListField>,
}

/// Stat values of one run; a missing value only drops out of its own series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatLine {
    values: [Option<f64>; 6],
}

impl StatLine {
    pub fn get(&self, field: StatField) -> Option<f64> {
        self.values[field.index()]
    }

    pub fn set(&mut self, field: StatField, value: Option<f64>) {
        self.values[field.index()] = value;
    }

    pub fn with(mut self, field: StatField, value: f64) -> Self {
        self.set(field, Some(value));
        self
    }
}

/// One trained unit-run, normalized. Never mutated after loading.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRecord {
    pub trainer_id: String,
    pub trainer_name: Option<String>,
    pub trainer_fans: Option<i64>,
    pub character_id: String,
    pub team_tier: Option<u32>,
    pub distance: Option<Distance>,
    pub running_style: Option<RunningStyle>,
    pub stats: StatLine,
    pub skills: Vec<String>,
    pub support_cards: Vec<String>,
}

impl TrainingRecord {
    /// Normalize a raw row. Rows without a trainer or character id are
    /// rejected.
    pub fn from_raw(raw: &RawRow) -> Option<Self> {
        let trainer_id = raw.trainer_id.as_ref()?.as_key()?;
        let character_id = raw.card_id.as_ref()?.as_key()?;

        let mut stats = StatLine::default();
        let columns = [
            (StatField::Speed, &raw.speed),
            (StatField::Power, &raw.power),
            (StatField::Stamina, &raw.stamina),
            (StatField::Wiz, &raw.wiz),
            (StatField::Guts, &raw.guts),
            (StatField::RankScore, &raw.rank_score),
        ];
        for (field, column) in columns {
            stats.set(field, column.as_ref().and_then(LooseValue::as_f64));
        }

        Some(TrainingRecord {
            trainer_id,
            trainer_name: raw.trainer_name.as_ref().and_then(LooseValue::as_key),
            trainer_fans: raw.trainer_fans.as_ref().and_then(LooseValue::as_i64),
            character_id,
            team_tier: raw
                .team_class
                .as_ref()
                .and_then(LooseValue::as_i64)
                .and_then(|t| u32::try_from(t).ok()),
            distance: raw
                .distance_type
                .as_ref()
                .and_then(LooseValue::as_i64)
                .and_then(Distance::from_code),
            running_style: raw
                .running_style
                .as_ref()
                .and_then(LooseValue::as_i64)
                .and_then(RunningStyle::from_code),
            stats,
            skills: raw.skills.as_ref().map(ListField::to_strings).unwrap_or_default(),
            support_cards: raw
                .support_cards
                .as_ref()
                .map(ListField::to_strings)
                .unwrap_or_default(),
        })
    }
}

/// Row normalization statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    pub total_rows: usize,
    pub kept: usize,
    pub rejected: usize,
}

/// Normalize every row, keeping source order.
pub fn normalize_rows(rows: &[RawRow]) -> (Vec<TrainingRecord>, NormalizeStats) {
    let mut stats = NormalizeStats {
        total_rows: rows.len(),
        ..NormalizeStats::default()
    };
    let mut records = Vec::with_capacity(rows.len());

    for (line, raw) in rows.iter().enumerate() {
        match TrainingRecord::from_raw(raw) {
            Some(record) => {
                records.push(record);
                stats.kept += 1;
            }
            None => {
                stats.rejected += 1;
                log::debug!("Row {line} rejected: missing trainer_id or card_id");
            }
        }
    }

    if stats.rejected > 0 {
        log::warn!(
            "{} of {} rows rejected during normalization",
            stats.rejected,
            stats.total_rows
        );
    }

    (records, stats)
}
