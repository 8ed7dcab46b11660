//! # Dataset Version Manager
//!
//! Every pipeline run produces one immutable version directory:
//!
//! ```text
//! <root>/
//!   datasets.json                  master index, newest first
//!   <version>/
//!     index.json                   DatasetIndex
//!     manifest.json                SHA-256 of every unit
//!     global/global.json
//!     distance/<distance>.json
//!     characters/<character_id>.json
//! ```
//!
//! Publishing a version replaces any earlier entry with the same version
//! key, so re-running a build is safe.

mod writer;

pub use writer::{
    sha256_hex, verify_version, DatasetWriter, Manifest, ManifestEntry, MANIFEST_FILE, SUBDIRS,
};

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};

pub const MASTER_INDEX_FILE: &str = "datasets.json";
pub const INDEX_FILE: &str = "index.json";

/// Local timestamp format shared by every `generated_at` field.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

pub fn timestamp(at: &NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Reject names that would leave their parent directory.
pub(crate) fn validate_component(kind: &'static str, value: &str) -> Result<()> {
    let bad = value.is_empty()
        || value == "."
        || value == ".."
        || value.chars().any(|c| c == '/' || c == '\\' || c.is_control());
    if bad {
        return Err(StatsError::InvalidComponent {
            kind,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// Identity of one dataset version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetVersion {
    id: String,
    generated_at: NaiveDateTime,
}

impl DatasetVersion {
    pub fn new(id: impl Into<String>, generated_at: NaiveDateTime) -> Result<Self> {
        let id = id.into();
        if validate_component("version", &id).is_err() {
            return Err(StatsError::InvalidVersion(id));
        }
        Ok(Self { id, generated_at })
    }

    /// Version keyed by the local date of `generated_at` (`YYYY-MM-DD`).
    pub fn dated(generated_at: NaiveDateTime) -> Self {
        Self {
            id: generated_at.format("%Y-%m-%d").to_string(),
            generated_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> String {
        format!("Statistics {}", self.id)
    }

    pub fn generated_at(&self) -> String {
        timestamp(&self.generated_at)
    }

    pub fn base_path(&self, public_base: &str) -> String {
        format!("{}/{}", public_base.trim_end_matches('/'), self.id)
    }
}

/// Contents of `<version>/index.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetIndex {
    pub generated_at: String,
    pub total_entries: usize,
    pub total_trainers: usize,
    pub total_characters: usize,
    pub distances: Vec<String>,
    pub character_ids: Vec<String>,
    pub version: String,
    pub name: String,
}

/// One `datasets` entry of the master index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub id: String,
    pub version: String,
    pub name: String,
    pub date: String,
    #[serde(rename = "basePath")]
    pub base_path: String,
    /// Kept as raw JSON so entries written by older builds survive a merge.
    pub index: serde_json::Value,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterIndex {
    pub datasets: Vec<DatasetEntry>,
    pub last_updated: String,
}

impl MasterIndex {
    pub fn empty(last_updated: impl Into<String>) -> Self {
        Self {
            datasets: Vec::new(),
            last_updated: last_updated.into(),
        }
    }

    /// Replace any entry with the same version, then sort newest first.
    pub fn upsert(&mut self, entry: DatasetEntry, updated_at: impl Into<String>) {
        self.datasets.retain(|ds| ds.version != entry.version);
        self.datasets.push(entry);
        self.datasets.sort_by(|a, b| b.date.cmp(&a.date));
        self.last_updated = updated_at.into();
    }

    pub fn get(&self, version: &str) -> Option<&DatasetEntry> {
        self.datasets.iter().find(|ds| ds.version == version)
    }
}

/// Load `<root>/datasets.json`, or `None` if it does not exist yet.
pub fn load_master_index(output_root: &Path) -> Result<Option<MasterIndex>> {
    let path = output_root.join(MASTER_INDEX_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(&path).map_err(|e| StatsError::io(&path, e))?;
    Ok(Some(serde_json::from_str(&text)?))
}

/// Write `<version>/index.json` and merge the version into the master index.
///
/// # Arguments
///
/// * `output_root` - directory holding `datasets.json`
/// * `version` - the version being published
/// * `index` - summary written to `<version>/index.json`
/// * `public_base` - URL prefix for the entry's `basePath`
///
/// # Returns
///
/// The master index as persisted.
pub fn publish(
    output_root: &Path,
    version: &DatasetVersion,
    index: &DatasetIndex,
    public_base: &str,
) -> Result<MasterIndex> {
    let index_path = output_root.join(version.id()).join(INDEX_FILE);
    if let Some(parent) = index_path.parent() {
        fs::create_dir_all(parent).map_err(|e| StatsError::io(parent, e))?;
    }
    let bytes = serde_json::to_vec_pretty(index)?;
    fs::write(&index_path, bytes).map_err(|e| StatsError::io(&index_path, e))?;

    let entry = DatasetEntry {
        id: version.id().to_string(),
        version: version.id().to_string(),
        name: index.name.clone(),
        date: index.generated_at.clone(),
        base_path: version.base_path(public_base),
        index: serde_json::to_value(index)?,
        extra: serde_json::Map::new(),
    };

    let mut master = load_master_index(output_root)?
        .unwrap_or_else(|| MasterIndex::empty(version.generated_at()));
    master.upsert(entry, version.generated_at());
    write_master_index(output_root, &master)?;

    log::info!(
        "Published {} ({} datasets in master index)",
        version.id(),
        master.datasets.len()
    );
    Ok(master)
}

/// Written to a sibling `.tmp` file, then renamed over the old index.
fn write_master_index(output_root: &Path, master: &MasterIndex) -> Result<()> {
    fs::create_dir_all(output_root).map_err(|e| StatsError::io(output_root, e))?;
    let path = output_root.join(MASTER_INDEX_FILE);
    let tmp = output_root.join(format!("{MASTER_INDEX_FILE}.tmp"));
    let bytes = serde_json::to_vec_pretty(master)?;
    fs::write(&tmp, bytes).map_err(|e| StatsError::io(&tmp, e))?;
    fs::rename(&tmp, &path).map_err(|e| StatsError::io(&path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, day)
            .and_then(|d| d.and_hms_micro_opt(hour, 0, 0, 123456))
            .unwrap()
    }

    fn index_for(version: &DatasetVersion, total: usize) -> DatasetIndex {
        DatasetIndex {
            generated_at: version.generated_at(),
            total_entries: total,
            total_trainers: 2,
            total_characters: 1,
            distances: vec!["Sprint".into(), "Mile".into()],
            character_ids: vec!["100101".into()],
            version: version.id().to_string(),
            name: version.name(),
        }
    }

    #[test]
    fn test_version_validation() {
        assert!(DatasetVersion::new("2025-06-01", at(1, 0)).is_ok());
        for bad in ["", ".", "..", "a/b", "a\\b"] {
            assert!(matches!(
                DatasetVersion::new(bad, at(1, 0)),
                Err(StatsError::InvalidVersion(_))
            ));
        }
        let v = DatasetVersion::dated(at(3, 9));
        assert_eq!(v.id(), "2025-06-03");
        assert_eq!(v.name(), "Statistics 2025-06-03");
        assert_eq!(v.generated_at(), "2025-06-03T09:00:00.123456");
        assert_eq!(v.base_path("/assets/statistics/"), "/assets/statistics/2025-06-03");
    }

    #[test]
    fn test_publish_is_idempotent() -> Result<()> {
        let root = TempDir::new().unwrap();
        let v = DatasetVersion::new("2025-06-01", at(1, 8))?;
        let index = index_for(&v, 10);

        let once = publish(root.path(), &v, &index, "/assets/statistics")?;
        let once_text = fs::read_to_string(root.path().join(MASTER_INDEX_FILE)).unwrap();
        let twice = publish(root.path(), &v, &index, "/assets/statistics")?;
        let twice_text = fs::read_to_string(root.path().join(MASTER_INDEX_FILE)).unwrap();

        assert_eq!(twice.datasets.len(), 1);
        assert_eq!(once, twice);
        assert_eq!(once_text, twice_text);
        assert!(!root.path().join("datasets.json.tmp").exists());

        let entry = twice.get("2025-06-01").unwrap();
        assert_eq!(entry.base_path, "/assets/statistics/2025-06-01");
        assert_eq!(entry.index["total_entries"], 10);

        let written: DatasetIndex = serde_json::from_str(
            &fs::read_to_string(root.path().join("2025-06-01/index.json")).unwrap(),
        )?;
        assert_eq!(written, index);
        Ok(())
    }

    #[test]
    fn test_republish_replaces_and_sorts_newest_first() -> Result<()> {
        let root = TempDir::new().unwrap();
        let old = DatasetVersion::new("2025-06-01", at(1, 8))?;
        let new = DatasetVersion::new("2025-06-05", at(5, 8))?;
        publish(root.path(), &new, &index_for(&new, 5), "/assets/statistics")?;
        publish(root.path(), &old, &index_for(&old, 1), "/assets/statistics")?;

        let rerun = DatasetVersion::new("2025-06-01", at(6, 8))?;
        let master = publish(root.path(), &rerun, &index_for(&rerun, 7), "/assets/statistics")?;

        let versions: Vec<_> = master.datasets.iter().map(|d| d.version.as_str()).collect();
        assert_eq!(versions, ["2025-06-01", "2025-06-05"]);
        assert_eq!(master.datasets[0].index["total_entries"], 7);
        assert_eq!(master.last_updated, "2025-06-06T08:00:00.123456");
        Ok(())
    }

    #[test]
    fn test_foreign_entry_fields_survive_merge() -> Result<()> {
        let root = TempDir::new().unwrap();
        let legacy = r#"{
          "datasets": [{
            "id": "2024-01-01", "version": "2024-01-01", "name": "Statistics 2024-01-01",
            "date": "2024-01-01T00:00:00", "basePath": "/assets/statistics/2024-01-01",
            "index": {"total_entries": 3}, "featured": true
          }],
          "last_updated": "2024-01-01T00:00:00"
        }"#;
        fs::write(root.path().join(MASTER_INDEX_FILE), legacy).unwrap();

        let v = DatasetVersion::new("2025-06-01", at(1, 8))?;
        let master = publish(root.path(), &v, &index_for(&v, 1), "/assets/statistics")?;
        assert_eq!(master.datasets.len(), 2);
        let kept = master.get("2024-01-01").unwrap();
        assert_eq!(kept.extra["featured"], true);
        Ok(())
    }

    #[test]
    fn test_missing_master_index() -> Result<()> {
        let root = TempDir::new().unwrap();
        assert!(load_master_index(root.path())?.is_none());
        Ok(())
    }
}
