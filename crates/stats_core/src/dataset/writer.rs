//! Version-scoped output tree with a SHA-256 manifest.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::{validate_component, DatasetVersion};
use crate::error::{Result, StatsError};

/// Manifest file name inside a version directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Subdirectories created for every version.
pub const SUBDIRS: [&str; 3] = ["global", "distance", "characters"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Path relative to the version directory, `/`-separated.
    pub path: String,
    pub bytes: u64,
    /// SHA256 checksum (hex)
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub generated_at: String,
    pub files: Vec<ManifestEntry>,
}

/// Writes report units under `<root>/<version>/`. Safe to share across
/// threads as long as each unit goes to its own path.
#[derive(Debug)]
pub struct DatasetWriter {
    dir: PathBuf,
    version: DatasetVersion,
    entries: Mutex<Vec<ManifestEntry>>,
}

impl DatasetWriter {
    /// Create `<output_root>/<id>/{global,distance,characters}`.
    pub fn create(output_root: &Path, version: &DatasetVersion) -> Result<Self> {
        let dir = output_root.join(version.id());
        for sub in SUBDIRS {
            let path = dir.join(sub);
            fs::create_dir_all(&path).map_err(|e| StatsError::io(&path, e))?;
        }
        Ok(Self {
            dir,
            version: version.clone(),
            entries: Mutex::new(Vec::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn version(&self) -> &DatasetVersion {
        &self.version
    }

    /// Serialize `value` as pretty JSON to `<sub>/<stem>.json` and record
    /// it in the manifest.
    pub fn write_unit<T: Serialize>(&self, sub: &str, stem: &str, value: &T) -> Result<ManifestEntry> {
        validate_component("file", stem)?;
        self.write_json(&format!("{sub}/{stem}.json"), value)
    }

    /// Serialize `value` as pretty JSON to `rel_path` under the version
    /// directory and record it in the manifest.
    pub fn write_json<T: Serialize>(&self, rel_path: &str, value: &T) -> Result<ManifestEntry> {
        let bytes = serde_json::to_vec_pretty(value)?;
        let path = self.dir.join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StatsError::io(parent, e))?;
        }
        fs::write(&path, &bytes).map_err(|e| StatsError::io(&path, e))?;
        log::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());

        let entry = ManifestEntry {
            path: rel_path.to_string(),
            bytes: bytes.len() as u64,
            sha256: sha256_hex(&bytes),
        };
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(entry.clone());
        Ok(entry)
    }

    /// Manifest entries written so far, sorted by path.
    pub fn manifest(&self) -> Manifest {
        let mut files = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Manifest {
            version: self.version.id().to_string(),
            generated_at: self.version.generated_at(),
            files,
        }
    }

    /// Persist the manifest next to the units and return it.
    pub fn finish(self) -> Result<Manifest> {
        let manifest = self.manifest();
        let path = self.dir.join(MANIFEST_FILE);
        let bytes = serde_json::to_vec_pretty(&manifest)?;
        fs::write(&path, bytes).map_err(|e| StatsError::io(&path, e))?;
        Ok(manifest)
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Re-hash every file listed in a version's manifest.
///
/// # Returns
///
/// The number of files checked. The first file whose checksum differs is
/// reported as [`StatsError::ManifestMismatch`].
pub fn verify_version(output_root: &Path, version_id: &str) -> Result<usize> {
    validate_component("version", version_id)?;
    let dir = output_root.join(version_id);
    let manifest_path = dir.join(MANIFEST_FILE);
    if !manifest_path.is_file() {
        return Err(StatsError::MissingManifest {
            version: version_id.to_string(),
        });
    }
    let text = fs::read_to_string(&manifest_path).map_err(|e| StatsError::io(&manifest_path, e))?;
    let manifest: Manifest = serde_json::from_str(&text)?;

    for entry in &manifest.files {
        let path = dir.join(&entry.path);
        let bytes = fs::read(&path).map_err(|e| StatsError::io(&path, e))?;
        if sha256_hex(&bytes) != entry.sha256 {
            return Err(StatsError::ManifestMismatch {
                path: entry.path.clone(),
            });
        }
    }
    Ok(manifest.files.len())
}
