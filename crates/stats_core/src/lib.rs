//! # stats_core
//!
//! Batch statistics engine for team-stadium training records.
//!
//! Normalized [`TrainingRecord`]s go in; a versioned tree of JSON report
//! units comes out: one global report, one per distance category, one per
//! character, plus the version index and the master dataset index.
//!
//! ## Modules
//!
//! - `codec` - composite `(entity_id, level)` ids
//! - `lookup` - id → name/type/colour tables
//! - `records` - raw rows and normalized records
//! - `config` - binning, thresholds, ranking sizes
//! - `analysis` - distribution, combination, type-usage and item-level analyzers
//! - `aggregate` - hierarchical slicing into report units
//! - `dataset` - version directories, manifest, master index
//! - `pipeline` - one full build

pub mod aggregate;
pub mod analysis;
pub mod codec;
pub mod config;
pub mod dataset;
pub mod error;
pub mod lookup;
pub mod pipeline;
pub mod records;

pub use aggregate::{Aggregator, CharacterReport, DistanceReport, GlobalReport, StatsContext};
pub use config::{BinningConfig, StatsConfig};
pub use dataset::{
    load_master_index, publish, verify_version, DatasetIndex, DatasetVersion, DatasetWriter,
    MasterIndex,
};
pub use error::{Result, StatsError};
pub use lookup::{ItemKind, LookupTables};
pub use pipeline::{compile, CompileOutput};
pub use records::{normalize_rows, Distance, NormalizeStats, RawRow, RunningStyle, TrainingRecord};

/// Crate version recorded by the builder.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
