//! Run configuration: histogram binning, slice thresholds and ranking sizes.
//!
//! Defaults reproduce the published datasets; a YAML file can override any
//! subset of fields.
//!
//! ```yaml
//! binning:
//!   rank_score: { min: 0, max: 20000, buckets: 40 }
//! thresholds:
//!   distance_team_tier: 30
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StatsError};
use crate::records::StatField;

/// Bucket count for fields with no configured binning.
pub const DEFAULT_BUCKETS: usize = 20;

/// Fixed histogram range for one numeric field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinningConfig {
    pub min: f64,
    pub max: f64,
    pub buckets: usize,
}

impl BinningConfig {
    pub const fn new(min: f64, max: f64, buckets: usize) -> Self {
        Self { min, max, buckets }
    }

    /// Range derived from the series itself, truncated to integers.
    pub fn auto(series_min: f64, series_max: f64, buckets: usize) -> Self {
        Self {
            min: series_min.trunc(),
            max: series_max.trunc(),
            buckets,
        }
    }

    pub fn width(&self) -> f64 {
        (self.max - self.min) / self.buckets as f64
    }

    /// `(start, end)` of every bucket, in order.
    pub fn bounds(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        let width = self.width();
        (0..self.buckets).map(move |i| {
            (
                self.min + (i as f64 * width),
                self.min + ((i + 1) as f64 * width),
            )
        })
    }

    pub fn validate(&self, field: &str) -> Result<()> {
        let reason = if self.buckets == 0 {
            Some("bucket count must be positive".to_string())
        } else if !self.min.is_finite() || !self.max.is_finite() {
            Some("range must be finite".to_string())
        } else if self.max <= self.min {
            Some(format!("max {} must exceed min {}", self.max, self.min))
        } else {
            None
        };

        match reason {
            Some(reason) => Err(StatsError::InvalidBinning {
                field: field.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// Minimum slice sizes. A slice is materialized only when its record count
/// is strictly greater than the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Team-tier slices of the global report.
    pub global_team_tier: usize,
    /// Team-tier slices inside a distance report.
    pub distance_team_tier: usize,
    /// Distance slices inside a character report.
    pub character_distance: usize,
    /// Team-tier slices inside a character × distance slice.
    pub character_team_tier: usize,
    /// Above this size a character slice gets full histogram summaries.
    pub character_histogram: usize,
    /// Tiers below this never form slices.
    pub min_team_tier: u32,
    /// Lowest tier listed in a character's team-tier distribution.
    pub character_tier_floor: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            global_team_tier: 100,
            distance_team_tier: 50,
            character_distance: 10,
            character_team_tier: 5,
            character_histogram: 20,
            min_team_tier: 1,
            character_tier_floor: 6,
        }
    }
}

/// Ranking sizes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopN {
    pub items: usize,
    pub combinations: usize,
    pub cards_per_type: usize,
    pub global_characters: usize,
    pub distance_characters: usize,
}

impl Default for TopN {
    fn default() -> Self {
        Self {
            items: 50,
            combinations: 50,
            cards_per_type: 50,
            global_characters: 30,
            distance_characters: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub binning: IndexMap<String, BinningConfig>,
    pub default_buckets: usize,
    pub thresholds: Thresholds,
    pub top_n: TopN,
    /// URL prefix recorded as each dataset's `basePath`.
    pub public_base: String,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            binning: default_binning(),
            default_buckets: DEFAULT_BUCKETS,
            thresholds: Thresholds::default(),
            top_n: TopN::default(),
            public_base: "/assets/statistics".to_string(),
        }
    }
}

fn default_binning() -> IndexMap<String, BinningConfig> {
    StatField::ALL
        .iter()
        .map(|field| {
            let binning = match field {
                StatField::RankScore => BinningConfig::new(0.0, 17000.0, 20),
                _ => BinningConfig::new(0.0, 1200.0, 20),
            };
            (field.as_str().to_string(), binning)
        })
        .collect()
}

impl StatsConfig {
    /// Parse a YAML override file. Binning entries are merged over the
    /// defaults rather than replacing the whole table.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mut config: StatsConfig = serde_yaml::from_str(yaml)?;
        let mut binning = default_binning();
        binning.extend(config.binning.drain(..));
        config.binning = binning;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, binning) in &self.binning {
            binning.validate(field)?;
        }
        if self.default_buckets == 0 {
            return Err(StatsError::InvalidBinning {
                field: "default_buckets".to_string(),
                reason: "bucket count must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn binning_for(&self, field: &str) -> Option<BinningConfig> {
        self.binning.get(field).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_published_layout() {
        let config = StatsConfig::default();
        assert_eq!(
            config.binning_for("speed"),
            Some(BinningConfig::new(0.0, 1200.0, 20))
        );
        assert_eq!(
            config.binning_for("rank_score"),
            Some(BinningConfig::new(0.0, 17000.0, 20))
        );
        assert_eq!(config.binning_for("fans"), None);
        assert_eq!(config.thresholds.global_team_tier, 100);
        assert_eq!(config.top_n.global_characters, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bounds_cover_range() {
        let b = BinningConfig::new(0.0, 100.0, 10);
        let bounds: Vec<_> = b.bounds().collect();
        assert_eq!(bounds.len(), 10);
        assert_eq!(bounds[0], (0.0, 10.0));
        assert_eq!(bounds[9], (90.0, 100.0));
    }

    #[test]
    fn test_yaml_overrides_merge() {
        let yaml = r#"
binning:
  rank_score: { min: 0, max: 20000, buckets: 40 }
  fans: { min: 0, max: 1000000, buckets: 10 }
thresholds:
  distance_team_tier: 30
top_n:
  items: 10
"#;
        let config = StatsConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(
            config.binning_for("rank_score"),
            Some(BinningConfig::new(0.0, 20000.0, 40))
        );
        assert_eq!(
            config.binning_for("speed"),
            Some(BinningConfig::new(0.0, 1200.0, 20))
        );
        assert!(config.binning_for("fans").is_some());
        assert_eq!(config.thresholds.distance_team_tier, 30);
        assert_eq!(config.thresholds.global_team_tier, 100);
        assert_eq!(config.top_n.items, 10);
        assert_eq!(config.top_n.combinations, 50);
        assert_eq!(config.public_base, "/assets/statistics");
    }

    #[test]
    fn test_invalid_binning_rejected() {
        let yaml = "binning:\n  speed: { min: 100, max: 100, buckets: 5 }\n";
        let err = StatsConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, StatsError::InvalidBinning { ref field, .. } if field == "speed"));

        let zero = BinningConfig::new(0.0, 1.0, 0);
        assert!(zero.validate("x").is_err());
    }

    #[test]
    fn test_bad_yaml_is_config_error() {
        let err = StatsConfig::from_yaml_str("thresholds: [1, 2").unwrap_err();
        assert!(matches!(err, StatsError::Yaml(_)));
    }
}
