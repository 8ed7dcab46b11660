//! # Distribution Engine
//!
//! Scalar summaries and fixed-range histograms for one numeric series.
//!
//! Histogram ranges come from [`StatsConfig`] so every dataset buckets the
//! same field identically. Values outside the configured range fall into no
//! bucket at all; they are *not* clamped into the edge buckets, so the
//! histogram total can be lower than `count`.

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::{BinningConfig, StatsConfig};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Percentiles {
    #[serde(rename = "25")]
    pub p25: f64,
    #[serde(rename = "50")]
    pub p50: f64,
    #[serde(rename = "75")]
    pub p75: f64,
    #[serde(rename = "95")]
    pub p95: f64,
}

/// Full summary with histogram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Distribution {
    pub mean: f64,
    pub std: f64,
    pub min: i64,
    pub max: i64,
    pub median: f64,
    pub percentiles: Percentiles,
    pub count: usize,
    pub histogram: IndexMap<String, usize>,
}

/// Reduced summary used for small slices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimpleSummary {
    pub mean: f64,
    pub median: f64,
    pub min: i64,
    pub max: i64,
    pub count: usize,
}

/// Serializes as `{}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EmptySummary {}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatSummary {
    Full(Distribution),
    Simple(SimpleSummary),
    Empty(EmptySummary),
}

impl StatSummary {
    pub fn is_empty(&self) -> bool {
        matches!(self, StatSummary::Empty(_))
    }

    pub fn count(&self) -> usize {
        match self {
            StatSummary::Full(d) => d.count,
            StatSummary::Simple(s) => s.count,
            StatSummary::Empty(_) => 0,
        }
    }
}

/// Summarize `series` with the histogram configured for `field`.
///
/// Fields without a configured range are bucketed over the series' own
/// truncated min/max with `config.default_buckets` buckets.
pub fn distribution(series: &[f64], field: &str, config: &StatsConfig) -> StatSummary {
    if series.is_empty() {
        return StatSummary::Empty(EmptySummary {});
    }

    let sorted = sorted_copy(series);
    let (min, max) = (sorted[0], sorted[sorted.len() - 1]);
    let binning = config
        .binning_for(field)
        .unwrap_or_else(|| BinningConfig::auto(min, max, config.default_buckets));

    StatSummary::Full(Distribution {
        mean: mean(series),
        std: sample_std(series),
        min: min.trunc() as i64,
        max: max.trunc() as i64,
        median: quantile(&sorted, 0.5),
        percentiles: Percentiles {
            p25: quantile(&sorted, 0.25),
            p50: quantile(&sorted, 0.50),
            p75: quantile(&sorted, 0.75),
            p95: quantile(&sorted, 0.95),
        },
        count: series.len(),
        histogram: histogram(series, &binning),
    })
}

/// Mean/median/min/max/count without a histogram.
pub fn simple_summary(series: &[f64]) -> StatSummary {
    if series.is_empty() {
        return StatSummary::Empty(EmptySummary {});
    }
    let sorted = sorted_copy(series);
    StatSummary::Simple(SimpleSummary {
        mean: mean(series),
        median: quantile(&sorted, 0.5),
        min: sorted[0].trunc() as i64,
        max: sorted[sorted.len() - 1].trunc() as i64,
        count: series.len(),
    })
}

/// Count values per bucket.
///
/// Every bucket is `[start, end)` except the last, which is `[start, end]`.
/// Keys are `"{trunc(start)}-{trunc(end)}"`. When a narrow range makes two
/// buckets format to the same key, the later bucket's count is stored under
/// the key's first position.
pub fn histogram(series: &[f64], binning: &BinningConfig) -> IndexMap<String, usize> {
    let mut buckets = IndexMap::with_capacity(binning.buckets);
    let last = binning.buckets.saturating_sub(1);

    for (i, (start, end)) in binning.bounds().enumerate() {
        let count = if i == last {
            series.iter().filter(|&&v| v >= start && v <= end).count()
        } else {
            series.iter().filter(|&&v| v >= start && v < end).count()
        };
        let key = format!("{}-{}", start.trunc() as i64, end.trunc() as i64);
        buckets.insert(key, count);
    }

    buckets
}

fn sorted_copy(series: &[f64]) -> Vec<f64> {
    let mut sorted = series.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

fn mean(series: &[f64]) -> f64 {
    series.iter().sum::<f64>() / series.len() as f64
}

/// Sample standard deviation (n − 1). A single value has no spread: 0.0.
fn sample_std(series: &[f64]) -> f64 {
    let n = series.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(series);
    let variance = series.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

/// Linear interpolation between closest ranks. `sorted` must be non-empty.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(field: &str, binning: BinningConfig) -> StatsConfig {
        let mut config = StatsConfig::default();
        config.binning.insert(field.to_string(), binning);
        config
    }

    fn full(summary: StatSummary) -> Distribution {
        match summary {
            StatSummary::Full(d) => d,
            other => panic!("expected full distribution, got {other:?}"),
        }
    }

    #[test]
    fn test_boundary_inclusion_scenario() {
        let config = config_with("score", BinningConfig::new(0.0, 100.0, 10));
        let d = full(distribution(&[0.0, 10.0, 10.0, 99.0, 100.0], "score", &config));

        assert_eq!(d.histogram.len(), 10);
        assert_eq!(d.histogram["0-10"], 1);
        assert_eq!(d.histogram["10-20"], 2);
        assert_eq!(d.histogram["90-100"], 2);
        for (key, count) in &d.histogram {
            if !matches!(key.as_str(), "0-10" | "10-20" | "90-100") {
                assert_eq!(*count, 0, "bucket {key}");
            }
        }
        let keys: Vec<_> = d.histogram.keys().cloned().collect();
        assert_eq!(keys.first().map(String::as_str), Some("0-10"));
        assert_eq!(keys.last().map(String::as_str), Some("90-100"));
    }

    #[test]
    fn test_scalar_statistics() {
        let config = StatsConfig::default();
        let d = full(distribution(&[400.0, 100.0, 300.0, 200.0], "speed", &config));
        assert_eq!(d.count, 4);
        assert_eq!(d.mean, 250.0);
        assert_eq!(d.min, 100);
        assert_eq!(d.max, 400);
        assert_eq!(d.median, 250.0);
        assert_eq!(d.percentiles.p25, 175.0);
        assert_eq!(d.percentiles.p75, 325.0);
        assert!((d.percentiles.p95 - 385.0).abs() < 1e-9);
        // sample std of 100..400 step 100
        assert!((d.std - 129.099_444_873_580_56).abs() < 1e-9);
    }

    #[test]
    fn test_default_stat_buckets() {
        let config = StatsConfig::default();
        let d = full(distribution(&[1200.0, 59.9, 60.0], "speed", &config));
        assert_eq!(d.histogram.len(), 20);
        assert_eq!(d.histogram["0-60"], 1);
        assert_eq!(d.histogram["60-120"], 1);
        assert_eq!(d.histogram["1140-1200"], 1);
    }

    #[test]
    fn test_out_of_range_values_are_dropped_not_clamped() {
        let config = config_with("score", BinningConfig::new(0.0, 100.0, 10));
        let d = full(distribution(&[-5.0, 50.0, 150.0], "score", &config));
        assert_eq!(d.count, 3);
        assert_eq!(d.histogram.values().sum::<usize>(), 1);
        assert_eq!(d.histogram["0-10"], 0);
        assert_eq!(d.histogram["90-100"], 0);
    }

    #[test]
    fn test_unknown_field_auto_ranges() {
        let config = StatsConfig::default();
        let d = full(distribution(&[10.0, 30.0, 50.0], "fans", &config));
        assert_eq!(d.histogram.len(), 20);
        assert_eq!(d.histogram.keys().next().map(String::as_str), Some("10-12"));
        assert_eq!(d.histogram.keys().last().map(String::as_str), Some("48-50"));
        assert_eq!(d.histogram.values().sum::<usize>(), 3);
    }

    #[test]
    fn test_empty_series_serializes_as_empty_object() {
        let config = StatsConfig::default();
        let summary = distribution(&[], "speed", &config);
        assert!(summary.is_empty());
        assert_eq!(serde_json::to_string(&summary).unwrap(), "{}");
        assert_eq!(serde_json::to_string(&simple_summary(&[])).unwrap(), "{}");
    }

    #[test]
    fn test_single_value_has_zero_std() {
        let config = StatsConfig::default();
        let d = full(distribution(&[700.0], "speed", &config));
        assert_eq!(d.std, 0.0);
        assert_eq!(d.median, 700.0);
        assert_eq!(d.percentiles.p95, 700.0);
    }

    #[test]
    fn test_simple_summary() {
        match simple_summary(&[3.0, 1.0, 2.0]) {
            StatSummary::Simple(s) => {
                assert_eq!(s.mean, 2.0);
                assert_eq!(s.median, 2.0);
                assert_eq!((s.min, s.max, s.count), (1, 3, 3));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_percentile_keys_serialize_as_strings() {
        let config = StatsConfig::default();
        let json = serde_json::to_value(distribution(&[1.0, 2.0], "speed", &config)).unwrap();
        assert!(json["percentiles"]["25"].is_number());
        assert!(json["percentiles"]["95"].is_number());
        assert!(json["histogram"]["0-60"].is_number());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: buckets partition [min, max]; every in-range value lands in exactly one
            #[test]
            fn prop_histogram_partitions_range(
                values in proptest::collection::vec(-200.0f64..1400.0, 0..200),
                buckets in 1usize..40
            ) {
                let binning = BinningConfig::new(0.0, 1200.0, buckets);
                // last bound as computed, which may differ from 1200 by an ulp
                let upper = binning.bounds().last().map(|(_, e)| e).unwrap_or(1200.0);
                let in_range = values.iter().filter(|v| **v >= 0.0 && **v <= upper).count();

                let mut hits = 0usize;
                for v in &values {
                    let matching = binning
                        .bounds()
                        .enumerate()
                        .filter(|(i, (s, e))| {
                            if *i == buckets - 1 { *v >= *s && *v <= *e } else { *v >= *s && *v < *e }
                        })
                        .count();
                    prop_assert!(matching <= 1);
                    hits += matching;
                }
                prop_assert_eq!(hits, in_range);

                // keys are unique at this width, so the map keeps every bucket
                let hist = histogram(&values, &binning);
                if 1200 % buckets == 0 {
                    prop_assert_eq!(hist.values().sum::<usize>(), in_range);
                }
            }
        }
    }
}
