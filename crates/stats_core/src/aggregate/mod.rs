//! # Hierarchical Aggregator
//!
//! Slices the record set by team tier, distance and character and runs the
//! analyzer battery on every slice that clears its minimum-sample gate.
//! Slices under their gate are omitted from the output, never emitted empty.
//!
//! ## Report Units
//!
//! - [`GlobalReport`] - one per dataset, tiers nested inside
//! - [`DistanceReport`] - one per distance category with records
//! - [`CharacterReport`] - one per character id

pub mod character;
pub mod distance;
pub mod global;

pub use character::{CharacterMetadata, CharacterReport, CharacterTierReport};
pub use distance::{DistanceMetadata, DistanceReport, DistanceTierReport};
pub use global::{GlobalMetadata, GlobalReport, TieredSection};

use indexmap::IndexMap;

use crate::analysis::{
    combinations, distribution, item_levels, simple_summary, type_usage, Combination, ItemLevels,
    StatSummary, TypeUsage,
};
use crate::config::StatsConfig;
use crate::lookup::{ItemKind, LookupTables};
use crate::records::{StatField, TrainingRecord};

/// Stat name → summary, in [`StatField::ALL`] order.
pub type StatTable = IndexMap<String, StatSummary>;

/// Everything an aggregation run reads besides the records themselves.
/// Built once, then shared immutably.
#[derive(Debug, Clone, Default)]
pub struct StatsContext {
    pub lookups: LookupTables,
    pub config: StatsConfig,
}

impl StatsContext {
    pub fn new(lookups: LookupTables, config: StatsConfig) -> Self {
        Self { lookups, config }
    }
}

/// Item analyses shared by every sliced report.
#[derive(Debug, Clone)]
pub(crate) struct SliceAnalysis {
    pub support_cards: IndexMap<String, ItemLevels>,
    pub total_support_cards: usize,
    pub combinations: IndexMap<String, Combination>,
    pub total_combinations: usize,
    pub type_distribution: IndexMap<String, TypeUsage>,
    pub skills: IndexMap<String, ItemLevels>,
    pub total_skills: usize,
}

/// Builds report units. One instance stamps every unit of a run with the
/// same `generated_at`.
pub struct Aggregator<'c> {
    ctx: &'c StatsContext,
    generated_at: String,
}

impl<'c> Aggregator<'c> {
    pub fn new(ctx: &'c StatsContext, generated_at: impl Into<String>) -> Self {
        Self {
            ctx,
            generated_at: generated_at.into(),
        }
    }

    pub fn context(&self) -> &StatsContext {
        self.ctx
    }

    pub fn generated_at(&self) -> &str {
        &self.generated_at
    }

    fn config(&self) -> &StatsConfig {
        &self.ctx.config
    }

    fn lookups(&self) -> &LookupTables {
        &self.ctx.lookups
    }

    /// Per-stat summaries. `full` selects histogrammed distributions over
    /// the simplified form.
    pub(crate) fn stat_table(&self, slice: &[&TrainingRecord], full: bool) -> StatTable {
        StatField::ALL
            .iter()
            .map(|&field| {
                let series = stat_series(slice, field);
                let summary = if full {
                    distribution(&series, field.as_str(), self.config())
                } else {
                    simple_summary(&series)
                };
                (field.as_str().to_string(), summary)
            })
            .collect()
    }

    pub(crate) fn analyze(&self, slice: &[&TrainingRecord]) -> SliceAnalysis {
        let top_n = &self.config().top_n;
        let runs = card_runs(slice);
        let cards = slice.iter().flat_map(|r| r.support_cards.iter());
        let skills = slice.iter().flat_map(|r| r.skills.iter());

        SliceAnalysis {
            support_cards: item_levels(cards.clone(), ItemKind::SupportCard, self.lookups(), top_n.items),
            total_support_cards: cards.count(),
            combinations: combinations(&runs, self.lookups(), top_n.combinations),
            total_combinations: runs.len(),
            type_distribution: type_usage(&runs, self.lookups(), top_n.cards_per_type),
            skills: item_levels(skills.clone(), ItemKind::Skill, self.lookups(), top_n.items),
            total_skills: skills.count(),
        }
    }
}

/// Present values of one stat column.
fn stat_series(slice: &[&TrainingRecord], field: StatField) -> Vec<f64> {
    slice.iter().filter_map(|r| r.stats.get(field)).collect()
}

/// Equipped cards of every run that has any.
pub(crate) fn card_runs<'r>(slice: &[&'r TrainingRecord]) -> Vec<&'r [String]> {
    slice
        .iter()
        .filter(|r| !r.support_cards.is_empty())
        .map(|r| r.support_cards.as_slice())
        .collect()
}

/// Records of `slice` matching `keep`.
pub(crate) fn subslice<'r, F>(slice: &[&'r TrainingRecord], keep: F) -> Vec<&'r TrainingRecord>
where
    F: Fn(&TrainingRecord) -> bool,
{
    slice.iter().copied().filter(|r| keep(*r)).collect()
}

/// Tiers at or above `min_tier`, in first-appearance order.
pub(crate) fn tiers_in(slice: &[&TrainingRecord], min_tier: u32) -> Vec<u32> {
    let mut tiers: Vec<u32> = Vec::new();
    for tier in slice.iter().filter_map(|r| r.team_tier) {
        if tier >= min_tier && !tiers.contains(&tier) {
            tiers.push(tier);
        }
    }
    tiers
}

pub(crate) fn unique_count<'r, I>(values: I) -> usize
where
    I: IntoIterator<Item = &'r str>,
{
    values.into_iter().collect::<rustc_hash::FxHashSet<_>>().len()
}

/// Distinct character ids in first-appearance order.
pub fn character_ids(records: &[TrainingRecord]) -> Vec<String> {
    let mut seen = indexmap::IndexSet::new();
    for record in records {
        seen.insert(record.character_id.as_str());
    }
    seen.into_iter().map(str::to_string).collect()
}

/// Character ids sorted numerically when every id is numeric, otherwise
/// lexically.
pub fn sorted_character_ids(records: &[TrainingRecord]) -> Vec<String> {
    let mut ids = character_ids(records);
    let numeric: Option<Vec<u64>> = ids.iter().map(|id| id.parse::<u64>().ok()).collect();
    match numeric {
        Some(_) => ids.sort_by_key(|id| id.parse::<u64>().unwrap_or(u64::MAX)),
        None => ids.sort(),
    }
    ids
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::records::{Distance, RunningStyle, StatField, StatLine, TrainingRecord};

    /// A record with every stat set to `stat`.
    pub fn record(
        trainer: &str,
        character: &str,
        tier: Option<u32>,
        distance: Option<Distance>,
        stat: f64,
    ) -> TrainingRecord {
        let stats = StatField::ALL
            .iter()
            .fold(StatLine::default(), |line, &f| line.with(f, stat));
        TrainingRecord {
            trainer_id: trainer.to_string(),
            trainer_name: Some(format!("Trainer {trainer}")),
            trainer_fans: Some(1000),
            character_id: character.to_string(),
            team_tier: tier,
            distance,
            running_style: Some(RunningStyle::PaceChaser),
            stats,
            skills: vec!["2001011".to_string(), "2001012".to_string()],
            support_cards: vec!["300204".to_string(), "300214".to_string()],
        }
    }

    /// `n` records of one character for distinct trainers.
    pub fn batch(
        prefix: &str,
        n: usize,
        character: &str,
        tier: u32,
        distance: Distance,
    ) -> Vec<TrainingRecord> {
        (0..n)
            .map(|i| {
                record(
                    &format!("{prefix}{i}"),
                    character,
                    Some(tier),
                    Some(distance),
                    500.0 + i as f64,
                )
            })
            .collect()
    }

    pub fn refs(records: &[TrainingRecord]) -> Vec<&TrainingRecord> {
        records.iter().collect()
    }
}
