//! Dataset-wide report with per-tier breakdowns.

use indexmap::IndexMap;
use serde::Serialize;

use super::{subslice, tiers_in, unique_count, Aggregator, StatTable};
use crate::analysis::{
    character_distribution, team_tier_distribution, Combination, ItemLevels, Share,
    TeamTierDistribution, TypeUsage,
};
use crate::records::TrainingRecord;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalMetadata {
    pub generated_at: String,
    pub total_entries: usize,
    pub total_trainers: usize,
    pub total_unique_umas: usize,
    pub total_trained_umas: usize,
}

/// `{overall, by_team_class, total_*}`. Counter keys are dynamic
/// (`total_skills`, `total_skills_7`, ...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TieredSection<T> {
    pub overall: T,
    pub by_team_class: IndexMap<String, T>,
    #[serde(flatten)]
    pub totals: IndexMap<String, usize>,
}

impl<T> TieredSection<T> {
    fn new(overall: T) -> Self {
        Self {
            overall,
            by_team_class: IndexMap::new(),
            totals: IndexMap::new(),
        }
    }

    fn with_total(overall: T, counter: &str, total: usize) -> Self {
        let mut section = Self::new(overall);
        section.totals.insert(counter.to_string(), total);
        section
    }

    fn add_tier(&mut self, tier: &str, value: T) {
        self.by_team_class.insert(tier.to_string(), value);
    }

    fn add_tier_total(&mut self, counter: &str, tier: &str, total: usize) {
        self.totals.insert(format!("{counter}_{tier}"), total);
    }
}

/// Characters keyed by display name, plus the same ranking per tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UmaDistribution {
    #[serde(flatten)]
    pub overall: IndexMap<String, Share>,
    pub by_team_class: IndexMap<String, IndexMap<String, Share>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalReport {
    pub metadata: GlobalMetadata,
    pub team_class_distribution: TeamTierDistribution,
    pub uma_distribution: UmaDistribution,
    pub stat_averages: TieredSection<StatTable>,
    pub support_cards: TieredSection<IndexMap<String, ItemLevels>>,
    pub support_card_combinations: TieredSection<IndexMap<String, Combination>>,
    pub support_card_type_distribution: TieredSection<IndexMap<String, TypeUsage>>,
    pub skills: TieredSection<IndexMap<String, ItemLevels>>,
}

impl Aggregator<'_> {
    /// Build the global report. Tier breakdowns exist only for tiers at or
    /// above `min_team_tier` with more than `global_team_tier` records.
    pub fn global(&self, records: &[TrainingRecord]) -> GlobalReport {
        let config = self.config();
        let all: Vec<&TrainingRecord> = records.iter().collect();
        let analysis = self.analyze(&all);

        let metadata = GlobalMetadata {
            generated_at: self.generated_at().to_string(),
            total_entries: all.len(),
            total_trainers: unique_count(all.iter().map(|r| r.trainer_id.as_str())),
            total_unique_umas: unique_count(all.iter().map(|r| r.character_id.as_str())),
            total_trained_umas: all.len(),
        };

        let mut report = GlobalReport {
            metadata,
            team_class_distribution: team_tier_distribution(&all, 0, None),
            uma_distribution: UmaDistribution {
                overall: character_distribution(
                    &all,
                    self.lookups(),
                    config.top_n.global_characters,
                ),
                by_team_class: IndexMap::new(),
            },
            stat_averages: TieredSection::new(self.stat_table(&all, true)),
            support_cards: TieredSection::with_total(
                analysis.support_cards,
                "total_support_cards",
                analysis.total_support_cards,
            ),
            support_card_combinations: TieredSection::with_total(
                analysis.combinations,
                "total_combinations",
                analysis.total_combinations,
            ),
            support_card_type_distribution: TieredSection::new(analysis.type_distribution),
            skills: TieredSection::with_total(
                analysis.skills,
                "total_skills",
                analysis.total_skills,
            ),
        };

        for tier in tiers_in(&all, config.thresholds.min_team_tier) {
            let slice = subslice(&all, |r| r.team_tier == Some(tier));
            if slice.len() <= config.thresholds.global_team_tier {
                log::debug!("Global tier {tier} skipped: {} records", slice.len());
                continue;
            }
            let key = tier.to_string();
            let tier_analysis = self.analyze(&slice);

            report.uma_distribution.by_team_class.insert(
                key.clone(),
                character_distribution(&slice, self.lookups(), config.top_n.global_characters),
            );
            report.stat_averages.add_tier(&key, self.stat_table(&slice, true));

            report.support_cards.add_tier(&key, tier_analysis.support_cards);
            report.support_cards.add_tier_total(
                "total_support_cards",
                &key,
                tier_analysis.total_support_cards,
            );
            report
                .support_card_combinations
                .add_tier(&key, tier_analysis.combinations);
            report.support_card_combinations.add_tier_total(
                "total_combinations",
                &key,
                tier_analysis.total_combinations,
            );
            report
                .support_card_type_distribution
                .add_tier(&key, tier_analysis.type_distribution);
            report.skills.add_tier(&key, tier_analysis.skills);
            report
                .skills
                .add_tier_total("total_skills", &key, tier_analysis.total_skills);
        }

        report
    }
}
