//! Per-distance report: one unit for every distance category with records.

use indexmap::IndexMap;
use serde::Serialize;

use super::{subslice, tiers_in, Aggregator, StatTable};
use crate::analysis::{character_distribution, Combination, ItemLevels, Share, TypeUsage};
use crate::records::{Distance, TrainingRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceMetadata {
    pub distance: String,
    pub total_entries: usize,
    pub generated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceTierReport {
    pub total_entries: usize,
    pub total_trained_umas: usize,
    pub uma_distribution: IndexMap<String, Share>,
    pub stat_averages: StatTable,
    pub support_cards: IndexMap<String, ItemLevels>,
    pub total_support_cards: usize,
    pub support_card_combinations: IndexMap<String, Combination>,
    pub total_combinations: usize,
    pub support_card_type_distribution: IndexMap<String, TypeUsage>,
    pub skills: IndexMap<String, ItemLevels>,
    pub total_skills: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceReport {
    pub metadata: DistanceMetadata,
    pub by_team_class: IndexMap<String, DistanceTierReport>,
}

impl Aggregator<'_> {
    /// Report for one distance, or `None` when no record has it.
    pub fn distance(&self, records: &[TrainingRecord], distance: Distance) -> Option<DistanceReport> {
        let all: Vec<&TrainingRecord> = records.iter().collect();
        let slice = subslice(&all, |r| r.distance == Some(distance));
        if slice.is_empty() {
            return None;
        }

        let thresholds = &self.config().thresholds;
        let mut by_team_class = IndexMap::new();

        for tier in tiers_in(&slice, thresholds.min_team_tier) {
            let tier_slice = subslice(&slice, |r| r.team_tier == Some(tier));
            if tier_slice.len() <= thresholds.distance_team_tier {
                log::debug!("{distance} tier {tier} skipped: {} records", tier_slice.len());
                continue;
            }
            by_team_class.insert(tier.to_string(), self.distance_tier(&tier_slice));
        }

        Some(DistanceReport {
            metadata: DistanceMetadata {
                distance: distance.name().to_string(),
                total_entries: slice.len(),
                generated_at: self.generated_at().to_string(),
            },
            by_team_class,
        })
    }

    fn distance_tier(&self, slice: &[&TrainingRecord]) -> DistanceTierReport {
        let analysis = self.analyze(slice);
        DistanceTierReport {
            total_entries: slice.len(),
            total_trained_umas: slice.len(),
            uma_distribution: character_distribution(
                slice,
                self.lookups(),
                self.config().top_n.distance_characters,
            ),
            stat_averages: self.stat_table(slice, true),
            support_cards: analysis.support_cards,
            total_support_cards: analysis.total_support_cards,
            support_card_combinations: analysis.combinations,
            total_combinations: analysis.total_combinations,
            support_card_type_distribution: analysis.type_distribution,
            skills: analysis.skills,
            total_skills: analysis.total_skills,
        }
    }
}
