//! Per-character report with a nested (distance, team tier) breakdown.

use indexmap::IndexMap;
use serde::Serialize;

use super::{subslice, tiers_in, Aggregator, StatTable};
use crate::analysis::{
    category_distribution, team_tier_distribution, CategoryDistribution, CharacterTag,
    Combination, ItemLevels, TeamTierDistribution, TypeUsage,
};
use crate::records::{Distance, TrainingRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterMetadata {
    pub character_id: String,
    pub character_name: String,
    pub character_color: Option<String>,
    pub total_entries: usize,
    pub total_trained_umas: usize,
    pub generated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterGlobal {
    pub distance_distribution: CategoryDistribution,
    pub running_style_distribution: CategoryDistribution,
    pub team_class_distribution: TeamTierDistribution,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterTierReport {
    pub total_entries: usize,
    pub total_trained_umas: usize,
    pub stat_averages: StatTable,
    pub common_support_cards: IndexMap<String, ItemLevels>,
    pub total_support_cards: usize,
    pub support_card_combinations: IndexMap<String, Combination>,
    pub total_combinations: usize,
    pub support_card_type_distribution: IndexMap<String, TypeUsage>,
    pub common_skills: IndexMap<String, ItemLevels>,
    pub total_skills: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterDistance {
    pub by_team_class: IndexMap<String, CharacterTierReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterReport {
    pub metadata: CharacterMetadata,
    pub global: CharacterGlobal,
    pub by_distance: IndexMap<String, CharacterDistance>,
}

impl Aggregator<'_> {
    /// Report for one character id, or `None` when it has no records.
    pub fn character(&self, records: &[TrainingRecord], character_id: &str) -> Option<CharacterReport> {
        let all: Vec<&TrainingRecord> = records.iter().collect();
        let slice = subslice(&all, |r| r.character_id == character_id);
        (!slice.is_empty()).then(|| self.character_report(character_id, &slice))
    }

    /// Report over records already filtered to `character_id`.
    pub fn character_report(&self, character_id: &str, slice: &[&TrainingRecord]) -> CharacterReport {
        let thresholds = &self.config().thresholds;
        let tag = CharacterTag {
            character_id: character_id.to_string(),
            character_color: self.lookups().character_color(character_id),
        };

        let global = CharacterGlobal {
            distance_distribution: category_distribution(slice, &tag, |r| {
                r.distance.map(|d| d.name().to_string())
            }),
            running_style_distribution: category_distribution(slice, &tag, |r| {
                r.running_style.map(|s| s.name().to_string())
            }),
            team_class_distribution: team_tier_distribution(
                slice,
                thresholds.character_tier_floor,
                Some(&tag),
            ),
        };

        let mut by_distance = IndexMap::new();
        for distance in distances_in(slice) {
            let distance_slice = subslice(slice, |r| r.distance == Some(distance));
            if distance_slice.len() <= thresholds.character_distance {
                continue;
            }

            let mut by_team_class = IndexMap::new();
            for tier in tiers_in(&distance_slice, thresholds.min_team_tier) {
                let tier_slice = subslice(&distance_slice, |r| r.team_tier == Some(tier));
                if tier_slice.len() <= thresholds.character_team_tier {
                    continue;
                }
                by_team_class.insert(tier.to_string(), self.character_tier(&tier_slice));
            }
            by_distance.insert(distance.name().to_string(), CharacterDistance { by_team_class });
        }

        CharacterReport {
            metadata: CharacterMetadata {
                character_id: character_id.to_string(),
                character_name: self.lookups().character_name(character_id),
                character_color: tag.character_color.clone(),
                total_entries: slice.len(),
                total_trained_umas: slice.len(),
                generated_at: self.generated_at().to_string(),
            },
            global,
            by_distance,
        }
    }

    fn character_tier(&self, slice: &[&TrainingRecord]) -> CharacterTierReport {
        let full = slice.len() > self.config().thresholds.character_histogram;
        let analysis = self.analyze(slice);
        CharacterTierReport {
            total_entries: slice.len(),
            total_trained_umas: slice.len(),
            stat_averages: self.stat_table(slice, full),
            common_support_cards: analysis.support_cards,
            total_support_cards: analysis.total_support_cards,
            support_card_combinations: analysis.combinations,
            total_combinations: analysis.total_combinations,
            support_card_type_distribution: analysis.type_distribution,
            common_skills: analysis.skills,
            total_skills: analysis.total_skills,
        }
    }
}

fn distances_in(slice: &[&TrainingRecord]) -> Vec<Distance> {
    let mut distances = Vec::new();
    for distance in slice.iter().filter_map(|r| r.distance) {
        if !distances.contains(&distance) {
            distances.push(distance);
        }
    }
    distances
}
