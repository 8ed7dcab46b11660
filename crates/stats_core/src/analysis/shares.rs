//! Category distributions: counts with percentages, tagged with the
//! character they describe.

use indexmap::IndexMap;
use serde::Serialize;

use super::percentage;
use crate::lookup::LookupTables;
use crate::records::TrainingRecord;

/// One category's share of a population.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub count: usize,
    pub percentage: f64,
    pub character_id: String,
    pub character_color: Option<String>,
}

/// Category shares with the population size alongside.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDistribution {
    pub total_entries: usize,
    #[serde(flatten)]
    pub entries: IndexMap<String, Share>,
}

/// Character id and colour attached to per-character tier shares.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterTag {
    pub character_id: String,
    pub character_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierShare {
    pub count: usize,
    pub percentage: f64,
    pub trained_umas: usize,
    pub trained_umas_percentage: f64,
    #[serde(flatten)]
    pub character: Option<CharacterTag>,
}

/// Trainer and trained-unit counts per team tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamTierDistribution {
    pub total_trainers: usize,
    pub total_trained_umas: usize,
    #[serde(flatten)]
    pub tiers: IndexMap<String, TierShare>,
}

/// Count keys in first-seen order, then order by count descending.
pub(crate) fn ranked_counts<K, I>(keys: I) -> Vec<(K, usize)>
where
    K: std::hash::Hash + Eq,
    I: IntoIterator<Item = K>,
{
    let mut counts: IndexMap<K, usize> = IndexMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    let mut ranked: Vec<(K, usize)> = counts.into_iter().collect();
    ranked.sort_by(|(_, a), (_, b)| b.cmp(a));
    ranked
}

/// The `top_n` most frequent characters, keyed by display name.
///
/// Percentages are relative to all records in the slice. Two ids sharing a
/// display name collapse into the later one's entry.
pub fn character_distribution(
    records: &[&TrainingRecord],
    lookups: &LookupTables,
    top_n: usize,
) -> IndexMap<String, Share> {
    let total = records.len();
    ranked_counts(records.iter().map(|r| r.character_id.as_str()))
        .into_iter()
        .take(top_n)
        .map(|(id, count)| {
            let share = Share {
                count,
                percentage: percentage(count, total),
                character_id: id.to_string(),
                character_color: lookups.character_color(id),
            };
            (lookups.character_name(id), share)
        })
        .collect()
}

/// Shares of an arbitrary category within one character's records. Records
/// without a category value count toward `total_entries` only.
pub fn category_distribution<F>(
    records: &[&TrainingRecord],
    character: &CharacterTag,
    category: F,
) -> CategoryDistribution
where
    F: Fn(&TrainingRecord) -> Option<String>,
{
    let total = records.len();
    let entries = ranked_counts(records.iter().filter_map(|r| category(*r)))
        .into_iter()
        .map(|(key, count)| {
            let share = Share {
                count,
                percentage: percentage(count, total),
                character_id: character.character_id.clone(),
                character_color: character.character_color.clone(),
            };
            (key, share)
        })
        .collect();
    CategoryDistribution {
        total_entries: total,
        entries,
    }
}

/// Team-tier distribution of a slice.
///
/// A trainer counts once, under the first non-empty tier among their
/// records. Tiers below `floor` are left out of the map but still count in
/// the totals.
pub fn team_tier_distribution(
    records: &[&TrainingRecord],
    floor: u32,
    character: Option<&CharacterTag>,
) -> TeamTierDistribution {
    let mut trainer_tier: IndexMap<&str, Option<u32>> = IndexMap::new();
    for record in records {
        let tier = trainer_tier.entry(record.trainer_id.as_str()).or_insert(None);
        if tier.is_none() {
            *tier = record.team_tier;
        }
    }
    let total_trainers = trainer_tier.len();
    let total_trained_umas = records.len();

    let trained: IndexMap<u32, usize> = ranked_counts(records.iter().filter_map(|r| r.team_tier))
        .into_iter()
        .collect();

    let tiers = ranked_counts(trainer_tier.values().filter_map(|t| *t))
        .into_iter()
        .filter(|(tier, _)| *tier >= floor)
        .map(|(tier, count)| {
            let trained_umas = trained.get(&tier).copied().unwrap_or(0);
            let share = TierShare {
                count,
                percentage: percentage(count, total_trainers),
                trained_umas,
                trained_umas_percentage: percentage(trained_umas, total_trained_umas),
                character: character.cloned(),
            };
            (tier.to_string(), share)
        })
        .collect();

    TeamTierDistribution {
        total_trainers,
        total_trained_umas,
        tiers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Distance, StatLine};

    fn record(trainer: &str, character: &str, tier: Option<u32>) -> TrainingRecord {
        TrainingRecord {
            trainer_id: trainer.to_string(),
            trainer_name: None,
            trainer_fans: None,
            character_id: character.to_string(),
            team_tier: tier,
            distance: Some(Distance::Mile),
            running_style: None,
            stats: StatLine::default(),
            skills: Vec::new(),
            support_cards: Vec::new(),
        }
    }

    #[test]
    fn test_character_distribution_keyed_by_name() {
        let mut t = LookupTables::new();
        t.insert_character("100101", "Special Week");
        t.insert_color("100101", "#EE6DCB");
        let records = [
            record("a", "100201", None),
            record("a", "100101", None),
            record("b", "100101", None),
            record("c", "100301", None),
        ];
        let refs: Vec<&TrainingRecord> = records.iter().collect();

        let dist = character_distribution(&refs, &t, 2);
        let keys: Vec<_> = dist.keys().map(String::as_str).collect();
        assert_eq!(keys, ["Special Week", "Character_100201"]);
        assert_eq!(dist["Special Week"].count, 2);
        assert_eq!(dist["Special Week"].percentage, 50.0);
        assert_eq!(dist["Special Week"].character_color.as_deref(), Some("#EE6DCB"));
        assert_eq!(dist["Character_100201"].character_color, None);
    }

    #[test]
    fn test_team_tier_uses_first_non_empty_tier() {
        let records = [
            record("a", "1", None),
            record("a", "1", Some(6)),
            record("a", "1", Some(5)),
            record("b", "1", Some(5)),
            record("c", "1", None),
        ];
        let refs: Vec<&TrainingRecord> = records.iter().collect();

        let dist = team_tier_distribution(&refs, 0, None);
        assert_eq!(dist.total_trainers, 3);
        assert_eq!(dist.total_trained_umas, 5);
        assert_eq!(dist.tiers["6"].count, 1);
        assert_eq!(dist.tiers["6"].trained_umas, 1);
        assert_eq!(dist.tiers["5"].count, 1);
        assert_eq!(dist.tiers["5"].trained_umas, 2);
        assert_eq!(dist.tiers["5"].trained_umas_percentage, 40.0);
        assert_eq!(dist.tiers["6"].percentage, 33.33);

        let json = serde_json::to_value(&dist).unwrap();
        assert_eq!(json["total_trainers"], 3);
        assert!(json["6"].get("character_id").is_none());
    }

    #[test]
    fn test_team_tier_floor_and_character_tag() {
        let records = [record("a", "1", Some(6)), record("b", "1", Some(3))];
        let refs: Vec<&TrainingRecord> = records.iter().collect();
        let tag = CharacterTag {
            character_id: "1".into(),
            character_color: None,
        };

        let dist = team_tier_distribution(&refs, 6, Some(&tag));
        assert_eq!(dist.tiers.len(), 1);
        assert_eq!(dist.total_trainers, 2);
        let json = serde_json::to_value(&dist).unwrap();
        assert_eq!(json["6"]["character_id"], "1");
        assert!(json["6"]["character_color"].is_null());
    }

    #[test]
    fn test_category_distribution() {
        let mut records = vec![record("a", "1", None), record("b", "1", None)];
        records[1].distance = Some(Distance::Long);
        records.push(record("c", "1", None));
        records[2].distance = None;
        let refs: Vec<&TrainingRecord> = records.iter().collect();
        let tag = CharacterTag {
            character_id: "1".into(),
            character_color: Some("#fff".into()),
        };

        let dist = category_distribution(&refs, &tag, |r| r.distance.map(|d| d.to_string()));
        assert_eq!(dist.total_entries, 3);
        assert_eq!(dist.entries["Mile"].percentage, 33.33);
        let json = serde_json::to_value(&dist).unwrap();
        assert_eq!(json["Long"]["character_color"], "#fff");
        assert_eq!(json["total_entries"], 3);
    }
}
