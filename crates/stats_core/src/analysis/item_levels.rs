//! Occurrence counts per (entity, level) for skills and support cards.

use indexmap::IndexMap;
use serde::Serialize;

use crate::codec;
use crate::lookup::{ItemKind, LookupTables};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemLevels {
    pub total: usize,
    pub by_level: IndexMap<String, usize>,
    pub avg_level: f64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub item_type: Option<String>,
    pub id: String,
}

/// Count every decodable item by entity and level, then keep the `top_n`
/// entities by total occurrences (ties in first-seen order).
///
/// Skills are enriched with an icon, support cards with their type.
pub fn item_levels<'a, I>(
    items: I,
    kind: ItemKind,
    lookups: &LookupTables,
    top_n: usize,
) -> IndexMap<String, ItemLevels>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut counts: IndexMap<String, IndexMap<u8, usize>> = IndexMap::new();

    for encoded in items {
        let Some(decoded) = codec::decode(encoded) else {
            continue;
        };
        *counts
            .entry(decoded.entity_key())
            .or_default()
            .entry(decoded.level)
            .or_insert(0) += 1;
    }

    let mut ranked: Vec<(String, usize, IndexMap<u8, usize>)> = counts
        .into_iter()
        .map(|(id, levels)| {
            let total = levels.values().sum();
            (id, total, levels)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));

    ranked
        .into_iter()
        .take(top_n)
        .map(|(id, total, levels)| {
            let weighted: usize = levels.iter().map(|(lvl, n)| *lvl as usize * n).sum();
            let entry = ItemLevels {
                total,
                avg_level: weighted as f64 / total as f64,
                by_level: levels
                    .into_iter()
                    .map(|(lvl, n)| (lvl.to_string(), n))
                    .collect(),
                name: lookups.name_of(kind, &id),
                icon: (kind == ItemKind::Skill).then(|| lookups.skill_icon(&id)),
                item_type: (kind == ItemKind::SupportCard)
                    .then(|| lookups.type_of(kind, &id).to_string()),
                id: id.clone(),
            };
            (id, entry)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_levels_and_average() {
        let mut t = LookupTables::new();
        t.insert_card("30020", "Kitasan Black", Some("speed"));
        let cards = items(&["300204", "300204", "300203", "300211", "bad"]);

        let result = item_levels(&cards, ItemKind::SupportCard, &t, 50);
        assert_eq!(result.keys().collect::<Vec<_>>(), ["30020", "30021"]);

        let kita = &result["30020"];
        assert_eq!(kita.total, 3);
        assert_eq!(kita.by_level["4"], 2);
        assert_eq!(kita.by_level["3"], 1);
        assert_eq!(kita.avg_level, 11.0 / 3.0);
        assert_eq!(kita.name, "Kitasan Black");
        assert_eq!(kita.item_type.as_deref(), Some("Speed"));
        assert_eq!(kita.icon, None);

        assert_eq!(result["30021"].name, "Card_30021");
        assert_eq!(result["30021"].item_type.as_deref(), Some("Unknown"));
    }

    #[test]
    fn test_skill_metadata_serialization() {
        let mut t = LookupTables::new();
        t.insert_skill("20010", "Corner Adept", Some("icon.png".into()));
        t.insert_skill("10010", "Right-Handed", None);
        let skills = items(&["200101", "900101"]);

        let result = item_levels(&skills, ItemKind::Skill, &t, 50);
        let json = serde_json::to_value(&result["20010"]).unwrap();
        assert_eq!(json["icon"], "icon.png");
        assert!(json.get("type").is_none());
        assert_eq!(json["avg_level"], 1.0);
        assert_eq!(result["90010"].name, "Right-Handed (Inherited)");
    }

    #[test]
    fn test_single_digit_items_count_under_entity_zero() {
        let t = LookupTables::new();
        let raw = items(&["7", "7"]);
        let result = item_levels(&raw, ItemKind::Other, &t, 50);
        assert_eq!(result["0"].total, 2);
        assert_eq!(result["0"].avg_level, 7.0);
        let json = serde_json::to_value(&result["0"]).unwrap();
        assert!(json.get("type").is_none() && json.get("icon").is_none());
    }

    #[test]
    fn test_avg_level_is_unrounded() {
        let t = LookupTables::new();
        let raw = items(&["101", "102", "102"]);
        let result = item_levels(&raw, ItemKind::Other, &t, 50);
        assert_eq!(result["10"].avg_level, 5.0 / 3.0);
    }

    #[test]
    fn test_top_n_by_total() {
        let t = LookupTables::new();
        let raw = items(&["101", "201", "201", "301", "301", "301"]);
        let result = item_levels(&raw, ItemKind::Skill, &t, 2);
        assert_eq!(result.keys().collect::<Vec<_>>(), ["30", "20"]);
    }
}
