//! # Type-Usage Analyzer
//!
//! Per card type: how many equipped cards, how many decks (runs) use it, and
//! which cards of that type are equipped most.

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use serde::Serialize;

use super::{percentage, resolve_card, round2};
use crate::lookup::LookupTables;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardUsage {
    pub count: usize,
    pub name: String,
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeUsage {
    pub total_usage: usize,
    pub usage_percentage: f64,
    pub deck_usage: usize,
    pub deck_percentage: f64,
    pub avg_per_deck: f64,
    pub top_cards: IndexMap<String, CardUsage>,
}

/// Counters for one type. A new one is created for every type seen.
#[derive(Debug, Default)]
struct TypeAccumulator {
    total: usize,
    decks: usize,
    cards: IndexMap<String, usize>,
}

/// Aggregate card usage by type over `runs`.
///
/// # Arguments
///
/// * `runs` - equipped cards of each run, still encoded
/// * `lookups` - card names and types
/// * `top_n_per_type` - length of each type's `top_cards`
///
/// # Returns
///
/// Types ordered by `total_usage` descending. `usage_percentage` is relative
/// to all resolved cards, `deck_percentage` to runs with at least one
/// resolved card.
pub fn type_usage(
    runs: &[&[String]],
    lookups: &LookupTables,
    top_n_per_type: usize,
) -> IndexMap<String, TypeUsage> {
    let mut by_type: IndexMap<String, TypeAccumulator> = IndexMap::new();
    let mut total_items = 0usize;
    let mut total_decks = 0usize;

    for cards in runs {
        let mut types_in_deck: FxHashSet<String> = FxHashSet::default();

        for encoded in cards.iter() {
            let Some(card) = resolve_card(encoded, lookups) else {
                continue;
            };
            total_items += 1;
            let acc = by_type.entry(card.card_type.clone()).or_default();
            acc.total += 1;
            *acc.cards.entry(card.id).or_insert(0) += 1;
            types_in_deck.insert(card.card_type);
        }

        if types_in_deck.is_empty() {
            continue;
        }
        total_decks += 1;
        for card_type in &types_in_deck {
            if let Some(acc) = by_type.get_mut(card_type) {
                acc.decks += 1;
            }
        }
    }

    let mut ranked: Vec<(String, TypeAccumulator)> = by_type.into_iter().collect();
    ranked.sort_by(|(_, a), (_, b)| b.total.cmp(&a.total));

    ranked
        .into_iter()
        .map(|(card_type, acc)| {
            let usage = TypeUsage {
                total_usage: acc.total,
                usage_percentage: percentage(acc.total, total_items),
                deck_usage: acc.decks,
                deck_percentage: percentage(acc.decks, total_decks),
                avg_per_deck: if acc.decks > 0 {
                    round2(acc.total as f64 / acc.decks as f64)
                } else {
                    0.0
                },
                top_cards: top_cards(acc.cards, lookups, top_n_per_type),
            };
            (card_type, usage)
        })
        .collect()
}

fn top_cards(
    cards: IndexMap<String, usize>,
    lookups: &LookupTables,
    top_n: usize,
) -> IndexMap<String, CardUsage> {
    let mut ranked: Vec<(String, usize)> = cards.into_iter().collect();
    ranked.sort_by(|(_, a), (_, b)| b.cmp(a));
    ranked
        .into_iter()
        .take(top_n)
        .map(|(id, count)| {
            let usage = CardUsage {
                count,
                name: lookups.card_name(&id),
                id: id.clone(),
            };
            (id, usage)
        })
        .collect()
}
