//! # Combination Analyzer
//!
//! Reduces each run's equipped cards to a canonical type signature such as
//! `3xspeed_2xwiz_1xfriend` and ranks signatures by how many runs share them.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use super::{percentage, resolve_card};
use crate::lookup::LookupTables;

/// Per-type counts of one run, in canonical order: count descending, then
/// type name ascending.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CombinationSignature {
    parts: Vec<(String, usize)>,
}

impl CombinationSignature {
    pub fn from_counts<I>(counts: I) -> Self
    where
        I: IntoIterator<Item = (String, usize)>,
    {
        let mut parts: Vec<(String, usize)> = counts.into_iter().filter(|(_, n)| *n > 0).collect();
        parts.sort_by(|(a_type, a_n), (b_type, b_n)| b_n.cmp(a_n).then_with(|| a_type.cmp(b_type)));
        Self { parts }
    }

    /// Parse a key produced by [`key`](Self::key).
    pub fn parse(key: &str) -> Option<Self> {
        if key.is_empty() {
            return None;
        }
        let mut parts = Vec::new();
        for segment in key.split('_') {
            let (count, type_name) = segment.split_once('x')?;
            let count = count.parse::<usize>().ok()?;
            if type_name.is_empty() {
                return None;
            }
            parts.push((type_name.to_string(), count));
        }
        Some(Self { parts })
    }

    pub fn key(&self) -> String {
        self.to_string()
    }

    pub fn composition(&self) -> IndexMap<String, usize> {
        self.parts.iter().cloned().collect()
    }

    pub fn total_items(&self) -> usize {
        self.parts.iter().map(|(_, n)| n).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl fmt::Display for CombinationSignature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, (type_name, count)) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str("_")?;
            }
            write!(f, "{count}x{type_name}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Combination {
    pub count: usize,
    pub percentage: f64,
    pub composition: IndexMap<String, usize>,
}

/// Signature of one run, or `None` when no card resolves to a known type.
pub fn run_signature(cards: &[String], lookups: &LookupTables) -> Option<CombinationSignature> {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for encoded in cards {
        if let Some(card) = resolve_card(encoded, lookups) {
            *counts.entry(card.card_type).or_insert(0) += 1;
        }
    }
    let signature = CombinationSignature::from_counts(counts);
    (!signature.is_empty()).then_some(signature)
}

/// Rank the `top_n` most frequent signatures across `runs`.
///
/// Percentages are relative to the runs with at least one resolved card.
/// Equal counts keep the order in which each signature was first seen.
pub fn combinations(
    runs: &[&[String]],
    lookups: &LookupTables,
    top_n: usize,
) -> IndexMap<String, Combination> {
    let mut counter: IndexMap<String, (usize, CombinationSignature)> = IndexMap::new();
    let mut eligible = 0usize;

    for cards in runs {
        let Some(signature) = run_signature(cards, lookups) else {
            continue;
        };
        eligible += 1;
        counter
            .entry(signature.key())
            .or_insert_with(|| (0, signature))
            .0 += 1;
    }

    let mut ranked: Vec<_> = counter.into_iter().collect();
    ranked.sort_by(|(_, (a, _)), (_, (b, _))| b.cmp(a));

    ranked
        .into_iter()
        .take(top_n)
        .map(|(key, (count, signature))| {
            let combination = Combination {
                count,
                percentage: percentage(count, eligible),
                composition: signature.composition(),
            };
            (key, combination)
        })
        .collect()
}
