//! # Analysis Module
//!
//! Pure analyzers over slices of normalized records. None of them touch the
//! filesystem; each call owns its accumulators.
//!
//! ## Submodules
//!
//! - `distribution` - scalar summaries and fixed-range histograms
//! - `combination` - support-card type combinations per run
//! - `type_usage` - per-type usage and top cards
//! - `item_levels` - occurrence counts by (entity, level)
//! - `shares` - category distributions with percentages

pub mod combination;
pub mod distribution;
pub mod item_levels;
pub mod shares;
pub mod type_usage;

pub use combination::{combinations, Combination, CombinationSignature};
pub use distribution::{distribution, histogram, simple_summary, Distribution, StatSummary};
pub use item_levels::{item_levels, ItemLevels};
pub use shares::{
    category_distribution, character_distribution, team_tier_distribution, CategoryDistribution,
    CharacterTag, Share, TeamTierDistribution, TierShare,
};
pub use type_usage::{type_usage, CardUsage, TypeUsage};

use crate::codec;
use crate::lookup::{LookupTables, UNKNOWN_TYPE};

/// Round to two decimals, ties to even (`0.125` → `0.12`).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// `part / whole × 100` rounded to two decimals; 0 when `whole` is 0.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 * 100.0 / whole as f64)
}

/// A support card resolved to its entity key and lowercase type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TypedCard {
    pub id: String,
    pub card_type: String,
}

/// Decode and type one equipped card. Undecodable entries, entity id 0 and
/// cards of unknown type resolve to `None`.
pub(crate) fn resolve_card(encoded: &str, lookups: &LookupTables) -> Option<TypedCard> {
    let decoded = codec::decode(encoded)?;
    if decoded.entity_id == 0 {
        return None;
    }
    let id = decoded.entity_key();
    let card_type = lookups.card_type(&id);
    if card_type == UNKNOWN_TYPE {
        return None;
    }
    Some(TypedCard {
        card_type: card_type.to_lowercase(),
        id,
    })
}
