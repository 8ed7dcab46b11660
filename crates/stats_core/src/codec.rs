//! # Composite-Id Codec
//!
//! Equipped support cards and learned skills are stored as a single decimal
//! number packing the entity id and a level: every digit but the last is the
//! entity id, the last digit is the level.
//!
//! ```
//! use stats_core::codec::{decode, CompositeId};
//!
//! assert_eq!(decode("300200"), Some(CompositeId { entity_id: 30020, level: 0 }));
//! assert_eq!(decode("7"), Some(CompositeId { entity_id: 0, level: 7 }));
//! assert_eq!(decode("abc"), None);
//! ```

use serde::{Deserialize, Serialize};

/// A decoded `(entity_id, level)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompositeId {
    pub entity_id: u64,
    pub level: u8,
}

impl CompositeId {
    /// Entity id as the string key used by lookup tables and reports.
    pub fn entity_key(&self) -> String {
        self.entity_id.to_string()
    }
}

/// Decode an encoded value.
///
/// Returns `None` for empty input, anything that is not made only of ASCII
/// digits, or an entity id that does not fit in `u64`. Callers skip those
/// entries.
pub fn decode(encoded: &str) -> Option<CompositeId> {
    if encoded.is_empty() || !encoded.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let (head, last) = encoded.split_at(encoded.len() - 1);
    let level = last.as_bytes()[0] - b'0';
    let entity_id = if head.is_empty() {
        0
    } else {
        head.parse::<u64>().ok()?
    };

    Some(CompositeId { entity_id, level })
}

/// Decode an already-numeric value. Total over `u64`.
pub fn decode_value(value: u64) -> CompositeId {
    CompositeId {
        entity_id: value / 10,
        level: (value % 10) as u8,
    }
}
