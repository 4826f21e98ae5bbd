//! Slot popularity and heat levels for the admin dashboard.

use crate::types::{ProductId, Slot, SlotKind, SlotUsage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ordinal popularity bucket
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeatLevel {
    /// Score below 25
    Cold,
    /// Score 25–49
    Warm,
    /// Score 50–74
    Hot,
    /// Score 75 and above
    VeryHot,
}

impl HeatLevel {
    /// Maps a 0–100 popularity score to its bucket
    ///
    /// Monotone: a higher score never yields a colder level.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        match score {
            0..25 => Self::Cold,
            25..50 => Self::Warm,
            50..75 => Self::Hot,
            _ => Self::VeryHot,
        }
    }
}

/// `usage × 100 / max`, 0 when `max` is 0
#[must_use]
pub fn popularity(usage: u64, max: u64) -> u8 {
    if max == 0 {
        return 0;
    }
    let score = u128::from(usage.min(max)) * 100 / u128::from(max);
    u8::try_from(score).unwrap_or(100)
}

/// Heat for one slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotHeat {
    /// The slot
    pub slot: Slot,
    /// Product last dispensed from it
    pub product_id: Option<ProductId>,
    /// Dispense events
    pub usage_count: u64,
    /// Last dispense
    pub last_used_at: Option<DateTime<Utc>>,
    /// 0–100 relative to the busiest slot
    pub popularity: u8,
    /// Bucketed popularity
    pub level: HeatLevel,
}

/// Every slot's heat, zero-filled for slots never used
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heatmap {
    /// Spray slots 1–5
    pub spray_slots: Vec<SlotHeat>,
    /// Bottle slots 1–15
    pub bottle_slots: Vec<SlotHeat>,
}

impl Heatmap {
    /// Builds the heatmap from raw usage records
    ///
    /// Popularity is relative to the busiest slot across both kinds.
    #[must_use]
    pub fn build(records: &[SlotUsage]) -> Self {
        let by_slot: HashMap<Slot, &SlotUsage> = records.iter().map(|r| (r.slot, r)).collect();
        let max = records.iter().map(|r| r.usage_count).max().unwrap_or(0);

        let heat_for = |kind: SlotKind| -> Vec<SlotHeat> {
            Slot::all(kind)
                .map(|slot| {
                    let usage = by_slot.get(&slot).map_or_else(|| SlotUsage::unused(slot), |r| **r);
                    let score = popularity(usage.usage_count, max);
                    SlotHeat {
                        slot,
                        product_id: usage.product_id,
                        usage_count: usage.usage_count,
                        last_used_at: usage.last_used_at,
                        popularity: score,
                        level: HeatLevel::from_score(score),
                    }
                })
                .collect()
        };

        Self {
            spray_slots: heat_for(SlotKind::Spray),
            bottle_slots: heat_for(SlotKind::Bottle),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_thresholds() {
        assert_eq!(HeatLevel::from_score(0), HeatLevel::Cold);
        assert_eq!(HeatLevel::from_score(24), HeatLevel::Cold);
        assert_eq!(HeatLevel::from_score(25), HeatLevel::Warm);
        assert_eq!(HeatLevel::from_score(50), HeatLevel::Hot);
        assert_eq!(HeatLevel::from_score(74), HeatLevel::Hot);
        assert_eq!(HeatLevel::from_score(75), HeatLevel::VeryHot);
        assert_eq!(HeatLevel::from_score(100), HeatLevel::VeryHot);
    }

    #[test]
    fn test_heat_level_serializes_kebab_case() {
        assert_eq!(serde_json::to_string(&HeatLevel::VeryHot).unwrap(), "\"very-hot\"");
    }

    #[test]
    fn test_popularity_edges() {
        assert_eq!(popularity(0, 0), 0);
        assert_eq!(popularity(5, 10), 50);
        assert_eq!(popularity(10, 10), 100);
        assert_eq!(popularity(u64::MAX, u64::MAX), 100);
    }

    #[test]
    fn test_heatmap_is_zero_filled() {
        let heatmap = Heatmap::build(&[]);
        assert_eq!(heatmap.spray_slots.len(), 5);
        assert_eq!(heatmap.bottle_slots.len(), 15);
        assert!(heatmap.bottle_slots.iter().all(|h| h.level == HeatLevel::Cold && h.usage_count == 0));
    }

    #[test]
    fn test_heatmap_relative_to_busiest_slot() {
        let now = Utc::now();
        let mut busy = SlotUsage::unused(Slot::bottle(2).unwrap());
        let mut quiet = SlotUsage::unused(Slot::spray(1).unwrap());
        for _ in 0..4 {
            busy.record(ProductId::new(1), now);
        }
        quiet.record(ProductId::new(2), now);

        let heatmap = Heatmap::build(&[busy, quiet]);

        assert_eq!(heatmap.bottle_slots[1].popularity, 100);
        assert_eq!(heatmap.bottle_slots[1].level, HeatLevel::VeryHot);
        assert_eq!(heatmap.spray_slots[0].popularity, 25);
        assert_eq!(heatmap.spray_slots[0].level, HeatLevel::Warm);
        assert_eq!(heatmap.spray_slots[0].product_id, Some(ProductId::new(2)));
    }

    proptest! {
        #[test]
        fn prop_heat_level_is_monotone(a in 0_u8..=100, b in 0_u8..=100) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(HeatLevel::from_score(lo) <= HeatLevel::from_score(hi));
        }
    }
}
