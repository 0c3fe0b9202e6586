//! Blood-unit inventory.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blood::{BloodGroup, StockLevel};

/// Not enough units of a blood group to cover a withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[error("only {available} units available for {blood_group}, {requested} requested")]
pub struct InsufficientStock {
    /// The blood group that ran short.
    pub blood_group: BloodGroup,
    /// Units on hand.
    pub available: u32,
    /// Units asked for.
    pub requested: u32,
}

/// Adding units would push a group past the largest count it can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[error("cannot add {added} units to {blood_group}: {available} already on hand")]
pub struct StockOverflow {
    /// The blood group at capacity.
    pub blood_group: BloodGroup,
    /// Units on hand.
    pub available: u32,
    /// Units that could not be added.
    pub added: u64,
}

/// Why an inventory adjustment was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AdjustError {
    /// The withdrawal exceeds the units on hand.
    #[error(transparent)]
    Insufficient(#[from] InsufficientStock),
    /// The addition exceeds the group's capacity.
    #[error(transparent)]
    Overflow(#[from] StockOverflow),
}

/// One row of an inventory listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockEntry {
    /// The blood group.
    pub blood_group: BloodGroup,
    /// Units on hand.
    pub units: u32,
    /// Classification of `units`.
    pub level: StockLevel,
}

/// Unit counts for all eight blood groups.
///
/// Every group is always present. Counts never go negative; withdrawals that
/// would overdraw a group fail without touching it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<BloodGroup, u32>",
    into = "BTreeMap<BloodGroup, u32>"
)]
pub struct InventoryTable {
    units: BTreeMap<BloodGroup, u32>,
}

impl Default for InventoryTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<BTreeMap<BloodGroup, u32>> for InventoryTable {
    fn from(mut units: BTreeMap<BloodGroup, u32>) -> Self {
        for group in BloodGroup::ALL {
            units.entry(group).or_insert(0);
        }
        Self { units }
    }
}

impl From<InventoryTable> for BTreeMap<BloodGroup, u32> {
    fn from(table: InventoryTable) -> Self {
        table.units
    }
}

impl InventoryTable {
    /// Inventory with zero units of every group.
    #[must_use]
    pub fn empty() -> Self {
        Self::from(BTreeMap::new())
    }

    /// Inventory with the given counts; unlisted groups hold zero.
    #[must_use]
    pub fn from_counts(counts: impl IntoIterator<Item = (BloodGroup, u32)>) -> Self {
        Self::from(counts.into_iter().collect::<BTreeMap<_, _>>())
    }

    /// Inventory with an independent draw from `range` for every group.
    ///
    /// A reversed range is treated as its ascending equivalent.
    pub fn seeded<R: Rng>(rng: &mut R, range: RangeInclusive<u32>) -> Self {
        let (lo, hi) = (*range.start(), *range.end());
        let (lo, hi) = (lo.min(hi), lo.max(hi));
        Self::from_counts(BloodGroup::ALL.map(|group| (group, rng.gen_range(lo..=hi))))
    }

    /// Units on hand for `group`.
    #[must_use]
    pub fn get(&self, group: BloodGroup) -> u32 {
        self.units.get(&group).copied().unwrap_or(0)
    }

    /// Add (`delta > 0`) or withdraw (`delta < 0`) units of `group`.
    ///
    /// # Errors
    ///
    /// Leaves the table unchanged and returns [`AdjustError::Insufficient`]
    /// if the withdrawal exceeds the units on hand, or
    /// [`AdjustError::Overflow`] if the result would not fit in a `u32`.
    pub fn adjust(&mut self, group: BloodGroup, delta: i64) -> Result<(), AdjustError> {
        let available = self.get(group);
        match i64::from(available)
            .checked_add(delta)
            .and_then(|updated| u32::try_from(updated).ok())
        {
            Some(updated) => {
                self.units.insert(group, updated);
                Ok(())
            }
            None if delta < 0 => Err(InsufficientStock {
                blood_group: group,
                available,
                requested: u32::try_from(delta.unsigned_abs()).unwrap_or(u32::MAX),
            }
            .into()),
            None => Err(StockOverflow {
                blood_group: group,
                available,
                added: delta.unsigned_abs(),
            }
            .into()),
        }
    }

    /// Check that `requested` units of `group` can be withdrawn.
    ///
    /// # Errors
    ///
    /// Returns [`InsufficientStock`] if fewer units are on hand.
    pub fn ensure_available(&self, group: BloodGroup, requested: u32) -> Result<(), InsufficientStock> {
        let available = self.get(group);
        if available < requested {
            return Err(InsufficientStock {
                blood_group: group,
                available,
                requested,
            });
        }
        Ok(())
    }

    /// Classify a unit count. Shorthand for [`StockLevel::classify`].
    #[must_use]
    pub fn classify(units: u32) -> StockLevel {
        StockLevel::classify(units)
    }

    /// Stock level of `group`.
    #[must_use]
    pub fn level(&self, group: BloodGroup) -> StockLevel {
        StockLevel::classify(self.get(group))
    }

    /// Total units across all groups.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.units.values().map(|units| u64::from(*units)).sum()
    }

    /// Every group in display order with its count and level.
    pub fn levels(&self) -> impl Iterator<Item = StockEntry> + '_ {
        self.units.iter().map(|(&blood_group, &units)| StockEntry {
            blood_group,
            units,
            level: StockLevel::classify(units),
        })
    }
}
