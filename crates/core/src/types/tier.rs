//! Bulk-discount tier schedule.
//!
//! A schedule maps the total quantity of items in a cart to the percentage
//! discount a merchant wants to grant. Schedules are small (a handful of
//! rungs), configured once at startup, and consulted on every cart webhook.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::discount::DiscountValue;

/// Errors from building or parsing a tier schedule.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TierScheduleError {
    /// The schedule string or tier list was empty.
    #[error("tier schedule is empty")]
    Empty,
    /// A `min_qty:percent` pair could not be parsed.
    #[error("invalid tier entry '{0}', expected 'min_qty:percent'")]
    InvalidEntry(String),
    /// A percentage was outside (0, 100].
    #[error("invalid percentage '{0}', must be greater than 0 and at most 100")]
    InvalidPercentage(String),
    /// Two tiers share the same quantity threshold.
    #[error("duplicate tier threshold {0}")]
    DuplicateThreshold(u32),
}

/// One rung of a bulk-discount schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    /// Minimum total cart quantity for this tier to apply.
    pub min_quantity: u32,
    /// Percentage granted, as a fraction of 1 (e.g., `0.10` for 10%).
    #[serde(with = "rust_decimal::serde::str")]
    pub percentage: Decimal,
}

/// An ordered bulk-discount schedule.
///
/// Tiers are kept sorted ascending by `min_quantity`; lookups return the
/// highest tier whose threshold the cart meets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSchedule {
    tiers: Vec<Tier>,
}

impl TierSchedule {
    /// Build a schedule from a list of tiers.
    ///
    /// Tiers are sorted by threshold; the percentages are whole-percent
    /// figures (e.g., `10` for 10%) and converted to fractions internally.
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty, a percentage is outside
    /// (0, 100], or two tiers share a threshold.
    pub fn new(entries: &[(u32, Decimal)]) -> Result<Self, TierScheduleError> {
        if entries.is_empty() {
            return Err(TierScheduleError::Empty);
        }

        let mut tiers = Vec::with_capacity(entries.len());
        for &(min_quantity, percent) in entries {
            if percent <= Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
                return Err(TierScheduleError::InvalidPercentage(percent.to_string()));
            }
            tiers.push(Tier {
                min_quantity,
                percentage: percent / Decimal::ONE_HUNDRED,
            });
        }

        tiers.sort_by_key(|t| t.min_quantity);

        for pair in tiers.windows(2) {
            if let [a, b] = pair
                && a.min_quantity == b.min_quantity
            {
                return Err(TierScheduleError::DuplicateThreshold(a.min_quantity));
            }
        }

        Ok(Self { tiers })
    }

    /// The tiers, sorted ascending by threshold.
    #[must_use]
    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// The discount for a cart holding `quantity` items in total.
    ///
    /// Returns the highest tier the quantity meets, or `None` when the cart
    /// is below every threshold (no discount).
    #[must_use]
    pub fn value_for_quantity(&self, quantity: u32) -> Option<DiscountValue> {
        self.tiers
            .iter()
            .rev()
            .find(|t| quantity >= t.min_quantity && quantity > 0)
            .map(|t| DiscountValue::Percentage {
                percentage: t.percentage,
            })
    }
}

impl Default for TierSchedule {
    /// The schedule shipped by the original campaign: 3+ items get 5%,
    /// 10+ get 10%, 25+ get 15%.
    fn default() -> Self {
        Self {
            tiers: vec![
                Tier {
                    min_quantity: 3,
                    percentage: Decimal::new(5, 2),
                },
                Tier {
                    min_quantity: 10,
                    percentage: Decimal::new(10, 2),
                },
                Tier {
                    min_quantity: 25,
                    percentage: Decimal::new(15, 2),
                },
            ],
        }
    }
}

impl FromStr for TierSchedule {
    type Err = TierScheduleError;

    /// Parse a schedule from a `min_qty:percent` list, e.g. `"3:5,10:10,25:15"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(TierScheduleError::Empty);
        }

        let mut entries = Vec::new();
        for entry in s.split(',') {
            let entry = entry.trim();
            let (qty, percent) = entry
                .split_once(':')
                .ok_or_else(|| TierScheduleError::InvalidEntry(entry.to_string()))?;

            let min_quantity: u32 = qty
                .trim()
                .parse()
                .map_err(|_| TierScheduleError::InvalidEntry(entry.to_string()))?;

            let percent: Decimal = percent
                .trim()
                .parse()
                .map_err(|_| TierScheduleError::InvalidEntry(entry.to_string()))?;

            entries.push((min_quantity, percent));
        }

        Self::new(&entries)
    }
}
