//! Discount value domain types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::Money;

/// The value of a discount: a percentage off or a fixed amount off.
///
/// The two forms are mutually exclusive by construction; the Admin API
/// rejects inputs that set both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountValue {
    /// Percentage off, as a fraction of 1 (e.g., `0.10` for 10%).
    Percentage {
        #[serde(with = "rust_decimal::serde::str")]
        percentage: Decimal,
    },
    /// Fixed amount off the cart total.
    FixedAmount { amount: Money },
}

impl DiscountValue {
    /// Build a percentage value from a whole-percent figure (e.g., `10` -> 10%).
    #[must_use]
    pub fn from_percent(percent: Decimal) -> Self {
        Self::Percentage {
            percentage: percent / Decimal::ONE_HUNDRED,
        }
    }
}

impl std::fmt::Display for DiscountValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Percentage { percentage } => {
                write!(f, "{}%", (*percentage * Decimal::ONE_HUNDRED).normalize())
            }
            Self::FixedAmount { amount } => write!(f, "{amount} off"),
        }
    }
}
