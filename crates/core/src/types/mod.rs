//! Core types for Cartwheel.
//!
//! This module provides type-safe representations of the discount domain.

pub mod discount;
pub mod money;
pub mod tier;

pub use discount::DiscountValue;
pub use money::Money;
pub use tier::{Tier, TierSchedule, TierScheduleError};
