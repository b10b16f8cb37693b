//! Prices

use std::{fmt, ops::Deref};

use serde::{Deserialize, Serialize};

/// Represents a price in minor currency units (cents, centavos, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price {
    value: u64,
}

impl Price {
    /// A zero price.
    pub const ZERO: Price = Price { value: 0 };

    /// Creates a new Price
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Price { value }
    }

    /// Returns the amount in minor units.
    #[must_use]
    pub const fn minor_units(self) -> u64 {
        self.value
    }

    /// Returns true if the price is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.value == 0
    }

    /// Multiplies the price by a quantity, saturating at `u64::MAX`.
    #[must_use]
    pub fn times(self, quantity: u32) -> Price {
        Price {
            value: self.value.saturating_mul(u64::from(quantity)),
        }
    }

    /// Adds two prices, saturating at `u64::MAX`.
    #[must_use]
    pub const fn saturating_add(self, other: Price) -> Price {
        Price {
            value: self.value.saturating_add(other.value),
        }
    }

    /// Subtracts `other`, stopping at zero.
    #[must_use]
    pub const fn saturating_sub(self, other: Price) -> Price {
        Price {
            value: self.value.saturating_sub(other.value),
        }
    }
}

impl Deref for Price {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl From<u64> for Price {
    fn from(value: u64) -> Self {
        Price::new(value)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl std::iter::Sum for Price {
    fn sum<I: Iterator<Item = Price>>(iter: I) -> Self {
        iter.fold(Price::ZERO, Price::saturating_add)
    }
}
