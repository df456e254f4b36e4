use std::{fmt::Display, iter::Sum, ops::Add};

use rust_decimal::{prelude::ToPrimitive, Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// The number of subunits in one display unit of the loyalty currency.
pub const SUBUNITS_PER_UNIT: i64 = 100;
const DECIMAL_PLACES: u32 = 2;

//--------------------------------------      Subunits       ---------------------------------------------------------
/// An amount of loyalty currency, in integral subunits (1/100 of a display unit).
///
/// All storage, arithmetic and comparisons happen on this type. Decimal values only exist at the JSON boundary, and
/// are converted with [`Subunits::from_decimal`] and [`Subunits::to_decimal`].
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Subunits(i64);

op!(binary Subunits, Add, add);
op!(binary Subunits, Sub, sub);
op!(inplace Subunits, SubAssign, sub_assign);
op!(inplace Subunits, AddAssign, add_assign);
op!(unary Subunits, Neg, neg);

impl Sum for Subunits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented in subunits: {0}")]
pub struct SubunitConversionError(String);

impl From<i64> for Subunits {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<Decimal> for Subunits {
    type Error = SubunitConversionError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl Display for Subunits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Subunits {
    pub fn zero() -> Self {
        Self(0)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Converts a display-currency amount into subunits, rounding half away from zero at two decimal places.
    pub fn from_decimal(amount: Decimal) -> Result<Self, SubunitConversionError> {
        let rounded = amount.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero);
        rounded
            .checked_mul(Decimal::from(SUBUNITS_PER_UNIT))
            .and_then(|scaled| scaled.to_i64())
            .map(Self)
            .ok_or_else(|| SubunitConversionError(format!("{amount} is out of range")))
    }

    /// The exact display-currency value of this amount.
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, DECIMAL_PLACES)
    }
}

pub fn to_subunits(amount: Decimal) -> Result<Subunits, SubunitConversionError> {
    Subunits::from_decimal(amount)
}

pub fn to_decimal(amount: Subunits) -> Decimal {
    amount.to_decimal()
}
