//! Fixed-point currency amounts.
//!
//! Every price, subtotal and total in the system is a [`Money`]: a
//! `rust_decimal::Decimal` held at exactly two fractional digits and bounded by
//! the `NUMERIC(10,2)` columns it is stored in. Floating point never touches
//! currency.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::ValueObject;

/// Fractional digits carried by every currency amount.
pub const CURRENCY_SCALE: u32 = 2;

/// Exclusive upper bound of a `NUMERIC(10,2)` column.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MoneyError {
    #[error("must be greater than or equal to 0")]
    Negative,

    #[error("must have no more than {CURRENCY_SCALE} decimal places")]
    TooPrecise,

    #[error("must be less than {MAX_AMOUNT}")]
    TooLarge,
}

/// A non-negative currency amount at two decimal places.
///
/// Serializes as a string (`"29.99"`) so clients never see a binary float.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(Decimal::from_parts(0, 0, 0, false, CURRENCY_SCALE));

    /// Validate and normalize an amount to currency scale.
    ///
    /// `20`, `20.0` and `20.00` all become `20.00`; `9.999` is rejected rather
    /// than rounded.
    pub fn try_new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount < Decimal::ZERO {
            return Err(MoneyError::Negative);
        }
        if amount.normalize().scale() > CURRENCY_SCALE {
            return Err(MoneyError::TooPrecise);
        }
        if amount >= MAX_AMOUNT {
            return Err(MoneyError::TooLarge);
        }

        let mut scaled = amount;
        scaled.rescale(CURRENCY_SCALE);
        Ok(Self(scaled))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Multiply by an integer quantity.
    ///
    /// The result stays at currency scale because the multiplier is integral.
    pub fn times(self, quantity: u32) -> Result<Money, MoneyError> {
        let product = self
            .0
            .checked_mul(Decimal::from(quantity))
            .ok_or(MoneyError::TooLarge)?;
        Self::try_new(product)
    }

    pub fn checked_add(self, other: Money) -> Result<Money, MoneyError> {
        let sum = self.0.checked_add(other.0).ok_or(MoneyError::TooLarge)?;
        Self::try_new(sum)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}
