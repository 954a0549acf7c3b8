//! Integer cents and the two rounding rules the tax calculator needs.
//!
//! Every amount in OrderDesk (prices, line totals, tax, payments, client
//! debit) is a [`Money`]: a count of cents in an `i64`. Tax is computed
//! from basis points in `i128` and rounded once, half away from zero:
//!
//! ```text
//!   additive   tax  = round(gross * bps / 10_000)
//!              total = gross + tax
//!
//!   inclusive  base = round(gross * 10_000 / (10_000 + bps))
//!              tax  = gross - base          (base + tax == gross, always)
//! ```
//!
//! ```rust
//! use orderdesk_core::money::Money;
//!
//! let line = Money::from_cents(10_000).checked_times(2);
//! assert_eq!(line.map(|m| m.to_string()), Some("200.00".to_string()));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use ts_rs::TS;

use crate::tax::TaxRate;

const BPS_PER_UNIT: i128 = 10_000;

/// An amount in cents. Serialized as a bare integer: `{"total": 23600}`.
///
/// Signed so intermediate differences cannot wrap; negative amounts never
/// reach storage because validation rejects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// `self - other`, never below zero. Pending balances and client debit
    /// use this when a payment lands.
    #[inline]
    pub fn saturating_sub_floor(self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0).max(0))
    }

    /// `None` when the sum leaves the `i64` range.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Tax charged on top of this amount.
    ///
    /// ```rust
    /// use orderdesk_core::money::Money;
    /// use orderdesk_core::tax::TaxRate;
    ///
    /// let tax = Money::from_cents(20_000).tax_on_top(TaxRate::from_bps(1_800));
    /// assert_eq!(tax.cents(), 3_600);
    /// ```
    pub fn tax_on_top(&self, rate: TaxRate) -> Money {
        let scaled = i128::from(self.0) * i128::from(rate.bps());
        Money(div_round(scaled, BPS_PER_UNIT) as i64)
    }

    /// Splits a tax-inclusive amount into `(base, tax)`.
    ///
    /// ```rust
    /// use orderdesk_core::money::Money;
    /// use orderdesk_core::tax::TaxRate;
    ///
    /// let (base, tax) = Money::from_cents(20_000).extract_included_tax(TaxRate::from_bps(1_800));
    /// assert_eq!((base.cents(), tax.cents()), (16_949, 3_051));
    /// ```
    pub fn extract_included_tax(&self, rate: TaxRate) -> (Money, Money) {
        let scaled = i128::from(self.0) * BPS_PER_UNIT;
        let divisor = BPS_PER_UNIT + i128::from(rate.bps());
        let base = Money(div_round(scaled, divisor) as i64);
        (base, *self - base)
    }

    /// Line total for `quantity` units at this unit price, `None` on
    /// overflow.
    #[inline]
    pub fn checked_times(&self, quantity: i64) -> Option<Money> {
        self.0.checked_mul(quantity).map(Money)
    }
}

/// Division rounding halves away from zero.
pub(crate) fn div_round(numerator: i128, divisor: i128) -> i128 {
    let half = divisor / 2;
    if numerator < 0 {
        (numerator - half) / divisor
    } else {
        (numerator + half) / divisor
    }
}

/// `1234.50`, `-5.50`. No currency symbol; documents add the one from
/// company settings.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        if self.0 < 0 {
            f.write_str("-")?;
        }
        write!(f, "{}.{:02}", abs / 100, abs % 100)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}
