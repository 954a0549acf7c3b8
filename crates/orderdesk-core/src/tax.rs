//! # Tax & Total Calculator
//!
//! The single place where order totals are computed. Server handlers, the
//! offline mock store and the draft order all call [`calculate_totals`].
//!
//! ## The Two Pricing Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ADDITIVE (tax on top)              INCLUSIVE (tax already in price)    │
//! │  ─────────────────────              ─────────────────────────────────   │
//! │  Σ price×qty = 200.00               Σ price×qty = 200.00                │
//! │        │                                  │                             │
//! │        ▼ subtotal                         ▼ total                       │
//! │  tax = 200.00 × 18% = 36.00         subtotal = 200.00 / 1.18 = 169.49   │
//! │        │                                  │                             │
//! │        ▼                                  ▼                             │
//! │  total = 236.00                     tax = 200.00 − 169.49 = 30.51       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both modes round exactly once, so `total == subtotal + tax` to the cent.

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

/// Highest admissible rate: 100% in basis points.
pub const MAX_TAX_RATE_BPS: u32 = 10_000;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1800 bps = 18% (ITBIS)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    ///
    /// Unchecked; [`TaxRate::checked_bps`] is the validating variant.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from basis points, rejecting anything above 100%.
    pub fn checked_bps(bps: u32) -> CoreResult<Self> {
        if bps > MAX_TAX_RATE_BPS {
            return Err(CoreError::invalid_config(format!(
                "rate {bps} bps exceeds 100%"
            )));
        }
        Ok(TaxRate(bps))
    }

    /// Creates a tax rate from a percentage as typed into the settings form.
    ///
    /// ## Errors
    /// `InvalidConfig` for negative, non-finite or > 100 values.
    ///
    /// ## Example
    /// ```rust
    /// use orderdesk_core::tax::TaxRate;
    ///
    /// assert_eq!(TaxRate::from_percentage(18.0).unwrap().bps(), 1800);
    /// assert!(TaxRate::from_percentage(-1.0).is_err());
    /// ```
    pub fn from_percentage(pct: f64) -> CoreResult<Self> {
        if !pct.is_finite() {
            return Err(CoreError::invalid_config("rate must be a finite number"));
        }
        if pct < 0.0 {
            return Err(CoreError::invalid_config("rate cannot be negative"));
        }
        if pct > 100.0 {
            return Err(CoreError::invalid_config("rate cannot exceed 100%"));
        }
        Ok(TaxRate((pct * 100.0).round() as u32))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::from_bps(crate::DEFAULT_TAX_RATE_BPS)
    }
}

/// Renders as a percentage: `18%`, `8.25%`.
impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 100 == 0 {
            write!(f, "{}%", self.0 / 100)
        } else {
            write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
        }
    }
}

// =============================================================================
// Tax Mode
// =============================================================================

/// Whether catalog prices already contain tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TaxMode {
    /// Tax is computed on top of the price.
    #[serde(alias = "exclusive")]
    Additive,
    /// The price contains the tax; it is backed out of the total.
    Inclusive,
}

impl TaxMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxMode::Additive => "additive",
            TaxMode::Inclusive => "inclusive",
        }
    }
}

impl Default for TaxMode {
    fn default() -> Self {
        TaxMode::Additive
    }
}

impl fmt::Display for TaxMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Tax Configuration
// =============================================================================

/// Mode + rate: the company-wide setting that drives every document total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxConfig {
    pub mode: TaxMode,
    pub rate: TaxRate,
}

impl TaxConfig {
    /// Builds a configuration from a percentage rate.
    pub fn new(mode: TaxMode, percentage: f64) -> CoreResult<Self> {
        Ok(Self {
            mode,
            rate: TaxRate::from_percentage(percentage)?,
        })
    }

    /// Builds a configuration from basis points, as stored in the database.
    pub fn from_bps(mode: TaxMode, bps: u32) -> CoreResult<Self> {
        Ok(Self {
            mode,
            rate: TaxRate::checked_bps(bps)?,
        })
    }

    /// Rejects rates a hand-built `TaxRate::from_bps` let through.
    pub fn validate(&self) -> CoreResult<()> {
        TaxRate::checked_bps(self.rate.bps()).map(|_| ())
    }
}

// =============================================================================
// Calculator
// =============================================================================

/// One priced line fed into the calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineAmount {
    pub unit_price: Money,
    pub quantity: i64,
}

impl LineAmount {
    pub const fn new(unit_price: Money, quantity: i64) -> Self {
        Self {
            unit_price,
            quantity,
        }
    }

    /// `unit_price * quantity`, rejected when it does not fit in cents.
    pub fn total(&self) -> CoreResult<Money> {
        self.unit_price
            .checked_times(self.quantity)
            .ok_or_else(|| out_of_range("line total").into())
    }
}

fn out_of_range(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
}

fn to_money(cents: i128, field: &str) -> CoreResult<Money> {
    i64::try_from(cents)
        .map(Money::from_cents)
        .map_err(|_| out_of_range(field).into())
}

/// Result of a total calculation. All parts are non-negative and
/// `total == subtotal + tax`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxBreakdown {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

impl TaxBreakdown {
    pub const fn zero() -> Self {
        Self {
            subtotal: Money::zero(),
            tax: Money::zero(),
            total: Money::zero(),
        }
    }
}

/// Computes subtotal, tax and total for a list of lines.
///
/// ## Errors
/// - `InvalidConfig` if the rate is above 100%
/// - `Validation` if a unit price or quantity is negative, or the
///   gross or the taxed total does not fit in an `i64` of cents
///
/// ## Example
/// ```rust
/// use orderdesk_core::money::Money;
/// use orderdesk_core::tax::{calculate_totals, LineAmount, TaxConfig, TaxMode};
///
/// let lines = [LineAmount::new(Money::from_cents(10_000), 2)];
/// let config = TaxConfig::new(TaxMode::Inclusive, 18.0).unwrap();
///
/// let totals = calculate_totals(&lines, &config).unwrap();
/// assert_eq!(totals.subtotal.cents(), 16_949);
/// assert_eq!(totals.tax.cents(), 3_051);
/// assert_eq!(totals.total.cents(), 20_000);
/// ```
pub fn calculate_totals(lines: &[LineAmount], config: &TaxConfig) -> CoreResult<TaxBreakdown> {
    config.validate()?;

    let mut gross: i128 = 0;
    for line in lines {
        if line.unit_price.is_negative() {
            return Err(ValidationError::negative("unit_price").into());
        }
        if line.quantity < 0 {
            return Err(ValidationError::negative("quantity").into());
        }
        gross = i128::from(line.unit_price.cents())
            .checked_mul(i128::from(line.quantity))
            .and_then(|amount| gross.checked_add(amount))
            .ok_or_else(|| out_of_range("order total"))?;
    }

    let gross = to_money(gross, "order total")?;

    let breakdown = match config.mode {
        TaxMode::Additive => {
            let tax = gross.tax_on_top(config.rate);
            let total = gross
                .checked_add(tax)
                .ok_or_else(|| out_of_range("order total"))?;
            TaxBreakdown {
                subtotal: gross,
                tax,
                total,
            }
        }
        TaxMode::Inclusive => {
            let (subtotal, tax) = gross.extract_included_tax(config.rate);
            TaxBreakdown {
                subtotal,
                tax,
                total: gross,
            }
        }
    };

    Ok(breakdown)
}

// =============================================================================
// Unit Tests
// =============================================================================
