//! # Payment Reconciliation
//!
//! Validates a multi-method payment against an invoice's pending balance.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Payment form                                                           │
//! │  ┌────────┬────────┬──────────┬────────┐                                │
//! │  │  cash  │  card  │ transfer │ check  │  ──► PaymentAllocation          │
//! │  └────────┴────────┴──────────┴────────┘                                │
//! │                        │                                                │
//! │                        ▼                                                │
//! │        validate_payment(allocation, pending)                            │
//! │             │                          │                                │
//! │          Ok(total)                Err(PaymentError)                     │
//! │             │                          │                                │
//! │             ▼                          ▼                                │
//! │  apply_payment(pending, total)    nothing is written                    │
//! │  (floored at zero)                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::PaymentError;
use crate::money::Money;

// =============================================================================
// Payment Method
// =============================================================================

/// The four tenders a route vendor accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Check,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Transfer,
        PaymentMethod::Check,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Transfer => "transfer",
            PaymentMethod::Check => "check",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Allocation
// =============================================================================

/// How one payment is split across tenders. Missing fields are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct PaymentAllocation {
    pub cash: Money,
    pub card: Money,
    pub transfer: Money,
    pub check: Money,
}

impl PaymentAllocation {
    /// Builds an allocation from raw cent amounts.
    pub const fn from_cents(cash: i64, card: i64, transfer: i64, check: i64) -> Self {
        Self {
            cash: Money::from_cents(cash),
            card: Money::from_cents(card),
            transfer: Money::from_cents(transfer),
            check: Money::from_cents(check),
        }
    }

    pub fn amount(&self, method: PaymentMethod) -> Money {
        match method {
            PaymentMethod::Cash => self.cash,
            PaymentMethod::Card => self.card,
            PaymentMethod::Transfer => self.transfer,
            PaymentMethod::Check => self.check,
        }
    }

    /// Sum of all tenders, `None` if it leaves the `i64` range.
    pub fn checked_total(&self) -> Option<Money> {
        self.cash
            .checked_add(self.card)?
            .checked_add(self.transfer)?
            .checked_add(self.check)
    }

    /// Sum of all tenders for display, clamped at the `i64` range.
    pub fn total(&self) -> Money {
        let cents = [self.card, self.transfer, self.check]
            .iter()
            .fold(self.cash.cents(), |acc, m| acc.saturating_add(m.cents()));
        Money::from_cents(cents)
    }

    /// The non-zero tenders, in form order.
    pub fn methods(&self) -> Vec<(PaymentMethod, Money)> {
        PaymentMethod::ALL
            .iter()
            .map(|&m| (m, self.amount(m)))
            .filter(|(_, amount)| !amount.is_zero())
            .collect()
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Checks a payment against the pending balance and returns its total.
///
/// ## Rules
/// - every tender ≥ 0
/// - pending ≥ 0
/// - the tenders' sum fits in an `i64`
/// - 0 < total ≤ pending
///
/// ## Example
/// ```rust
/// use orderdesk_core::money::Money;
/// use orderdesk_core::payment::{validate_payment, PaymentAllocation};
///
/// let split = PaymentAllocation::from_cents(5_000, 5_000, 0, 0);
/// let total = validate_payment(&split, Money::from_cents(10_000)).unwrap();
/// assert_eq!(total.cents(), 10_000);
/// ```
pub fn validate_payment(
    allocation: &PaymentAllocation,
    pending: Money,
) -> Result<Money, PaymentError> {
    for method in PaymentMethod::ALL {
        if allocation.amount(method).is_negative() {
            return Err(PaymentError::NegativeAmount { method });
        }
    }

    if pending.is_negative() {
        return Err(PaymentError::NegativeBalance);
    }

    let total = allocation
        .checked_total()
        .ok_or(PaymentError::TotalOutOfRange)?;
    if total.is_zero() {
        return Err(PaymentError::NothingToApply);
    }
    if total > pending {
        return Err(PaymentError::ExceedsPending { total, pending });
    }

    Ok(total)
}

/// New pending balance after a validated payment, floored at zero.
#[inline]
pub fn apply_payment(pending: Money, total: Money) -> Money {
    pending.saturating_sub_floor(total)
}

/// What the payment form shows while the vendor is typing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentPreview {
    pub valid: bool,
    pub total: Money,
    pub remaining: Money,
    pub error: Option<String>,
}

/// Non-failing wrapper around [`validate_payment`] for previews.
pub fn preview_payment(allocation: &PaymentAllocation, pending: Money) -> PaymentPreview {
    match validate_payment(allocation, pending) {
        Ok(total) => PaymentPreview {
            valid: true,
            total,
            remaining: apply_payment(pending, total),
            error: None,
        },
        Err(err) => PaymentPreview {
            valid: false,
            total: allocation.total(),
            remaining: pending,
            error: Some(err.to_string()),
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
