//! # orderdesk-core: Pure Business Logic for OrderDesk
//!
//! This crate is the **heart** of OrderDesk. It contains every business rule
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        OrderDesk Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               Mobile / Web client (orderdesk-client)            │   │
//! │  │    Order screen ──► Summary ──► Payment form ──► PDF viewer     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/api (axum handlers)                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ orderdesk-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ │   │
//! │  │   │  money  │ │   tax   │ │ payment │ │  order  │ │validation│ │   │
//! │  │   │  Money  │ │ TaxRate │ │ Alloc.  │ │  Draft  │ │  rules   │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └──────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 orderdesk-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`tax`] - Tax rates, tax modes and the total calculator
//! - [`payment`] - Multi-method payment allocation and reconciliation
//! - [`order`] - Draft order (the order being keyed in)
//! - [`control`] - Human-readable document numbers
//! - [`types`] - Domain entities (Product, Client, Vendor, Transaction, ...)
//! - [`validation`] - Input validation rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use orderdesk_core::money::Money;
//! use orderdesk_core::tax::{calculate_totals, LineAmount, TaxConfig, TaxMode};
//!
//! let config = TaxConfig::new(TaxMode::Additive, 18.0).unwrap();
//! let lines = [LineAmount::new(Money::from_cents(10_000), 2)];
//!
//! let totals = calculate_totals(&lines, &config).unwrap();
//! assert_eq!(totals.subtotal.cents(), 20_000);
//! assert_eq!(totals.tax.cents(), 3_600);
//! assert_eq!(totals.total.cents(), 23_600);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod control;
pub mod error;
pub mod money;
pub mod order;
pub mod payment;
pub mod tax;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, PaymentError, ValidationError};
pub use money::Money;
pub use payment::{PaymentAllocation, PaymentMethod};
pub use tax::{TaxBreakdown, TaxConfig, TaxMode, TaxRate};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed on a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single product on one line.
///
/// Route sales move cases of product, so this is higher than a counter POS
/// would allow, but still catches a mistyped extra digit or two.
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Highest unit price accepted for a product, in cents (one billion).
///
/// At this price a full order (`MAX_ORDER_LINES` lines of
/// `MAX_LINE_QUANTITY`) plus 100% tax still fits in an `i64`.
pub const MAX_PRICE_CENTS: i64 = 100_000_000_000;

/// Default ITBIS rate in basis points (18%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 1_800;
