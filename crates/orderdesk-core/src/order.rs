//! # Draft Order
//!
//! The order a vendor is keying in before it becomes an invoice.
//!
//! ## Draft Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Draft Order Operations                               │
//! │                                                                         │
//! │  Vendor Action            Method                  Draft Change          │
//! │  ─────────────            ──────                  ────────────          │
//! │                                                                         │
//! │  Tap Product ────────────► add_product() ───────► push or merge qty     │
//! │  Change Quantity ────────► update_quantity() ───► lines[i].qty = n     │
//! │  Swipe Remove ───────────► remove_product() ────► lines.remove(i)      │
//! │  Cancel Order ───────────► clear() ─────────────► lines.clear()        │
//! │  View Summary ───────────► totals(&config) ─────► (read only)          │
//! │  Confirm ────────────────► to_invoice() ────────► NewInvoice           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::tax::{calculate_totals, LineAmount, TaxBreakdown, TaxConfig};
use crate::types::{InvoiceLineInput, NewInvoice, Product};
use crate::validation::validate_quantity;
use crate::{MAX_LINE_QUANTITY, MAX_ORDER_LINES};

/// A product on the draft, with catalog data frozen when it was added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DraftLine {
    pub product_id: String,
    pub code: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl DraftLine {
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        DraftLine {
            product_id: product.id.clone(),
            code: product.code.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            quantity,
            added_at: Utc::now(),
        }
    }

    pub fn line_total(&self) -> CoreResult<Money> {
        self.amount().total()
    }

    fn amount(&self) -> LineAmount {
        LineAmount::new(Money::from_cents(self.unit_price_cents), self.quantity)
    }
}

/// The order in progress.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product merges)
/// - Every quantity is in `1..=MAX_LINE_QUANTITY`
/// - At most `MAX_ORDER_LINES` lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDraft {
    pub client_id: Option<String>,
    pub lines: Vec<DraftLine>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Default for OrderDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderDraft {
    pub fn new() -> Self {
        OrderDraft {
            client_id: None,
            lines: Vec::new(),
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// Starts a draft for a client.
    pub fn for_client(client_id: impl Into<String>) -> Self {
        OrderDraft {
            client_id: Some(client_id.into()),
            ..Self::new()
        }
    }

    pub fn set_client(&mut self, client_id: impl Into<String>) {
        self.client_id = Some(client_id.into());
    }

    /// Adds a product or increases its quantity if it is already on the draft.
    pub fn add_product(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            let new_qty = line.quantity + quantity;
            if new_qty > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_LINE_QUANTITY,
                });
            }
            line.quantity = new_qty;
            return Ok(());
        }

        if self.lines.len() >= MAX_ORDER_LINES {
            return Err(CoreError::OrderTooLarge {
                max: MAX_ORDER_LINES,
            });
        }

        self.lines.push(DraftLine::from_product(product, quantity));
        Ok(())
    }

    /// Sets a line's quantity. Zero removes the line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_product(product_id);
        }

        if quantity > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_LINE_QUANTITY,
            });
        }
        validate_quantity(quantity)?;

        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => {
                line.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::LineNotFound(product_id.to_string())),
        }
    }

    pub fn remove_product(&mut self, product_id: &str) -> CoreResult<()> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == before {
            Err(CoreError::LineNotFound(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Empties the draft. The client selection is kept.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.notes = None;
        self.created_at = Utc::now();
    }

    /// Number of distinct products.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of all quantities.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Totals under the given tax configuration.
    pub fn totals(&self, config: &TaxConfig) -> CoreResult<TaxBreakdown> {
        let amounts: Vec<LineAmount> = self.lines.iter().map(DraftLine::amount).collect();
        calculate_totals(&amounts, config)
    }

    /// Converts the draft into an invoice request.
    pub fn to_invoice(&self) -> CoreResult<NewInvoice> {
        let client_id = self
            .client_id
            .clone()
            .ok_or_else(|| crate::error::ValidationError::required("client_id"))?;

        let invoice = NewInvoice {
            client_id,
            lines: self
                .lines
                .iter()
                .map(|l| InvoiceLineInput {
                    product_id: l.product_id.clone(),
                    quantity: l.quantity,
                })
                .collect(),
            notes: self.notes.clone(),
        };
        invoice.validate()?;
        Ok(invoice)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
