//! # Domain Types
//!
//! Core domain types used throughout OrderDesk.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Client      │   │     Vendor      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id             │       │
//! │  │  code (unique)  │   │  rnc            │   │  name           │       │
//! │  │  price_cents    │   │  debit_cents    │   │  route          │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────────┐  ┌──────────────────┐  ┌──────────────────┐   │
//! │  │    Transaction      │  │ TransactionLine  │  │ PaymentReference │   │
//! │  │  ─────────────────  │  │ ───────────────  │  │ ──────────────── │   │
//! │  │  control_number     │◄─┤ transaction_id   │  │ payment_id ──────┼─┐ │
//! │  │  kind invoice|pay.  │  │ code/name snap.  │  │ invoice_id ──────┼─┤ │
//! │  │  pending_cents      │  │ quantity         │  │ cash/card/...    │ │ │
//! │  └─────────────────────┘  └──────────────────┘  └──────────────────┘ │ │
//! │            ▲                                                         │ │
//! │            └─────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID: (product code, control number) - human-readable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::payment::PaymentAllocation;
use crate::tax::{TaxConfig, TaxMode, TaxRate};
use crate::validation::{
    validate_code, validate_line_count, validate_name, validate_non_negative,
    validate_optional_text, validate_prefix, validate_price_cents, validate_quantity,
    validate_rnc, validate_route, validate_tax_rate_bps,
};
use crate::DEFAULT_TAX_RATE_BPS;

fn default_tax_rate_bps() -> u32 {
    DEFAULT_TAX_RATE_BPS
}

/// Validates an optional tax id only when one was entered.
fn validate_optional_rnc(rnc: Option<&str>) -> CoreResult<()> {
    match rnc.map(str::trim) {
        Some(r) if !r.is_empty() => Ok(validate_rnc(r)?),
        _ => Ok(()),
    }
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Business code, unique across the catalog.
    pub code: String,

    /// Display name printed on documents.
    pub name: String,

    /// Price in cents.
    pub price_cents: i64,

    /// Catalog tax rate in basis points. Printed on the line table;
    /// document totals use the company tax configuration.
    pub tax_rate_bps: u32,

    /// Units on hand. Invoicing may drive it negative (back-order).
    pub stock: i64,

    pub category: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

/// Body of `POST /api/products` and `PUT /api/products/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductInput {
    pub code: String,
    pub name: String,
    pub price_cents: i64,
    #[serde(default = "default_tax_rate_bps")]
    pub tax_rate_bps: u32,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub category: Option<String>,
}

impl ProductInput {
    pub fn validate(&self) -> CoreResult<()> {
        validate_code(&self.code)?;
        validate_name("name", &self.name)?;
        validate_price_cents(self.price_cents)?;
        validate_tax_rate_bps(self.tax_rate_bps)?;
        validate_optional_text("category", self.category.as_deref())?;
        Ok(())
    }
}

// =============================================================================
// Client
// =============================================================================

/// A customer account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub name: String,
    /// RNC or cédula.
    pub rnc: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Credit in favour of the client.
    pub credit_cents: i64,
    /// Amount the client owes across open invoices.
    pub debit_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Client {
    #[inline]
    pub fn debit(&self) -> Money {
        Money::from_cents(self.debit_cents)
    }
}

/// Body of `POST /api/clients` and `PUT /api/clients/{id}`.
///
/// `debit_cents` is not here: it only moves through invoices and payments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClientInput {
    pub name: String,
    #[serde(default)]
    pub rnc: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub credit_cents: i64,
}

impl ClientInput {
    pub fn validate(&self) -> CoreResult<()> {
        validate_name("name", &self.name)?;
        validate_optional_rnc(self.rnc.as_deref())?;
        validate_optional_text("address", self.address.as_deref())?;
        validate_optional_text("phone", self.phone.as_deref())?;
        validate_non_negative("credit", self.credit_cents)?;
        Ok(())
    }
}

// =============================================================================
// Vendor
// =============================================================================

/// A route salesperson. Logs in with id + name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Vendor {
    pub id: String,
    pub name: String,
    pub route: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/vendors` and `PUT /api/vendors/{id}`.
///
/// `id` is optional on create: vendors are often given short codes
/// (`V001`) they can type at login. When absent a UUID is generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VendorInput {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub route: Option<String>,
}

impl VendorInput {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(id) = &self.id {
            validate_code(id).map_err(|_| ValidationError::InvalidFormat {
                field: "id".to_string(),
                reason: "must be 1 to 50 letters, numbers, hyphens or underscores".to_string(),
            })?;
        }
        validate_name("name", &self.name)?;
        if let Some(route) = &self.route {
            validate_route(route)?;
        }
        Ok(())
    }
}

// =============================================================================
// Transaction Kind / Status
// =============================================================================

/// What a transaction documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// A sale on credit (factura).
    Invoice,
    /// Money received against an invoice (recibo).
    Payment,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Invoice => "invoice",
            TransactionKind::Payment => "payment",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement status. Invoices are `Pending` until `pending_cents` hits zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Paid,
}

impl TransactionStatus {
    /// Status implied by a pending balance.
    pub fn for_pending(pending: Money) -> Self {
        if pending.is_positive() {
            TransactionStatus::Pending
        } else {
            TransactionStatus::Paid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Paid => "paid",
        }
    }
}

impl Default for TransactionStatus {
    fn default() -> Self {
        TransactionStatus::Pending
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// An invoice or a payment receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    pub id: String,
    /// Human-readable document number (`FAC-000042`).
    pub control_number: String,
    pub kind: TransactionKind,
    pub client_id: String,
    pub vendor_id: String,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    /// Unpaid remainder. Always zero for payments.
    pub pending_cents: i64,
    pub status: TransactionStatus,
    /// Tax configuration in force when the document was created.
    pub tax_mode: TaxMode,
    pub tax_rate_bps: u32,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn pending(&self) -> Money {
        Money::from_cents(self.pending_cents)
    }

    #[inline]
    pub fn is_invoice(&self) -> bool {
        self.kind == TransactionKind::Invoice
    }

    /// Tax configuration snapshot stored on the document.
    pub fn tax_config(&self) -> TaxConfig {
        TaxConfig {
            mode: self.tax_mode,
            rate: TaxRate::from_bps(self.tax_rate_bps),
        }
    }
}

/// A line on an invoice. Code, name and price are frozen at invoicing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct TransactionLine {
    pub id: String,
    pub transaction_id: String,
    /// `None` once the product has been deleted from the catalog.
    pub product_id: Option<String>,
    pub code_snapshot: String,
    pub name_snapshot: String,
    pub unit_price_cents: i64,
    pub tax_rate_bps: u32,
    pub quantity: i64,
    pub line_total_cents: i64,
}

impl TransactionLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// Links a payment to the invoice it settles, with the tender split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PaymentReference {
    pub id: String,
    pub payment_id: String,
    pub invoice_id: String,
    pub cash_cents: i64,
    pub card_cents: i64,
    pub transfer_cents: i64,
    pub check_cents: i64,
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl PaymentReference {
    pub fn allocation(&self) -> PaymentAllocation {
        PaymentAllocation::from_cents(
            self.cash_cents,
            self.card_cents,
            self.transfer_cents,
            self.check_cents,
        )
    }
}

/// A transaction with everything needed to display or print it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionDetail {
    pub transaction: Transaction,
    pub lines: Vec<TransactionLine>,
    /// For an invoice: payments made against it. For a payment: the
    /// invoice(s) it settled.
    pub references: Vec<PaymentReference>,
}

// =============================================================================
// Transaction Inputs
// =============================================================================

/// One requested line: the price comes from the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InvoiceLineInput {
    pub product_id: String,
    pub quantity: i64,
}

/// Body of `POST /api/transactions/invoices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewInvoice {
    pub client_id: String,
    pub lines: Vec<InvoiceLineInput>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewInvoice {
    pub fn validate(&self) -> CoreResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(ValidationError::required("client_id").into());
        }
        validate_line_count(self.lines.len())?;
        for line in &self.lines {
            if line.product_id.trim().is_empty() {
                return Err(ValidationError::required("product_id").into());
            }
            validate_quantity(line.quantity)?;
        }
        validate_optional_text("notes", self.notes.as_deref())?;
        Ok(())
    }
}

/// Body of `POST /api/transactions/{id}/payments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewPayment {
    pub amounts: PaymentAllocation,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Query parameters of `GET /api/transactions`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TransactionFilter {
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub kind: Option<TransactionKind>,
    #[serde(default)]
    pub status: Option<TransactionStatus>,
    #[serde(default)]
    pub limit: Option<i64>,
}

// =============================================================================
// Settings
// =============================================================================

/// Company profile and tax configuration (single row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Settings {
    pub company_name: String,
    pub rnc: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub tax_mode: TaxMode,
    pub tax_rate_bps: u32,
    pub currency_symbol: String,
    pub invoice_prefix: String,
    pub payment_prefix: String,
}

impl Settings {
    /// The configuration every document total is computed with.
    pub fn tax_config(&self) -> CoreResult<TaxConfig> {
        TaxConfig::from_bps(self.tax_mode, self.tax_rate_bps)
    }

    pub fn validate(&self) -> CoreResult<()> {
        validate_name("company_name", &self.company_name)?;
        validate_optional_rnc(self.rnc.as_deref())?;
        validate_optional_text("address", self.address.as_deref())?;
        validate_optional_text("phone", self.phone.as_deref())?;
        validate_tax_rate_bps(self.tax_rate_bps)?;
        if self.currency_symbol.trim().is_empty() {
            return Err(ValidationError::required("currency_symbol").into());
        }
        validate_prefix("invoice_prefix", &self.invoice_prefix)?;
        validate_prefix("payment_prefix", &self.payment_prefix)?;
        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            company_name: "Mi Empresa".to_string(),
            rnc: None,
            address: None,
            phone: None,
            tax_mode: TaxMode::Additive,
            tax_rate_bps: DEFAULT_TAX_RATE_BPS,
            currency_symbol: "RD$".to_string(),
            invoice_prefix: "FAC".to_string(),
            payment_prefix: "REC".to_string(),
        }
    }
}

// =============================================================================
// Session
// =============================================================================

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoginRequest {
    pub vendor_id: String,
    pub name: String,
}

/// The explicit context a logged-in vendor works in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionInfo {
    pub session_id: String,
    pub vendor: Vendor,
    pub settings: Settings,
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
}

/// Response of `POST /api/auth/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub session: SessionInfo,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn product_input() -> ProductInput {
        ProductInput {
            code: "AGUA-500".to_string(),
            name: "Agua 500ml".to_string(),
            price_cents: 2_500,
            tax_rate_bps: 1_800,
            stock: 120,
            category: Some("Bebidas".to_string()),
        }
    }

    #[test]
    fn test_product_input_validation() {
        assert!(product_input().validate().is_ok());

        let mut bad = product_input();
        bad.price_cents = -1;
        assert!(matches!(bad.validate(), Err(CoreError::Validation(_))));

        let mut bad = product_input();
        bad.tax_rate_bps = 10_001;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_product_input_defaults() {
        let input: ProductInput =
            serde_json::from_str(r#"{"code":"X1","name":"X","price_cents":100}"#).unwrap();
        assert_eq!(input.tax_rate_bps, 1_800);
        assert_eq!(input.stock, 0);
        assert!(input.category.is_none());
    }

    #[test]
    fn test_client_input_rnc_is_optional_but_checked() {
        let mut input = ClientInput {
            name: "Colmado Don Pedro".to_string(),
            rnc: None,
            address: None,
            phone: None,
            credit_cents: 0,
        };
        assert!(input.validate().is_ok());

        input.rnc = Some("".to_string());
        assert!(input.validate().is_ok());

        input.rnc = Some("123".to_string());
        assert!(input.validate().is_err());

        input.rnc = Some("131-12345-6".to_string());
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_vendor_input_validation() {
        let input = VendorInput {
            id: Some("V001".to_string()),
            name: "Juan Perez".to_string(),
            route: Some("Ruta Norte".to_string()),
        };
        assert!(input.validate().is_ok());

        let input = VendorInput {
            id: Some("V 001".to_string()),
            ..input
        };
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_new_invoice_validation() {
        let invoice = NewInvoice {
            client_id: "c1".to_string(),
            lines: vec![InvoiceLineInput {
                product_id: "p1".to_string(),
                quantity: 3,
            }],
            notes: None,
        };
        assert!(invoice.validate().is_ok());

        let empty = NewInvoice {
            lines: vec![],
            ..invoice.clone()
        };
        assert!(empty.validate().is_err());

        let zero_qty = NewInvoice {
            lines: vec![InvoiceLineInput {
                product_id: "p1".to_string(),
                quantity: 0,
            }],
            ..invoice
        };
        assert!(zero_qty.validate().is_err());
    }

    #[test]
    fn test_status_for_pending() {
        assert_eq!(
            TransactionStatus::for_pending(Money::from_cents(1)),
            TransactionStatus::Pending
        );
        assert_eq!(
            TransactionStatus::for_pending(Money::zero()),
            TransactionStatus::Paid
        );
    }

    #[test]
    fn test_settings_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        let config = settings.tax_config().unwrap();
        assert_eq!(config.mode, TaxMode::Additive);
        assert_eq!(config.rate.bps(), 1_800);
    }

    #[test]
    fn test_settings_rejects_bad_prefix_and_rate() {
        let mut settings = Settings::default();
        settings.invoice_prefix = String::new();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.tax_rate_bps = 20_000;
        assert!(settings.validate().is_err());
        assert!(settings.tax_config().is_err());
    }

    #[test]
    fn test_filter_deserializes_kind_and_status() {
        let filter: TransactionFilter =
            serde_json::from_str(r#"{"kind":"invoice","status":"pending","limit":10}"#).unwrap();
        assert_eq!(filter.kind, Some(TransactionKind::Invoice));
        assert_eq!(filter.status, Some(TransactionStatus::Pending));
        assert_eq!(filter.limit, Some(10));
    }
}
