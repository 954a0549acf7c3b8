//! # OrderStore
//!
//! Everything a front end needs from the backend, as one async trait.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Session       login · logout                                           │
//! │  Catalog       products · clients · vendors   (list/get/create/update/  │
//! │                                                delete)                  │
//! │  Settings      get · update                                             │
//! │  Documents     list/get transactions · create_invoice · record_payment  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Implementations must apply the same business rules: totals from the
//! settings tax configuration, payments checked against the pending balance,
//! and every call except `login` rejected without a session.

use async_trait::async_trait;
use orderdesk_core::{
    Client, ClientInput, LoginRequest, LoginResponse, NewInvoice, NewPayment, Product,
    ProductInput, Settings, Transaction, TransactionDetail, TransactionFilter, Vendor,
    VendorInput,
};

use crate::error::ClientResult;

#[async_trait]
pub trait OrderStore: Send + Sync {
    // -------------------------------------------------------------------------
    // Session
    // -------------------------------------------------------------------------

    async fn login(&self, request: &LoginRequest) -> ClientResult<LoginResponse>;

    async fn logout(&self) -> ClientResult<()>;

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    /// Searches by code prefix or name; an empty query lists everything.
    async fn list_products(&self, query: &str, limit: u32) -> ClientResult<Vec<Product>>;

    async fn get_product(&self, id: &str) -> ClientResult<Product>;

    async fn create_product(&self, input: &ProductInput) -> ClientResult<Product>;

    async fn update_product(&self, id: &str, input: &ProductInput) -> ClientResult<Product>;

    async fn delete_product(&self, id: &str) -> ClientResult<()>;

    // -------------------------------------------------------------------------
    // Clients
    // -------------------------------------------------------------------------

    async fn list_clients(&self, query: &str, limit: u32) -> ClientResult<Vec<Client>>;

    async fn get_client(&self, id: &str) -> ClientResult<Client>;

    async fn create_client(&self, input: &ClientInput) -> ClientResult<Client>;

    async fn update_client(&self, id: &str, input: &ClientInput) -> ClientResult<Client>;

    async fn delete_client(&self, id: &str) -> ClientResult<()>;

    // -------------------------------------------------------------------------
    // Vendors
    // -------------------------------------------------------------------------

    async fn list_vendors(&self) -> ClientResult<Vec<Vendor>>;

    async fn get_vendor(&self, id: &str) -> ClientResult<Vendor>;

    async fn create_vendor(&self, input: &VendorInput) -> ClientResult<Vendor>;

    async fn update_vendor(&self, id: &str, input: &VendorInput) -> ClientResult<Vendor>;

    async fn delete_vendor(&self, id: &str) -> ClientResult<()>;

    // -------------------------------------------------------------------------
    // Settings
    // -------------------------------------------------------------------------

    async fn get_settings(&self) -> ClientResult<Settings>;

    async fn update_settings(&self, settings: &Settings) -> ClientResult<Settings>;

    // -------------------------------------------------------------------------
    // Transactions
    // -------------------------------------------------------------------------

    async fn list_transactions(&self, filter: &TransactionFilter) -> ClientResult<Vec<Transaction>>;

    async fn get_transaction(&self, id: &str) -> ClientResult<TransactionDetail>;

    /// Creates an invoice issued by the logged-in vendor.
    async fn create_invoice(&self, input: &NewInvoice) -> ClientResult<TransactionDetail>;

    /// Records a payment against an invoice. Returns the receipt.
    async fn record_payment(
        &self,
        invoice_id: &str,
        input: &NewPayment,
    ) -> ClientResult<TransactionDetail>;
}
