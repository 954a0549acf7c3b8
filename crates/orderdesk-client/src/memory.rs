//! # MemoryStore
//!
//! An in-process [`OrderStore`] holding everything in one mutex-guarded
//! state. It runs the same calculator, payment validator and control
//! numbering as the database layer, so front-end logic can be exercised
//! without a server.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MemoryStore                                                            │
//! │  └── Mutex<MemoryState>                                                 │
//! │       ├── products / clients / vendors                                  │
//! │       ├── settings                (tax mode + rate, prefixes)           │
//! │       ├── transactions / lines / references                             │
//! │       ├── counters                (invoice, payment)                    │
//! │       └── session                 (logged-in vendor, or None)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each write takes the lock once and validates before mutating, so a
//! rejected call leaves the state as it was.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use orderdesk_core::control::{format_control_number, prefix_for};
use orderdesk_core::payment::{apply_payment, validate_payment};
use orderdesk_core::tax::{calculate_totals, LineAmount};
use orderdesk_core::{
    Client, ClientInput, LoginRequest, LoginResponse, NewInvoice, NewPayment, PaymentReference,
    Product, ProductInput, SessionInfo, Settings, Transaction, TransactionDetail,
    TransactionFilter, TransactionKind, TransactionLine, TransactionStatus, Vendor, VendorInput,
};

use crate::error::{ClientError, ClientResult};
use crate::store::OrderStore;

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Default)]
struct MemoryState {
    products: Vec<Product>,
    clients: Vec<Client>,
    vendors: Vec<Vendor>,
    settings: Settings,
    transactions: Vec<Transaction>,
    lines: Vec<TransactionLine>,
    references: Vec<PaymentReference>,
    invoice_seq: i64,
    payment_seq: i64,
    session: Option<SessionInfo>,
}

impl MemoryState {
    fn session(&self) -> ClientResult<&SessionInfo> {
        match &self.session {
            Some(session) if session.expires_at > Utc::now() => Ok(session),
            Some(_) => Err(ClientError::Unauthorized("session expired".to_string())),
            None => Err(ClientError::Unauthorized("not logged in".to_string())),
        }
    }

    fn next_control_number(&mut self, kind: TransactionKind) -> String {
        let seq = match kind {
            TransactionKind::Invoice => {
                self.invoice_seq += 1;
                self.invoice_seq
            }
            TransactionKind::Payment => {
                self.payment_seq += 1;
                self.payment_seq
            }
        };
        format_control_number(prefix_for(&self.settings, kind), seq)
    }

    fn detail(&self, id: &str) -> ClientResult<TransactionDetail> {
        let transaction = self
            .transactions
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| ClientError::not_found("Transaction", id))?;

        let lines = self
            .lines
            .iter()
            .filter(|l| l.transaction_id == id)
            .cloned()
            .collect();
        let references = self
            .references
            .iter()
            .filter(|r| r.invoice_id == id || r.payment_id == id)
            .cloned()
            .collect();

        Ok(TransactionDetail {
            transaction,
            lines,
            references,
        })
    }
}

/// In-memory store. Starts with default settings and no data.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    session_ttl: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            state: Mutex::new(MemoryState::default()),
            session_ttl: Duration::hours(12),
        }
    }

    /// Adds a vendor before anyone is logged in, so there is someone to
    /// log in as.
    pub fn with_vendor(mut self, id: &str, name: &str) -> Self {
        self.state.get_mut().vendors.push(Vendor {
            id: id.to_string(),
            name: name.to_string(),
            route: None,
            created_at: Utc::now(),
        });
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.state.get_mut().settings = settings;
        self
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn clamp_limit(limit: u32) -> usize {
    limit.min(MAX_LIMIT as u32) as usize
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn login(&self, request: &LoginRequest) -> ClientResult<LoginResponse> {
        let mut state = self.state.lock().await;

        let wanted = request.name.trim().to_lowercase();
        let vendor = state
            .vendors
            .iter()
            .find(|v| v.id == request.vendor_id.trim() && v.name.trim().to_lowercase() == wanted)
            .cloned()
            .ok_or_else(|| {
                warn!(vendor_id = %request.vendor_id, "Login rejected");
                ClientError::Unauthorized("invalid vendor credentials".to_string())
            })?;

        let session = SessionInfo {
            session_id: Uuid::new_v4().to_string(),
            vendor,
            settings: state.settings.clone(),
            expires_at: Utc::now() + self.session_ttl,
        };
        state.session = Some(session.clone());

        info!(vendor_id = %session.vendor.id, "Vendor logged in");
        Ok(LoginResponse {
            token: format!("memory-{}", session.session_id),
            session,
        })
    }

    async fn logout(&self) -> ClientResult<()> {
        let mut state = self.state.lock().await;
        if let Some(session) = state.session.take() {
            info!(vendor_id = %session.vendor.id, "Vendor logged out");
        }
        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    async fn list_products(&self, query: &str, limit: u32) -> ClientResult<Vec<Product>> {
        let state = self.state.lock().await;
        state.session()?;

        let query = query.trim().to_lowercase();
        let mut hits: Vec<(bool, &Product)> = state
            .products
            .iter()
            .filter_map(|p| {
                let code_hit = p.code.to_lowercase().starts_with(&query);
                let name_hit = p.name.to_lowercase().contains(&query);
                (code_hit || name_hit).then_some((code_hit && !query.is_empty(), p))
            })
            .collect();
        hits.sort_by(|(a_code, a), (b_code, b)| b_code.cmp(a_code).then_with(|| a.name.cmp(&b.name)));

        Ok(hits
            .into_iter()
            .take(clamp_limit(limit))
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn get_product(&self, id: &str) -> ClientResult<Product> {
        let state = self.state.lock().await;
        state.session()?;

        state
            .products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| ClientError::not_found("Product", id))
    }

    async fn create_product(&self, input: &ProductInput) -> ClientResult<Product> {
        input.validate()?;
        let mut state = self.state.lock().await;
        state.session()?;

        let code = input.code.trim();
        if state.products.iter().any(|p| p.code == code) {
            return Err(ClientError::Conflict(format!("product code {code} already exists")));
        }

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            name: input.name.trim().to_string(),
            price_cents: input.price_cents,
            tax_rate_bps: input.tax_rate_bps,
            stock: input.stock,
            category: trimmed(&input.category),
            created_at: now,
            updated_at: now,
        };
        state.products.push(product.clone());

        debug!(id = %product.id, code = %product.code, "Product created");
        Ok(product)
    }

    async fn update_product(&self, id: &str, input: &ProductInput) -> ClientResult<Product> {
        input.validate()?;
        let mut state = self.state.lock().await;
        state.session()?;

        let code = input.code.trim();
        if state.products.iter().any(|p| p.code == code && p.id != id) {
            return Err(ClientError::Conflict(format!("product code {code} already exists")));
        }

        let product = state
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ClientError::not_found("Product", id))?;

        product.code = code.to_string();
        product.name = input.name.trim().to_string();
        product.price_cents = input.price_cents;
        product.tax_rate_bps = input.tax_rate_bps;
        product.stock = input.stock;
        product.category = trimmed(&input.category);
        product.updated_at = Utc::now();

        Ok(product.clone())
    }

    async fn delete_product(&self, id: &str) -> ClientResult<()> {
        let mut state = self.state.lock().await;
        state.session()?;

        let before = state.products.len();
        state.products.retain(|p| p.id != id);
        if state.products.len() == before {
            return Err(ClientError::not_found("Product", id));
        }

        // Lines keep their snapshot and lose the link.
        for line in state.lines.iter_mut().filter(|l| l.product_id.as_deref() == Some(id)) {
            line.product_id = None;
        }
        Ok(())
    }

    // =========================================================================
    // Clients
    // =========================================================================

    async fn list_clients(&self, query: &str, limit: u32) -> ClientResult<Vec<Client>> {
        let state = self.state.lock().await;
        state.session()?;

        let query = query.trim().to_lowercase();
        let mut clients: Vec<Client> = state
            .clients
            .iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&query)
                    || c.rnc.as_deref().is_some_and(|r| r.starts_with(&query))
            })
            .cloned()
            .collect();
        clients.sort_by(|a, b| a.name.cmp(&b.name));
        clients.truncate(clamp_limit(limit));

        Ok(clients)
    }

    async fn get_client(&self, id: &str) -> ClientResult<Client> {
        let state = self.state.lock().await;
        state.session()?;

        state
            .clients
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| ClientError::not_found("Client", id))
    }

    async fn create_client(&self, input: &ClientInput) -> ClientResult<Client> {
        input.validate()?;
        let mut state = self.state.lock().await;
        state.session()?;

        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            rnc: trimmed(&input.rnc),
            address: trimmed(&input.address),
            phone: trimmed(&input.phone),
            credit_cents: input.credit_cents,
            debit_cents: 0,
            created_at: now,
            updated_at: now,
        };
        state.clients.push(client.clone());

        Ok(client)
    }

    async fn update_client(&self, id: &str, input: &ClientInput) -> ClientResult<Client> {
        input.validate()?;
        let mut state = self.state.lock().await;
        state.session()?;

        let client = state
            .clients
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ClientError::not_found("Client", id))?;

        client.name = input.name.trim().to_string();
        client.rnc = trimmed(&input.rnc);
        client.address = trimmed(&input.address);
        client.phone = trimmed(&input.phone);
        client.credit_cents = input.credit_cents;
        client.updated_at = Utc::now();

        Ok(client.clone())
    }

    async fn delete_client(&self, id: &str) -> ClientResult<()> {
        let mut state = self.state.lock().await;
        state.session()?;

        if state.transactions.iter().any(|t| t.client_id == id) {
            return Err(ClientError::Conflict(format!("client {id} has transactions")));
        }

        let before = state.clients.len();
        state.clients.retain(|c| c.id != id);
        if state.clients.len() == before {
            return Err(ClientError::not_found("Client", id));
        }
        Ok(())
    }

    // =========================================================================
    // Vendors
    // =========================================================================

    async fn list_vendors(&self) -> ClientResult<Vec<Vendor>> {
        let state = self.state.lock().await;
        state.session()?;

        let mut vendors = state.vendors.clone();
        vendors.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(vendors)
    }

    async fn get_vendor(&self, id: &str) -> ClientResult<Vendor> {
        let state = self.state.lock().await;
        state.session()?;

        state
            .vendors
            .iter()
            .find(|v| v.id == id)
            .cloned()
            .ok_or_else(|| ClientError::not_found("Vendor", id))
    }

    async fn create_vendor(&self, input: &VendorInput) -> ClientResult<Vendor> {
        input.validate()?;
        let mut state = self.state.lock().await;
        state.session()?;

        let id = trimmed(&input.id).unwrap_or_else(|| Uuid::new_v4().to_string());
        if state.vendors.iter().any(|v| v.id == id) {
            return Err(ClientError::Conflict(format!("vendor id {id} already exists")));
        }

        let vendor = Vendor {
            id,
            name: input.name.trim().to_string(),
            route: trimmed(&input.route),
            created_at: Utc::now(),
        };
        state.vendors.push(vendor.clone());

        Ok(vendor)
    }

    async fn update_vendor(&self, id: &str, input: &VendorInput) -> ClientResult<Vendor> {
        input.validate()?;
        let mut state = self.state.lock().await;
        state.session()?;

        let vendor = state
            .vendors
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or_else(|| ClientError::not_found("Vendor", id))?;

        vendor.name = input.name.trim().to_string();
        vendor.route = trimmed(&input.route);

        Ok(vendor.clone())
    }

    async fn delete_vendor(&self, id: &str) -> ClientResult<()> {
        let mut state = self.state.lock().await;
        state.session()?;

        if state.transactions.iter().any(|t| t.vendor_id == id) {
            return Err(ClientError::Conflict(format!("vendor {id} has transactions")));
        }

        let before = state.vendors.len();
        state.vendors.retain(|v| v.id != id);
        if state.vendors.len() == before {
            return Err(ClientError::not_found("Vendor", id));
        }
        Ok(())
    }

    // =========================================================================
    // Settings
    // =========================================================================

    async fn get_settings(&self) -> ClientResult<Settings> {
        let state = self.state.lock().await;
        state.session()?;
        Ok(state.settings.clone())
    }

    async fn update_settings(&self, settings: &Settings) -> ClientResult<Settings> {
        settings.validate()?;
        let mut state = self.state.lock().await;
        state.session()?;

        let mut stored = settings.clone();
        stored.company_name = stored.company_name.trim().to_string();
        stored.invoice_prefix = stored.invoice_prefix.trim().to_uppercase();
        stored.payment_prefix = stored.payment_prefix.trim().to_uppercase();
        state.settings = stored.clone();

        if let Some(session) = state.session.as_mut() {
            session.settings = stored.clone();
        }
        Ok(stored)
    }

    // =========================================================================
    // Transactions
    // =========================================================================

    async fn list_transactions(&self, filter: &TransactionFilter) -> ClientResult<Vec<Transaction>> {
        let state = self.state.lock().await;
        state.session()?;

        let limit = filter.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT) as usize;
        Ok(state
            .transactions
            .iter()
            .rev()
            .filter(|t| filter.client_id.as_ref().map_or(true, |c| &t.client_id == c))
            .filter(|t| filter.kind.map_or(true, |k| t.kind == k))
            .filter(|t| filter.status.map_or(true, |s| t.status == s))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_transaction(&self, id: &str) -> ClientResult<TransactionDetail> {
        let state = self.state.lock().await;
        state.session()?;
        state.detail(id)
    }

    async fn create_invoice(&self, input: &NewInvoice) -> ClientResult<TransactionDetail> {
        input.validate()?;
        let mut state = self.state.lock().await;
        let vendor_id = state.session()?.vendor.id.clone();

        let config = state.settings.tax_config()?;
        if !state.clients.iter().any(|c| c.id == input.client_id) {
            return Err(ClientError::not_found("Client", &input.client_id));
        }

        let mut products = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let product = state
                .products
                .iter()
                .find(|p| p.id == line.product_id)
                .cloned()
                .ok_or_else(|| ClientError::not_found("Product", &line.product_id))?;
            products.push((product, line.quantity));
        }

        let amounts: Vec<LineAmount> = products
            .iter()
            .map(|(p, qty)| LineAmount::new(p.price(), *qty))
            .collect();
        let totals = calculate_totals(&amounts, &config)?;
        let line_totals = amounts
            .iter()
            .map(LineAmount::total)
            .collect::<Result<Vec<_>, _>>()?;

        // Everything below is infallible.
        let now = Utc::now();
        let invoice = Transaction {
            id: Uuid::new_v4().to_string(),
            control_number: state.next_control_number(TransactionKind::Invoice),
            kind: TransactionKind::Invoice,
            client_id: input.client_id.clone(),
            vendor_id,
            subtotal_cents: totals.subtotal.cents(),
            tax_cents: totals.tax.cents(),
            total_cents: totals.total.cents(),
            pending_cents: totals.total.cents(),
            status: TransactionStatus::for_pending(totals.total),
            tax_mode: config.mode,
            tax_rate_bps: config.rate.bps(),
            notes: input.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        for ((product, quantity), line_total) in products.iter().zip(&line_totals) {
            state.lines.push(TransactionLine {
                id: Uuid::new_v4().to_string(),
                transaction_id: invoice.id.clone(),
                product_id: Some(product.id.clone()),
                code_snapshot: product.code.clone(),
                name_snapshot: product.name.clone(),
                unit_price_cents: product.price_cents,
                tax_rate_bps: product.tax_rate_bps,
                quantity: *quantity,
                line_total_cents: line_total.cents(),
            });
            if let Some(stored) = state.products.iter_mut().find(|p| p.id == product.id) {
                stored.stock -= quantity;
            }
        }

        if let Some(client) = state.clients.iter_mut().find(|c| c.id == input.client_id) {
            client.debit_cents = client.debit_cents.saturating_add(invoice.total_cents);
            client.updated_at = now;
        }

        info!(
            control_number = %invoice.control_number,
            total_cents = invoice.total_cents,
            "Invoice created"
        );

        let id = invoice.id.clone();
        state.transactions.push(invoice);
        state.detail(&id)
    }

    async fn record_payment(
        &self,
        invoice_id: &str,
        input: &NewPayment,
    ) -> ClientResult<TransactionDetail> {
        let mut state = self.state.lock().await;
        let vendor_id = state.session()?.vendor.id.clone();

        let invoice = state
            .transactions
            .iter()
            .find(|t| t.id == invoice_id)
            .cloned()
            .ok_or_else(|| ClientError::not_found("Transaction", invoice_id))?;

        if !invoice.is_invoice() {
            return Err(ClientError::Validation(format!(
                "transaction {} is a {}, expected an invoice",
                invoice.id, invoice.kind
            )));
        }

        let total = validate_payment(&input.amounts, invoice.pending())?;
        let remaining = apply_payment(invoice.pending(), total);

        let now = Utc::now();
        let payment = Transaction {
            id: Uuid::new_v4().to_string(),
            control_number: state.next_control_number(TransactionKind::Payment),
            kind: TransactionKind::Payment,
            client_id: invoice.client_id.clone(),
            vendor_id,
            subtotal_cents: total.cents(),
            tax_cents: 0,
            total_cents: total.cents(),
            pending_cents: 0,
            status: TransactionStatus::Paid,
            tax_mode: invoice.tax_mode,
            tax_rate_bps: invoice.tax_rate_bps,
            notes: input.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        state.references.push(PaymentReference {
            id: Uuid::new_v4().to_string(),
            payment_id: payment.id.clone(),
            invoice_id: invoice.id.clone(),
            cash_cents: input.amounts.cash.cents(),
            card_cents: input.amounts.card.cents(),
            transfer_cents: input.amounts.transfer.cents(),
            check_cents: input.amounts.check.cents(),
            total_cents: total.cents(),
            created_at: now,
        });

        if let Some(stored) = state.transactions.iter_mut().find(|t| t.id == invoice.id) {
            stored.pending_cents = remaining.cents();
            stored.status = TransactionStatus::for_pending(remaining);
            stored.updated_at = now;
        }
        if let Some(client) = state.clients.iter_mut().find(|c| c.id == invoice.client_id) {
            client.debit_cents = client.debit().saturating_sub_floor(total).cents();
            client.updated_at = now;
        }

        info!(
            control_number = %payment.control_number,
            invoice_id = %invoice.id,
            remaining_cents = remaining.cents(),
            "Payment recorded"
        );

        let id = payment.id.clone();
        state.transactions.push(payment);
        state.detail(&id)
    }
}
