//! # SessionContext
//!
//! The explicit working context of a logged-in vendor: who they are, the
//! company settings in force, and the order being built.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  login(id, name)                                                        │
//! │    └─► session = Some(vendor, settings)      draft = empty              │
//! │                                                                         │
//! │  start_order(client) → add_product … → draft_totals()   (local preview) │
//! │                                                                         │
//! │  submit_draft()                                                         │
//! │    └─► store.create_invoice(draft.to_invoice())                         │
//! │        ok  → draft lines cleared, client kept                           │
//! │        err → draft kept, so the vendor can fix and resubmit             │
//! │                                                                         │
//! │  logout()                                                               │
//! │    └─► session = None                        draft = empty              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use orderdesk_core::order::OrderDraft;
use orderdesk_core::payment::{preview_payment, PaymentPreview};
use orderdesk_core::{
    LoginRequest, NewPayment, PaymentAllocation, Product, SessionInfo, Settings, TaxBreakdown,
    Transaction, TransactionDetail, Vendor,
};
use tracing::info;

use crate::error::{ClientError, ClientResult};
use crate::store::OrderStore;

pub struct SessionContext<S: OrderStore> {
    store: S,
    session: Option<SessionInfo>,
    draft: OrderDraft,
}

impl<S: OrderStore> SessionContext<S> {
    pub fn new(store: S) -> Self {
        SessionContext {
            store,
            session: None,
            draft: OrderDraft::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // =========================================================================
    // Session
    // =========================================================================

    pub async fn login(&mut self, vendor_id: &str, name: &str) -> ClientResult<&SessionInfo> {
        let response = self
            .store
            .login(&LoginRequest {
                vendor_id: vendor_id.trim().to_string(),
                name: name.trim().to_string(),
            })
            .await?;

        info!(vendor_id = %response.session.vendor.id, "Session started");
        self.draft = OrderDraft::new();
        Ok(self.session.insert(response.session))
    }

    /// Ends the session locally even if the store call fails.
    pub async fn logout(&mut self) -> ClientResult<()> {
        let result = self.store.logout().await;
        self.session = None;
        self.draft = OrderDraft::new();
        result
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&SessionInfo> {
        self.session.as_ref()
    }

    pub fn vendor(&self) -> Option<&Vendor> {
        self.session.as_ref().map(|s| &s.vendor)
    }

    pub fn settings(&self) -> Option<&Settings> {
        self.session.as_ref().map(|s| &s.settings)
    }

    /// Re-reads settings from the store, e.g. after an admin changed the
    /// tax mode.
    pub async fn refresh_settings(&mut self) -> ClientResult<&Settings> {
        let settings = self.store.get_settings().await?;
        let session = self.active_mut()?;
        session.settings = settings;
        Ok(&session.settings)
    }

    fn active(&self) -> ClientResult<&SessionInfo> {
        self.session
            .as_ref()
            .ok_or_else(|| ClientError::Unauthorized("not logged in".to_string()))
    }

    fn active_mut(&mut self) -> ClientResult<&mut SessionInfo> {
        self.session
            .as_mut()
            .ok_or_else(|| ClientError::Unauthorized("not logged in".to_string()))
    }

    // =========================================================================
    // Draft order
    // =========================================================================

    pub fn draft(&self) -> &OrderDraft {
        &self.draft
    }

    /// Starts a fresh order for a client, discarding any current draft.
    pub fn start_order(&mut self, client_id: &str) -> ClientResult<()> {
        self.active()?;
        self.draft = OrderDraft::for_client(client_id);
        Ok(())
    }

    pub fn add_product(&mut self, product: &Product, quantity: i64) -> ClientResult<()> {
        self.active()?;
        Ok(self.draft.add_product(product, quantity)?)
    }

    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> ClientResult<()> {
        Ok(self.draft.update_quantity(product_id, quantity)?)
    }

    pub fn remove_product(&mut self, product_id: &str) -> ClientResult<()> {
        Ok(self.draft.remove_product(product_id)?)
    }

    /// Totals of the draft under the session's tax settings.
    pub fn draft_totals(&self) -> ClientResult<TaxBreakdown> {
        let config = self.active()?.settings.tax_config()?;
        Ok(self.draft.totals(&config)?)
    }

    /// Sends the draft as an invoice. The draft is cleared only on success.
    pub async fn submit_draft(&mut self) -> ClientResult<TransactionDetail> {
        self.active()?;
        let invoice = self.draft.to_invoice()?;

        let detail = self.store.create_invoice(&invoice).await?;
        self.draft.clear();
        Ok(detail)
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Local check of a payment against an invoice's pending balance.
    pub fn preview_payment(&self, invoice: &Transaction, amounts: &PaymentAllocation) -> PaymentPreview {
        preview_payment(amounts, invoice.pending())
    }

    pub async fn pay(
        &self,
        invoice_id: &str,
        amounts: PaymentAllocation,
        notes: Option<String>,
    ) -> ClientResult<TransactionDetail> {
        self.active()?;
        self.store
            .record_payment(invoice_id, &NewPayment { amounts, notes })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use orderdesk_core::{ClientInput, ProductInput, TaxMode, TransactionStatus};

    async fn session_with_catalog() -> (SessionContext<MemoryStore>, String, Product) {
        let mut ctx = SessionContext::new(MemoryStore::new().with_vendor("V001", "Juan Perez"));
        ctx.login("V001", "juan perez").await.unwrap();

        let client = ctx
            .store()
            .create_client(&ClientInput {
                name: "Supermercado La Fe".to_string(),
                rnc: None,
                address: None,
                phone: None,
                credit_cents: 0,
            })
            .await
            .unwrap();
        let product = ctx
            .store()
            .create_product(&ProductInput {
                code: "ARROZ".to_string(),
                name: "Arroz 10lb".to_string(),
                price_cents: 10_000,
                tax_rate_bps: 1_800,
                stock: 20,
                category: None,
            })
            .await
            .unwrap();

        (ctx, client.id, product)
    }

    #[tokio::test]
    async fn test_login_populates_context() {
        let (ctx, _, _) = session_with_catalog().await;
        assert!(ctx.is_logged_in());
        assert_eq!(ctx.vendor().unwrap().id, "V001");
        assert_eq!(ctx.settings().unwrap().invoice_prefix, "FAC");
    }

    #[tokio::test]
    async fn test_draft_submit_and_pay() {
        let (mut ctx, client_id, product) = session_with_catalog().await;

        ctx.start_order(&client_id).unwrap();
        ctx.add_product(&product, 1).unwrap();
        ctx.add_product(&product, 1).unwrap();
        assert_eq!(ctx.draft().item_count(), 1);

        let preview = ctx.draft_totals().unwrap();
        assert_eq!(preview.total.cents(), 23_600);

        let invoice = ctx.submit_draft().await.unwrap().transaction;
        assert_eq!(invoice.total_cents, 23_600);
        assert!(ctx.draft().is_empty());
        // Next order for the same client starts right away
        assert_eq!(ctx.draft().client_id.as_deref(), Some(client_id.as_str()));

        let check = ctx.preview_payment(&invoice, &PaymentAllocation::from_cents(30_000, 0, 0, 0));
        assert!(!check.valid);

        ctx.pay(&invoice.id, PaymentAllocation::from_cents(23_600, 0, 0, 0), None)
            .await
            .unwrap();
        let stored = ctx.store().get_transaction(&invoice.id).await.unwrap();
        assert_eq!(stored.transaction.status, TransactionStatus::Paid);
    }

    #[tokio::test]
    async fn test_failed_submit_keeps_draft() {
        let (mut ctx, _, product) = session_with_catalog().await;

        ctx.start_order("no-such-client").unwrap();
        ctx.add_product(&product, 3).unwrap();

        let err = ctx.submit_draft().await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
        assert_eq!(ctx.draft().total_quantity(), 3);
    }

    #[tokio::test]
    async fn test_refresh_settings_changes_preview() {
        let (mut ctx, client_id, product) = session_with_catalog().await;
        ctx.start_order(&client_id).unwrap();
        ctx.add_product(&product, 2).unwrap();

        let mut settings = ctx.settings().unwrap().clone();
        settings.tax_mode = TaxMode::Inclusive;
        ctx.store().update_settings(&settings).await.unwrap();
        ctx.refresh_settings().await.unwrap();

        let totals = ctx.draft_totals().unwrap();
        assert_eq!(totals.total.cents(), 20_000);
        assert_eq!(totals.tax.cents(), 3_051);
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let (mut ctx, client_id, product) = session_with_catalog().await;
        ctx.start_order(&client_id).unwrap();
        ctx.add_product(&product, 1).unwrap();

        ctx.logout().await.unwrap();
        assert!(!ctx.is_logged_in());
        assert!(ctx.draft().is_empty());
        assert!(matches!(ctx.draft_totals(), Err(ClientError::Unauthorized(_))));
        assert!(matches!(ctx.start_order(&client_id), Err(ClientError::Unauthorized(_))));
    }
}
