//! # Transaction Repository
//!
//! Invoices, payment receipts and the two multi-table writes that create
//! them.
//!
//! ## Atomic Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_invoice                       record_payment                    │
//! │  ──────────────                       ──────────────                    │
//! │  BEGIN IMMEDIATE                      BEGIN IMMEDIATE                   │
//! │  ├─ load settings → TaxConfig         ├─ load invoice (must be invoice) │
//! │  ├─ load client, vendor, products     ├─ validate_payment vs pending    │
//! │  ├─ calculate_totals                  ├─ next control number (REC)      │
//! │  ├─ next control number (FAC)         ├─ INSERT payment transaction     │
//! │  ├─ INSERT transaction                ├─ INSERT payment_reference       │
//! │  ├─ INSERT lines                      ├─ invoice.pending -= total (≥ 0) │
//! │  ├─ products.stock -= qty             ├─ invoice.status = paid at zero  │
//! │  ├─ client.debit += total             ├─ client.debit -= total (≥ 0)    │
//! │  COMMIT                               COMMIT                            │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: nothing is written.     │
//! │  IMMEDIATE takes the write lock up front, so a second writer waits      │
//! │  out `busy_timeout` instead of failing on a read-to-write upgrade.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction as SqlTransaction};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use orderdesk_core::control::{format_control_number, prefix_for};
use orderdesk_core::payment::{apply_payment, validate_payment};
use orderdesk_core::tax::{calculate_totals, LineAmount};
use orderdesk_core::{
    Client, CoreError, Money, NewInvoice, NewPayment, PaymentReference, Product, Settings,
    Transaction, TransactionDetail, TransactionFilter, TransactionKind, TransactionLine,
    TransactionStatus, Vendor,
};

const TRANSACTION_COLUMNS: &str = "id, control_number, kind, client_id, vendor_id, \
     subtotal_cents, tax_cents, total_cents, pending_cents, status, tax_mode, tax_rate_bps, \
     notes, created_at, updated_at";

const LINE_COLUMNS: &str = "id, transaction_id, product_id, code_snapshot, name_snapshot, \
     unit_price_cents, tax_rate_bps, quantity, line_total_cents";

const REFERENCE_COLUMNS: &str = "id, payment_id, invoice_id, cash_cents, card_cents, \
     transfer_cents, check_cents, total_cents, created_at";

/// Default and maximum page sizes for listings.
const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    async fn begin_write(&self) -> DbResult<SqlTransaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Lists transactions, newest first.
    pub async fn list(&self, filter: &TransactionFilter) -> DbResult<Vec<Transaction>> {
        let limit = filter.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

        debug!(
            client_id = ?filter.client_id,
            kind = ?filter.kind,
            status = ?filter.status,
            limit,
            "Listing transactions"
        );

        let sql = format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM transactions
            WHERE (?1 IS NULL OR client_id = ?1)
              AND (?2 IS NULL OR kind = ?2)
              AND (?3 IS NULL OR status = ?3)
            ORDER BY created_at DESC, control_number DESC
            LIMIT ?4
            "#
        );

        let transactions = sqlx::query_as::<_, Transaction>(&sql)
            .bind(&filter.client_id)
            .bind(filter.kind)
            .bind(filter.status)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(transactions)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let mut conn = self.pool.acquire().await?;
        fetch_transaction(&mut conn, id).await
    }

    /// Lines of an invoice, in entry order. Empty for payments.
    pub async fn get_lines(&self, transaction_id: &str) -> DbResult<Vec<TransactionLine>> {
        let sql = format!(
            "SELECT {LINE_COLUMNS} FROM transaction_lines \
             WHERE transaction_id = ?1 ORDER BY position"
        );

        let lines = sqlx::query_as::<_, TransactionLine>(&sql)
            .bind(transaction_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(lines)
    }

    /// Payment references touching a transaction, from either side.
    pub async fn get_references(&self, transaction_id: &str) -> DbResult<Vec<PaymentReference>> {
        let sql = format!(
            "SELECT {REFERENCE_COLUMNS} FROM payment_references \
             WHERE invoice_id = ?1 OR payment_id = ?1 ORDER BY created_at"
        );

        let references = sqlx::query_as::<_, PaymentReference>(&sql)
            .bind(transaction_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(references)
    }

    /// A transaction with its lines and payment references.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<TransactionDetail>> {
        let Some(transaction) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let lines = self.get_lines(id).await?;
        let references = self.get_references(id).await?;

        Ok(Some(TransactionDetail {
            transaction,
            lines,
            references,
        }))
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Atomic writes
    // =========================================================================

    /// Creates an invoice from catalog prices and the company tax settings.
    ///
    /// ## Returns
    /// * `Ok(TransactionDetail)` - The stored invoice with its lines
    /// * `Err(DbError::NotFound)` - Client, vendor or a product is missing
    /// * `Err(DbError::Core)` - Invalid input or tax configuration
    pub async fn create_invoice(
        &self,
        vendor_id: &str,
        input: &NewInvoice,
    ) -> DbResult<TransactionDetail> {
        input.validate()?;

        let mut tx = self.begin_write().await?;

        let settings = fetch_settings(&mut tx).await?;
        let config = settings.tax_config()?;

        let client = fetch_client(&mut tx, &input.client_id)
            .await?
            .ok_or_else(|| DbError::not_found("Client", &input.client_id))?;
        fetch_vendor(&mut tx, vendor_id)
            .await?
            .ok_or_else(|| DbError::not_found("Vendor", vendor_id))?;

        let mut products = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let product = fetch_product(&mut tx, &line.product_id)
                .await?
                .ok_or_else(|| DbError::not_found("Product", &line.product_id))?;
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

        let control_number = next_control_number(
            &mut tx,
            TransactionKind::Invoice,
            prefix_for(&settings, TransactionKind::Invoice),
        )
        .await?;

        let now = Utc::now();
        let invoice = Transaction {
            id: Uuid::new_v4().to_string(),
            control_number,
            kind: TransactionKind::Invoice,
            client_id: client.id.clone(),
            vendor_id: vendor_id.to_string(),
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

        debug!(
            id = %invoice.id,
            control_number = %invoice.control_number,
            lines = products.len(),
            "Inserting invoice"
        );

        insert_transaction(&mut tx, &invoice).await?;

        let mut lines = Vec::with_capacity(products.len());
        for (position, ((product, quantity), line_total)) in
            products.iter().zip(&line_totals).enumerate()
        {
            let line = TransactionLine {
                id: Uuid::new_v4().to_string(),
                transaction_id: invoice.id.clone(),
                product_id: Some(product.id.clone()),
                code_snapshot: product.code.clone(),
                name_snapshot: product.name.clone(),
                unit_price_cents: product.price_cents,
                tax_rate_bps: product.tax_rate_bps,
                quantity: *quantity,
                line_total_cents: line_total.cents(),
            };
            insert_line(&mut tx, &line, position as i64).await?;

            sqlx::query("UPDATE products SET stock = stock - ?2, updated_at = ?3 WHERE id = ?1")
                .bind(&product.id)
                .bind(*quantity)
                .bind(now)
                .execute(&mut *tx)
                .await?;

            lines.push(line);
        }

        sqlx::query("UPDATE clients SET debit_cents = debit_cents + ?2, updated_at = ?3 WHERE id = ?1")
            .bind(&client.id)
            .bind(invoice.total_cents)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            id = %invoice.id,
            control_number = %invoice.control_number,
            client_id = %invoice.client_id,
            total_cents = invoice.total_cents,
            "Invoice created"
        );

        Ok(TransactionDetail {
            transaction: invoice,
            lines,
            references: Vec::new(),
        })
    }

    /// Records a multi-method payment against an invoice.
    ///
    /// Validation runs against the pending balance read inside the same
    /// transaction, so two concurrent payments cannot both pass against a
    /// stale balance.
    ///
    /// ## Returns
    /// * `Ok(TransactionDetail)` - The payment receipt with its reference
    /// * `Err(DbError::NotFound)` - Invoice doesn't exist
    /// * `Err(DbError::Core(CoreError::Payment(_)))` - Rejected payment
    /// * `Err(DbError::Core(CoreError::NotAnInvoice { .. }))` - Target is a receipt
    pub async fn record_payment(
        &self,
        invoice_id: &str,
        vendor_id: &str,
        input: &NewPayment,
    ) -> DbResult<TransactionDetail> {
        let mut tx = self.begin_write().await?;

        let invoice = fetch_transaction(&mut tx, invoice_id)
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", invoice_id))?;

        if !invoice.is_invoice() {
            return Err(CoreError::NotAnInvoice {
                id: invoice.id.clone(),
                kind: invoice.kind.to_string(),
            }
            .into());
        }

        let total = match validate_payment(&input.amounts, invoice.pending()) {
            Ok(total) => total,
            Err(err) => {
                warn!(
                    invoice_id = %invoice.id,
                    pending_cents = invoice.pending_cents,
                    error = %err,
                    "Payment rejected"
                );
                return Err(err.into());
            }
        };

        fetch_vendor(&mut tx, vendor_id)
            .await?
            .ok_or_else(|| DbError::not_found("Vendor", vendor_id))?;

        let settings = fetch_settings(&mut tx).await?;
        let control_number = next_control_number(
            &mut tx,
            TransactionKind::Payment,
            prefix_for(&settings, TransactionKind::Payment),
        )
        .await?;

        let now = Utc::now();
        let payment = Transaction {
            id: Uuid::new_v4().to_string(),
            control_number,
            kind: TransactionKind::Payment,
            client_id: invoice.client_id.clone(),
            vendor_id: vendor_id.to_string(),
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
        insert_transaction(&mut tx, &payment).await?;

        let reference = PaymentReference {
            id: Uuid::new_v4().to_string(),
            payment_id: payment.id.clone(),
            invoice_id: invoice.id.clone(),
            cash_cents: input.amounts.cash.cents(),
            card_cents: input.amounts.card.cents(),
            transfer_cents: input.amounts.transfer.cents(),
            check_cents: input.amounts.check.cents(),
            total_cents: total.cents(),
            created_at: now,
        };
        insert_reference(&mut tx, &reference).await?;

        let remaining = apply_payment(invoice.pending(), total);
        sqlx::query(
            "UPDATE transactions SET pending_cents = ?2, status = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(&invoice.id)
        .bind(remaining.cents())
        .bind(TransactionStatus::for_pending(remaining))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE clients SET debit_cents = MAX(debit_cents - ?2, 0), updated_at = ?3 WHERE id = ?1",
        )
        .bind(&invoice.client_id)
        .bind(total.cents())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            payment_id = %payment.id,
            control_number = %payment.control_number,
            invoice_id = %invoice.id,
            total_cents = total.cents(),
            remaining_cents = remaining.cents(),
            "Payment recorded"
        );

        Ok(TransactionDetail {
            transaction: payment,
            lines: Vec::new(),
            references: vec![reference],
        })
    }
}

// =============================================================================
// Connection-level helpers (usable inside a transaction)
// =============================================================================

async fn fetch_transaction(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Transaction>> {
    let sql = format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1");

    let transaction = sqlx::query_as::<_, Transaction>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(transaction)
}

async fn fetch_settings(conn: &mut SqliteConnection) -> DbResult<Settings> {
    sqlx::query_as::<_, Settings>(
        "SELECT company_name, rnc, address, phone, tax_mode, tax_rate_bps, \
         currency_symbol, invoice_prefix, payment_prefix FROM settings WHERE id = 1",
    )
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Settings", "1"))
}

async fn fetch_client(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Client>> {
    let client = sqlx::query_as::<_, Client>(
        "SELECT id, name, rnc, address, phone, credit_cents, debit_cents, created_at, updated_at \
         FROM clients WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(client)
}

async fn fetch_vendor(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Vendor>> {
    let vendor = sqlx::query_as::<_, Vendor>(
        "SELECT id, name, route, created_at FROM vendors WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(vendor)
}

async fn fetch_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT id, code, name, price_cents, tax_rate_bps, stock, category, created_at, updated_at \
         FROM products WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

/// Bumps the per-kind counter and formats the next control number.
async fn next_control_number(
    conn: &mut SqliteConnection,
    kind: TransactionKind,
    prefix: &str,
) -> DbResult<String> {
    let sequence: i64 = sqlx::query_scalar(
        "UPDATE document_counters SET value = value + 1 WHERE kind = ?1 RETURNING value",
    )
    .bind(kind)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::RowNotFound => DbError::Internal(format!("missing document counter for {kind}")),
        other => other.into(),
    })?;

    Ok(format_control_number(prefix, sequence))
}

async fn insert_transaction(conn: &mut SqliteConnection, t: &Transaction) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, control_number, kind, client_id, vendor_id,
            subtotal_cents, tax_cents, total_cents, pending_cents, status,
            tax_mode, tax_rate_bps, notes, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
    )
    .bind(&t.id)
    .bind(&t.control_number)
    .bind(t.kind)
    .bind(&t.client_id)
    .bind(&t.vendor_id)
    .bind(t.subtotal_cents)
    .bind(t.tax_cents)
    .bind(t.total_cents)
    .bind(t.pending_cents)
    .bind(t.status)
    .bind(t.tax_mode)
    .bind(t.tax_rate_bps)
    .bind(&t.notes)
    .bind(t.created_at)
    .bind(t.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_line(conn: &mut SqliteConnection, line: &TransactionLine, position: i64) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO transaction_lines (
            id, transaction_id, product_id, code_snapshot, name_snapshot,
            unit_price_cents, tax_rate_bps, quantity, line_total_cents, position
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&line.id)
    .bind(&line.transaction_id)
    .bind(&line.product_id)
    .bind(&line.code_snapshot)
    .bind(&line.name_snapshot)
    .bind(line.unit_price_cents)
    .bind(line.tax_rate_bps)
    .bind(line.quantity)
    .bind(line.line_total_cents)
    .bind(position)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_reference(conn: &mut SqliteConnection, r: &PaymentReference) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO payment_references (
            id, payment_id, invoice_id, cash_cents, card_cents,
            transfer_cents, check_cents, total_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&r.id)
    .bind(&r.payment_id)
    .bind(&r.invoice_id)
    .bind(r.cash_cents)
    .bind(r.card_cents)
    .bind(r.transfer_cents)
    .bind(r.check_cents)
    .bind(r.total_cents)
    .bind(r.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Sum of payments recorded against an invoice.
pub async fn total_paid(pool: &SqlitePool, invoice_id: &str) -> DbResult<Money> {
    let cents: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(total_cents), 0) FROM payment_references WHERE invoice_id = ?1",
    )
    .bind(invoice_id)
    .fetch_one(pool)
    .await?;

    Ok(Money::from_cents(cents))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use orderdesk_core::{
        ClientInput, InvoiceLineInput, PaymentAllocation, PaymentError, ProductInput, TaxMode,
        VendorInput,
    };

    struct Fixture {
        db: Database,
        client: Client,
        vendor_id: String,
        agua: Product,
        jugo: Product,
    }

    async fn fixture() -> Fixture {
        fixture_on(DbConfig::in_memory()).await
    }

    async fn fixture_on(config: DbConfig) -> Fixture {
        let db = Database::new(config).await.unwrap();

        let client = db
            .clients()
            .insert(&ClientInput {
                name: "Colmado Don Pedro".to_string(),
                rnc: None,
                address: None,
                phone: None,
                credit_cents: 0,
            })
            .await
            .unwrap();

        let vendor = db
            .vendors()
            .insert(&VendorInput {
                id: Some("V001".to_string()),
                name: "Juan Perez".to_string(),
                route: None,
            })
            .await
            .unwrap();

        let product = |code: &str, price_cents: i64| ProductInput {
            code: code.to_string(),
            name: code.to_string(),
            price_cents,
            tax_rate_bps: 1_800,
            stock: 50,
            category: None,
        };
        let agua = db.products().insert(&product("AGUA", 10_000)).await.unwrap();
        let jugo = db.products().insert(&product("JUGO", 2_550)).await.unwrap();

        Fixture {
            db,
            client,
            vendor_id: vendor.id,
            agua,
            jugo,
        }
    }

    fn invoice_for(f: &Fixture, lines: &[(&Product, i64)]) -> NewInvoice {
        NewInvoice {
            client_id: f.client.id.clone(),
            lines: lines
                .iter()
                .map(|(p, qty)| InvoiceLineInput {
                    product_id: p.id.clone(),
                    quantity: *qty,
                })
                .collect(),
            notes: None,
        }
    }

    fn payment(cash: i64, card: i64, transfer: i64, check: i64) -> NewPayment {
        NewPayment {
            amounts: PaymentAllocation::from_cents(cash, card, transfer, check),
            notes: None,
        }
    }

    async fn client_debit(f: &Fixture) -> i64 {
        f.db.clients()
            .get_by_id(&f.client.id)
            .await
            .unwrap()
            .unwrap()
            .debit_cents
    }

    #[tokio::test]
    async fn test_create_invoice_additive() {
        let f = fixture().await;
        let detail = f
            .db
            .transactions()
            .create_invoice(&f.vendor_id, &invoice_for(&f, &[(&f.agua, 2)]))
            .await
            .unwrap();

        let invoice = &detail.transaction;
        assert_eq!(invoice.control_number, "FAC-000001");
        assert_eq!(invoice.subtotal_cents, 20_000);
        assert_eq!(invoice.tax_cents, 3_600);
        assert_eq!(invoice.total_cents, 23_600);
        assert_eq!(invoice.pending_cents, 23_600);
        assert_eq!(invoice.status, TransactionStatus::Pending);
        assert_eq!(detail.lines.len(), 1);

        let stock = f.db.products().get_by_id(&f.agua.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 48);
        assert_eq!(client_debit(&f).await, 23_600);
    }

    #[tokio::test]
    async fn test_create_invoice_uses_inclusive_settings() {
        let f = fixture().await;
        let mut settings = f.db.settings().get().await.unwrap();
        settings.tax_mode = TaxMode::Inclusive;
        f.db.settings().update(&settings).await.unwrap();

        let detail = f
            .db
            .transactions()
            .create_invoice(&f.vendor_id, &invoice_for(&f, &[(&f.agua, 2)]))
            .await
            .unwrap();

        assert_eq!(detail.transaction.subtotal_cents, 16_949);
        assert_eq!(detail.transaction.tax_cents, 3_051);
        assert_eq!(detail.transaction.total_cents, 20_000);
        assert_eq!(detail.transaction.tax_mode, TaxMode::Inclusive);
    }

    #[tokio::test]
    async fn test_create_invoice_with_missing_product_writes_nothing() {
        let f = fixture().await;
        let mut input = invoice_for(&f, &[(&f.agua, 2)]);
        input.lines.push(InvoiceLineInput {
            product_id: "missing".to_string(),
            quantity: 1,
        });

        let err = f
            .db
            .transactions()
            .create_invoice(&f.vendor_id, &input)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        assert_eq!(f.db.transactions().count().await.unwrap(), 0);
        assert_eq!(client_debit(&f).await, 0);
        let stock = f.db.products().get_by_id(&f.agua.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 50);
    }

    #[tokio::test]
    async fn test_full_payment_marks_invoice_paid() {
        let f = fixture().await;
        let repo = f.db.transactions();
        let invoice = repo
            .create_invoice(&f.vendor_id, &invoice_for(&f, &[(&f.agua, 2)]))
            .await
            .unwrap()
            .transaction;

        let receipt = repo
            .record_payment(&invoice.id, &f.vendor_id, &payment(20_000, 3_600, 0, 0))
            .await
            .unwrap();
        assert_eq!(receipt.transaction.control_number, "REC-000001");
        assert_eq!(receipt.transaction.kind, TransactionKind::Payment);
        assert_eq!(receipt.transaction.total_cents, 23_600);
        assert_eq!(receipt.references[0].card_cents, 3_600);

        let stored = repo.get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.pending_cents, 0);
        assert_eq!(stored.status, TransactionStatus::Paid);
        assert_eq!(client_debit(&f).await, 0);

        let detail = repo.get_detail(&invoice.id).await.unwrap().unwrap();
        assert_eq!(detail.references.len(), 1);
        assert_eq!(total_paid(f.db.pool(), &invoice.id).await.unwrap().cents(), 23_600);
    }

    #[tokio::test]
    async fn test_partial_payments_accumulate() {
        let f = fixture().await;
        let repo = f.db.transactions();
        let invoice = repo
            .create_invoice(&f.vendor_id, &invoice_for(&f, &[(&f.jugo, 4)]))
            .await
            .unwrap()
            .transaction;
        // 4 × 25.50 = 102.00, + 18% = 120.36
        assert_eq!(invoice.total_cents, 12_036);

        repo.record_payment(&invoice.id, &f.vendor_id, &payment(5_000, 0, 0, 0))
            .await
            .unwrap();
        let stored = repo.get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.pending_cents, 7_036);
        assert_eq!(stored.status, TransactionStatus::Pending);

        repo.record_payment(&invoice.id, &f.vendor_id, &payment(0, 0, 7_036, 0))
            .await
            .unwrap();
        let stored = repo.get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TransactionStatus::Paid);
    }

    #[tokio::test]
    async fn test_rejected_payment_changes_nothing() {
        let f = fixture().await;
        let repo = f.db.transactions();
        let invoice = repo
            .create_invoice(&f.vendor_id, &invoice_for(&f, &[(&f.agua, 1)]))
            .await
            .unwrap()
            .transaction;
        let count_before = repo.count().await.unwrap();

        let err = repo
            .record_payment(&invoice.id, &f.vendor_id, &payment(10_000, 5_000, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Payment(PaymentError::ExceedsPending { .. }))
        ));

        let err = repo
            .record_payment(&invoice.id, &f.vendor_id, &payment(0, 0, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Payment(PaymentError::NothingToApply))
        ));

        let stored = repo.get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.pending_cents, invoice.pending_cents);
        assert_eq!(repo.count().await.unwrap(), count_before);
        assert_eq!(client_debit(&f).await, invoice.total_cents);
    }

    #[tokio::test]
    async fn test_cannot_pay_a_receipt() {
        let f = fixture().await;
        let repo = f.db.transactions();
        let invoice = repo
            .create_invoice(&f.vendor_id, &invoice_for(&f, &[(&f.agua, 1)]))
            .await
            .unwrap()
            .transaction;
        let receipt = repo
            .record_payment(&invoice.id, &f.vendor_id, &payment(1_000, 0, 0, 0))
            .await
            .unwrap()
            .transaction;

        let err = repo
            .record_payment(&receipt.id, &f.vendor_id, &payment(1, 0, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::NotAnInvoice { .. })));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let f = fixture().await;
        let repo = f.db.transactions();
        let invoice = repo
            .create_invoice(&f.vendor_id, &invoice_for(&f, &[(&f.agua, 1)]))
            .await
            .unwrap()
            .transaction;
        repo.create_invoice(&f.vendor_id, &invoice_for(&f, &[(&f.jugo, 1)]))
            .await
            .unwrap();
        repo.record_payment(&invoice.id, &f.vendor_id, &payment(invoice.total_cents, 0, 0, 0))
            .await
            .unwrap();

        let all = repo.list(&TransactionFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let invoices = repo
            .list(&TransactionFilter {
                kind: Some(TransactionKind::Invoice),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(invoices.len(), 2);

        let open = repo
            .list(&TransactionFilter {
                kind: Some(TransactionKind::Invoice),
                status: Some(TransactionStatus::Pending),
                client_id: Some(f.client.id.clone()),
                limit: Some(10),
            })
            .await
            .unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].control_number, "FAC-000002");
    }

    #[tokio::test]
    async fn test_referenced_client_cannot_be_deleted() {
        let f = fixture().await;
        f.db.transactions()
            .create_invoice(&f.vendor_id, &invoice_for(&f, &[(&f.agua, 1)]))
            .await
            .unwrap();

        assert!(matches!(
            f.db.clients().delete(&f.client.id).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
        assert!(matches!(
            f.db.vendors().delete(&f.vendor_id).await,
            Err(DbError::ForeignKeyViolation { .. })
        ));
    }

    #[tokio::test]
    async fn test_deleted_product_keeps_line_snapshot() {
        let f = fixture().await;
        let detail = f
            .db
            .transactions()
            .create_invoice(&f.vendor_id, &invoice_for(&f, &[(&f.agua, 1)]))
            .await
            .unwrap();

        f.db.products().delete(&f.agua.id).await.unwrap();

        let lines = f
            .db
            .transactions()
            .get_lines(&detail.transaction.id)
            .await
            .unwrap();
        assert_eq!(lines[0].product_id, None);
        assert_eq!(lines[0].code_snapshot, "AGUA");
    }

    #[tokio::test]
    async fn test_payment_summing_past_i64_writes_nothing() {
        let f = fixture().await;
        let repo = f.db.transactions();
        let invoice = repo
            .create_invoice(&f.vendor_id, &invoice_for(&f, &[(&f.agua, 1)]))
            .await
            .unwrap()
            .transaction;

        let err = repo
            .record_payment(&invoice.id, &f.vendor_id, &payment(i64::MAX, 1, 0, 0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Payment(PaymentError::TotalOutOfRange))
        ));

        let stored = repo.get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(stored.pending_cents, 11_800);
        assert_eq!(stored.status, TransactionStatus::Pending);
        assert_eq!(repo.count().await.unwrap(), 1);
        assert_eq!(client_debit(&f).await, 11_800);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_on_a_file_database() {
        let path = std::env::temp_dir().join(format!("orderdesk-{}.db", Uuid::new_v4()));
        let config = DbConfig::new(&path)
            .max_connections(8)
            .connect_timeout(std::time::Duration::from_secs(15));
        let f = fixture_on(config).await;

        let invoice = f
            .db
            .transactions()
            .create_invoice(&f.vendor_id, &invoice_for(&f, &[(&f.agua, 2)]))
            .await
            .unwrap()
            .transaction;

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let repo = f.db.transactions();
            let (invoice_id, vendor_id) = (invoice.id.clone(), f.vendor_id.clone());
            tasks.push(tokio::spawn(async move {
                repo.record_payment(&invoice_id, &vendor_id, &payment(100, 0, 0, 0))
                    .await
                    .map(|_| ())
            }));
        }
        for _ in 0..8 {
            let repo = f.db.transactions();
            let vendor_id = f.vendor_id.clone();
            let input = invoice_for(&f, &[(&f.jugo, 1)]);
            tasks.push(tokio::spawn(async move {
                repo.create_invoice(&vendor_id, &input).await.map(|_| ())
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let repo = f.db.transactions();
        let paid = repo.get_by_id(&invoice.id).await.unwrap().unwrap();
        assert_eq!(paid.pending_cents, 23_600 - 800);

        let invoices = repo
            .list(&TransactionFilter {
                kind: Some(TransactionKind::Invoice),
                ..TransactionFilter::default()
            })
            .await
            .unwrap();
        let mut numbers: Vec<_> = invoices.iter().map(|t| t.control_number.clone()).collect();
        numbers.sort();
        numbers.dedup();
        assert_eq!(numbers.len(), 9);

        let jugo = f.db.products().get_by_id(&f.jugo.id).await.unwrap().unwrap();
        assert_eq!(jugo.stock, 42);
        // 23_600 + 8 × 3_009 - 8 × 100
        assert_eq!(client_debit(&f).await, 46_872);

        f.db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let mut file = path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}
