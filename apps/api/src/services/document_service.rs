//! Printable invoices and receipts.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use tracing::info;

use orderdesk_core::TransactionKind;

use crate::error::ApiError;
use crate::pdf::DocumentData;
use crate::AppState;

/// `GET /api/transactions/{id}/pdf` and `GET /api/facturas/pdf/{id}`
///
/// Rendering is CPU-bound, so it runs on the blocking pool.
pub async fn transaction_pdf(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let data = gather(&state, &id).await?;
    let control_number = data.detail.transaction.control_number.clone();

    let renderer = state.pdf.clone();
    let bytes = tokio::task::spawn_blocking(move || renderer.render(&data))
        .await
        .map_err(|e| ApiError::Internal(format!("PDF task failed: {}", e)))??;

    info!(control_number = %control_number, size = bytes.len(), "PDF rendered");

    Ok((
        [
            (CONTENT_TYPE, "application/pdf".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("inline; filename=\"{control_number}.pdf\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// Loads the transaction and everything printed alongside it.
async fn gather(state: &AppState, id: &str) -> Result<DocumentData, ApiError> {
    let transactions = state.db.transactions();

    let detail = transactions
        .get_detail(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Transaction", id))?;

    let transaction = &detail.transaction;

    let client = state
        .db
        .clients()
        .get_by_id(&transaction.client_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Client", &transaction.client_id))?;

    let vendor_name = state
        .db
        .vendors()
        .get_by_id(&transaction.vendor_id)
        .await?
        .map(|v| v.name)
        .unwrap_or_else(|| transaction.vendor_id.clone());

    let mut invoice_numbers = Vec::new();
    if transaction.kind == TransactionKind::Payment {
        for reference in &detail.references {
            let number = transactions
                .get_by_id(&reference.invoice_id)
                .await?
                .map(|invoice| invoice.control_number)
                .unwrap_or_else(|| reference.invoice_id.clone());
            invoice_numbers.push(number);
        }
    }

    let settings = state.db.settings().get().await?;

    Ok(DocumentData {
        settings,
        detail,
        client,
        vendor_name,
        invoice_numbers,
    })
}
