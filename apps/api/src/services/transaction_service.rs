//! Invoices, payments and their listing.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use tracing::info;

use orderdesk_core::{NewInvoice, NewPayment, Transaction, TransactionDetail, TransactionFilter};

use crate::auth::Session;
use crate::error::ApiError;
use crate::AppState;

/// `GET /api/transactions?client_id=&kind=&status=&limit=`
pub async fn list(
    State(state): State<Arc<AppState>>,
    filter: Result<Query<TransactionFilter>, QueryRejection>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let Query(filter) = filter?;
    Ok(Json(state.db.transactions().list(&filter).await?))
}

/// `GET /api/transactions/{id}` with lines and payment references.
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TransactionDetail>, ApiError> {
    state
        .db
        .transactions()
        .get_detail(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Transaction", &id))
}

/// `POST /api/transactions/invoices`
///
/// The invoice is issued by the session's vendor.
pub async fn create_invoice(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    body: Result<Json<NewInvoice>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionDetail>), ApiError> {
    let Json(input) = body?;

    let detail = state
        .db
        .transactions()
        .create_invoice(&session.vendor.id, &input)
        .await?;

    info!(
        control_number = %detail.transaction.control_number,
        vendor_id = %session.vendor.id,
        "Invoice issued via API"
    );
    Ok((StatusCode::CREATED, Json(detail)))
}

/// `POST /api/transactions/{id}/payments`
///
/// Records a receipt against invoice `id`. A rejected payment answers 422 and
/// leaves the invoice untouched.
pub async fn record_payment(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(invoice_id): Path<String>,
    body: Result<Json<NewPayment>, JsonRejection>,
) -> Result<(StatusCode, Json<TransactionDetail>), ApiError> {
    let Json(input) = body?;

    let detail = state
        .db
        .transactions()
        .record_payment(&invoice_id, &session.vendor.id, &input)
        .await?;

    Ok((StatusCode::CREATED, Json(detail)))
}
