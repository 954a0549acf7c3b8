//! Live calculations for the order and payment screens.
//!
//! Nothing here writes. Clients call these while the vendor is typing; the
//! figures match what invoice creation and payment recording would store.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use orderdesk_core::payment::{preview_payment, PaymentPreview};
use orderdesk_core::tax::{calculate_totals, LineAmount};
use orderdesk_core::{Money, PaymentAllocation, TaxBreakdown, TaxConfig, TaxMode, TaxRate};

use crate::error::ApiError;
use crate::AppState;

/// Body of `POST /api/calc/totals`. Mode and rate default to the company
/// settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalsRequest {
    pub lines: Vec<LineAmount>,
    #[serde(default)]
    pub tax_mode: Option<TaxMode>,
    /// Percentage, e.g. `18.0`
    #[serde(default)]
    pub tax_rate: Option<f64>,
}

/// Body of `POST /api/calc/payment`. Either `pending` or `invoice_id` must
/// be given; the invoice's stored balance wins when both are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPreviewRequest {
    #[serde(default)]
    pub amounts: PaymentAllocation,
    #[serde(default)]
    pub pending: Option<Money>,
    #[serde(default)]
    pub invoice_id: Option<String>,
}

/// `POST /api/calc/totals`
pub async fn totals(
    State(state): State<Arc<AppState>>,
    body: Result<Json<TotalsRequest>, JsonRejection>,
) -> Result<Json<TaxBreakdown>, ApiError> {
    let Json(req) = body?;

    let config = match (req.tax_mode, req.tax_rate) {
        (Some(mode), Some(pct)) => TaxConfig::new(mode, pct)?,
        (mode, rate) => {
            let defaults = state.db.settings().get().await?.tax_config()?;
            TaxConfig {
                mode: mode.unwrap_or(defaults.mode),
                rate: match rate {
                    Some(pct) => TaxRate::from_percentage(pct)?,
                    None => defaults.rate,
                },
            }
        }
    };

    Ok(Json(calculate_totals(&req.lines, &config)?))
}

/// `POST /api/calc/payment`
///
/// Always answers 200; a payment that would be rejected comes back with
/// `valid: false` and the reason.
pub async fn payment(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PaymentPreviewRequest>, JsonRejection>,
) -> Result<Json<PaymentPreview>, ApiError> {
    let Json(req) = body?;

    let pending = match (&req.invoice_id, req.pending) {
        (Some(id), _) => state
            .db
            .transactions()
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found("Transaction", id))?
            .pending(),
        (None, Some(pending)) => pending,
        (None, None) => {
            return Err(ApiError::Validation(
                "pending or invoice_id is required".to_string(),
            ))
        }
    };

    Ok(Json(preview_payment(&req.amounts, pending)))
}
