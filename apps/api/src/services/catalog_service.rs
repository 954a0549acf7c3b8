//! Products, clients and vendors.
//!
//! ```text
//! GET    /api/{products,clients}?q=&limit=   search / list
//! GET    /api/vendors                        list
//! GET    /api/{entity}/{id}                  one record
//! POST   /api/{entity}                       create  → 201
//! PUT    /api/{entity}/{id}                  update
//! DELETE /api/{entity}/{id}                  delete  → 204 (409 if referenced)
//! ```

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use orderdesk_core::validation::{validate_search_query, validate_uuid};
use orderdesk_core::{Client, ClientInput, Product, ProductInput, Vendor, VendorInput};

use crate::error::ApiError;
use crate::AppState;

const DEFAULT_LIST_LIMIT: u32 = 50;
const MAX_LIST_LIMIT: u32 = 500;

/// `?q=&limit=` for the list endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub q: String,
    pub limit: Option<u32>,
}

impl ListQuery {
    fn parts(&self) -> Result<(String, u32), ApiError> {
        let query = validate_search_query(&self.q)?;
        let limit = self
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT);
        Ok((query, limit))
    }
}

// =============================================================================
// Products
// =============================================================================

pub async fn list_products(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let Query(query) = query?;
    let (q, limit) = query.parts()?;
    Ok(Json(state.db.products().search(&q, limit).await?))
}

pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    validate_uuid(&id)?;
    state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", &id))
}

pub async fn create_product(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ProductInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let Json(input) = body?;
    let product = state.db.products().insert(&input).await?;
    info!(id = %product.id, code = %product.code, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<ProductInput>, JsonRejection>,
) -> Result<Json<Product>, ApiError> {
    validate_uuid(&id)?;
    let Json(input) = body?;
    Ok(Json(state.db.products().update(&id, &input).await?))
}

pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    validate_uuid(&id)?;
    state.db.products().delete(&id).await?;
    info!(id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Clients
// =============================================================================

pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Client>>, ApiError> {
    let Query(query) = query?;
    let (q, limit) = query.parts()?;
    Ok(Json(state.db.clients().search(&q, limit).await?))
}

pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Client>, ApiError> {
    validate_uuid(&id)?;
    state
        .db
        .clients()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Client", &id))
}

pub async fn create_client(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ClientInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Client>), ApiError> {
    let Json(input) = body?;
    let client = state.db.clients().insert(&input).await?;
    info!(id = %client.id, "Client created");
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn update_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<ClientInput>, JsonRejection>,
) -> Result<Json<Client>, ApiError> {
    validate_uuid(&id)?;
    let Json(input) = body?;
    Ok(Json(state.db.clients().update(&id, &input).await?))
}

pub async fn delete_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    validate_uuid(&id)?;
    state.db.clients().delete(&id).await?;
    info!(id = %id, "Client deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Vendors
// =============================================================================

pub async fn list_vendors(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Vendor>>, ApiError> {
    Ok(Json(state.db.vendors().list().await?))
}

pub async fn get_vendor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vendor>, ApiError> {
    state
        .db
        .vendors()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Vendor", &id))
}

pub async fn create_vendor(
    State(state): State<Arc<AppState>>,
    body: Result<Json<VendorInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Vendor>), ApiError> {
    let Json(input) = body?;
    let vendor = state.db.vendors().insert(&input).await?;
    info!(id = %vendor.id, "Vendor created");
    Ok((StatusCode::CREATED, Json(vendor)))
}

pub async fn update_vendor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<VendorInput>, JsonRejection>,
) -> Result<Json<Vendor>, ApiError> {
    let Json(input) = body?;
    Ok(Json(state.db.vendors().update(&id, &input).await?))
}

pub async fn delete_vendor(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.db.vendors().delete(&id).await?;
    info!(id = %id, "Vendor deleted");
    Ok(StatusCode::NO_CONTENT)
}
