//! # Vendor Repository
//!
//! Route salespeople, and the id + name check used at login.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use orderdesk_core::{Vendor, VendorInput};

const VENDOR_COLUMNS: &str = "id, name, route, created_at";

#[derive(Debug, Clone)]
pub struct VendorRepository {
    pool: SqlitePool,
}

impl VendorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        VendorRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Vendor>> {
        let sql = format!("SELECT {VENDOR_COLUMNS} FROM vendors ORDER BY name");

        let vendors = sqlx::query_as::<_, Vendor>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(vendors)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Vendor>> {
        let sql = format!("SELECT {VENDOR_COLUMNS} FROM vendors WHERE id = ?1");

        let vendor = sqlx::query_as::<_, Vendor>(&sql)
            .bind(id.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(vendor)
    }

    /// Inserts a vendor. Uses the supplied id, or generates a UUID.
    pub async fn insert(&self, input: &VendorInput) -> DbResult<Vendor> {
        input.validate()?;

        let id = input
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let vendor = Vendor {
            id,
            name: input.name.trim().to_string(),
            route: route_of(input),
            created_at: Utc::now(),
        };

        debug!(id = %vendor.id, "Inserting vendor");

        sqlx::query("INSERT INTO vendors (id, name, route, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&vendor.id)
            .bind(&vendor.name)
            .bind(&vendor.route)
            .bind(vendor.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("vendor id", &vendor.id),
                other => other,
            })?;

        Ok(vendor)
    }

    /// Updates name and route. The id is immutable.
    pub async fn update(&self, id: &str, input: &VendorInput) -> DbResult<Vendor> {
        input.validate()?;

        debug!(id = %id, "Updating vendor");

        let result = sqlx::query("UPDATE vendors SET name = ?2, route = ?3 WHERE id = ?1")
            .bind(id)
            .bind(input.name.trim())
            .bind(route_of(input))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Vendor", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Vendor", id))
    }

    /// Deletes a vendor. Fails with a foreign key violation once the vendor
    /// has issued documents.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting vendor");

        let result = sqlx::query("DELETE FROM vendors WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Vendor", id));
        }

        Ok(())
    }

    /// Checks a login attempt: the id must exist and the name must match,
    /// ignoring case and surrounding whitespace.
    ///
    /// Returns `None` on mismatch; the caller decides how to report it.
    pub async fn authenticate(&self, id: &str, name: &str) -> DbResult<Option<Vendor>> {
        let vendor = self.get_by_id(id).await?;

        let matched = vendor.filter(|v| v.name.trim().to_lowercase() == name.trim().to_lowercase());
        match &matched {
            Some(v) => info!(vendor_id = %v.id, "Vendor authenticated"),
            None => info!(vendor_id = %id.trim(), "Vendor authentication failed"),
        }

        Ok(matched)
    }
}

fn route_of(input: &VendorInput) -> Option<String> {
    input
        .route
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
}
