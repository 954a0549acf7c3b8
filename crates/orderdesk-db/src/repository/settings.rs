//! # Settings Repository
//!
//! The single settings row (`id = 1`), seeded by the initial migration.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use orderdesk_core::Settings;

const SETTINGS_COLUMNS: &str = "company_name, rnc, address, phone, tax_mode, tax_rate_bps, \
     currency_symbol, invoice_prefix, payment_prefix";

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    pub async fn get(&self) -> DbResult<Settings> {
        let sql = format!("SELECT {SETTINGS_COLUMNS} FROM settings WHERE id = 1");

        let settings = sqlx::query_as::<_, Settings>(&sql)
            .fetch_optional(&self.pool)
            .await?;

        settings.ok_or_else(|| DbError::not_found("Settings", "1"))
    }

    /// Replaces the settings row. New tax configuration applies to documents
    /// created afterwards; existing documents keep their snapshot.
    pub async fn update(&self, settings: &Settings) -> DbResult<Settings> {
        settings.validate()?;

        debug!(
            tax_mode = %settings.tax_mode,
            tax_rate_bps = settings.tax_rate_bps,
            "Updating settings"
        );

        sqlx::query(
            r#"
            UPDATE settings SET
                company_name = ?1,
                rnc = ?2,
                address = ?3,
                phone = ?4,
                tax_mode = ?5,
                tax_rate_bps = ?6,
                currency_symbol = ?7,
                invoice_prefix = ?8,
                payment_prefix = ?9,
                updated_at = ?10
            WHERE id = 1
            "#,
        )
        .bind(settings.company_name.trim())
        .bind(&settings.rnc)
        .bind(&settings.address)
        .bind(&settings.phone)
        .bind(settings.tax_mode)
        .bind(settings.tax_rate_bps)
        .bind(settings.currency_symbol.trim())
        .bind(settings.invoice_prefix.trim().to_uppercase())
        .bind(settings.payment_prefix.trim().to_uppercase())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!("Settings updated");
        self.get().await
    }
}
