//! # Client Repository
//!
//! Customer accounts. `debit_cents` is never written from here: it moves
//! only inside the invoice and payment transactions.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use orderdesk_core::{Client, ClientInput};

const CLIENT_COLUMNS: &str =
    "id, name, rnc, address, phone, credit_cents, debit_cents, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Lists clients by name, optionally filtered by name or RNC.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Client>> {
        let query = query.trim();
        debug!(query = %query, limit = %limit, "Searching clients");

        let clients = if query.is_empty() {
            let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients ORDER BY name LIMIT ?1");
            sqlx::query_as::<_, Client>(&sql)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
        } else {
            let sql = format!(
                "SELECT {CLIENT_COLUMNS} FROM clients \
                 WHERE name LIKE '%' || ?1 || '%' OR rnc LIKE ?1 || '%' \
                 ORDER BY name LIMIT ?2"
            );
            sqlx::query_as::<_, Client>(&sql)
                .bind(query)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
        };

        Ok(clients)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1");

        let client = sqlx::query_as::<_, Client>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(client)
    }

    pub async fn insert(&self, input: &ClientInput) -> DbResult<Client> {
        input.validate()?;

        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            rnc: normalize(&input.rnc),
            address: normalize(&input.address),
            phone: normalize(&input.phone),
            credit_cents: input.credit_cents,
            debit_cents: 0,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %client.id, name = %client.name, "Inserting client");

        sqlx::query(
            r#"
            INSERT INTO clients (
                id, name, rnc, address, phone,
                credit_cents, debit_cents, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&client.id)
        .bind(&client.name)
        .bind(&client.rnc)
        .bind(&client.address)
        .bind(&client.phone)
        .bind(client.credit_cents)
        .bind(client.debit_cents)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(client)
    }

    pub async fn update(&self, id: &str, input: &ClientInput) -> DbResult<Client> {
        input.validate()?;

        debug!(id = %id, "Updating client");

        let result = sqlx::query(
            r#"
            UPDATE clients SET
                name = ?2,
                rnc = ?3,
                address = ?4,
                phone = ?5,
                credit_cents = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(input.name.trim())
        .bind(normalize(&input.rnc))
        .bind(normalize(&input.address))
        .bind(normalize(&input.phone))
        .bind(input.credit_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Client", id))
    }

    /// Deletes a client.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - The client has transactions
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting client");

        let result = sqlx::query("DELETE FROM clients WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }

        Ok(())
    }
}

/// Blank optional text is stored as NULL.
fn normalize(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn input(name: &str) -> ClientInput {
        ClientInput {
            name: name.to_string(),
            rnc: Some("131-12345-6".to_string()),
            address: Some("Calle 1, Santiago".to_string()),
            phone: Some("  ".to_string()),
            credit_cents: 0,
        }
    }

    #[tokio::test]
    async fn test_client_crud() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.clients();

        let client = repo.insert(&input("Colmado Don Pedro")).await.unwrap();
        assert_eq!(client.debit_cents, 0);
        assert!(client.phone.is_none());

        let fetched = repo.get_by_id(&client.id).await.unwrap().unwrap();
        assert_eq!(fetched.id, client.id);
        assert_eq!(fetched.rnc.as_deref(), Some("131-12345-6"));

        let updated = repo
            .update(&client.id, &input("Colmado Don Pedro II"))
            .await
            .unwrap();
        assert_eq!(updated.name, "Colmado Don Pedro II");

        let found = repo.search("pedro", 10).await.unwrap();
        assert_eq!(found.len(), 1);
        let found = repo.search("131", 10).await.unwrap();
        assert_eq!(found.len(), 1);

        repo.delete(&client.id).await.unwrap();
        assert!(repo.get_by_id(&client.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&client.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_invalid_rnc_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut bad = input("Cliente");
        bad.rnc = Some("12".to_string());

        assert!(matches!(
            db.clients().insert(&bad).await,
            Err(DbError::Core(_))
        ));
    }
}
