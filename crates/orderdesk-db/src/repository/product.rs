//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - Search by code or name
//! - CRUD operations (hard delete)
//! - Stock adjustments
//!
//! ## Search
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Vendor types: "agua"                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  code LIKE 'agua%'  OR  name LIKE '%agua%'   (case-insensitive)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Code-prefix hits first, then by name:                                  │
//! │    AGUA-500  | Agua 500ml                                               │
//! │    AGUA-1GL  | Agua Galon                                               │
//! │    JUG-001   | Jugo de agua de coco                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use orderdesk_core::{Product, ProductInput};

const PRODUCT_COLUMNS: &str =
    "id, code, name, price_cents, tax_rate_bps, stock, category, created_at, updated_at";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let results = repo.search("agua", 20).await?;
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Searches products by code prefix or name substring.
    ///
    /// An empty query lists the catalog ordered by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching products");

        if query.is_empty() {
            return self.list(limit).await;
        }

        let escaped = escape_like(query);
        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE code LIKE ?1 || '%' ESCAPE '\'
               OR name LIKE '%' || ?1 || '%' ESCAPE '\'
            ORDER BY (code LIKE ?1 || '%' ESCAPE '\') DESC, name
            LIMIT ?2
            "#
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(&escaped)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// Lists products ordered by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name LIMIT ?1");

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product by its business code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE code = ?1");

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(code.trim())
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a new product from validated input.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The stored product
    /// * `Err(DbError::UniqueViolation)` - Code already exists
    pub async fn insert(&self, input: &ProductInput) -> DbResult<Product> {
        input.validate()?;

        let now = Utc::now();
        let product = Product {
            id: generate_product_id(),
            code: input.code.trim().to_string(),
            name: input.name.trim().to_string(),
            price_cents: input.price_cents,
            tax_rate_bps: input.tax_rate_bps,
            stock: input.stock,
            category: input.category.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(code = %product.code, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, name, price_cents, tax_rate_bps,
                stock, category, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.code)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.tax_rate_bps)
        .bind(product.stock)
        .bind(&product.category)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_code(e, &product.code))?;

        Ok(product)
    }

    /// Replaces a product's fields.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The updated product
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, id: &str, input: &ProductInput) -> DbResult<Product> {
        input.validate()?;

        debug!(id = %id, "Updating product");

        let code = input.code.trim();
        let result = sqlx::query(
            r#"
            UPDATE products SET
                code = ?2,
                name = ?3,
                price_cents = ?4,
                tax_rate_bps = ?5,
                stock = ?6,
                category = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(code)
        .bind(input.name.trim())
        .bind(input.price_cents)
        .bind(input.tax_rate_bps)
        .bind(input.stock)
        .bind(&input.category)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_code(e, code))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Applies a stock delta (negative when invoicing, positive on restock).
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let result = sqlx::query(
            "UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Deletes a product. Past invoice lines keep their snapshots.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts products (for seeding and diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Attaches the offending code to a unique-constraint error.
fn duplicate_code(err: sqlx::Error, code: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("code", code),
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn input(code: &str, name: &str, price_cents: i64) -> ProductInput {
        ProductInput {
            code: code.to_string(),
            name: name.to_string(),
            price_cents,
            tax_rate_bps: 1_800,
            stock: 10,
            category: Some("Bebidas".to_string()),
        }
    }

    async fn repo() -> ProductRepository {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let repo = repo().await;
        let product = repo.insert(&input("AGUA-500", "Agua 500ml", 2_500)).await.unwrap();

        let fetched = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched.code, "AGUA-500");
        assert_eq!(fetched.price_cents, 2_500);
        assert_eq!(fetched.tax_rate_bps, 1_800);

        let by_code = repo.get_by_code("AGUA-500").await.unwrap().unwrap();
        assert_eq!(by_code.id, product.id);
    }

    #[tokio::test]
    async fn test_duplicate_code_is_rejected() {
        let repo = repo().await;
        repo.insert(&input("AGUA-500", "Agua 500ml", 2_500)).await.unwrap();

        let err = repo
            .insert(&input("AGUA-500", "Otra agua", 3_000))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref value, .. } if value == "AGUA-500"));
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected_before_sql() {
        let repo = repo().await;
        let err = repo.insert(&input("", "Sin codigo", 100)).await.unwrap_err();
        assert!(matches!(err, DbError::Core(_)));
        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_search_by_code_and_name() {
        let repo = repo().await;
        repo.insert(&input("AGUA-500", "Agua 500ml", 2_500)).await.unwrap();
        repo.insert(&input("JUG-001", "Jugo de agua de coco", 6_000)).await.unwrap();
        repo.insert(&input("REF-001", "Refresco Rojo", 4_000)).await.unwrap();

        let results = repo.search("agua", 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].code, "AGUA-500");

        let results = repo.search("ref", 10).await.unwrap();
        assert_eq!(results.len(), 1);

        let all = repo.search("", 10).await.unwrap();
        assert_eq!(all.len(), 3);

        // Wildcards are literal
        assert!(repo.search("%", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = repo().await;
        let product = repo.insert(&input("AGUA-500", "Agua 500ml", 2_500)).await.unwrap();

        let updated = repo
            .update(&product.id, &input("AGUA-500", "Agua 500ml fria", 2_700))
            .await
            .unwrap();
        assert_eq!(updated.name, "Agua 500ml fria");
        assert_eq!(updated.price_cents, 2_700);

        repo.delete(&product.id).await.unwrap();
        assert!(repo.get_by_id(&product.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&product.id).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            repo.update(&product.id, &input("X", "X", 1)).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_adjust_stock() {
        let repo = repo().await;
        let product = repo.insert(&input("AGUA-500", "Agua 500ml", 2_500)).await.unwrap();

        repo.adjust_stock(&product.id, -4).await.unwrap();
        repo.adjust_stock(&product.id, 10).await.unwrap();

        let fetched = repo.get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(fetched.stock, 16);
        assert!(repo.adjust_stock("missing", 1).await.is_err());
    }
}
