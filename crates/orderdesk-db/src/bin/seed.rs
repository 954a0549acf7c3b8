//! # Seed Data Generator
//!
//! Populates a database with a demo catalog, clients and vendors.
//!
//! ## Usage
//! ```bash
//! cargo run -p orderdesk-db --bin seed
//! cargo run -p orderdesk-db --bin seed -- --db ./data/orderdesk.db
//! ```
//!
//! Vendors are created with fixed ids (`V001`, `V002`) so the login
//! screen can be tried right away.

use std::env;

use anyhow::Context;
use orderdesk_core::{ClientInput, ProductInput, VendorInput};
use orderdesk_db::{Database, DbConfig};
use tracing::{info, warn};

/// (code, name, price in cents, category)
const PRODUCTS: &[(&str, &str, i64, &str)] = &[
    ("AGU-05", "Agua Planeta 500ml", 2_500, "Bebidas"),
    ("AGU-GL", "Agua Planeta Galon", 9_500, "Bebidas"),
    ("REF-CC", "Refresco Cola 2L", 11_000, "Bebidas"),
    ("JUG-NA", "Jugo de Naranja 1L", 8_500, "Bebidas"),
    ("ARR-10", "Arroz Selecto 10lb", 42_000, "Granos"),
    ("HAB-RO", "Habichuelas Rojas 1lb", 9_000, "Granos"),
    ("ACE-SO", "Aceite de Soya 1L", 21_500, "Despensa"),
    ("AZU-CR", "Azucar Crema 5lb", 19_000, "Despensa"),
    ("SAL-MO", "Salami Mortadela 1lb", 16_500, "Embutidos"),
    ("QUE-BL", "Queso de Freir 1lb", 24_000, "Lacteos"),
    ("LEC-EN", "Leche Entera 1L", 7_500, "Lacteos"),
    ("CAF-MO", "Cafe Molido 1lb", 32_000, "Despensa"),
];

/// (name, rnc, address)
const CLIENTS: &[(&str, Option<&str>, &str)] = &[
    ("Colmado Don Pedro", Some("131-12345-6"), "Calle Duarte 12, Santiago"),
    ("Supermercado La Fe", Some("101-55555-1"), "Av. Estrella Sadhala, Santiago"),
    ("Cafeteria El Buen Sabor", None, "Calle Restauracion 4, Moca"),
];

/// (id, name, route)
const VENDORS: &[(&str, &str, &str)] = &[
    ("V001", "Juan Perez", "Ruta Norte"),
    ("V002", "Ana Gomez", "Ruta Sur"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let db_path = parse_db_path(env::args().skip(1))?;
    info!(db = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {db_path}"))?;

    let existing = db.products().count().await?;
    if existing > 0 {
        warn!(existing, "Database already has products, skipping seed");
        return Ok(());
    }

    for (code, name, price_cents, category) in PRODUCTS {
        let input = ProductInput {
            code: code.to_string(),
            name: name.to_string(),
            price_cents: *price_cents,
            tax_rate_bps: orderdesk_core::DEFAULT_TAX_RATE_BPS,
            stock: 100,
            category: Some(category.to_string()),
        };
        db.products()
            .insert(&input)
            .await
            .with_context(|| format!("inserting product {code}"))?;
    }
    info!(count = PRODUCTS.len(), "Products inserted");

    for (name, rnc, address) in CLIENTS {
        let input = ClientInput {
            name: name.to_string(),
            rnc: rnc.map(str::to_string),
            address: Some(address.to_string()),
            phone: None,
            credit_cents: 500_000,
        };
        db.clients()
            .insert(&input)
            .await
            .with_context(|| format!("inserting client {name}"))?;
    }
    info!(count = CLIENTS.len(), "Clients inserted");

    for (id, name, route) in VENDORS {
        let input = VendorInput {
            id: Some(id.to_string()),
            name: name.to_string(),
            route: Some(route.to_string()),
        };
        db.vendors()
            .insert(&input)
            .await
            .with_context(|| format!("inserting vendor {id}"))?;
    }
    info!(count = VENDORS.len(), "Vendors inserted");

    db.close().await;
    info!("Seed complete");
    Ok(())
}

fn parse_db_path(mut args: impl Iterator<Item = String>) -> anyhow::Result<String> {
    let mut db_path = String::from("./orderdesk_dev.db");

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" | "-d" => {
                db_path = args.next().context("--db requires a path")?;
            }
            other => anyhow::bail!("unknown argument: {other} (usage: seed [--db PATH])"),
        }
    }

    Ok(db_path)
}
