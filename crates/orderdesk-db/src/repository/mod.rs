//! # Repository Module
//!
//! One repository per table group, each holding a clone of the pool.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Database                                                               │
//! │  ├── products()      → ProductRepository      catalog + stock           │
//! │  ├── clients()       → ClientRepository       accounts                  │
//! │  ├── vendors()       → VendorRepository       salespeople + login check │
//! │  ├── settings()      → SettingsRepository     company + tax mode        │
//! │  └── transactions()  → TransactionRepository  invoices + receipts       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cross-table writes (invoice creation, payment recording) live in
//! [`TransactionRepository`] and run inside a single SQLite transaction.

pub mod client;
pub mod product;
pub mod settings;
pub mod transaction;
pub mod vendor;

pub use client::ClientRepository;
pub use product::ProductRepository;
pub use settings::SettingsRepository;
pub use transaction::TransactionRepository;
pub use vendor::VendorRepository;
