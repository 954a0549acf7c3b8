//! REST handlers.
//!
//! Each module owns one slice of the `/api` surface; the routes are wired
//! in [`crate::router`].

pub mod auth_service;
pub mod calc_service;
pub mod catalog_service;
pub mod document_service;
pub mod health_service;
pub mod settings_service;
pub mod transaction_service;
