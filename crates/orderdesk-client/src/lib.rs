//! # orderdesk-client: Storage Abstraction for Front Ends
//!
//! A front end talks to one [`OrderStore`] and never cares where the data
//! lives.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Front end (mobile / web / CLI)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SessionContext<S>        vendor · settings · OrderDraft                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  dyn OrderStore                                                         │
//! │   ├── MemoryStore         in-process, same rules as the server          │
//! │   └── RestStore           reqwest → orderdesk-api                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Failures from either store arrive as a [`ClientError`] classified as
//! validation, network, not-found, unauthorized, conflict or server.

pub mod error;
pub mod memory;
pub mod rest;
pub mod session;
pub mod store;

pub use error::{ClientError, ClientResult};
pub use memory::MemoryStore;
pub use rest::RestStore;
pub use session::SessionContext;
pub use store::OrderStore;
