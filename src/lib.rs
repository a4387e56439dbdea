//! Concordance API - Read-only Concept Identity Resolution
//!
//! Resolves the identity of a real-world concept across the identifier
//! authorities it is known under (Factset, LEI, Smartlogic, TME, ...). Given a
//! concept id, or an authority and identifier values, it returns every
//! equivalent identifier of the underlying canonical concept.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 HTTP surface (axum, `server`)                    │
//! │      /concordances          /__health /__gtg /__ping ...         │
//! └─────────────────────────────────────────────────────────────────┘
//!             │                                   │
//!             ▼                                   ▼
//! ┌───────────────────────────────┐   ┌─────────────────────────────┐
//! │     Concordance Resolver      │   │      ConnectivityCell       │
//! │  strategy per representation  │   │   last probe outcome        │
//! └───────────────────────────────┘   └─────────────────────────────┘
//!        │              │                          ▲
//!        ▼              ▼                          │
//! ┌──────────────┐ ┌──────────────────┐   ┌─────────────────────────┐
//! │  Authority   │ │ Result Assembler │   │  Connectivity Monitor   │
//! │  Registry    │ │ dedup, API URLs  │   │  fixed-interval probe   │
//! └──────────────┘ └──────────────────┘   └─────────────────────────┘
//!        │                                          │
//!        ▼                                          ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │         GraphStore (Neo4j transactional HTTP | in-memory)        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use concordance_api::{AuthorityRegistry, ConcordanceResolver, Neo4jHttpStore};
//!
//! let store = Arc::new(Neo4jHttpStore::new("http://localhost:7474/db/data", timeout, 0)?);
//! let resolver = ConcordanceResolver::new(store, AuthorityRegistry::new(), "prod");
//! let (records, found) = resolver
//!     .resolve_by_authority("http://api.ft.com/system/FACTSET", &["003JLG-E".into()])
//!     .await?;
//! ```

pub mod assembler;
pub mod authority;
pub mod config;
pub mod error;
pub mod model;
pub mod monitor;
pub mod resolver;
pub mod store;

#[cfg(feature = "server")]
pub mod handlers;
#[cfg(feature = "server")]
pub mod router;

pub use authority::AuthorityRegistry;
pub use config::AppConfig;
pub use error::ConcordanceError;
pub use model::{Concept, Concordance, Concordances, Identifier};
pub use monitor::{ConnectivityCell, ConnectivityMonitor, ConnectivityStatus};
pub use resolver::ConcordanceResolver;
pub use store::{GraphStore, MemoryGraph, Neo4jHttpStore, StoreError};
