//! Resolution error taxonomy.
//!
//! "Not found" and "unsupported authority" are not errors: resolver calls
//! return `Ok((records, false))` for both.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ConcordanceError {
    /// The graph holds something it must never hold, e.g. two concept nodes
    /// sharing one UUID.
    #[error("data integrity: {0}")]
    DataIntegrity(String),

    /// A concept's type labels do not map onto a single API route.
    #[error("no API route for concept {uuid} with types {types:?}")]
    TypeMapping { uuid: String, types: Vec<String> },

    /// The query could not be executed. Safe to retry.
    #[error("graph store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl ConcordanceError {
    pub fn http_status(&self) -> u16 {
        match self {
            Self::DataIntegrity(_) | Self::TypeMapping { .. } | Self::StoreUnavailable(_) => 500,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}
