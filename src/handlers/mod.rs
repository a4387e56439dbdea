//! HTTP handlers.

pub mod concordances;
pub mod error;
pub mod health;

/// Per-deployment values the handlers need besides the resolver.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub system_code: String,
    /// Full `Cache-Control` header value for successful responses.
    pub cache_control: String,
}

impl ServiceSettings {
    pub fn from_config(config: &crate::config::AppConfig) -> Self {
        Self {
            system_code: config.app_system_code.clone(),
            cache_control: config.cache_control(),
        }
    }
}
