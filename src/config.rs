//! Service configuration.
//!
//! Every setting is a CLI flag with an environment variable fallback. A `.env`
//! file in the working directory is loaded by the binary before parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

const DEFAULT_HEALTHCHECK_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Parser)]
#[command(name = "concordance-api")]
#[command(version)]
#[command(about = "Read-only API resolving concept identity across identifier authorities")]
pub struct AppConfig {
    /// System code of the application
    #[arg(long, env = "APP_SYSTEM_CODE", default_value = "public-concordances-api")]
    pub app_system_code: String,

    /// Neo4j endpoint URL
    #[arg(long, env = "NEO_URL", default_value = "http://localhost:7474/db/data")]
    pub neo_url: String,

    /// Port to listen on
    #[arg(long, env = "APP_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Environment this app is running in; `test` selects the test API host
    #[arg(long, env = "ENVIRONMENT", default_value = "local")]
    pub env: String,

    /// Value of `max-age` on successful responses
    #[arg(long, env = "CACHE_DURATION_SECS", default_value_t = 30)]
    pub cache_duration_secs: u64,

    /// Default tracing filter, overridden by RUST_LOG
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// How often the graph store connectivity check runs
    #[arg(long, env = "HEALTHCHECK_INTERVAL_SECS", default_value_t = 30)]
    pub healthcheck_interval_secs: u64,

    /// Maximum statements per Neo4j request (0 = no limit)
    #[arg(long, env = "BATCH_SIZE", default_value_t = 0)]
    pub batch_size: usize,

    /// Per-request Neo4j timeout
    #[arg(long, env = "NEO_TIMEOUT_SECS", default_value_t = 60)]
    pub neo_timeout_secs: u64,

    /// Serve from a YAML graph fixture instead of Neo4j
    #[arg(long, env = "GRAPH_FIXTURE")]
    pub graph_fixture: Option<PathBuf>,
}

impl AppConfig {
    pub fn healthcheck_interval(&self) -> Duration {
        match self.healthcheck_interval_secs {
            0 => DEFAULT_HEALTHCHECK_INTERVAL,
            secs => Duration::from_secs(secs),
        }
    }

    pub fn neo_timeout(&self) -> Duration {
        Duration::from_secs(self.neo_timeout_secs)
    }

    pub fn cache_control(&self) -> String {
        format!("max-age={}, public", self.cache_duration_secs)
    }
}
