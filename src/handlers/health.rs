//! Operational endpoints: `/__health`, `/__gtg`, `/__build-info`, `/__ping`.
//!
//! None of these touch the graph store. They report whatever the
//! connectivity monitor last published.

use std::sync::Arc;

use axum::{http::StatusCode, response::IntoResponse, Extension, Json};
use serde::Serialize;

use super::ServiceSettings;
use crate::monitor::ConnectivityCell;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub schema_version: u8,
    pub system_code: String,
    pub name: &'static str,
    pub description: &'static str,
    pub checks: Vec<HealthCheck>,
    pub ok: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheck {
    pub id: &'static str,
    pub name: &'static str,
    pub ok: bool,
    pub severity: u8,
    pub business_impact: &'static str,
    pub technical_summary: &'static str,
    pub panic_guide: String,
    pub check_output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

pub async fn health(
    Extension(cell): Extension<ConnectivityCell>,
    Extension(settings): Extension<Arc<ServiceSettings>>,
) -> Json<HealthReport> {
    let status = cell.get().await;
    let neo4j = HealthCheck {
        id: "check-connectivity-to-neo4j",
        name: "Check connectivity to Neo4j",
        ok: status.is_ok(),
        severity: 1,
        business_impact: "Unable to respond to Public Concordances api requests",
        technical_summary:
            "Cannot connect to Neo4j a instance with at least one concordance loaded in it",
        panic_guide: format!("https://runbooks.in.ft.com/{}", settings.system_code),
        check_output: status.message(),
        last_updated: status.checked_at().map(|t| t.to_rfc3339()),
    };

    Json(HealthReport {
        schema_version: 1,
        system_code: settings.system_code.clone(),
        name: "Public Concordances API",
        description: "Resolves concept identity across identifier authorities",
        ok: neo4j.ok,
        checks: vec![neo4j],
    })
}

/// 200 when the last connectivity probe succeeded, 503 otherwise.
pub async fn gtg(Extension(cell): Extension<ConnectivityCell>) -> impl IntoResponse {
    let status = cell.get().await;
    if status.is_ok() {
        (StatusCode::OK, "OK".to_string())
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, status.message())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub system_code: String,
}

pub async fn build_info(Extension(settings): Extension<Arc<ServiceSettings>>) -> Json<BuildInfo> {
    Json(BuildInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        system_code: settings.system_code.clone(),
    })
}

pub async fn ping() -> &'static str {
    "pong"
}
