//! Router construction for the concordance API.

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::handlers::{self, ServiceSettings};
use crate::monitor::ConnectivityCell;
use crate::resolver::ConcordanceResolver;

/// Build the full axum router with all routes and middleware.
pub fn build_router(
    resolver: Arc<ConcordanceResolver>,
    connectivity: ConnectivityCell,
    settings: ServiceSettings,
) -> Router {
    let api = Router::new().route(
        "/concordances",
        get(handlers::concordances::get_concordances)
            .post(handlers::concordances::post_concordances),
    );

    // Operational endpoints, served from the connectivity cell only
    let admin = Router::new()
        .route("/__health", get(handlers::health::health))
        .route("/__gtg", get(handlers::health::gtg))
        .route("/__build-info", get(handlers::health::build_info))
        .route("/build-info", get(handlers::health::build_info))
        .route("/__ping", get(handlers::health::ping))
        .route("/ping", get(handlers::health::ping));

    api.merge(admin).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(Extension(resolver))
            .layer(Extension(connectivity))
            .layer(Extension(Arc::new(settings))),
    )
}
