pub mod cli;
pub mod config;
pub mod db;
pub mod entity;
pub mod generation;
pub mod lineage;
pub mod logging;
pub mod middleware;
pub mod migration;
pub mod nodes;
pub mod openapi;
pub mod providers;
pub mod storage;
#[cfg(test)]
mod tests;
pub mod tree;

use axum::{
    body::Body,
    error_handling::HandleErrorLayer,
    http::{header, Response, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use dazzign_shared::error::DazzignError;
use generation::{generate_image, text_to_spec, Generator};
use nodes::{get_node, get_node_lineage, get_node_tree, get_root_nodes, post_node};
use sea_orm::DatabaseConnection;
use std::{borrow::Cow, sync::Arc, time::Duration};
use tower::{BoxError, ServiceBuilder};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::error;

use crate::{
    cli::{db_path_default, CliOpts},
    config::ProviderConfig,
    logging::logging_layer,
};

/// Everything in here is read-only after startup, so there's no lock.
pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub conn: DatabaseConnection,
    pub generator: Generator,
    pub request_timeout: Duration,
}

impl AppState {
    pub async fn new(cli: &CliOpts) -> Result<Self, DazzignError> {
        let generator = Generator::from_config(&ProviderConfig::from(cli))?;
        let conn = storage::new(&cli.db_path.clone().unwrap_or(db_path_default().into())).await?;
        Ok(Self {
            conn,
            generator,
            request_timeout: Duration::from_secs(cli.request_timeout),
        })
    }

    #[cfg(test)]
    pub async fn test() -> Self {
        let generator = Generator::from_config(&ProviderConfig::placeholder_only())
            .expect("Failed to build placeholder generator");
        Self::test_with_generator(generator).await
    }

    #[cfg(test)]
    pub async fn test_with_generator(generator: Generator) -> Self {
        let conn = storage::start_db(None)
            .await
            .expect("Failed to start test DB");
        Self {
            conn,
            generator,
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn build_app<T>(shared_state: &SharedState) -> Router<T> {
    let router = Router::new()
        .route("/health", get(health))
        .route("/api/v1/node", post(post_node))
        .route("/api/v1/node/root", get(get_root_nodes))
        .route("/api/v1/node/{id}", get(get_node))
        .route("/api/v1/node/{id}/tree", get(get_node_tree))
        .route("/api/v1/node/{id}/lineage", get(get_node_lineage))
        .route("/api/v1/image-gen/generate", post(generate_image))
        .route("/api/v1/text-gen/text-to-image", post(text_to_spec))
        .merge(openapi::api_route());

    router
        // Add middleware to all routes
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::process_time))
                .layer(middleware::corslayer())
                .layer(SetResponseHeaderLayer::overriding(
                    header::CACHE_CONTROL,
                    |response: &Response<Body>| {
                        if response.status() == StatusCode::OK {
                            "private, no-transform max-age=0".parse().ok()
                        } else {
                            None
                        }
                    },
                ))
                // Handle errors from middleware
                .layer(HandleErrorLayer::new(handle_error))
                .load_shed()
                .concurrency_limit(1024)
                .timeout(shared_state.request_timeout)
                .layer(logging_layer()),
        )
        .with_state(shared_state.clone())
}

async fn handle_error(error: BoxError) -> impl IntoResponse {
    if error.is::<tower::timeout::error::Elapsed>() {
        return (StatusCode::REQUEST_TIMEOUT, Cow::from("request timed out"));
    }

    if error.is::<tower::load_shed::error::Overloaded>() {
        let msg = "service is overloaded, try again later";
        error!("{}", msg);
        return (StatusCode::SERVICE_UNAVAILABLE, Cow::from(msg));
    }

    let msg = format!("Unhandled internal error: {error}");
    error!("{}", msg);
    (StatusCode::INTERNAL_SERVER_ERROR, Cow::from(msg))
}

#[tokio::test]
async fn test_handle_error() {
    let err = tower::timeout::error::Elapsed::new();
    let res = handle_error(Box::new(err)).await.into_response();
    let expected = (StatusCode::REQUEST_TIMEOUT, Cow::from("request timed out")).into_response();

    assert_eq!(res.status(), expected.status());

    let err = tower::load_shed::error::Overloaded::new();
    let res = handle_error(Box::new(err)).await.into_response();
    let expected = (
        StatusCode::SERVICE_UNAVAILABLE,
        Cow::from("service is overloaded, try again later"),
    )
        .into_response();

    assert_eq!(res.status(), expected.status());

    let err = std::io::Error::other("disk on fire");
    let res = handle_error(Box::new(err)).await.into_response();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
