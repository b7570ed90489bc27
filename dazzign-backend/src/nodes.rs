use axum::extract::{Path, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use dazzign_shared::error::DazzignError;
use dazzign_shared::node::NodeDraft;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

use crate::entity::node;
use crate::lineage::{self, NodeLineage};
use crate::tree::{self, NodeTree};
use crate::{db, SharedState};

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug)]
pub struct WebError {
    status: StatusCode,
    message: String,
}

impl WebError {
    pub fn not_found(message: String) -> Self {
        WebError {
            status: StatusCode::NOT_FOUND,
            message,
        }
    }

    pub fn validation(message: String) -> Self {
        WebError {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({
            "error": self.message,
        });
        let mut response = axum::response::Response::new(body.to_string().into());
        *response.status_mut() = self.status;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        response
    }
}

impl From<DazzignError> for WebError {
    fn from(err: DazzignError) -> Self {
        match err {
            DazzignError::NotFound(message) => WebError::not_found(message),
            DazzignError::Validation(message) => WebError::validation(message),
            DazzignError::Persistence(_)
            | DazzignError::Configuration(_)
            | DazzignError::IOError(_) => {
                error!("Request failed: {}", err);
                WebError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: err.to_string(),
                }
            }
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RootNodesQuery {
    /// 1-based page number, defaults to 1
    pub page: Option<u64>,
    /// Between 1 and 100, defaults to 20
    pub page_size: Option<u64>,
}

impl RootNodesQuery {
    /// Returns `(page, page_size)` with defaults applied.
    pub fn validate(&self) -> Result<(u64, u64), DazzignError> {
        let page = self.page.unwrap_or(DEFAULT_PAGE);
        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page < 1 {
            return Err(DazzignError::Validation(format!(
                "page must be at least 1, got {page}"
            )));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(DazzignError::Validation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
            )));
        }
        Ok((page, page_size))
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RootNodesResponse {
    pub nodes: Vec<node::Model>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NodeTreeResponse {
    pub tree: NodeTree,
}

#[utoipa::path(
    post,
    path = "/api/v1/node",
    tag = "node",
    request_body = NodeDraft,
    responses(
        (status = 200, description = "Node created", body = node::Model),
        (status = 404, description = "Parent node not found"),
    )
)]
pub async fn post_node(
    State(state): State<SharedState>,
    Json(draft): Json<NodeDraft>,
) -> Result<Json<node::Model>, WebError> {
    debug!("Creating node: {:?}", draft.prompt);
    let node = db::node::create(&state.conn, draft).await?;
    Ok(Json(node))
}

#[utoipa::path(
    get,
    path = "/api/v1/node/root",
    tag = "node",
    params(RootNodesQuery),
    responses(
        (status = 200, description = "A page of root nodes, newest first", body = RootNodesResponse),
        (status = 400, description = "Page or page size out of range"),
    )
)]
pub async fn get_root_nodes(
    Query(query): Query<RootNodesQuery>,
    State(state): State<SharedState>,
) -> Result<Json<RootNodesResponse>, WebError> {
    let (page, page_size) = query.validate()?;
    let (nodes, total) = db::node::list_roots(&state.conn, page, page_size)
        .await
        .inspect_err(|err| error!("Failed to list root nodes: {}", err))?;
    Ok(Json(RootNodesResponse {
        nodes,
        total,
        page,
        page_size,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/node/{id}",
    tag = "node",
    params(("id" = i32, Path, description = "Node id")),
    responses(
        (status = 200, body = node::Model),
        (status = 404, description = "Node not found"),
    )
)]
pub async fn get_node(
    Path(id): Path<i32>,
    State(state): State<SharedState>,
) -> Result<Json<node::Model>, WebError> {
    match db::node::get_by_id(&state.conn, id).await? {
        Some(node) => Ok(Json(node)),
        None => Err(WebError::not_found(format!("Node {} not found", id))),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/node/{id}/tree",
    tag = "node",
    params(("id" = i32, Path, description = "Node id")),
    responses(
        (status = 200, description = "The node and every descendant", body = NodeTreeResponse),
        (status = 404, description = "Node not found"),
    )
)]
pub async fn get_node_tree(
    Path(id): Path<i32>,
    State(state): State<SharedState>,
) -> Result<Json<NodeTreeResponse>, WebError> {
    match tree::get_tree(&state.conn, id).await? {
        Some(tree) => Ok(Json(NodeTreeResponse { tree })),
        None => Err(WebError::not_found(format!("Node {} not found", id))),
    }
}

/// Unknown ids give an empty lineage, not a 404.
#[utoipa::path(
    get,
    path = "/api/v1/node/{id}/lineage",
    tag = "node",
    params(("id" = i32, Path, description = "Node id")),
    responses(
        (status = 200, description = "Ancestors and two levels of descendants", body = NodeLineage),
    )
)]
pub async fn get_node_lineage(
    Path(id): Path<i32>,
    State(state): State<SharedState>,
) -> Result<Json<NodeLineage>, WebError> {
    Ok(Json(lineage::get_lineage(&state.conn, id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_query_validation() {
        assert_eq!(RootNodesQuery::default().validate(), Ok((1, 20)));

        for (page, page_size) in [(1, 1), (3, 100), (1, 20)] {
            let query = RootNodesQuery {
                page: Some(page),
                page_size: Some(page_size),
            };
            assert_eq!(query.validate(), Ok((page, page_size)));
        }

        for (page, page_size) in [(0, 20), (1, 0), (1, 101)] {
            let query = RootNodesQuery {
                page: Some(page),
                page_size: Some(page_size),
            };
            assert!(matches!(
                query.validate(),
                Err(DazzignError::Validation(_))
            ));
        }
    }

    #[test]
    fn test_web_error_mapping() {
        let err: WebError = DazzignError::NotFound("gone".to_string()).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        let err: WebError = DazzignError::Validation("bad".to_string()).into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let err: WebError = DazzignError::Persistence("disk".to_string()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
