//! HTTP API for the matrix node.

use crate::node::NodeState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use matrix_engine::{MatrixOverview, MatrixPosition, NetworkStats, TreeNode, UserId, MAX_LEVELS};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the API router.
pub fn build_router(state: NodeState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/api/v1/health", get(health))
        // Registration workflow
        .route("/api/v1/placements", post(create_placement))
        // Reporting
        .route("/api/v1/positions/:user_id", get(get_position))
        .route("/api/v1/stats/:user_id", get(get_stats))
        .route("/api/v1/tree/:user_id", get(get_tree))
        .route("/api/v1/upline/:user_id", get(get_upline))
        .route("/api/v1/overview", get(get_overview))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// --- Errors ---

/// Error body returned to API clients.
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    pub error: String,
}

impl ApiError {
    fn new(status: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
        }
    }
}

impl From<matrix_engine::Error> for ApiError {
    fn from(e: matrix_engine::Error) -> Self {
        if !e.is_user_facing() {
            tracing::error!("Matrix operation failed: {}", e);
        }
        Self::new(status_for(&e), user_message(&e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// HTTP status for a matrix error.
pub fn status_for(e: &matrix_engine::Error) -> StatusCode {
    use matrix_engine::Error;
    match e {
        Error::NoSponsorPosition(_) | Error::UnknownPosition(_) => StatusCode::NOT_FOUND,
        Error::MatrixFull(_) | Error::AlreadyPlaced(_) | Error::SlotTaken { .. } => {
            StatusCode::CONFLICT
        }
        Error::MaxDepthExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        Error::ParentFull(_) | Error::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Message safe to show to the member registering.
fn user_message(e: &matrix_engine::Error) -> String {
    use matrix_engine::Error;
    match e {
        Error::NoSponsorPosition(_) => "Your sponsor is not active in the matrix".to_string(),
        Error::MatrixFull(_) => "Your sponsor's network is full".to_string(),
        Error::MaxDepthExceeded { .. } => "Your sponsor's network has reached its maximum depth".to_string(),
        Error::AlreadyPlaced(_) => "This member is already placed in the matrix".to_string(),
        Error::SlotTaken { .. } => "The matrix changed during placement, please retry".to_string(),
        Error::UnknownPosition(_) => "No matrix position found".to_string(),
        Error::ParentFull(_) | Error::Storage(_) => "Internal error".to_string(),
    }
}

type ApiResult<T> = Result<T, ApiError>;

// --- Health endpoints ---

async fn health() -> &'static str {
    "OK"
}

// --- Placement endpoints ---

#[derive(Debug, Deserialize)]
pub struct PlacementRequest {
    pub user_id: UserId,
    pub sponsor_id: Option<UserId>,
}

async fn create_placement(
    State(state): State<NodeState>,
    Json(req): Json<PlacementRequest>,
) -> ApiResult<(StatusCode, Json<MatrixPosition>)> {
    let mut engine = state.engine.write().await;
    let position = engine.place(req.user_id, req.sponsor_id)?;
    Ok((StatusCode::CREATED, Json(position)))
}

// --- Reporting endpoints ---

async fn get_position(
    State(state): State<NodeState>,
    Path(user_id): Path<u64>,
) -> ApiResult<Json<MatrixPosition>> {
    let engine = state.engine.read().await;
    engine
        .position(UserId(user_id))?
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "No matrix position found"))
}

async fn get_stats(
    State(state): State<NodeState>,
    Path(user_id): Path<u64>,
) -> ApiResult<Json<NetworkStats>> {
    let engine = state.engine.read().await;
    Ok(Json(engine.network_stats(UserId(user_id))?))
}

#[derive(Debug, Deserialize)]
pub struct TreeQuery {
    pub depth: Option<u8>,
}

async fn get_tree(
    State(state): State<NodeState>,
    Path(user_id): Path<u64>,
    Query(query): Query<TreeQuery>,
) -> ApiResult<Json<TreeNode>> {
    let depth = query.depth.unwrap_or(state.config.default_tree_depth);
    let engine = state.engine.read().await;
    engine
        .build_tree(UserId(user_id), depth)?
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "No matrix position found"))
}

#[derive(Debug, Deserialize)]
pub struct UplineQuery {
    pub levels: Option<u8>,
}

async fn get_upline(
    State(state): State<NodeState>,
    Path(user_id): Path<u64>,
    Query(query): Query<UplineQuery>,
) -> ApiResult<Json<Vec<MatrixPosition>>> {
    let levels = query.levels.unwrap_or(MAX_LEVELS);
    let engine = state.engine.read().await;
    Ok(Json(engine.upline(UserId(user_id), levels)?))
}

async fn get_overview(State(state): State<NodeState>) -> ApiResult<Json<MatrixOverview>> {
    let engine = state.engine.read().await;
    Ok(Json(engine.overview()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{MatrixNode, NodeConfig};
    use tempfile::TempDir;

    fn test_state() -> (TempDir, NodeState) {
        let dir = tempfile::tempdir().unwrap();
        let config = NodeConfig {
            data_dir: dir.path().to_path_buf(),
            admin_socket: dir.path().join("admin.sock"),
            ..NodeConfig::default()
        };
        let node = MatrixNode::new(config).unwrap();
        (dir, node.state())
    }

    async fn place(state: &NodeState, user: u64, sponsor: Option<u64>) -> ApiResult<MatrixPosition> {
        let req = PlacementRequest {
            user_id: UserId(user),
            sponsor_id: sponsor.map(UserId),
        };
        let (status, Json(position)) = create_placement(State(state.clone()), Json(req)).await?;
        assert_eq!(status, StatusCode::CREATED);
        Ok(position)
    }

    #[tokio::test]
    async fn placement_and_stats() {
        let (_dir, state) = test_state();
        place(&state, 1, None).await.unwrap();
        for user in 2..=5 {
            place(&state, user, Some(1)).await.unwrap();
        }

        let Json(stats) = get_stats(State(state.clone()), Path(1)).await.unwrap();
        assert_eq!(stats.total_network_size, 4);

        let Json(overview) = get_overview(State(state.clone())).await.unwrap();
        assert_eq!(overview.spillover_count, 1);
    }

    #[tokio::test]
    async fn unknown_sponsor_maps_to_not_found() {
        let (_dir, state) = test_state();
        let err = place(&state, 2, Some(1)).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(err.error, "Your sponsor is not active in the matrix");
    }

    #[tokio::test]
    async fn tree_uses_requested_depth() {
        let (_dir, state) = test_state();
        place(&state, 1, None).await.unwrap();
        for user in 2..=7 {
            place(&state, user, Some(1)).await.unwrap();
        }

        let Json(tree) = get_tree(
            State(state.clone()),
            Path(1),
            Query(TreeQuery { depth: Some(1) }),
        )
        .await
        .unwrap();
        assert_eq!(tree.size(), 4);

        let missing = get_tree(State(state.clone()), Path(99), Query(TreeQuery { depth: None })).await;
        assert_eq!(missing.unwrap_err().status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn status_mapping() {
        use matrix_engine::Error;
        assert_eq!(status_for(&Error::MatrixFull(UserId(1))), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&Error::MaxDepthExceeded { level: 8, max: 7 }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&Error::Storage("io".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
