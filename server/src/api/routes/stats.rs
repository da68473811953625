//! Pruning stats endpoint

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;

use crate::domain::pruning::{PruneStats, StatsSnapshot};

pub fn routes(stats: Arc<PruneStats>) -> Router {
    Router::new()
        .route("/", get(get_stats))
        .with_state(stats)
}

/// Counters accumulated since startup
pub async fn get_stats(State(stats): State<Arc<PruneStats>>) -> Json<StatsSnapshot> {
    Json(stats.snapshot())
}
