use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::admin::AdminState;
use crate::daemon::SyncStatus;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    #[serde(flatten)]
    pub sync: SyncStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleSummary {
    pub source: String,
    pub pattern: String,
    pub default_template: Option<String>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        sync: state.status.snapshot().as_ref().clone(),
    })
}

pub async fn get_config(State(state): State<AdminState>) -> impl IntoResponse {
    let committed = state.status.committed();
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        committed.as_ref().clone(),
    )
}

pub async fn get_rules(State(state): State<AdminState>) -> Json<Vec<RuleSummary>> {
    Json(state.rules.as_ref().clone())
}
