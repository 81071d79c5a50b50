use super::wire::{GenerateSummaryBody, PageQuery, PromptBody};
use super::AppState;
use crate::ai::prompt::DEFAULT_INSTRUCTIONS;
use crate::ai::SummaryResult;
use crate::error::{AppError, Result};
use crate::github::{PullRequestPage, Repository};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "repo2resume API - ready to summarize your GitHub contributions"
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// `GET /api/repos`
pub async fn list_repositories(State(state): State<AppState>) -> Result<Json<Vec<Repository>>> {
    info!("listing repositories");
    let repos = state.activity.list_repositories().await?;
    Ok(Json(repos))
}

/// `GET /api/repos/{owner}/{name}/pull-requests`
pub async fn list_pull_requests(
    State(state): State<AppState>,
    Path((owner, name)): Path<(String, String)>,
    query: std::result::Result<Query<PageQuery>, QueryRejection>,
) -> Result<Json<PullRequestPage>> {
    let Query(query) = query.map_err(|e| AppError::validation(e.body_text()))?;
    let full_name = format!("{}/{}", owner, name);
    info!(repo = %full_name, page = query.page, per_page = query.per_page, "listing pull requests");

    let page = state
        .activity
        .list_pull_requests(&full_name, query.page, query.per_page)
        .await?;
    Ok(Json(page))
}

/// `GET /api/default-prompt`
pub async fn default_prompt() -> Json<PromptBody> {
    Json(PromptBody {
        prompt: DEFAULT_INSTRUCTIONS.to_string(),
    })
}

/// `POST /api/generate-summary`
pub async fn generate_summary(
    State(state): State<AppState>,
    body: std::result::Result<Json<GenerateSummaryBody>, JsonRejection>,
) -> Result<Json<SummaryResult>> {
    let Json(body) = body.map_err(|e| AppError::validation(e.body_text()))?;
    let request = body.into_request()?;
    info!(repo = %request.repo_name, range = %request.date_range.describe(), "generating summary");

    let result = state.orchestrator.generate_summary(&request).await?;
    Ok(Json(result))
}
