use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cwatch_crawler::spawn_crawl;
use cwatch_db::CrawlRunRow;

use crate::middleware::RequestId;

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};

/// Depth bounds for manually triggered crawls.
const DEFAULT_DEPTH: i32 = 10;
const MAX_DEPTH: i32 = 50;

/// Priority recorded on manual runs; above every tier sweep.
const MANUAL_PRIORITY: i16 = 20;

#[derive(Debug, Deserialize)]
pub(super) struct TriggerCrawlBody {
    platform: String,
    external_id: String,
    depth: Option<i32>,
}

#[derive(Debug, Serialize)]
pub(super) struct TriggerCrawlData {
    crawl_run_id: Uuid,
    status: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct CrawlRunsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct CrawlRunItem {
    crawl_run_id: Uuid,
    platform: String,
    external_id: String,
    depth: i32,
    priority: i16,
    trigger_source: String,
    status: String,
    attempts: i32,
    videos_found: i32,
    error_message: Option<String>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<CrawlRunRow> for CrawlRunItem {
    fn from(row: CrawlRunRow) -> Self {
        Self {
            crawl_run_id: row.public_id,
            platform: row.platform,
            external_id: row.external_id,
            depth: row.depth,
            priority: row.priority,
            trigger_source: row.trigger_source,
            status: row.status,
            attempts: row.attempts,
            videos_found: row.videos_found,
            error_message: row.error_message,
            started_at: row.started_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
        }
    }
}

pub(super) async fn trigger_crawl(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<TriggerCrawlBody>,
) -> Result<Json<ApiResponse<TriggerCrawlData>>, ApiError> {
    if body.external_id.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "external_id must not be empty",
        ));
    }
    let depth = body.depth.unwrap_or(DEFAULT_DEPTH);
    if !(1..=MAX_DEPTH).contains(&depth) {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            format!("depth must be between 1 and {MAX_DEPTH}"),
        ));
    }
    if !state.executor.supports_platform(&body.platform) {
        return Err(ApiError::new(
            req_id.0,
            "unsupported_platform",
            format!("no client registered for platform '{}'", body.platform),
        ));
    }

    let run = cwatch_db::create_crawl_run(
        &state.pool,
        &body.platform,
        &body.external_id,
        depth,
        MANUAL_PRIORITY,
        "manual",
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = TriggerCrawlData {
        crawl_run_id: run.public_id,
        status: run.status.clone(),
    };
    spawn_crawl(state.pool.clone(), state.executor, run);

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn list_runs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CrawlRunsQuery>,
) -> Result<Json<ApiResponse<Vec<CrawlRunItem>>>, ApiError> {
    let rows = cwatch_db::list_crawl_runs(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(CrawlRunItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_run(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(public_id): Path<Uuid>,
) -> Result<Json<ApiResponse<CrawlRunItem>>, ApiError> {
    let row = cwatch_db::get_crawl_run_by_public_id(&state.pool, public_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("no crawl run with id {public_id}"),
            )
        })?;

    Ok(Json(ApiResponse {
        data: CrawlRunItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crawl_run_item_is_serializable() {
        let item = CrawlRunItem {
            crawl_run_id: Uuid::new_v4(),
            platform: "youtube".to_string(),
            external_id: "UCabc".to_string(),
            depth: 10,
            priority: 20,
            trigger_source: "manual".to_string(),
            status: "succeeded".to_string(),
            attempts: 1,
            videos_found: 7,
            error_message: None,
            started_at: Some(Utc::now()),
            completed_at: Some(Utc::now()),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&item).expect("serialize crawl run");
        assert!(json.contains("\"trigger_source\":\"manual\""));
        assert!(json.contains("\"videos_found\":7"));
    }

    #[test]
    fn trigger_body_defaults_depth() {
        let body: TriggerCrawlBody =
            serde_json::from_str(r#"{"platform":"youtube","external_id":"UCabc"}"#)
                .expect("parse body");
        assert_eq!(body.depth, None);
        assert_eq!(body.platform, "youtube");
    }
}
