use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct QuotaItem {
    platform: String,
    bucket_key: String,
    /// Tokens currently available. A bucket with no traffic yet reports full.
    available: f64,
    capacity: f64,
}

pub(super) async fn quota_metrics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<QuotaItem>>>, ApiError> {
    let mut data = Vec::with_capacity(state.quota_sources.len());

    for source in state.quota_sources.iter() {
        let bucket = state.kv.read_bucket(&source.bucket_key).await.map_err(|e| {
            tracing::error!(error = %e, key = %source.bucket_key, "quota read failed");
            ApiError::new(
                req_id.0.clone(),
                "internal_error",
                "quota state unavailable",
            )
        })?;

        let (available, capacity) = match bucket {
            Some(contents) => (contents.tokens, contents.capacity),
            None => (source.capacity, source.capacity),
        };
        data.push(QuotaItem {
            platform: source.platform.clone(),
            bucket_key: source.bucket_key.clone(),
            available,
            capacity,
        });
    }

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_item_is_serializable() {
        let item = QuotaItem {
            platform: "youtube".to_string(),
            bucket_key: "yt:units".to_string(),
            available: 650.0,
            capacity: 900.0,
        };
        let json = serde_json::to_string(&item).expect("serialize quota item");
        assert!(json.contains("\"bucket_key\":\"yt:units\""));
        assert!(json.contains("\"capacity\":900.0"));
    }
}
