use axum::{
    Json,
    extract::{Multipart, Query, State, rejection::JsonRejection},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::future::try_join_all;
use shared_types::{ContentKey, encode_data_uri};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    dto::{DataEnvelope, DataQuery, PostDataRequest, PostDataResponse, UploadResponse},
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Public caching policy for successful reads.
pub const DATA_CACHE_CONTROL: &str = "public, s-maxage=60, stale-while-revalidate=300";

/// Decode a `POST /data` body. Anything but a JSON object with a string
/// `key` is a 400.
fn parse_write(body: serde_json::Value) -> ApiResult<PostDataRequest> {
    if !body.is_object() {
        return Err(ApiError::BadRequest("Expected a JSON object".to_string()));
    }
    serde_json::from_value(body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))
}

fn parse_key(raw: &str) -> ApiResult<ContentKey> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid key: {raw}")))
}

/// Valid keys from a comma-separated list, in order, without duplicates.
/// Unknown keys are dropped.
fn parse_key_list(raw: &str) -> Vec<ContentKey> {
    let mut keys = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        match part.parse::<ContentKey>() {
            Ok(key) if !keys.contains(&key) => keys.push(key),
            Ok(_) => {}
            Err(_) => debug!("Dropping unknown key from batch: {}", part),
        }
    }
    keys
}

async fn load(state: &AppState, key: ContentKey) -> anyhow::Result<serde_json::Value> {
    if let Some(value) = state.cache.get(key) {
        debug!(%key, "Serving cached value");
        return Ok(value);
    }

    let value = state.storage.read(key).await?;
    state.cache.insert(key, value.clone());
    Ok(value)
}

fn cacheable<T: serde::Serialize>(body: DataEnvelope<T>) -> Response {
    ([(header::CACHE_CONTROL, DATA_CACHE_CONTROL)], Json(body)).into_response()
}

/// GET /data?key=K or GET /data?keys=K1,K2
#[instrument(skip(state))]
pub async fn get_data(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DataQuery>,
) -> ApiResult<Response> {
    if let Some(raw) = query.key.as_deref() {
        let key = parse_key(raw)?;
        info!(%key, "Getting content");

        let data = load(&state, key).await?;
        return Ok(cacheable(DataEnvelope { data }));
    }

    if let Some(raw) = query.keys.as_deref() {
        let keys = parse_key_list(raw);
        if keys.is_empty() {
            return Err(ApiError::BadRequest("No valid keys provided".to_string()));
        }
        info!(count = keys.len(), "Getting content batch");

        let state = state.as_ref();
        let values = try_join_all(keys.into_iter().map(|key| async move {
            load(state, key)
                .await
                .map(|value| (key.as_str().to_string(), value))
        }))
        .await?;

        let data: serde_json::Map<String, serde_json::Value> = values.into_iter().collect();
        return Ok(cacheable(DataEnvelope { data }));
    }

    Err(ApiError::BadRequest("Missing key parameter".to_string()))
}

/// POST /data
/// Replace the value stored under a key
#[instrument(skip(state, headers, payload))]
pub async fn post_data(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Json<PostDataResponse>> {
    state.authorize(&headers)?;

    let Json(body) = payload?;
    let request = parse_write(body)?;

    let key = parse_key(request.key.as_deref().unwrap_or_default())?;
    let data = request
        .data
        .ok_or_else(|| ApiError::BadRequest("Missing data".to_string()))?;

    info!(%key, "Writing content");
    state.storage.write(key, &data).await?;

    state.cache.evict(key);
    state.revalidator.revalidate(key);

    Ok(Json(PostDataResponse {
        success: true,
        data,
    }))
}

/// POST /upload
/// Encode the multipart field `file` as a data URI
#[instrument(skip(state, headers, multipart))]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    state.authorize(&headers)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let mime = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes: Bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {e}")))?;

        if bytes.is_empty() {
            return Err(ApiError::BadRequest("Uploaded file is empty".to_string()));
        }

        info!(mime = %mime, size = bytes.len(), "Encoded upload");
        return Ok(Json(UploadResponse {
            success: true,
            url: encode_data_uri(&mime, &bytes),
        }));
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "site-content",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
