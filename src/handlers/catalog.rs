use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, Method},
    response::Json,
};
use chrono::{DateTime, Local, NaiveDateTime};
use serde::Deserialize;

use crate::api::envelope::Envelope;
use crate::database::store::CatalogSource;
use crate::error::ApiError;

/// Accepted `last_updated` format, e.g. `2021-01-02T15:04:05+0000`.
const LAST_UPDATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Shared per-request state: read-only store handle and the configured
/// API key. Safe for concurrent access; nothing here is mutated.
#[derive(Clone)]
pub struct AppState {
    pub source: Arc<dyn CatalogSource>,
    pub api_key: String,
}

#[derive(Debug, Deserialize)]
struct FeedRequest {
    /// Missing key is treated as an empty (wrong) key, not a parse error.
    #[serde(default)]
    api_key: String,
    #[serde(default)]
    last_updated: Option<String>,
}

/// POST / - the single endpoint. Sequential validation, first failure wins;
/// every outcome is an HTTP 200 envelope.
pub async fn feed(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    body: Bytes,
) -> Result<Json<Envelope>, ApiError> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();
    if !content_type.starts_with("application/json") {
        return Err(ApiError::InvalidContentType(content_type));
    }

    log_access(&headers, connect_info.map(|ConnectInfo(addr)| addr));

    if method != Method::POST {
        return Err(ApiError::InvalidRequest);
    }

    let request: FeedRequest =
        serde_json::from_slice(&body).map_err(|e| ApiError::InvalidBody(e.to_string()))?;

    if request.api_key != state.api_key {
        tracing::warn!("got invalid api_key [{}]", request.api_key);
        return Err(ApiError::InvalidApiKey);
    }

    let min_updated_at = match request.last_updated.as_deref() {
        Some(raw) if !raw.is_empty() => {
            Some(parse_last_updated(raw).map_err(|e| ApiError::InvalidTime(e.to_string()))?)
        }
        _ => None,
    };

    let records = state.source.fetch(min_updated_at).await?;
    Ok(Json(Envelope::ok(records)))
}

/// Access log line for every request that passed the content-type check:
/// source IP, local timestamp, user agent.
fn log_access(headers: &HeaderMap, peer: Option<SocketAddr>) {
    let ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
        .or_else(|| peer.map(|p| p.ip().to_string()))
        .unwrap_or_default();

    let now = Local::now().format("%Y-%m-%d %H:%M:%S");
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    tracing::info!("{ip}\t{now}\t{user_agent}");
}

/// Parse the fixed timestamp format and keep the wall-clock value as written,
/// which is what the store compares against `at_date_update`. A literal `Z`
/// suffix means UTC.
fn parse_last_updated(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    if let Some(prefix) = raw.strip_suffix('Z') {
        return NaiveDateTime::parse_from_str(prefix, "%Y-%m-%dT%H:%M:%S");
    }
    DateTime::parse_from_str(raw, LAST_UPDATED_FORMAT).map(|dt| dt.naive_local())
}
