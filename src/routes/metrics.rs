use axum::http::header;
use prometheus::{Encoder, TextEncoder};

use crate::error::ApiError;

/// GET /metrics — Prometheus scrape endpoint.
pub async fn metrics_handler() -> Result<([(header::HeaderName, String); 1], String), ApiError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(anyhow::Error::from)?;
    let body = String::from_utf8(buffer).map_err(anyhow::Error::from)?;
    Ok(([(header::CONTENT_TYPE, encoder.format_type().to_string())], body))
}
