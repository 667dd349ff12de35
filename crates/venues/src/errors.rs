//! Classification of transport and payload failures into [`AdapterError`].

use reqwest::StatusCode;
use serde::Deserialize;

use coinhub_core::AdapterError;

/// Error body returned by Binance-style REST APIs.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: i64,
    pub msg: String,
}

/// Venue codes that mean the key or signature was refused.
const AUTH_ERROR_CODES: [i64; 4] = [-1022, -2008, -2014, -2015];

pub(crate) fn network_error(err: reqwest::Error) -> AdapterError {
    if err.is_timeout() {
        AdapterError::Network(format!("Request timed out: {err}"))
    } else {
        AdapterError::Network(format!("Request failed: {err}"))
    }
}

pub(crate) fn parse_error(err: serde_json::Error) -> AdapterError {
    AdapterError::InvalidResponse(format!("Failed to parse response: {err}"))
}

/// Maps a non-success HTTP response onto an adapter error.
pub(crate) fn status_error(status: StatusCode, body: &str) -> AdapterError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(api) if AUTH_ERROR_CODES.contains(&api.code) => AdapterError::Authentication(api.msg),
        Ok(api) => AdapterError::Exchange {
            code: api.code,
            message: api.msg,
        },
        Err(_) if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => {
            AdapterError::Authentication(format!("HTTP {status}"))
        }
        Err(_) => AdapterError::Exchange {
            code: i64::from(status.as_u16()),
            message: truncate(body),
        },
    }
}

fn truncate(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
