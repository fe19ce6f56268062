// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("session expired or not authorized -- sign in again")]
    Unauthorized,
    #[error("cannot reach {base_url} -- check api.base_url and your network ({source})")]
    Connection {
        base_url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("server error ({status}): {message}")]
    Status { status: u16, message: String },
    #[error("{0}")]
    Rejected(String),
    #[error("decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl ApiError {
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

/// True when `error` carries an [`ApiError::Unauthorized`] anywhere in its chain.
pub fn is_unauthorized(error: &anyhow::Error) -> bool {
    error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<ApiError>())
        .any(ApiError::is_unauthorized)
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

pub(crate) fn clean_error_response(status: StatusCode, body: &str) -> ApiError {
    let code = status.as_u16();
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.message.or(parsed.error)
        && !message.trim().is_empty()
    {
        return ApiError::Status {
            status: code,
            message,
        };
    }

    let trimmed = body.trim();
    let message = if !trimmed.is_empty() && trimmed.len() < 100 && !trimmed.contains('<') {
        trimmed.to_owned()
    } else {
        status
            .canonical_reason()
            .unwrap_or("unexpected response")
            .to_owned()
    };
    ApiError::Status {
        status: code,
        message,
    }
}
