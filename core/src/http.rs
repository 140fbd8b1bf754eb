//! HTTP request/response types and status classification.
//!
//! # Design
//! Requests and responses are plain data. `HttpRequest::new` resolves a
//! relative path against a base URL and encodes the JSON:API body;
//! `HttpResponse` holds a fully read body, so whichever transport produced it
//! has already released the underlying stream. Status classification is a
//! static table shared by every operation; per-operation overrides (201 on
//! create, 204/409 on delete) live in the account client.

use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::error::{ApiError, Result};

/// Media type for every request body sent to the account API.
pub const JSON_API_CONTENT_TYPE: &str = "application/vnd.api+json";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Build a request for `path` resolved against `base`.
    ///
    /// A `Some` body is serialized to JSON and tagged with the JSON:API
    /// content type; `None` produces a request with neither body nor
    /// content-type header.
    pub fn new<B>(base: &Url, method: HttpMethod, path: &str, body: Option<&B>) -> Result<Self>
    where
        B: Serialize + ?Sized,
    {
        let url = base
            .join(path)
            .map_err(|e| ApiError::RequestConstruction(format!("invalid path {path:?}: {e}")))?;

        let (headers, body) = match body {
            Some(value) => {
                let encoded = serde_json::to_string(value)
                    .map_err(|e| ApiError::RequestConstruction(e.to_string()))?;
                (
                    vec![("content-type".to_string(), JSON_API_CONTENT_TYPE.to_string())],
                    Some(encoded),
                )
            }
            None => (Vec::new(), None),
        };

        Ok(HttpRequest {
            method,
            url: url.into(),
            headers,
            body,
        })
    }
}

/// An HTTP response with its body already read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Apply the shared status classification to this response.
    pub fn error_for_status(&self) -> Result<()> {
        classify(self.status)
    }

    /// Classify the status, then decode the body as JSON into `T`.
    pub fn json<T: DeserializeOwned>(self) -> Result<T> {
        self.error_for_status()?;
        decode(&self.body)
    }
}

/// Status codes with a dedicated error, checked after the 2xx range.
const STATUS_TABLE: &[(u16, ApiError)] = &[
    (400, ApiError::BadRequest),
    (403, ApiError::NotAuthorized),
    (404, ApiError::ContentNotFound),
];

/// Map a status code to success or a typed error.
///
/// 409 is deliberately absent from the table: outside the delete path a
/// conflict is an `InternalServer` error like any other unlisted status.
pub fn classify(status: u16) -> Result<()> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    let err = STATUS_TABLE
        .iter()
        .find(|(code, _)| *code == status)
        .map(|(_, err)| err.clone())
        .unwrap_or(ApiError::InternalServer { status });
    Err(err)
}

/// Decode a JSON body, reporting failures as `ApiError::Decode`.
pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}
