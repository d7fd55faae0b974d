//! Translation between native HTTP messages and destination records.
//!
//! # Responsibilities
//! - Buffer the inbound body and copy method, path+query and headers
//! - Write a destination's status, headers and body back to the client
//! - Shape failures into server-error responses carrying the error text
//!
//! # Design Decisions
//! - Header values are copied in arrival order; repeated keys stay repeated
//! - Header values are passed through byte-exact; a value that is not
//!   UTF-8 cannot be carried by a record and fails the request
//! - Header names reach the destination lowercased
//! - No body size limit: that belongs to surrounding infrastructure

use std::fmt::Display;

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::http::record::{HttpRequestRecord, HttpResponseRecord, RecordHeaders};

/// Errors while shaping records to or from native HTTP.
#[derive(Debug, Error)]
pub enum TranslationError {
    /// The inbound body stream failed.
    #[error("failed to read request body: {0}")]
    Read(String),

    /// An inbound header value is not valid UTF-8.
    #[error("request header `{0}` is not valid UTF-8")]
    NonUtf8Header(String),

    /// The destination replied with a status HTTP cannot carry.
    #[error("invalid status code {0} in destination response")]
    InvalidStatus(u16),

    #[error("invalid header name `{0}` in destination response")]
    InvalidHeaderName(String),

    #[error("invalid value for header `{0}` in destination response")]
    InvalidHeaderValue(String),
}

/// Build a request record from a native request, consuming its body.
pub async fn to_request_record(request: Request<Body>) -> Result<HttpRequestRecord, TranslationError> {
    let (parts, body) = request.into_parts();

    // The body is consumed here on success and dropped on error.
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .map_err(|e| TranslationError::Read(e.to_string()))?;

    let path = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| parts.uri.path().to_string());

    Ok(HttpRequestRecord::new(
        parts.method.as_str(),
        path,
        collect_headers(&parts.headers)?,
        body.to_vec(),
    ))
}

fn collect_headers(headers: &HeaderMap) -> Result<RecordHeaders, TranslationError> {
    let mut collected = RecordHeaders::new();
    for (name, value) in headers.iter() {
        let value = std::str::from_utf8(value.as_bytes())
            .map_err(|_| TranslationError::NonUtf8Header(name.as_str().to_string()))?;
        collected
            .entry(name.as_str().to_string())
            .or_default()
            .push(value.to_string());
    }
    Ok(collected)
}

/// Turn a destination's response record into a native response.
///
/// The first value for a header sets it and later values are appended,
/// so repeated headers such as `Set-Cookie` all reach the client.
pub fn apply_response_record(record: HttpResponseRecord) -> Result<Response, TranslationError> {
    let (status_code, headers, body) = record.into_parts();
    let status =
        StatusCode::from_u16(status_code).map_err(|_| TranslationError::InvalidStatus(status_code))?;

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;

    let target = response.headers_mut();
    for (name, values) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| TranslationError::InvalidHeaderName(name.clone()))?;
        for value in values {
            let header_value = HeaderValue::from_str(&value)
                .map_err(|_| TranslationError::InvalidHeaderValue(name.clone()))?;
            if target.contains_key(&header_name) {
                target.append(header_name.clone(), header_value);
            } else {
                target.insert(header_name.clone(), header_value);
            }
        }
    }

    Ok(response)
}

/// A 500 response whose body is the error text.
pub fn error_response(err: &impl Display) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
}
