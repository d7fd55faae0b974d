//! Destination-neutral request and response records.
//!
//! These are the shapes exchanged with a destination over RPC. They carry
//! no HTTP library types so the codec can round-trip them losslessly.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Multi-valued headers. Values for a key keep their arrival order.
pub type RecordHeaders = HashMap<String, Vec<String>>;

/// An inbound HTTP request as seen by a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequestRecord {
    method: String,
    path: String,
    headers: RecordHeaders,
    body: Vec<u8>,
}

impl HttpRequestRecord {
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        headers: RecordHeaders,
        body: Vec<u8>,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            headers,
            body,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Path including the query string, if any.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &RecordHeaders {
        &self.headers
    }

    pub fn header_values(&self, name: &str) -> &[String] {
        self.headers.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// A destination's reply, to be written back to the HTTP client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpResponseRecord {
    status_code: u16,
    headers: RecordHeaders,
    body: Vec<u8>,
}

impl HttpResponseRecord {
    pub fn new(status_code: u16, headers: RecordHeaders, body: Vec<u8>) -> Self {
        Self {
            status_code,
            headers,
            body,
        }
    }

    /// Start a response with a status and no headers or body.
    pub fn with_status(status_code: u16) -> Self {
        Self::new(status_code, RecordHeaders::new(), Vec::new())
    }

    /// Append a header value, keeping any earlier values for the same key.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.entry(name.into()).or_default().push(value.into());
        self
    }

    pub fn body_bytes(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn headers(&self) -> &RecordHeaders {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_parts(self) -> (u16, RecordHeaders, Vec<u8>) {
        (self.status_code, self.headers, self.body)
    }
}
