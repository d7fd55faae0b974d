//! Binary codec for RPC payloads.
//!
//! Records and the invocation envelope are serialized with bincode.
//! Header multiplicity and arbitrary body bytes survive a round trip.

use serde::{Deserialize, Serialize};

use crate::http::record::{HttpRequestRecord, HttpResponseRecord};
use crate::rpc::RpcError;

/// Envelope addressing an encoded payload to a destination operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    pub destination: String,
    pub operation: String,
    pub payload: Vec<u8>,
}

/// Reply envelope. A present `error` means the call failed remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationResponse {
    pub payload: Vec<u8>,
    pub error: Option<String>,
}

impl InvocationResponse {
    pub fn ok(payload: Vec<u8>) -> Self {
        Self {
            payload,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            payload: Vec::new(),
            error: Some(error.into()),
        }
    }
}

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, RpcError> {
    Ok(bincode::serialize(value)?)
}

pub fn decode<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, RpcError> {
    Ok(bincode::deserialize(bytes)?)
}

pub fn encode_request(request: &HttpRequestRecord) -> Result<Vec<u8>, RpcError> {
    encode(request)
}

pub fn decode_request(bytes: &[u8]) -> Result<HttpRequestRecord, RpcError> {
    decode(bytes)
}

pub fn encode_response(response: &HttpResponseRecord) -> Result<Vec<u8>, RpcError> {
    encode(response)
}

pub fn decode_response(bytes: &[u8]) -> Result<HttpResponseRecord, RpcError> {
    decode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::record::RecordHeaders;

    #[test]
    fn request_survives_with_repeated_headers_and_binary_body() {
        let mut headers = RecordHeaders::new();
        headers.insert("x-multi".to_string(), vec!["a".to_string(), "b".to_string()]);
        let request = HttpRequestRecord::new("PUT", "/blob?v=2", headers, vec![0, 255, 10, 13]);

        let decoded = decode_request(&encode_request(&request).unwrap()).unwrap();
        assert_eq!(decoded, request);
        assert_eq!(decoded.header_values("x-multi"), ["a", "b"]);
    }

    #[test]
    fn truncated_response_fails_to_decode() {
        let response = HttpResponseRecord::with_status(200).body_bytes("hello world");
        let bytes = encode_response(&response).unwrap();

        let err = decode_response(&bytes[..bytes.len() / 2]).unwrap_err();
        assert!(matches!(err, RpcError::Codec(_)));
    }

    #[test]
    fn failed_invocation_response_carries_error() {
        let reply = InvocationResponse::failed("no handler");
        let decoded: InvocationResponse = decode(&encode(&reply).unwrap()).unwrap();
        assert_eq!(decoded.error.as_deref(), Some("no handler"));
        assert!(decoded.payload.is_empty());
    }
}
