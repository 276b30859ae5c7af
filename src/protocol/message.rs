//! Wire codec: one JSON-RPC 2.0 message per line.
//!
//! Classifies each wire line as exactly one of request, response, or
//! notification. The codec checks structural shape only; method routing
//! and parameter validation happen in the dispatcher.

use serde_json::Value;

use super::request::{JsonRpcRequest, RpcId};
use super::response::JsonRpcResponse;

/// A single protocol message, classified by shape.
///
/// - `method` + `id`  → request
/// - `method`, no `id` → notification
/// - no `method`, `id` + (`result` xor `error`) → response
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request(JsonRpcRequest),
    Response(JsonRpcResponse),
    Notification(JsonRpcRequest),
}

/// Structural decode failure for a wire line.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message is not a JSON object")]
    NotAnObject,
    #[error("unsupported jsonrpc version: {0:?}")]
    Version(Option<String>),
    #[error("response carries neither result nor error")]
    EmptyResponse,
    #[error("message has neither method nor id")]
    Unclassifiable,
}

impl Message {
    /// Serialize to a single line of text, without the trailing newline.
    /// Framing belongs to the transport.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        match self {
            Self::Request(req) | Self::Notification(req) => serde_json::to_string(req),
            Self::Response(resp) => serde_json::to_string(resp),
        }
    }

    /// Parse and classify one wire line.
    pub fn decode(line: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(line)?;
        let obj = value.as_object().ok_or(DecodeError::NotAnObject)?;

        match obj.get("jsonrpc").and_then(Value::as_str) {
            Some("2.0") => {}
            other => return Err(DecodeError::Version(other.map(str::to_string))),
        }

        if obj.contains_key("method") {
            let req: JsonRpcRequest = serde_json::from_value(value)?;
            return Ok(if req.id.is_some() {
                Self::Request(req)
            } else {
                Self::Notification(req)
            });
        }

        if obj.contains_key("id") {
            if !obj.contains_key("result") && !obj.contains_key("error") {
                return Err(DecodeError::EmptyResponse);
            }
            let resp: JsonRpcResponse = serde_json::from_value(value)?;
            return Ok(Self::Response(resp));
        }

        Err(DecodeError::Unclassifiable)
    }
}

/// Best-effort id recovery from a malformed line, so a parse-error response
/// can still be correlated by the peer when the line was valid JSON.
pub fn recover_id(line: &str) -> Option<RpcId> {
    let value: Value = serde_json::from_str(line).ok()?;
    serde_json::from_value(value.get("id")?.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::JsonRpcError;

    #[test]
    fn classify_request() {
        let msg = Message::decode(r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#).unwrap();
        match msg {
            Message::Request(req) => {
                assert_eq!(req.id, Some(RpcId::Number(1)));
                assert_eq!(req.method, "tools/list");
            }
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[test]
    fn classify_notification() {
        let msg =
            Message::decode(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).unwrap();
        assert!(matches!(msg, Message::Notification(_)));
    }

    #[test]
    fn classify_response() {
        let msg = Message::decode(r#"{"jsonrpc":"2.0","id":"a","result":{}}"#).unwrap();
        match msg {
            Message::Response(resp) => assert_eq!(resp.id, Some(RpcId::Str("a".into()))),
            other => panic!("expected response, got {other:?}"),
        }
    }

    #[test]
    fn reject_invalid_json() {
        assert!(matches!(
            Message::decode("{not json"),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn reject_non_object() {
        assert!(matches!(
            Message::decode("[1,2,3]"),
            Err(DecodeError::NotAnObject)
        ));
    }

    #[test]
    fn reject_wrong_version() {
        assert!(matches!(
            Message::decode(r#"{"jsonrpc":"1.0","id":1,"method":"ping"}"#),
            Err(DecodeError::Version(_))
        ));
    }

    #[test]
    fn reject_response_without_result_or_error() {
        assert!(matches!(
            Message::decode(r#"{"jsonrpc":"2.0","id":1}"#),
            Err(DecodeError::EmptyResponse)
        ));
    }

    #[test]
    fn request_roundtrip_preserves_all_fields() {
        let original = Message::Request(JsonRpcRequest::new(
            RpcId::Number(7),
            "tools/call",
            Some(serde_json::json!({"name":"echo","arguments":{"message":"hi"}})),
        ));
        let decoded = Message::decode(&original.encode().unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn error_response_roundtrip() {
        let original = Message::Response(JsonRpcResponse::error(
            Some(RpcId::Str("x-1".into())),
            JsonRpcError::method_not_found("frobnicate"),
        ));
        let decoded = Message::decode(&original.encode().unwrap()).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn recover_id_from_shape_invalid_line() {
        let id = recover_id(r#"{"jsonrpc":"2.0","id":42}"#);
        assert_eq!(id, Some(RpcId::Number(42)));
        assert_eq!(recover_id("{broken"), None);
    }
}
