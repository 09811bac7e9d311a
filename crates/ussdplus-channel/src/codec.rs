// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// JSON method codec.
//
// Wire format shared with the application shell:
//
//   call     {"method": "getSMS", "args": null}
//   success  [<result>]
//   error    [<code>, <message>, <details>]      details is always null here
//   not impl (empty message)

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use ussdplus_core::error::{Result, UssdPlusError};
use ussdplus_core::reply_errors::ReplyError;

/// Error code for a message that could not be decoded as a method call.
pub const BAD_CALL: &str = "BAD_CALL";

/// A decoded method invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub args: Value,
}

impl MethodCall {
    /// A call with no arguments.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            args: Value::Null,
        }
    }
}

/// Outcome of a method call, before encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodReply {
    Success(Value),
    Error { code: String, message: String },
    /// The handler does not know the method.
    NotImplemented,
}

impl MethodReply {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        MethodReply::Error {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<ReplyError> for MethodReply {
    fn from(reply: ReplyError) -> Self {
        MethodReply::error(reply.code(), reply.message)
    }
}

/// Stateless JSON codec for calls and reply envelopes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMethodCodec;

impl JsonMethodCodec {
    pub fn encode_method_call(&self, call: &MethodCall) -> Vec<u8> {
        json!({ "method": call.method, "args": call.args })
            .to_string()
            .into_bytes()
    }

    pub fn decode_method_call(&self, message: &[u8]) -> Result<MethodCall> {
        let value: Value = serde_json::from_slice(message)
            .map_err(|e| UssdPlusError::Codec(format!("call is not valid JSON: {e}")))?;
        let Value::Object(mut obj) = value else {
            return Err(UssdPlusError::Codec("call is not a JSON object".into()));
        };
        let method = match obj.remove("method") {
            Some(Value::String(method)) => method,
            _ => return Err(UssdPlusError::Codec("call has no string 'method'".into())),
        };
        let args = obj.remove("args").unwrap_or(Value::Null);
        Ok(MethodCall { method, args })
    }

    /// Encode a reply envelope. Not-implemented encodes to an empty message.
    pub fn encode_reply(&self, reply: &MethodReply) -> Vec<u8> {
        let envelope = match reply {
            MethodReply::Success(result) => json!([result]),
            MethodReply::Error { code, message } => json!([code, message, Value::Null]),
            MethodReply::NotImplemented => return Vec::new(),
        };
        envelope.to_string().into_bytes()
    }

    pub fn decode_reply(&self, envelope: &[u8]) -> Result<MethodReply> {
        if envelope.is_empty() {
            return Ok(MethodReply::NotImplemented);
        }
        let value: Value = serde_json::from_slice(envelope)
            .map_err(|e| UssdPlusError::Codec(format!("envelope is not valid JSON: {e}")))?;
        let Value::Array(mut items) = value else {
            return Err(UssdPlusError::Codec("envelope is not a JSON array".into()));
        };
        match items.len() {
            1 => Ok(MethodReply::Success(items.remove(0))),
            3 => match (&items[0], &items[1]) {
                (Value::String(code), Value::String(message)) => {
                    Ok(MethodReply::error(code.as_str(), message.as_str()))
                }
                _ => Err(UssdPlusError::Codec(
                    "error envelope needs string code and message".into(),
                )),
            },
            n => Err(UssdPlusError::Codec(format!(
                "envelope has {n} elements, expected 1 or 3"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODEC: JsonMethodCodec = JsonMethodCodec;

    #[test]
    fn call_without_args_decodes_to_null() {
        let call = CODEC.decode_method_call(br#"{"method":"getSMS"}"#).unwrap();
        assert_eq!(call, MethodCall::new("getSMS"));
    }

    #[test]
    fn encoded_call_is_shell_format() {
        let bytes = CODEC.encode_method_call(&MethodCall::new("getSMS"));
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!({"method": "getSMS", "args": null}));
    }

    #[test]
    fn non_object_call_rejected() {
        assert!(matches!(
            CODEC.decode_method_call(b"[\"getSMS\"]"),
            Err(UssdPlusError::Codec(_))
        ));
        assert!(matches!(
            CODEC.decode_method_call(br#"{"method": 3}"#),
            Err(UssdPlusError::Codec(_))
        ));
        assert!(matches!(
            CODEC.decode_method_call(b"\xff\xfe"),
            Err(UssdPlusError::Codec(_))
        ));
    }

    #[test]
    fn error_envelope_has_null_details() {
        let bytes = CODEC.encode_reply(&MethodReply::error("SMS_ERROR", "boom"));
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value, json!(["SMS_ERROR", "boom", null]));
    }

    #[test]
    fn not_implemented_is_empty() {
        assert!(CODEC.encode_reply(&MethodReply::NotImplemented).is_empty());
        assert_eq!(CODEC.decode_reply(b"").unwrap(), MethodReply::NotImplemented);
    }

    #[test]
    fn success_envelope_wraps_result() {
        let reply = MethodReply::Success(json!([{"_id": 1}]));
        let bytes = CODEC.encode_reply(&reply);
        assert_eq!(String::from_utf8(bytes.clone()).unwrap(), r#"[[{"_id":1}]]"#);
        assert_eq!(CODEC.decode_reply(&bytes).unwrap(), reply);
    }

    #[test]
    fn malformed_envelopes_rejected() {
        assert!(CODEC.decode_reply(b"{}").is_err());
        assert!(CODEC.decode_reply(b"[1, 2]").is_err());
        assert!(CODEC.decode_reply(b"[1, 2, null]").is_err());
    }
}
