// JSON-RPC envelope for the Deluge web endpoint.
//
// The dialect is a single POST target with `{method, params, id}` bodies.
// Success is `{"result": <any>, "error": null}`; `result: null` is how
// mutating calls report success. The `error` field arrives in three
// shapes: null, a bare string, or an object carrying a `message`.

use serde::{Deserialize, Serialize};

/// A single JSON-RPC request body.
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub method: &'a str,
    pub params: serde_json::Value,
    pub id: i64,
}

/// The daemon's response envelope.
///
/// `result` is kept as a raw value so callers can decide whether `null`
/// means "success with no payload" (set-style calls) or a type error
/// (get-style calls).
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<RpcFault>,
    #[serde(default)]
    pub id: Option<i64>,
}

/// A populated `error` field, in any of the daemon's shapes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RpcFault {
    Message(String),
    Detail {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        code: Option<i64>,
    },
    Other(serde_json::Value),
}

impl RpcFault {
    /// Flatten the fault into one displayable message.
    pub fn message(&self) -> String {
        match self {
            Self::Message(s) => s.clone(),
            Self::Detail { message, code } => match (message, code) {
                (Some(m), Some(c)) => format!("{m} (code {c})"),
                (Some(m), None) => m.clone(),
                (None, Some(c)) => format!("daemon error code {c}"),
                (None, None) => "unspecified daemon error".into(),
            },
            Self::Other(v) => v.to_string(),
        }
    }
}

/// Truncate a response body for error messages, respecting char bounds.
pub(crate) fn preview(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((i, _)) => &body[..i],
        None => body,
    }
}

/// The daemon's login answer follows its scripting language's boolean
/// convention, so "falsy" covers more than literal `false`.
pub(crate) fn truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(a) => !a.is_empty(),
        serde_json::Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn fault_deserializes_from_string() {
        let r: RpcResponse = serde_json::from_str(r#"{"result": null, "error": "boom"}"#).unwrap();
        assert_eq!(r.error.unwrap().message(), "boom");
    }

    #[test]
    fn fault_deserializes_from_object() {
        let r: RpcResponse =
            serde_json::from_str(r#"{"error": {"message": "not authenticated", "code": 1}}"#)
                .unwrap();
        assert_eq!(r.error.unwrap().message(), "not authenticated (code 1)");
    }

    #[test]
    fn null_error_is_success() {
        let r: RpcResponse =
            serde_json::from_str(r#"{"result": true, "error": null, "id": 1}"#).unwrap();
        assert!(r.error.is_none());
        assert_eq!(r.result, Some(serde_json::Value::Bool(true)));
    }

    #[test]
    fn unexpected_fault_shape_still_reads() {
        let r: RpcResponse = serde_json::from_str(r#"{"error": [1, 2]}"#).unwrap();
        assert_eq!(r.error.unwrap().message(), "[1,2]");
    }

    #[test]
    fn preview_respects_char_boundaries() {
        let s = "é".repeat(300);
        assert_eq!(preview(&s).chars().count(), 200);
    }
}
