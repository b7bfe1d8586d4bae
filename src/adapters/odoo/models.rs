//! Odoo JSON-RPC models
//!
//! Request envelopes and response structures for the `/jsonrpc` endpoint.
//! These are separate from the domain models and only handle the wire
//! format.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC 2.0 call envelope
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: RpcParams<'a>,
    pub id: u64,
}

/// Parameters of a `call`: which service method to invoke
#[derive(Debug, Clone, Serialize)]
pub struct RpcParams<'a> {
    pub service: &'a str,
    pub method: &'a str,
    pub args: Vec<Value>,
}

impl<'a> RpcRequest<'a> {
    /// Builds a `call` request
    pub fn call(id: u64, service: &'a str, method: &'a str, args: Vec<Value>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: "call",
            params: RpcParams {
                service,
                method,
                args,
            },
            id,
        }
    }
}

/// JSON-RPC response: exactly one of `result` or `error` is set
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

/// Error object returned by the server
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<RpcErrorData>,
}

/// Server-side exception details
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorData {
    /// Python exception class, e.g. `odoo.exceptions.AccessDenied`
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RpcErrorObject {
    /// Most specific message available
    pub fn describe(&self) -> String {
        self.data
            .as_ref()
            .and_then(|d| d.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.message.clone())
    }

    /// Whether the server rejected the credentials
    pub fn is_access_denied(&self) -> bool {
        self.data
            .as_ref()
            .and_then(|d| d.name.as_deref())
            .map(|name| name.ends_with("AccessDenied"))
            .unwrap_or(false)
    }
}

/// One entry of a `fields_get` answer
#[derive(Debug, Clone, Deserialize)]
pub struct FieldInfo {
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub string: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_envelope() {
        let request = RpcRequest::call(1, "common", "version", vec![]);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "method": "call",
                "params": {"service": "common", "method": "version", "args": []},
                "id": 1
            })
        );
    }

    #[test]
    fn test_error_object() {
        let response: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "error": {
                "code": 200,
                "message": "Odoo Server Error",
                "data": {
                    "name": "odoo.exceptions.AccessDenied",
                    "message": "Access Denied"
                }
            }
        }))
        .unwrap();

        let error = response.error.unwrap();
        assert!(error.is_access_denied());
        assert_eq!(error.describe(), "Access Denied");
        assert!(response.result.is_none());
    }

    #[test]
    fn test_error_without_data_uses_message() {
        let error: RpcErrorObject =
            serde_json::from_value(json!({"code": -32601, "message": "Method not found"})).unwrap();
        assert!(!error.is_access_denied());
        assert_eq!(error.describe(), "Method not found");
    }
}
