//! Plain-data request and response envelopes for host-side transports.
//!
//! # Design
//! These types describe one remote call and its outcome without any I/O. A
//! transport that wants a ready-made encoding can build a `MethodCall`,
//! serialize it with `to_json`, ship the bytes however it likes, and hand the
//! reply body to `MethodResponse::from_json`. The bundled mock server speaks
//! exactly this encoding.

use serde::{Deserialize, Serialize};

use crate::transport::TransportError;
use crate::value::Value;

/// A single remote call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodCall {
    pub method_name: String,
    pub params: Vec<Value>,
}

/// A fault reported by the endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaultBody {
    pub fault_code: i32,
    pub fault_string: String,
}

/// The outcome of a remote call: a result value or a fault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MethodResponse {
    Params(Value),
    Fault(FaultBody),
}

impl MethodCall {
    pub fn new(method_name: &str, params: &[Value]) -> Self {
        Self {
            method_name: method_name.to_string(),
            params: params.to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(|e| TransportError::Encoding(e.to_string()))
    }
}

impl MethodResponse {
    pub fn from_json(body: &str) -> Result<Self, TransportError> {
        serde_json::from_str(body).map_err(|e| TransportError::Encoding(e.to_string()))
    }

    /// Collapse the envelope into the transport result shape.
    pub fn into_result(self) -> Result<Value, TransportError> {
        match self {
            MethodResponse::Params(value) => Ok(value),
            MethodResponse::Fault(fault) => Err(TransportError::Fault {
                code: fault.fault_code,
                message: fault.fault_string,
            }),
        }
    }
}
