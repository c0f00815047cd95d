//! The capability the client uses to reach the remote endpoint.
//!
//! # Design
//! The client never encodes requests or talks to the network itself. It hands
//! a method name and positional parameters to a `Transport` and gets back a
//! single `Value` or a `TransportError`. How the call travels (XML over HTTP,
//! the JSON envelope in `crate::envelope`, an in-memory fake) is the
//! transport's business, as are timeouts, TLS and connection reuse.

use crate::value::Value;

/// Errors a transport may report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The endpoint answered with a protocol-level fault.
    #[error("fault {code}: {message}")]
    Fault { code: i32, message: String },

    /// The call never produced a response.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request or response could not be encoded or decoded.
    #[error("malformed payload: {0}")]
    Encoding(String),
}

/// A handle to a remote procedure endpoint.
pub trait Transport: Sized {
    /// Open a transport bound to `endpoint`.
    fn connect(endpoint: &str) -> Result<Self, TransportError>;

    /// Invoke `method` with positional `params` and wait for the result.
    fn call(&self, method: &str, params: &[Value]) -> Result<Value, TransportError>;

    /// A new transport pointed at `endpoint`, keeping this one's settings.
    fn bind(&self, endpoint: &str) -> Result<Self, TransportError>;
}
