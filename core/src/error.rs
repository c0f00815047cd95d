//! Error types for the blog client.
//!
//! # Design
//! Every remote failure reaches the caller as an `ApiError` carrying a numeric
//! code and a message, whatever the transport underneath reported. The
//! conversion from `TransportError` is the only place that translation
//! happens. Operations that fail their own postcondition (blog not found, edit
//! rejected, no posts) use the same shape with code 0.
//!
//! Records that do not match the expected field contract are a different kind
//! of failure, a broken assumption about the remote API rather than a runtime
//! condition, so they get their own `MappingError` type.

use std::io;
use std::path::PathBuf;

use crate::transport::TransportError;

/// Message used when `select_blog` finds no matching blog.
pub const BLOG_NOT_FOUND: &str = "Blog not found";
/// Message used when the remote endpoint rejects a post edit.
pub const POST_EDIT_FAILED: &str = "Post edit failed";
/// Message used when `get_last_post` runs against an empty blog.
pub const NO_POSTS: &str = "No posts found";

/// Domain error: a numeric code plus a message.
///
/// Remote faults keep the code the endpoint sent. Failures raised by the
/// client itself, or transport conditions without a code, use 0.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("remote error {code}: {message}")]
pub struct ApiError {
    pub code: i32,
    pub message: String,
}

impl ApiError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// An application-level failure with code 0.
    pub fn application(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Fault { code, message } => ApiError::new(code, message),
            other => ApiError::application(other.to_string()),
        }
    }
}

/// A remote record did not satisfy the field contract of an entity.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MappingError {
    #[error("{entity}: missing required field '{field}'")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },

    #[error("{entity}: field '{field}' should be {expected}, got {found}")]
    InvalidType {
        entity: &'static str,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{entity}: field '{field}' is not a number: '{value}'")]
    InvalidNumber {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("{entity}: field '{field}' is not a valid date: '{value}'")]
    InvalidDate {
        entity: &'static str,
        field: &'static str,
        value: String,
    },
}

/// Errors returned by `BlogClient` operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A remote fault or an application-level failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A remote record violated its field contract.
    #[error("unexpected remote record: {0}")]
    Mapping(#[from] MappingError),

    /// The media file could not be read before upload.
    #[error("failed to read media file '{}': {source}", .path.display())]
    Media {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn application(message: &str) -> Self {
        Error::Api(ApiError::application(message))
    }

    /// The domain error code, or 0 for failures that never reached the remote
    /// endpoint.
    pub fn code(&self) -> i32 {
        match self {
            Error::Api(err) => err.code,
            Error::Mapping(_) | Error::Media { .. } => 0,
        }
    }

    /// Returns the inner `ApiError` if this is a remote or application failure.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for Error {
    fn from(err: TransportError) -> Self {
        Error::Api(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_keeps_code_and_message() {
        let err: ApiError = TransportError::Fault {
            code: 403,
            message: "Incorrect username or password.".to_string(),
        }
        .into();
        assert_eq!(err.code, 403);
        assert_eq!(err.message, "Incorrect username or password.");
    }

    #[test]
    fn non_fault_becomes_code_zero() {
        let err: ApiError = TransportError::Connection("connection refused".to_string()).into();
        assert_eq!(err.code, 0);
        assert_eq!(err.message, "connection failed: connection refused");
    }

    #[test]
    fn transport_error_surfaces_as_api_variant() {
        let err: Error = TransportError::Encoding("bad body".to_string()).into();
        assert!(matches!(err, Error::Api(ApiError { code: 0, .. })));
    }

    #[test]
    fn application_error_has_code_zero() {
        let err = Error::application(BLOG_NOT_FOUND);
        assert_eq!(err.code(), 0);
        assert_eq!(err.as_api().unwrap().message, "Blog not found");
        assert_eq!(err.to_string(), "remote error 0: Blog not found");
    }

    #[test]
    fn mapping_error_is_distinct() {
        let err: Error = MappingError::MissingField {
            entity: "post",
            field: "postid",
        }
        .into();
        assert!(err.as_api().is_none());
        assert_eq!(
            err.to_string(),
            "unexpected remote record: post: missing required field 'postid'"
        );
    }
}
