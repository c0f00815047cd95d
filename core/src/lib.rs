//! Typed client for the MovableType / Blogger / MetaWeblog / WordPress remote
//! procedure API.
//!
//! # Overview
//! `BlogClient` turns the loosely typed remote methods into operations over
//! `Blog`, `User`, `Category`, `Tag` and `Post` values. The wire encoding and
//! the network round-trip belong to a `Transport` supplied by the caller, which
//! keeps this crate deterministic and easy to test.
//!
//! # Design
//! - `value` models the untyped remote values; `mapper` pins the field
//!   contract of every record and fails loudly when a record breaks it.
//! - Every remote failure surfaces as `Error::Api` carrying a numeric code and
//!   a message; contract violations surface as `Error::Mapping`.
//! - Category and tag lists are cached per selected blog and dropped when
//!   `select_blog` switches blogs.
//! - `envelope` offers a ready-made JSON encoding of calls and replies for
//!   transports that do not need the XML wire format, such as the bundled mock
//!   server used by the integration tests.

pub mod client;
pub mod config;
pub mod envelope;
pub mod error;
pub mod mapper;
pub mod transport;
pub mod types;
pub mod value;

pub use client::{BlogClient, DEFAULT_RECENT_POSTS};
pub use config::ClientConfig;
pub use envelope::{FaultBody, MethodCall, MethodResponse};
pub use error::{ApiError, Error, MappingError};
pub use transport::{Transport, TransportError};
pub use types::{Blog, Category, CategoryAssignment, Post, PostCategory, Tag, User};
pub use value::{Record, Value};
