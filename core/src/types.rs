//! Domain entities exchanged with the blog endpoint.
//!
//! # Design
//! These are plain records built fresh by the mappers on every call. Field
//! names follow Rust conventions and are deliberately unrelated to the remote
//! field names; `crate::mapper` owns that correspondence. `Default` gives the
//! "not yet fetched" value of each entity, which is also what callers start
//! from when composing a new post.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A blog the authenticated account can access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blog {
    pub id: String,
    pub name: String,
    pub url: String,
    pub is_admin: bool,
    /// Remote procedure endpoint serving this blog.
    pub xmlrpc_endpoint: String,
}

/// The authenticated identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub nickname: String,
    pub email: String,
}

/// A node in the blog's category tree. `parent_id == 0` marks a root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub parent_id: i64,
    pub description: String,
    pub name: String,
    pub html_url: String,
    pub rss_url: String,
}

impl Category {
    pub fn is_root(&self) -> bool {
        self.parent_id == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub count: i64,
    pub slug: String,
    pub html_url: String,
    pub rss_url: String,
}

/// The unit of content exchanged with the blog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
    pub perma_link: String,
    pub description: String,
    /// Body continuation shown after the "more" break.
    pub text_more: String,
    pub excerpt: String,
    pub link: String,
    /// Category identifiers. Resolve them through `BlogClient::get_categories`.
    pub categories: Vec<i64>,
    pub tags: Vec<String>,
    /// Author id.
    pub user: String,
    pub allow_pings: bool,
    pub allow_comments: bool,
}

/// Write-side association of a post with a category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAssignment {
    pub category_id: i64,
    pub is_primary: bool,
}

impl CategoryAssignment {
    /// A non-primary assignment, which is what post writes send.
    pub fn secondary(category_id: i64) -> Self {
        Self {
            category_id,
            is_primary: false,
        }
    }
}

/// Read-side association of a post with a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCategory {
    pub id: i64,
    pub name: String,
    pub is_primary: bool,
}
