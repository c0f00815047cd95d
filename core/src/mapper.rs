//! Conversions between remote records and domain entities.
//!
//! # Design
//! Each `*_from_record` function reads one remote struct by its wire field
//! names and builds the matching entity. Required fields that are missing, or
//! present with the wrong wire type, produce a `MappingError`; nothing is
//! filled in with a default. Ids that the wire carries as strings are coerced
//! to integers, and flags follow the equality-to-1 rule of `Value::is_one`.
//!
//! The reverse direction only covers posts, and only the fields the write
//! methods accept. Category associations never travel inside the post record;
//! they are encoded separately by `category_assignments`.

use chrono::NaiveDateTime;

use crate::error::MappingError;
use crate::types::{Blog, Category, CategoryAssignment, Post, PostCategory, Tag, User};
use crate::value::{Record, Value, DATE_FORMAT};

/// Typed field access over one remote record.
struct Fields<'a> {
    entity: &'static str,
    record: &'a Record,
}

impl<'a> Fields<'a> {
    fn of(entity: &'static str, value: &'a Value) -> Result<Self, MappingError> {
        match value {
            Value::Struct(record) => Ok(Self { entity, record }),
            other => Err(MappingError::InvalidType {
                entity,
                field: "<record>",
                expected: "struct",
                found: other.type_name(),
            }),
        }
    }

    fn optional(&self, field: &'static str) -> Option<&'a Value> {
        self.record.get(field)
    }

    fn get(&self, field: &'static str) -> Result<&'a Value, MappingError> {
        self.optional(field).ok_or(MappingError::MissingField {
            entity: self.entity,
            field,
        })
    }

    fn wrong_type(&self, field: &'static str, expected: &'static str, found: &Value) -> MappingError {
        MappingError::InvalidType {
            entity: self.entity,
            field,
            expected,
            found: found.type_name(),
        }
    }

    fn string(&self, field: &'static str) -> Result<String, MappingError> {
        match self.get(field)? {
            Value::String(s) => Ok(s.clone()),
            other => Err(self.wrong_type(field, "string", other)),
        }
    }

    /// Identifier kept as text; integers are accepted and rendered.
    fn id_string(&self, field: &'static str) -> Result<String, MappingError> {
        match self.get(field)? {
            Value::String(s) => Ok(s.clone()),
            Value::Int(i) => Ok(i.to_string()),
            other => Err(self.wrong_type(field, "string", other)),
        }
    }

    fn integer(&self, field: &'static str) -> Result<i64, MappingError> {
        coerce_int(self.entity, field, self.get(field)?)
    }

    fn flag(&self, field: &'static str) -> Result<bool, MappingError> {
        Ok(self.get(field)?.is_one())
    }

    fn date(&self, field: &'static str) -> Result<NaiveDateTime, MappingError> {
        match self.get(field)? {
            Value::DateTime(dt) => Ok(*dt),
            Value::String(raw) => {
                NaiveDateTime::parse_from_str(raw, DATE_FORMAT).map_err(|_| MappingError::InvalidDate {
                    entity: self.entity,
                    field,
                    value: raw.clone(),
                })
            }
            other => Err(self.wrong_type(field, "dateTime.iso8601", other)),
        }
    }

    fn ids(&self, field: &'static str) -> Result<Vec<i64>, MappingError> {
        match self.get(field)? {
            Value::Array(items) => items
                .iter()
                .map(|item| coerce_int(self.entity, field, item))
                .collect(),
            other => Err(self.wrong_type(field, "array", other)),
        }
    }

    /// Keywords arrive either comma-joined or as an array of strings.
    fn keywords(&self, field: &'static str) -> Result<Vec<String>, MappingError> {
        match self.optional(field) {
            None | Some(Value::Nil) => Ok(Vec::new()),
            Some(Value::String(joined)) => Ok(joined
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(self.wrong_type(field, "string", other)),
                })
                .collect(),
            Some(other) => Err(self.wrong_type(field, "string", other)),
        }
    }
}

/// Read an integer the wire may carry as `int` or as a numeric string.
pub(crate) fn coerce_int(
    entity: &'static str,
    field: &'static str,
    value: &Value,
) -> Result<i64, MappingError> {
    match value {
        Value::Int(i) => Ok(*i),
        Value::String(s) => s.trim().parse().map_err(|_| MappingError::InvalidNumber {
            entity,
            field,
            value: s.clone(),
        }),
        other => Err(MappingError::InvalidType {
            entity,
            field,
            expected: "int",
            found: other.type_name(),
        }),
    }
}

pub fn blog_from_record(value: &Value) -> Result<Blog, MappingError> {
    let f = Fields::of("blog", value)?;
    Ok(Blog {
        id: f.id_string("blogid")?,
        name: f.string("blogName")?,
        url: f.string("url")?,
        is_admin: f.flag("isAdmin")?,
        xmlrpc_endpoint: f.string("xmlrpc")?,
    })
}

pub fn user_from_record(value: &Value) -> Result<User, MappingError> {
    let f = Fields::of("user", value)?;
    Ok(User {
        id: f.id_string("userid")?,
        first_name: f.string("firstname")?,
        last_name: f.string("lastname")?,
        nickname: f.string("nickname")?,
        email: f.string("email")?,
    })
}

pub fn category_from_record(value: &Value) -> Result<Category, MappingError> {
    let f = Fields::of("category", value)?;
    Ok(Category {
        id: f.integer("categoryId")?,
        parent_id: f.integer("parentId")?,
        description: f.string("description")?,
        name: f.string("categoryName")?,
        html_url: f.string("htmlUrl")?,
        rss_url: f.string("rssUrl")?,
    })
}

pub fn tag_from_record(value: &Value) -> Result<Tag, MappingError> {
    let f = Fields::of("tag", value)?;
    Ok(Tag {
        id: f.integer("tag_id")?,
        name: f.string("name")?,
        count: f.integer("count")?,
        slug: f.string("slug")?,
        html_url: f.string("html_url")?,
        rss_url: f.string("rss_url")?,
    })
}

pub fn post_from_record(value: &Value) -> Result<Post, MappingError> {
    let f = Fields::of("post", value)?;
    Ok(Post {
        id: f.integer("postid")?,
        title: f.string("title")?,
        date: Some(f.date("dateCreated")?),
        perma_link: f.string("permaLink")?,
        description: f.string("description")?,
        text_more: f.string("mt_text_more")?,
        excerpt: f.string("mt_excerpt")?,
        link: f.string("link")?,
        categories: f.ids("categories")?,
        tags: f.keywords("mt_keywords")?,
        user: f.id_string("userid")?,
        allow_pings: f.flag("mt_allow_pings")?,
        allow_comments: f.flag("mt_allow_comments")?,
    })
}

pub fn post_category_from_record(value: &Value) -> Result<PostCategory, MappingError> {
    let f = Fields::of("post category", value)?;
    Ok(PostCategory {
        id: f.integer("categoryId")?,
        name: f.string("categoryName")?,
        is_primary: f.optional("isPrimary").is_some_and(Value::is_one),
    })
}

/// Map every element of a remote array with `map`, preserving order.
pub fn list_from_value<T>(
    entity: &'static str,
    value: &Value,
    map: impl Fn(&Value) -> Result<T, MappingError>,
) -> Result<Vec<T>, MappingError> {
    match value {
        Value::Array(items) => items.iter().map(map).collect(),
        other => Err(MappingError::InvalidType {
            entity,
            field: "<list>",
            expected: "array",
            found: other.type_name(),
        }),
    }
}

/// Read an array of method names.
pub fn strings_from_value(entity: &'static str, value: &Value) -> Result<Vec<String>, MappingError> {
    list_from_value(entity, value, |item| match item {
        Value::String(s) => Ok(s.clone()),
        other => Err(MappingError::InvalidType {
            entity,
            field: "<item>",
            expected: "string",
            found: other.type_name(),
        }),
    })
}

/// Read the `url` field of an upload result.
pub fn media_url_from_record(value: &Value) -> Result<String, MappingError> {
    Fields::of("media object", value)?.string("url")
}

fn writable_fields(post: &Post) -> Record {
    let mut fields = Record::new();
    fields.insert("title".to_string(), Value::from(post.title.as_str()));
    fields.insert("description".to_string(), Value::from(post.description.as_str()));
    fields.insert(
        "mt_keywords".to_string(),
        Value::Array(post.tags.iter().map(|t| Value::from(t.as_str())).collect()),
    );
    if let Some(date) = post.date {
        fields.insert("dateCreated".to_string(), Value::DateTime(date));
    }
    fields
}

/// Content struct for `metaWeblog.newPost`.
pub fn new_post_record(post: &Post) -> Value {
    Value::Struct(writable_fields(post))
}

/// Content struct for `metaWeblog.editPost`.
pub fn edit_post_record(post: &Post) -> Value {
    let mut fields = writable_fields(post);
    fields.insert("permaLink".to_string(), Value::from(post.perma_link.as_str()));
    fields.insert("mt_allow_pings".to_string(), Value::Bool(post.allow_pings));
    fields.insert("mt_text_more".to_string(), Value::from(post.text_more.as_str()));
    fields.insert("mt_excerpt".to_string(), Value::from(post.excerpt.as_str()));
    Value::Struct(fields)
}

/// Array argument for `mt.setPostCategories`.
pub fn category_assignments(assignments: &[CategoryAssignment]) -> Value {
    Value::Array(
        assignments
            .iter()
            .map(|a| {
                Value::record([
                    ("categoryId", Value::Int(a.category_id)),
                    ("isPrimary", Value::Bool(a.is_primary)),
                ])
            })
            .collect(),
    )
}
