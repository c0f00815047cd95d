//! In-memory emulation of a two-blog WordPress remote procedure endpoint.
//!
//! # Design
//! Calls arrive as JSON envelopes (`{"methodName": ..., "params": [...]}`) on
//! `/xmlrpc.php` (blog "1") or `/blog2/xmlrpc.php` (blog "2") and are answered
//! with `{"params": value}` or `{"fault": {...}}`. Values use the same
//! type-tagged encoding as the client crate but are defined here
//! independently, so a schema drift between the two shows up in the
//! integration tests.
//!
//! Only the subset of WordPress behavior the client relies on is modelled:
//! one account, per-blog categories and tags, a shared post table, and the
//! fault codes WordPress uses for bad credentials and unknown posts.

use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::State,
    http::{header::HOST, HeaderMap},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

pub const USERNAME: &str = "admin";
pub const PASSWORD: &str = "secret";

const DEFAULT_DATE: &str = "20240101T00:00:00";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[serde(rename = "int")]
    Int(i64),
    #[serde(rename = "boolean")]
    Bool(bool),
    #[serde(rename = "string")]
    String(String),
    #[serde(rename = "double")]
    Double(f64),
    #[serde(rename = "dateTime.iso8601")]
    DateTime(String),
    #[serde(rename = "base64")]
    Base64(Vec<u8>),
    #[serde(rename = "array")]
    Array(Vec<Value>),
    #[serde(rename = "struct")]
    Struct(BTreeMap<String, Value>),
    #[serde(rename = "nil")]
    Nil,
}

impl Value {
    fn str(s: &str) -> Self {
        Value::String(s.to_string())
    }

    fn record<const N: usize>(fields: [(&str, Value); N]) -> Self {
        Value::Struct(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodCall {
    pub method_name: String,
    #[serde(default)]
    pub params: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fault {
    pub fault_code: i32,
    pub fault_string: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MethodResponse {
    Params(Value),
    Fault(Fault),
}

fn fault(code: i32, message: &str) -> Fault {
    Fault {
        fault_code: code,
        fault_string: message.to_string(),
    }
}

fn bad_params() -> Fault {
    fault(-32602, "server error. invalid method parameters")
}

struct BlogRow {
    id: &'static str,
    name: &'static str,
    path: &'static str,
}

const BLOGS: [BlogRow; 2] = [
    BlogRow {
        id: "1",
        name: "Main Blog",
        path: "/xmlrpc.php",
    },
    BlogRow {
        id: "2",
        name: "Travel Notes",
        path: "/blog2/xmlrpc.php",
    },
];

const SUPPORTED_METHODS: [&str; 16] = [
    "blogger.deletePost",
    "blogger.getUserInfo",
    "metaWeblog.editPost",
    "metaWeblog.getPost",
    "metaWeblog.getRecentPosts",
    "metaWeblog.newMediaObject",
    "metaWeblog.newPost",
    "mt.getPostCategories",
    "mt.getTrackbackPings",
    "mt.publishPost",
    "mt.setPostCategories",
    "mt.supportedMethods",
    "pingback.extensions.getPingbacks",
    "wp.getCategories",
    "wp.getTags",
    "wp.getUsersBlogs",
];

#[derive(Clone, Debug)]
struct CategoryRow {
    id: i64,
    parent_id: i64,
    name: String,
}

#[derive(Clone, Debug)]
struct TagRow {
    id: i64,
    name: String,
    count: i64,
}

#[derive(Clone, Debug, Default)]
struct PostRow {
    id: i64,
    blog_id: String,
    title: String,
    description: String,
    text_more: String,
    excerpt: String,
    keywords: Vec<String>,
    date: String,
    categories: Vec<i64>,
    allow_pings: bool,
    published: bool,
}

pub struct Store {
    posts: BTreeMap<i64, PostRow>,
    next_post_id: i64,
    categories: BTreeMap<String, Vec<CategoryRow>>,
    tags: BTreeMap<String, Vec<TagRow>>,
    media: Vec<String>,
}

impl Default for Store {
    fn default() -> Self {
        let category = |id, parent_id, name: &str| CategoryRow {
            id,
            parent_id,
            name: name.to_string(),
        };
        let tag = |id, name: &str, count| TagRow {
            id,
            name: name.to_string(),
            count,
        };

        let mut categories = BTreeMap::new();
        categories.insert(
            "1".to_string(),
            vec![
                category(1, 0, "Uncategorized"),
                category(2, 0, "News"),
                category(3, 2, "Rust"),
            ],
        );
        categories.insert("2".to_string(), vec![category(10, 0, "Travel")]);

        let mut tags = BTreeMap::new();
        tags.insert(
            "1".to_string(),
            vec![tag(1, "rust", 3), tag(2, "xmlrpc", 1)],
        );
        tags.insert("2".to_string(), vec![tag(5, "photos", 8)]);

        Self {
            posts: BTreeMap::new(),
            next_post_id: 1,
            categories,
            tags,
            media: Vec::new(),
        }
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/xmlrpc.php", post(rpc))
        .route("/blog2/xmlrpc.php", post(rpc))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn rpc(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(call): Json<MethodCall>,
) -> Json<MethodResponse> {
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let base = format!("http://{host}");
    tracing::debug!(method = %call.method_name, "rpc call");

    let mut store = db.write().await;
    let response = match dispatch(&mut store, &base, &call) {
        Ok(value) => MethodResponse::Params(value),
        Err(fault) => {
            tracing::debug!(method = %call.method_name, code = fault.fault_code, "rpc fault");
            MethodResponse::Fault(fault)
        }
    };
    Json(response)
}

fn dispatch(store: &mut Store, base: &str, call: &MethodCall) -> Result<Value, Fault> {
    let p = call.params.as_slice();
    match call.method_name.as_str() {
        "mt.supportedMethods" => Ok(Value::Array(
            SUPPORTED_METHODS.iter().map(|m| Value::str(m)).collect(),
        )),
        "wp.getUsersBlogs" => {
            check_auth(p, 0)?;
            Ok(Value::Array(
                BLOGS
                    .iter()
                    .map(|b| {
                        Value::record([
                            ("blogid", Value::str(b.id)),
                            ("blogName", Value::str(b.name)),
                            ("url", Value::String(format!("{base}/"))),
                            ("isAdmin", Value::Bool(true)),
                            ("xmlrpc", Value::String(format!("{base}{}", b.path))),
                        ])
                    })
                    .collect(),
            ))
        }
        "blogger.getUserInfo" => {
            check_auth(p, 1)?;
            Ok(Value::record([
                ("userid", Value::str("1")),
                ("firstname", Value::str("Ada")),
                ("lastname", Value::str("Lovelace")),
                ("nickname", Value::str("ada")),
                ("email", Value::str("ada@example.com")),
                ("url", Value::String(format!("{base}/"))),
            ]))
        }
        "metaWeblog.getRecentPosts" => {
            let blog = blog_param(p, 0)?;
            check_auth(p, 1)?;
            let limit = usize::try_from(int_param(p, 3)?).unwrap_or(0);
            Ok(Value::Array(
                store
                    .posts
                    .values()
                    .rev()
                    .filter(|row| row.blog_id == blog)
                    .take(limit)
                    .map(|row| post_record(base, row))
                    .collect(),
            ))
        }
        "metaWeblog.getPost" => {
            let id = int_param(p, 0)?;
            check_auth(p, 1)?;
            let row = find_post(store, id)?;
            Ok(post_record(base, row))
        }
        "metaWeblog.newPost" => {
            let blog = blog_param(p, 0)?;
            check_auth(p, 1)?;
            let content = struct_param(p, 3)?;
            let id = store.next_post_id;
            store.next_post_id += 1;
            let mut row = PostRow {
                id,
                blog_id: blog,
                date: DEFAULT_DATE.to_string(),
                ..PostRow::default()
            };
            apply_content(&mut row, content);
            store.posts.insert(id, row);
            Ok(Value::String(id.to_string()))
        }
        "metaWeblog.editPost" => {
            let id = int_param(p, 0)?;
            check_auth(p, 1)?;
            let content = struct_param(p, 3)?;
            let row = store
                .posts
                .get_mut(&id)
                .ok_or_else(|| fault(404, "Invalid post ID."))?;
            apply_content(row, content);
            Ok(Value::Bool(true))
        }
        "blogger.deletePost" => {
            let id = int_param(p, 1)?;
            check_auth(p, 2)?;
            store
                .posts
                .remove(&id)
                .map(|_| Value::Bool(true))
                .ok_or_else(|| fault(404, "Invalid post ID."))
        }
        "mt.getPostCategories" => {
            let id = int_param(p, 0)?;
            check_auth(p, 1)?;
            let row = find_post(store, id)?;
            let known = store.categories.get(&row.blog_id).map(Vec::as_slice).unwrap_or(&[]);
            Ok(Value::Array(
                row.categories
                    .iter()
                    .enumerate()
                    .filter_map(|(i, cat_id)| {
                        known.iter().find(|c| c.id == *cat_id).map(|c| {
                            Value::record([
                                ("categoryId", Value::String(c.id.to_string())),
                                ("categoryName", Value::String(c.name.clone())),
                                ("isPrimary", Value::Bool(i == 0)),
                            ])
                        })
                    })
                    .collect(),
            ))
        }
        "mt.setPostCategories" => {
            let id = int_param(p, 0)?;
            check_auth(p, 1)?;
            let Some(Value::Array(assignments)) = p.get(3) else {
                return Err(bad_params());
            };
            let ids = assignments
                .iter()
                .map(|a| match a {
                    Value::Struct(fields) => fields
                        .get("categoryId")
                        .and_then(int_like)
                        .ok_or_else(bad_params),
                    _ => Err(bad_params()),
                })
                .collect::<Result<Vec<_>, _>>()?;
            let row = store
                .posts
                .get_mut(&id)
                .ok_or_else(|| fault(404, "Invalid post ID."))?;
            row.categories = ids;
            Ok(Value::Bool(true))
        }
        "wp.getCategories" => {
            let blog = blog_param(p, 0)?;
            check_auth(p, 1)?;
            let rows = store.categories.get(&blog).cloned().unwrap_or_default();
            Ok(Value::Array(
                rows.iter()
                    .map(|c| {
                        Value::record([
                            ("categoryId", Value::String(c.id.to_string())),
                            ("parentId", Value::String(c.parent_id.to_string())),
                            ("description", Value::String(c.name.clone())),
                            ("categoryDescription", Value::str("")),
                            ("categoryName", Value::String(c.name.clone())),
                            ("htmlUrl", Value::String(format!("{base}/?cat={}", c.id))),
                            ("rssUrl", Value::String(format!("{base}/?feed=rss2&cat={}", c.id))),
                        ])
                    })
                    .collect(),
            ))
        }
        "wp.getTags" => {
            let blog = blog_param(p, 0)?;
            check_auth(p, 1)?;
            let rows = store.tags.get(&blog).cloned().unwrap_or_default();
            Ok(Value::Array(
                rows.iter()
                    .map(|t| {
                        Value::record([
                            ("tag_id", Value::Int(t.id)),
                            ("name", Value::String(t.name.clone())),
                            ("count", Value::Int(t.count)),
                            ("slug", Value::String(t.name.clone())),
                            ("html_url", Value::String(format!("{base}/?tag={}", t.name))),
                            ("rss_url", Value::String(format!("{base}/?feed=rss2&tag={}", t.name))),
                        ])
                    })
                    .collect(),
            ))
        }
        "mt.getTrackbackPings" => {
            let id = int_param(p, 0)?;
            find_post(store, id)?;
            Ok(Value::Array(Vec::new()))
        }
        "pingback.extensions.getPingbacks" => match p.first() {
            Some(Value::String(_)) => Ok(Value::Array(Vec::new())),
            _ => Err(bad_params()),
        },
        "mt.publishPost" => {
            let id = int_param(p, 0)?;
            check_auth(p, 1)?;
            let row = store
                .posts
                .get_mut(&id)
                .ok_or_else(|| fault(404, "Invalid post ID."))?;
            row.published = true;
            Ok(Value::Int(1))
        }
        "metaWeblog.newMediaObject" => {
            blog_param(p, 0)?;
            check_auth(p, 1)?;
            let media = struct_param(p, 3)?;
            let Some(Value::String(name)) = media.get("name") else {
                return Err(bad_params());
            };
            let Some(Value::Base64(_)) = media.get("bits") else {
                return Err(bad_params());
            };
            let mime = match media.get("type") {
                Some(Value::String(t)) => t.clone(),
                _ => "application/octet-stream".to_string(),
            };
            let url = format!("{base}/wp-content/uploads/{name}");
            store.media.push(url.clone());
            Ok(Value::record([
                ("file", Value::String(name.clone())),
                ("url", Value::String(url)),
                ("type", Value::String(mime)),
            ]))
        }
        other => Err(fault(
            -32601,
            &format!("server error. requested method {other} does not exist."),
        )),
    }
}

fn check_auth(params: &[Value], index: usize) -> Result<(), Fault> {
    match (params.get(index), params.get(index + 1)) {
        (Some(Value::String(user)), Some(Value::String(pass)))
            if user == USERNAME && pass == PASSWORD =>
        {
            Ok(())
        }
        _ => Err(fault(403, "Incorrect username or password.")),
    }
}

fn int_like(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn int_param(params: &[Value], index: usize) -> Result<i64, Fault> {
    params.get(index).and_then(int_like).ok_or_else(bad_params)
}

fn struct_param(params: &[Value], index: usize) -> Result<&BTreeMap<String, Value>, Fault> {
    match params.get(index) {
        Some(Value::Struct(fields)) => Ok(fields),
        _ => Err(bad_params()),
    }
}

/// Blog id 0 addresses the main blog, like a single-site install.
fn blog_param(params: &[Value], index: usize) -> Result<String, Fault> {
    let id = match params.get(index) {
        Some(Value::Int(0)) => "1".to_string(),
        Some(Value::Int(i)) => i.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => return Err(bad_params()),
    };
    if BLOGS.iter().any(|b| b.id == id) {
        Ok(id)
    } else {
        Err(fault(404, "Invalid blog ID."))
    }
}

fn find_post(store: &Store, id: i64) -> Result<&PostRow, Fault> {
    store.posts.get(&id).ok_or_else(|| fault(404, "Invalid post ID."))
}

fn apply_content(row: &mut PostRow, content: &BTreeMap<String, Value>) {
    let text = |field: &str| match content.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    };
    if let Some(title) = text("title") {
        row.title = title;
    }
    if let Some(description) = text("description") {
        row.description = description;
    }
    if let Some(more) = text("mt_text_more") {
        row.text_more = more;
    }
    if let Some(excerpt) = text("mt_excerpt") {
        row.excerpt = excerpt;
    }
    match content.get("mt_keywords") {
        Some(Value::Array(items)) => {
            row.keywords = items
                .iter()
                .filter_map(|k| match k {
                    Value::String(s) => Some(s.clone()),
                    _ => None,
                })
                .collect();
        }
        Some(Value::String(joined)) => {
            row.keywords = joined.split(',').map(|k| k.trim().to_string()).collect();
        }
        _ => {}
    }
    if let Some(Value::DateTime(date)) = content.get("dateCreated") {
        row.date = date.clone();
    }
    match content.get("mt_allow_pings") {
        Some(Value::Bool(b)) => row.allow_pings = *b,
        Some(Value::Int(i)) => row.allow_pings = *i == 1,
        _ => {}
    }
}

fn post_record(base: &str, row: &PostRow) -> Value {
    let link = format!("{base}/?p={}", row.id);
    Value::record([
        ("postid", Value::String(row.id.to_string())),
        ("title", Value::String(row.title.clone())),
        ("description", Value::String(row.description.clone())),
        ("dateCreated", Value::DateTime(row.date.clone())),
        ("permaLink", Value::String(link.clone())),
        ("link", Value::String(link)),
        ("mt_text_more", Value::String(row.text_more.clone())),
        ("mt_excerpt", Value::String(row.excerpt.clone())),
        (
            "categories",
            Value::Array(row.categories.iter().map(|c| Value::String(c.to_string())).collect()),
        ),
        ("mt_keywords", Value::String(row.keywords.join(", "))),
        ("userid", Value::str("1")),
        ("mt_allow_pings", Value::Int(i64::from(row.allow_pings))),
        ("mt_allow_comments", Value::Int(1)),
        (
            "post_status",
            Value::str(if row.published { "publish" } else { "draft" }),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(method: &str, params: Vec<Value>) -> MethodCall {
        MethodCall {
            method_name: method.to_string(),
            params,
        }
    }

    fn creds() -> [Value; 2] {
        [Value::str(USERNAME), Value::str(PASSWORD)]
    }

    #[test]
    fn value_uses_wire_type_tags() {
        let json = serde_json::to_value(Value::record([("n", Value::Int(1))])).unwrap();
        assert_eq!(json["struct"]["n"]["int"], 1);
    }

    #[test]
    fn method_call_params_default_to_empty() {
        let call: MethodCall = serde_json::from_str(r#"{"methodName":"mt.supportedMethods"}"#).unwrap();
        assert!(call.params.is_empty());
    }

    #[test]
    fn rejects_wrong_password() {
        let mut store = Store::default();
        let result = dispatch(
            &mut store,
            "http://h",
            &call("wp.getUsersBlogs", vec![Value::str(USERNAME), Value::str("nope")]),
        );
        assert_eq!(result.unwrap_err().fault_code, 403);
    }

    #[test]
    fn blog_zero_is_main_blog() {
        let [user, pass] = creds();
        let mut store = Store::default();
        let result = dispatch(
            &mut store,
            "http://h",
            &call("wp.getTags", vec![Value::Int(0), user, pass]),
        )
        .unwrap();
        let Value::Array(tags) = result else {
            panic!("expected array");
        };
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn unknown_method_faults() {
        let mut store = Store::default();
        let err = dispatch(&mut store, "http://h", &call("wp.nope", vec![])).unwrap_err();
        assert_eq!(err.fault_code, -32601);
    }

    #[test]
    fn new_post_then_publish() {
        let [user, pass] = creds();
        let mut store = Store::default();
        let id = dispatch(
            &mut store,
            "http://h",
            &call(
                "metaWeblog.newPost",
                vec![
                    Value::str("2"),
                    user.clone(),
                    pass.clone(),
                    Value::record([("title", Value::str("Hi"))]),
                    Value::Bool(false),
                ],
            ),
        )
        .unwrap();
        assert_eq!(id, Value::str("1"));

        let published = dispatch(
            &mut store,
            "http://h",
            &call("mt.publishPost", vec![Value::Int(1), user, pass]),
        )
        .unwrap();
        assert_eq!(published, Value::Int(1));
        assert!(store.posts[&1].published);
        assert_eq!(store.posts[&1].blog_id, "2");
    }

    #[test]
    fn media_upload_returns_uploads_url() {
        let [user, pass] = creds();
        let mut store = Store::default();
        let result = dispatch(
            &mut store,
            "http://h",
            &call(
                "metaWeblog.newMediaObject",
                vec![
                    Value::Int(0),
                    user,
                    pass,
                    Value::record([
                        ("name", Value::str("a.png")),
                        ("type", Value::str("image/png")),
                        ("bits", Value::Base64(vec![1, 2, 3])),
                    ]),
                ],
            ),
        )
        .unwrap();
        let Value::Struct(fields) = result else {
            panic!("expected struct");
        };
        assert_eq!(fields["url"], Value::str("http://h/wp-content/uploads/a.png"));
        assert_eq!(store.media, vec!["http://h/wp-content/uploads/a.png"]);
    }
}
