//! Typed client for the blog's remote procedure API.
//!
//! # Design
//! `BlogClient` owns the connection context (endpoint, credentials, selected
//! blog) and one `Transport` bound to the current endpoint. Each operation
//! issues a single blocking call, except `new_post` and `edit_post` which
//! chain follow-up calls. Results go through `crate::mapper`; transport
//! failures go through the `ApiError` conversion, so callers only ever see
//! `crate::Error`.
//!
//! Category and tag lists are memoized per selected blog. The caches and the
//! blog context are plain fields mutated through `&mut self`, so a client is
//! meant for one caller at a time.
//!
//! List operations return fully materialized `Vec`s: the transport delivers
//! each list as a single batch, so nothing is gained by yielding lazily.

use std::fmt;
use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::ClientConfig;
use crate::error::{Error, BLOG_NOT_FOUND, NO_POSTS, POST_EDIT_FAILED};
use crate::mapper::{
    blog_from_record, category_assignments, category_from_record, coerce_int, edit_post_record,
    list_from_value, media_url_from_record, new_post_record, post_category_from_record,
    post_from_record, strings_from_value, tag_from_record, user_from_record,
};
use crate::transport::Transport;
use crate::types::{Blog, Category, CategoryAssignment, Post, PostCategory, Tag, User};
use crate::value::Value;

/// Number of posts `get_recent_posts` callers usually ask for.
pub const DEFAULT_RECENT_POSTS: u32 = 5;

/// Client for one account on a blog endpoint.
///
/// Starts unbound (blog id 0). `select_blog` binds it to one of the
/// account's blogs, switching the endpoint to that blog's own and dropping
/// cached categories and tags. It can be re-bound any number of times.
pub struct BlogClient<T: Transport> {
    endpoint: String,
    username: String,
    password: String,
    blog_id: Option<String>,
    categories: Option<Vec<Category>>,
    tags: Option<Vec<Tag>>,
    transport: T,
}

impl<T: Transport + fmt::Debug> fmt::Debug for BlogClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlogClient")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("blog_id", &self.blog_id)
            .field("categories_cached", &self.categories.is_some())
            .field("tags_cached", &self.tags.is_some())
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> BlogClient<T> {
    /// Open a transport to `config.endpoint` and wrap it.
    pub fn connect(config: ClientConfig) -> Result<Self, Error> {
        let transport = T::connect(&config.endpoint)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Wrap a transport that is already bound to `config.endpoint`.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            endpoint: config.endpoint,
            username: config.username,
            password: config.password,
            blog_id: None,
            categories: None,
            tags: None,
            transport,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The selected blog, or `None` while unbound.
    pub fn blog_id(&self) -> Option<&str> {
        self.blog_id.as_deref()
    }

    pub fn is_bound(&self) -> bool {
        self.blog_id.is_some()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Forget the memoized category and tag lists.
    pub fn invalidate_caches(&mut self) {
        self.categories = None;
        self.tags = None;
    }

    fn call(&self, method: &str, params: &[Value]) -> Result<Value, Error> {
        debug!(method, endpoint = %self.endpoint, "remote call");
        self.transport.call(method, params).map_err(|err| {
            debug!(method, error = %err, "remote call failed");
            Error::from(err)
        })
    }

    fn user(&self) -> Value {
        Value::from(self.username.as_str())
    }

    fn pass(&self) -> Value {
        Value::from(self.password.as_str())
    }

    fn blog(&self) -> Value {
        match &self.blog_id {
            Some(id) => Value::from(id.as_str()),
            None => Value::Int(0),
        }
    }

    /// Bind the client to the blog with id `blog_id`.
    ///
    /// On failure the client keeps its previous blog, endpoint and caches.
    pub fn select_blog(&mut self, blog_id: &str) -> Result<(), Error> {
        let blog = self
            .get_users_blogs()?
            .into_iter()
            .find(|b| b.id == blog_id)
            .ok_or_else(|| Error::application(BLOG_NOT_FOUND))?;

        let transport = self.transport.bind(&blog.xmlrpc_endpoint)?;
        info!(blog_id = %blog.id, endpoint = %blog.xmlrpc_endpoint, "blog selected");

        self.transport = transport;
        self.endpoint = blog.xmlrpc_endpoint;
        self.blog_id = Some(blog.id);
        self.invalidate_caches();
        Ok(())
    }

    /// Method names the endpoint advertises.
    pub fn supported_methods(&self) -> Result<Vec<String>, Error> {
        let raw = self.call("mt.supportedMethods", &[])?;
        Ok(strings_from_value("supported methods", &raw)?)
    }

    /// Blogs the account can access. Not cached.
    pub fn get_users_blogs(&self) -> Result<Vec<Blog>, Error> {
        let raw = self.call("wp.getUsersBlogs", &[self.user(), self.pass()])?;
        Ok(list_from_value("blog", &raw, blog_from_record)?)
    }

    pub fn get_user_info(&self) -> Result<User, Error> {
        let raw = self.call(
            "blogger.getUserInfo",
            &[Value::from(""), self.user(), self.pass()],
        )?;
        Ok(user_from_record(&raw)?)
    }

    /// Up to `limit` posts in the order the endpoint returns them (newest
    /// first on WordPress).
    pub fn get_recent_posts(&self, limit: u32) -> Result<Vec<Post>, Error> {
        let raw = self.call(
            "metaWeblog.getRecentPosts",
            &[self.blog(), self.user(), self.pass(), Value::Int(i64::from(limit))],
        )?;
        Ok(list_from_value("post", &raw, post_from_record)?)
    }

    /// The most recent post, or a "No posts found" error on an empty blog.
    pub fn get_last_post(&self) -> Result<Post, Error> {
        self.get_recent_posts(1)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::application(NO_POSTS))
    }

    pub fn get_post(&self, post_id: i64) -> Result<Post, Error> {
        let raw = self.call(
            "metaWeblog.getPost",
            &[Value::from(post_id.to_string()), self.user(), self.pass()],
        )?;
        Ok(post_from_record(&raw)?)
    }

    /// Create `post`, assign its categories and optionally publish it.
    ///
    /// Returns the new post id. If a follow-up step fails the post already
    /// exists remotely; the error of the failing step is returned.
    pub fn new_post(&self, post: &Post, publish: bool) -> Result<i64, Error> {
        let raw = self.call(
            "metaWeblog.newPost",
            &[
                self.blog(),
                self.user(),
                self.pass(),
                new_post_record(post),
                Value::Bool(false),
            ],
        )?;
        let post_id = coerce_int("new post", "postid", &raw)?;
        debug!(post_id, "post created");

        self.finish_write(post_id, post, publish)?;
        Ok(post_id)
    }

    /// Overwrite the writable fields of `post_id` with those of `post`,
    /// re-assign categories and optionally publish.
    ///
    /// Same partial-success behavior as `new_post`.
    pub fn edit_post(&self, post_id: i64, post: &Post, publish: bool) -> Result<(), Error> {
        let raw = self.call(
            "metaWeblog.editPost",
            &[
                Value::Int(post_id),
                self.user(),
                self.pass(),
                edit_post_record(post),
                Value::Bool(false),
            ],
        )?;
        if matches!(raw, Value::Bool(false) | Value::Int(0)) {
            return Err(Error::application(POST_EDIT_FAILED));
        }

        self.finish_write(post_id, post, publish)
    }

    fn finish_write(&self, post_id: i64, post: &Post, publish: bool) -> Result<(), Error> {
        let assignments: Vec<CategoryAssignment> = post
            .categories
            .iter()
            .copied()
            .map(CategoryAssignment::secondary)
            .collect();

        let result = self.set_post_categories(post_id, &assignments).and_then(|()| {
            if publish && !self.publish_post(post_id)? {
                warn!(post_id, "endpoint did not confirm publish");
            }
            Ok(())
        });
        if let Err(err) = &result {
            warn!(post_id, error = %err, "post written but follow-up step failed");
        }
        result
    }

    /// Returns the endpoint's boolean verdict.
    pub fn delete_post(&self, post_id: i64) -> Result<bool, Error> {
        let raw = self.call(
            "blogger.deletePost",
            &[Value::from(""), Value::Int(post_id), self.user(), self.pass()],
        )?;
        Ok(raw.is_one())
    }

    pub fn get_post_categories(&self, post_id: i64) -> Result<Vec<PostCategory>, Error> {
        let raw = self.call(
            "mt.getPostCategories",
            &[Value::Int(post_id), self.user(), self.pass()],
        )?;
        Ok(list_from_value("post category", &raw, post_category_from_record)?)
    }

    pub fn set_post_categories(
        &self,
        post_id: i64,
        categories: &[CategoryAssignment],
    ) -> Result<(), Error> {
        self.call(
            "mt.setPostCategories",
            &[
                Value::Int(post_id),
                self.user(),
                self.pass(),
                category_assignments(categories),
            ],
        )?;
        Ok(())
    }

    /// Categories of the selected blog, fetched once and then served from
    /// the cache until the blog changes.
    pub fn get_categories(&mut self) -> Result<&[Category], Error> {
        if self.categories.is_none() {
            let raw = self.call("wp.getCategories", &[self.blog(), self.user(), self.pass()])?;
            let categories = list_from_value("category", &raw, category_from_record)?;
            debug!(count = categories.len(), "category cache filled");
            self.categories = Some(categories);
        }
        Ok(self.categories.as_deref().unwrap_or_default())
    }

    /// Id of the first category named exactly `name`.
    pub fn get_category_id_from_name(&mut self, name: &str) -> Result<Option<i64>, Error> {
        Ok(self
            .get_categories()?
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.id))
    }

    /// Tags of the selected blog, cached like `get_categories`.
    pub fn get_tags(&mut self) -> Result<&[Tag], Error> {
        if self.tags.is_none() {
            let raw = self.call("wp.getTags", &[self.blog(), self.user(), self.pass()])?;
            let tags = list_from_value("tag", &raw, tag_from_record)?;
            debug!(count = tags.len(), "tag cache filled");
            self.tags = Some(tags);
        }
        Ok(self.tags.as_deref().unwrap_or_default())
    }

    /// Trackback pings of a post, exactly as the endpoint returns them.
    pub fn get_trackback_pings(&self, post_id: i64) -> Result<Value, Error> {
        self.call("mt.getTrackbackPings", &[Value::Int(post_id)])
    }

    /// Pingbacks received by `post_url`, exactly as the endpoint returns them.
    pub fn get_pingbacks(&self, post_url: &str) -> Result<Value, Error> {
        self.call("pingback.extensions.getPingbacks", &[Value::from(post_url)])
    }

    /// True only when the endpoint answers `1`.
    pub fn publish_post(&self, post_id: i64) -> Result<bool, Error> {
        let raw = self.call(
            "mt.publishPost",
            &[Value::Int(post_id), self.user(), self.pass()],
        )?;
        Ok(raw.is_one())
    }

    /// Upload the file at `path` and return the URL the endpoint assigned.
    pub fn new_media_object(&self, path: impl AsRef<Path>) -> Result<String, Error> {
        let path = path.as_ref();
        let bits = fs::read(path).map_err(|source| Error::Media {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mime = mime_guess::from_path(path).first_or_octet_stream();
        debug!(%name, size = bits.len(), "uploading media");

        let media = Value::record([
            ("name", Value::from(name)),
            ("type", Value::from(mime.essence_str())),
            ("bits", Value::Base64(bits)),
        ]);
        let raw = self.call(
            "metaWeblog.newMediaObject",
            &[self.blog(), self.user(), self.pass(), media],
        )?;
        Ok(media_url_from_record(&raw)?)
    }
}
