//! Route declaration surface and route definitions.
//!
//! Applications declare routes through [`Routes`]; the table builder turns
//! each declaration into a [`RouteDefinition`] once at startup.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::Method;
use futures_util::future::BoxFuture;

use crate::app::Application;
use crate::http::Context;
use crate::routing::matcher::{self, PARAM_MARKER};
use crate::BoxError;

/// Result returned by route handlers.
pub type HandlerResult = Result<(), BoxError>;

/// A route handler.
///
/// Handlers communicate their result by mutating the [`Context`] response
/// fields. Returning an error produces an opaque 500 response.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn call(&self, ctx: &mut Context, app: &Application) -> HandlerResult;
}

#[async_trait]
impl<F> Handler for F
where
    F: for<'a> Fn(&'a mut Context, &'a Application) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    async fn call(&self, ctx: &mut Context, app: &Application) -> HandlerResult {
        (self)(ctx, app).await
    }
}

/// Errors detected while building the route table.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("route path must start with '/': {method} {path}")]
    InvalidPath { method: Method, path: String },

    #[error("empty parameter name in route {method} {path}")]
    EmptyParam { method: Method, path: String },

    #[error("parameter '{name}' declared twice in route {method} {path}")]
    DuplicateParam {
        method: Method,
        path: String,
        name: String,
    },

    #[error("static route declared twice: {method} {path}")]
    DuplicateRoute { method: Method, path: String },
}

/// One declared route, before compilation.
pub(crate) struct RouteEntry {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) handler: Arc<dyn Handler>,
}

/// Ordered route declarations.
///
/// ```ignore
/// let routes = Routes::new()
///     .get("/users/:id", |ctx, _app| Box::pin(async move {
///         let id = ctx.param("id").unwrap_or_default().to_string();
///         ctx.set_body(serde_json::json!({ "id": id }));
///         Ok(())
///     }));
/// ```
#[derive(Default)]
pub struct Routes {
    entries: Vec<RouteEntry>,
}

macro_rules! method_fn {
    ($(#[$doc:meta])* $name:ident, $method:expr) => {
        $(#[$doc])*
        pub fn $name<F>(self, path: &str, handler: F) -> Self
        where
            F: for<'a> Fn(&'a mut Context, &'a Application) -> BoxFuture<'a, HandlerResult>
                + Send
                + Sync
                + 'static,
        {
            self.route($method, path, handler)
        }
    };
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    method_fn!(
        /// Declare a `GET` route.
        get, Method::GET
    );
    method_fn!(
        /// Declare a `HEAD` route.
        head, Method::HEAD
    );
    method_fn!(
        /// Declare a `POST` route.
        post, Method::POST
    );
    method_fn!(
        /// Declare a `PUT` route.
        put, Method::PUT
    );
    method_fn!(
        /// Declare a `DELETE` route.
        delete, Method::DELETE
    );
    method_fn!(
        /// Declare a `PATCH` route.
        patch, Method::PATCH
    );
    method_fn!(
        /// Declare an `OPTIONS` route.
        options, Method::OPTIONS
    );

    /// Declare a route for any method with any [`Handler`] implementation.
    pub fn route<H: Handler>(mut self, method: Method, path: &str, handler: H) -> Self {
        self.entries.push(RouteEntry {
            method,
            path: path.to_string(),
            handler: Arc::new(handler),
        });
        self
    }

    /// Number of declared routes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn into_entries(self) -> Vec<RouteEntry> {
        self.entries
    }
}

/// A route after parsing its path.
#[derive(Clone)]
pub struct RouteDefinition {
    method: Method,
    path: String,
    handler: Arc<dyn Handler>,
    is_dynamic: bool,
    param_names: Vec<String>,
}

impl RouteDefinition {
    pub(crate) fn parse(entry: RouteEntry) -> Result<Self, RouteError> {
        let RouteEntry {
            method,
            path,
            handler,
        } = entry;

        if !path.starts_with('/') {
            return Err(RouteError::InvalidPath { method, path });
        }

        let is_dynamic = path.split('/').any(|s| s.starts_with(PARAM_MARKER));
        let param_names: Vec<String> = matcher::param_names(&path)
            .into_iter()
            .map(str::to_string)
            .collect();
        {
            let mut seen = HashSet::new();
            for name in &param_names {
                if name.is_empty() {
                    return Err(RouteError::EmptyParam { method, path });
                }
                if !seen.insert(name.as_str()) {
                    let name = name.clone();
                    return Err(RouteError::DuplicateParam { method, path, name });
                }
            }
        }

        Ok(Self {
            method,
            path,
            handler,
            is_dynamic,
            param_names,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// True if the path contains at least one `:name` segment.
    pub fn is_dynamic(&self) -> bool {
        self.is_dynamic
    }

    /// Parameter names in left-to-right segment order.
    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }
}

impl fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("is_dynamic", &self.is_dynamic)
            .field("param_names", &self.param_names)
            .finish_non_exhaustive()
    }
}
