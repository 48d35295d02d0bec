//! Per-request context.
//!
//! # Responsibilities
//! - Expose the request: method, url, path, query, headers, body
//! - Carry route parameters, bound once before the handler runs
//! - Accumulate the response: status, headers, body and content type
//!
//! # Design Decisions
//! - Owned exclusively by one request task, never shared
//! - The request body is read lazily, at most once, then cached
//! - Route parameters are captured verbatim; decoding is opt-in

use std::borrow::Cow;
use std::mem;

use axum::body::Body;
use axum::http::header::CONTENT_LENGTH;
use axum::http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use bytes::Bytes;

use crate::http::response::ResponseBody;
use crate::routing::Params;

/// Default upper bound for buffered request bodies.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Error reading the request body.
#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("failed to read request body: {0}")]
    Read(#[source] axum::Error),

    /// An earlier read failed; the body is gone.
    #[error("request body unavailable after failed read: {0}")]
    Failed(String),
}

const INTERRUPTED_READ: &str = "body read was interrupted";

/// Where the request body is in its read-once lifecycle.
enum RequestBody {
    Unread(Body),
    Cached(Bytes),
    Failed(String),
}

/// State of one request/response exchange.
pub struct Context {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    request_body: RequestBody,
    body_limit: usize,
    params: Option<Params>,

    status: StatusCode,
    response_headers: HeaderMap,
    body: ResponseBody,
    content_type: Option<String>,
    raw_response: Option<Response<Body>>,
}

impl Context {
    /// Create a context with the default body limit.
    pub fn new(request: Request<Body>) -> Self {
        Self::with_body_limit(request, DEFAULT_BODY_LIMIT)
    }

    pub fn with_body_limit(request: Request<Body>, body_limit: usize) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            request_body: RequestBody::Unread(body),
            body_limit,
            params: None,
            status: StatusCode::OK,
            response_headers: HeaderMap::new(),
            body: ResponseBody::default(),
            content_type: None,
            raw_response: None,
        }
    }

    // ----- request -----

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Path and query as received, e.g. `/users/42?x=1`.
    pub fn url(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| self.uri.path())
    }

    /// Path without the query string.
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Decoded query parameters, in order of appearance.
    pub fn query(&self) -> Vec<(String, String)> {
        self.uri
            .query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// First value of a query parameter.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.uri.query().and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        })
    }

    /// Read the whole request body.
    ///
    /// Returns `None` for `GET` and `HEAD` requests and when the client sent
    /// `Content-Length: 0`. The body is read once; later calls return the
    /// cached bytes, or the same failure if the read failed.
    pub async fn body_bytes(&mut self) -> Result<Option<Bytes>, BodyError> {
        if self.method == Method::GET || self.method == Method::HEAD {
            return Ok(None);
        }
        if self
            .headers
            .get(CONTENT_LENGTH)
            .is_some_and(|len| len.as_bytes() == b"0")
        {
            return Ok(None);
        }

        // A dropped read leaves the failure marker behind.
        let state = mem::replace(
            &mut self.request_body,
            RequestBody::Failed(INTERRUPTED_READ.to_string()),
        );

        match state {
            RequestBody::Unread(body) => match axum::body::to_bytes(body, self.body_limit).await {
                Ok(bytes) => {
                    self.request_body = RequestBody::Cached(bytes.clone());
                    Ok(Some(bytes))
                }
                Err(e) => {
                    self.request_body = RequestBody::Failed(e.to_string());
                    Err(BodyError::Read(e))
                }
            },
            RequestBody::Cached(bytes) => {
                self.request_body = RequestBody::Cached(bytes.clone());
                Ok(Some(bytes))
            }
            RequestBody::Failed(message) => {
                self.request_body = RequestBody::Failed(message.clone());
                Err(BodyError::Failed(message))
            }
        }
    }

    // ----- route parameters -----

    /// Parameters of the matched route. Empty before dispatch.
    pub fn params(&self) -> &Params {
        static EMPTY: Params = Params::empty();
        self.params.as_ref().unwrap_or(&EMPTY)
    }

    /// Raw value of a route parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.as_ref().and_then(|p| p.get(name))
    }

    /// Percent-decoded value of a route parameter.
    ///
    /// Falls back to the raw value when the decoded bytes are not UTF-8.
    pub fn param_decoded(&self, name: &str) -> Option<Cow<'_, str>> {
        self.param(name)
            .map(|raw| urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw)))
    }

    /// Bind route parameters. Only the first call has an effect.
    pub(crate) fn bind_params(&mut self, params: Params) {
        if self.params.is_some() {
            tracing::warn!(path = %self.uri.path(), "Route parameters already bound");
            return;
        }
        self.params = Some(params);
    }

    // ----- response -----

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn response_headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.response_headers
    }

    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// Replace the response body.
    pub fn set_body(&mut self, body: impl Into<ResponseBody>) {
        self.body = body.into();
    }

    /// Serialize a value into a JSON response body.
    pub fn set_json<T: serde::Serialize>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        self.body = ResponseBody::Json(serde_json::to_value(value)?);
        Ok(())
    }

    /// Content type of the response, if set explicitly.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = Some(content_type.into());
    }

    /// Take over the response entirely, bypassing body serialization.
    pub fn respond_raw(&mut self, response: Response<Body>) {
        self.raw_response = Some(response);
    }

    pub(crate) fn into_outgoing(self) -> Outgoing {
        Outgoing {
            status: self.status,
            headers: self.response_headers,
            body: self.body,
            content_type: self.content_type,
            raw: self.raw_response,
        }
    }
}

/// What the response writer reads from a finished context.
pub(crate) struct Outgoing {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: ResponseBody,
    pub(crate) content_type: Option<String>,
    pub(crate) raw: Option<Response<Body>>,
}
