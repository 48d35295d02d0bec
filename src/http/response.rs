//! Response serialization.
//!
//! # Responsibilities
//! - Turn a finished context into exactly one HTTP response
//! - Serialize the body by kind (text, binary, JSON, stream)
//! - Produce the core's own 404 and 500 responses
//! - Stamp the `Server` header on everything the core writes
//!
//! # Design Decisions
//! - Streams are handed to the transport unbuffered
//! - Error responses never carry internal detail
//! - A raw response set by the handler is passed through untouched

use std::fmt;

use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, SERVER};
use axum::http::{HeaderValue, Response, StatusCode};
use bytes::Bytes;
use futures_util::stream::{BoxStream, Stream, StreamExt};

use crate::http::context::{Context, Outgoing};
use crate::BoxError;

/// Value of the `Server` header.
pub const SERVER_NAME: &str = concat!("plant/", env!("CARGO_PKG_VERSION"));

const JSON_CONTENT_TYPE: &str = "application/json";

/// Response payload accumulated on the context.
pub enum ResponseBody {
    /// Written as-is.
    Text(String),
    /// Written verbatim with an explicit content length.
    Binary(Bytes),
    /// JSON-encoded on write.
    Json(serde_json::Value),
    /// Lazily produced bytes, streamed straight to the client.
    Stream(BoxStream<'static, Result<Bytes, BoxError>>),
}

impl ResponseBody {
    /// Wrap a byte stream.
    pub fn stream<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        Self::Stream(stream.map(|chunk| chunk.map_err(Into::<BoxError>::into)).boxed())
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Binary(bytes) => f.debug_tuple("Binary").field(&bytes.len()).finish(),
            Self::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<String> for ResponseBody {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for ResponseBody {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Bytes> for ResponseBody {
    fn from(bytes: Bytes) -> Self {
        Self::Binary(bytes)
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(bytes))
    }
}

impl From<serde_json::Value> for ResponseBody {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

fn stamp_server(response: &mut Response<Body>) {
    response
        .headers_mut()
        .insert(SERVER, HeaderValue::from_static(SERVER_NAME));
}

fn plain(status: StatusCode, text: &'static str) -> Response<Body> {
    let mut response = Response::new(Body::from(text));
    *response.status_mut() = status;
    stamp_server(&mut response);
    response
}

/// Response for a request no route matched.
pub fn not_found() -> Response<Body> {
    plain(StatusCode::NOT_FOUND, "Not Found")
}

/// Opaque response for a failed request.
pub fn internal_error() -> Response<Body> {
    plain(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

/// Serialize the response accumulated on a context.
pub fn write(ctx: Context) -> Response<Body> {
    let Outgoing {
        status,
        headers,
        body,
        content_type,
        raw,
    } = ctx.into_outgoing();

    if let Some(raw) = raw {
        return raw;
    }

    let (payload, length, default_type) = match body {
        ResponseBody::Text(text) => (Body::from(text), None, None),
        ResponseBody::Binary(bytes) => {
            let len = bytes.len();
            (Body::from(bytes), Some(len), None)
        }
        ResponseBody::Json(value) => match serde_json::to_vec(&value) {
            Ok(encoded) => {
                let len = encoded.len();
                (Body::from(encoded), Some(len), Some(JSON_CONTENT_TYPE))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode JSON response body");
                return internal_error();
            }
        },
        ResponseBody::Stream(stream) => (Body::from_stream(stream), None, None),
    };

    let mut response = Response::new(payload);
    *response.status_mut() = status;
    response.headers_mut().extend(headers);

    if let Some(content_type) = content_type {
        match HeaderValue::from_str(&content_type) {
            Ok(value) => {
                response.headers_mut().insert(CONTENT_TYPE, value);
            }
            Err(_) => {
                tracing::warn!(content_type = %content_type, "Ignoring invalid content type");
            }
        }
    } else if let Some(default_type) = default_type {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(default_type));
    }

    if let Some(len) = length {
        response
            .headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from(len));
    }

    stamp_server(&mut response);
    response
}
