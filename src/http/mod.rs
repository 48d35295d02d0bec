//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → context.rs (wrap request, collect response)
//!     → [application runs middleware and route handler]
//!     → response.rs (serialize body, add headers)
//!     → Send to client
//! ```

pub mod context;
pub mod response;
pub mod server;

pub use context::{BodyError, Context};
pub use response::{ResponseBody, SERVER_NAME};
pub use server::HttpServer;
