//! plant: a minimal HTTP application framework.
//!
//! An application declares routes and middleware, registers its instances,
//! services and jobs, and hands the result to the HTTP server. Every request
//! runs through the middleware chain and, if the chain completes, is
//! dispatched to the matching route handler.

pub mod app;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod middleware;
pub mod observability;
pub mod routing;

pub use app::{Application, ApplicationBuilder, Instance, Job};
pub use config::PlantConfig;
pub use http::{Context, HttpServer, ResponseBody};
pub use lifecycle::Shutdown;
pub use middleware::{Middleware, Next};
pub use routing::{Handler, Params, RouteTable, Routes};

/// Error type returned by application-supplied handlers, middleware and jobs.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Re-exported so route closures can name their return type.
pub use futures_util::future::BoxFuture;
