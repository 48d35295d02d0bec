//! Application subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     PlantConfig + Routes + middleware + instances/services/jobs
//!     → builder.rs (compile routes, validate registries)
//!     → Application (immutable)
//!
//! Per request (application.rs):
//!     Request → Context → middleware chain → dispatch → handler → response
//! ```
//!
//! # Design Decisions
//! - The application is the single place that turns failures into responses
//! - Instances are closed in registration order when the application stops

pub mod application;
pub mod builder;
pub mod registry;

use async_trait::async_trait;

use crate::BoxError;

pub use application::{AppError, Application};
pub use builder::ApplicationBuilder;
pub use registry::{Registry, RegistryError};

/// A shared resource (database pool, cache client, ...) with a shutdown hook.
#[async_trait]
pub trait Instance: Send + Sync + 'static {
    /// Release the resource. Called once, when the application stops.
    async fn close(&self) -> Result<(), BoxError> {
        Ok(())
    }
}

/// A named unit of offline work run through [`Application::run_job`].
#[async_trait]
pub trait Job: Send + Sync + 'static {
    async fn run(&self, app: &Application) -> Result<(), BoxError>;
}
