//! Request orchestration and application lifecycle.
//!
//! # Responsibilities
//! - Run the middleware chain, dispatch the route, invoke the handler
//! - Convert every failure into exactly one client response
//! - Give handlers and jobs access to config, instances and services
//! - Close instances when the application stops
//!
//! # Design Decisions
//! - A short-circuited chain is answered with what it wrote; no dispatch
//! - Handler and chain failures are logged in full and answered with an
//!   opaque 500
//! - Everything here is read-only after build (shared via Arc, no locks)

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};

use crate::app::builder::ApplicationBuilder;
use crate::app::registry::{Registry, RegistryError};
use crate::app::{Instance, Job};
use crate::config::{ConfigError, PlantConfig};
use crate::http::{response, Context};
use crate::middleware::{run_chain, ChainOutcome, Middleware};
use crate::routing::{RouteError, RouteTable};
use crate::BoxError;

/// Errors raised while building or running an application.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("job '{0}' registered twice")]
    DuplicateJob(String),

    #[error("job '{0}' not found")]
    JobNotFound(String),

    #[error("job '{name}' failed: {source}")]
    Job {
        name: String,
        #[source]
        source: BoxError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A loaded application.
pub struct Application {
    pub(crate) config: Arc<PlantConfig>,
    pub(crate) routes: RouteTable,
    pub(crate) middlewares: Vec<Arc<dyn Middleware>>,
    pub(crate) instances: Registry,
    pub(crate) lifecycle: Vec<(String, Arc<dyn Instance>)>,
    pub(crate) services: Registry,
    pub(crate) jobs: HashMap<String, Arc<dyn Job>>,
}

impl Application {
    pub fn builder(config: PlantConfig) -> ApplicationBuilder {
        ApplicationBuilder::new(config)
    }

    pub fn config(&self) -> &PlantConfig {
        &self.config
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Look up a registered instance.
    pub fn instance<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, RegistryError> {
        self.instances.get(name)
    }

    /// Look up a registered service.
    pub fn service<T: Send + Sync + 'static>(&self, name: &str) -> Result<Arc<T>, RegistryError> {
        self.services.get(name)
    }

    pub fn instances(&self) -> &Registry {
        &self.instances
    }

    pub fn services(&self) -> &Registry {
        &self.services
    }

    /// Handle one request end to end.
    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        let mut ctx = Context::with_body_limit(request, self.config.server.max_body_size);

        match run_chain(&self.middlewares, &mut ctx).await {
            Ok(ChainOutcome::Completed) => {}
            Ok(ChainOutcome::ShortCircuited) => {
                tracing::debug!(method = %ctx.method(), url = %ctx.url(), "Middleware handled request");
                return response::write(ctx);
            }
            Err(e) => {
                tracing::error!(
                    method = %ctx.method(),
                    url = %ctx.url(),
                    error = %e,
                    "Middleware chain failed"
                );
                return response::internal_error();
            }
        }

        let Some(matched) = self.routes.dispatch(ctx.method(), ctx.url()) else {
            tracing::debug!(method = %ctx.method(), url = %ctx.url(), "No route matched");
            return response::not_found();
        };

        let handler = matched.route.handler().clone();
        ctx.bind_params(matched.params);

        if let Err(e) = handler.call(&mut ctx, self).await {
            tracing::error!(
                method = %ctx.method(),
                url = %ctx.url(),
                error = %e,
                error_debug = ?e,
                "Handler failed"
            );
            return response::internal_error();
        }

        response::write(ctx)
    }

    /// Run a named job, then close every instance.
    pub async fn run_job(&self, name: &str) -> Result<(), AppError> {
        let result = match self.jobs.get(name) {
            None => Err(AppError::JobNotFound(name.to_string())),
            Some(job) => {
                tracing::info!(job = %name, "Running job");
                job.run(self).await.map_err(|source| AppError::Job {
                    name: name.to_string(),
                    source,
                })
            }
        };

        self.close().await;
        result
    }

    /// Names of the registered jobs.
    pub fn job_names(&self) -> impl Iterator<Item = &str> {
        self.jobs.keys().map(String::as_str)
    }

    /// Close every instance in registration order.
    ///
    /// Failures are logged; the remaining instances are still closed.
    pub async fn close(&self) {
        for (name, instance) in &self.lifecycle {
            match instance.close().await {
                Ok(()) => tracing::debug!(instance = %name, "Instance closed"),
                Err(e) => tracing::error!(instance = %name, error = %e, "Failed to close instance"),
            }
        }
    }
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("env", &self.config.env)
            .field("routes", &self.routes)
            .field("middlewares", &self.middlewares.len())
            .field("instances", &self.instances)
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}
