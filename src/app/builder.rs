//! Application assembly.

use std::collections::HashMap;
use std::sync::Arc;

use crate::app::application::{AppError, Application};
use crate::app::registry::RegistryBuilder;
use crate::app::{Instance, Job};
use crate::config::PlantConfig;
use crate::middleware::Middleware;
use crate::routing::{RouteTable, Routes};

/// Collects everything an application is made of, then freezes it.
pub struct ApplicationBuilder {
    config: PlantConfig,
    routes: Routes,
    middlewares: Vec<Arc<dyn Middleware>>,
    instances: RegistryBuilder,
    lifecycle: Vec<(String, Arc<dyn Instance>)>,
    services: RegistryBuilder,
    jobs: Vec<(String, Arc<dyn Job>)>,
}

impl ApplicationBuilder {
    pub fn new(config: PlantConfig) -> Self {
        Self {
            config,
            routes: Routes::new(),
            middlewares: Vec::new(),
            instances: RegistryBuilder::new(),
            lifecycle: Vec::new(),
            services: RegistryBuilder::new(),
            jobs: Vec::new(),
        }
    }

    /// Set the route declarations. Replaces any previous set.
    pub fn routes(mut self, routes: Routes) -> Self {
        self.routes = routes;
        self
    }

    /// Append a middleware. Middleware run in the order they are added.
    pub fn middleware(mut self, middleware: impl Middleware) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Register a shared instance, closed when the application stops.
    pub fn instance<T: Instance>(mut self, name: impl Into<String>, instance: T) -> Self {
        let name = name.into();
        let instance = Arc::new(instance);
        self.instances.insert(name.clone(), instance.clone());
        let closer: Arc<dyn Instance> = instance;
        self.lifecycle.push((name, closer));
        self
    }

    /// Register a service.
    pub fn service<T: Send + Sync + 'static>(mut self, name: impl Into<String>, service: T) -> Self {
        self.services.insert(name, Arc::new(service));
        self
    }

    /// Register a job.
    pub fn job(mut self, name: impl Into<String>, job: impl Job) -> Self {
        let job: Arc<dyn Job> = Arc::new(job);
        self.jobs.push((name.into(), job));
        self
    }

    /// Compile routes, validate registries and build the application.
    pub fn build(self) -> Result<Application, AppError> {
        let routes = RouteTable::build(self.routes)?;
        let instances = self.instances.build("instance")?;
        let services = self.services.build("service")?;

        let mut jobs = HashMap::with_capacity(self.jobs.len());
        for (name, job) in self.jobs {
            if jobs.contains_key(&name) {
                return Err(AppError::DuplicateJob(name));
            }
            jobs.insert(name, job);
        }

        tracing::info!(
            env = %self.config.env,
            static_routes = routes.static_len(),
            dynamic_routes = routes.dynamic_len(),
            middlewares = self.middlewares.len(),
            instances = instances.len(),
            services = services.len(),
            jobs = jobs.len(),
            "Application loaded"
        );

        Ok(Application {
            config: Arc::new(self.config),
            routes,
            middlewares: self.middlewares,
            instances,
            lifecycle: self.lifecycle,
            services,
            jobs,
        })
    }
}
