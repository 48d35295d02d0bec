//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with a single catch-all handler
//! - Wire up transport middleware (tracing, request ID, optional timeout)
//! - Serve on a bound listener until shutdown
//! - Close application instances once the server has stopped
//!
//! # Design Decisions
//! - Axum only carries the connection; routing happens in the application
//! - The request timeout lives here, outside the dispatch core

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::app::Application;
use crate::lifecycle::shutdown::shutdown_signal;

/// HTTP server for a plant application.
pub struct HttpServer {
    router: Router,
    app: Arc<Application>,
}

impl HttpServer {
    /// Create a new HTTP server for the given application.
    pub fn new(app: Application) -> Self {
        let app = Arc::new(app);
        let router = Self::build_router(app.clone());
        Self { router, app }
    }

    /// Build the Axum router with all transport layers.
    #[allow(deprecated)]
    fn build_router(app: Arc<Application>) -> Router {
        let timeout = app.config().server.request_timeout_secs;

        let router = Router::new()
            .fallback(handle_request)
            .with_state(app)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        match timeout {
            Some(secs) => router.layer(TimeoutLayer::new(Duration::from_secs(secs))),
            None => router,
        }
    }

    /// A clone of the router, for driving requests in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn application(&self) -> &Arc<Application> {
        &self.app
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        self.app.close().await;
        Ok(())
    }
}

async fn handle_request(
    State(app): State<Arc<Application>>,
    request: Request<Body>,
) -> Response {
    app.handle(request).await
}
