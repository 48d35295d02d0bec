//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the listener from the resolved server configuration
//! - Start serving the application
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The application is fully built (routes compiled, registries validated)
//!   before the listener is bound, so traffic only arrives when ready

use tokio::net::TcpListener;

use crate::app::{AppError, Application};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;

/// Bind the configured address and serve until shutdown.
pub async fn serve(app: Application, shutdown: &Shutdown) -> Result<(), AppError> {
    let server = &app.config().server;
    let bind_address = format!("{}:{}", server.hostname, server.port);

    let listener = TcpListener::bind(&bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, env = %app.config().env, "Server running");

    HttpServer::new(app)
        .run(listener, shutdown.subscribe())
        .await?;
    Ok(())
}
