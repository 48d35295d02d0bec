//! Middleware subsystem.
//!
//! # Data Flow
//! ```text
//! Context (fresh, per request)
//!     → chain.rs (run middleware 0..n, onion style)
//!     → ChainOutcome::Completed       → route dispatch
//!     → ChainOutcome::ShortCircuited  → write what the chain produced
//! ```
//!
//! # Design Decisions
//! - The middleware list is fixed when the application is built
//! - Each continuation may advance the chain exactly once
//! - Middleware errors are not caught here; the application answers them

pub mod chain;

use async_trait::async_trait;

use crate::http::Context;
use crate::BoxError;

pub use chain::{run_chain, ChainError, ChainOutcome, Next};

/// A function run around every request before route dispatch.
///
/// Code before `next.run(ctx)` runs on the way in, code after it on the way
/// out. Not calling `next` at all short-circuits the request: the middleware
/// then owns the response and no route is dispatched.
#[async_trait]
pub trait Middleware: Send + Sync + 'static {
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> Result<(), BoxError>;
}
