//! Middleware chain executor.
//!
//! # Responsibilities
//! - Run an ordered middleware list over one request context
//! - Guard every continuation against being invoked twice
//! - Report whether the chain ran to completion or was short-circuited
//!
//! # Design Decisions
//! - Explicit state machine: a cursor that starts at -1 and only increases
//! - A continuation for step `i` is allowed only when `i` is above the cursor
//! - A violation is recorded on the run itself, so it surfaces even when the
//!   offending middleware ignores the error returned by `next`

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicIsize, Ordering};
use std::sync::{Arc, OnceLock};

use futures_util::future::{self, BoxFuture};

use crate::http::Context;
use crate::middleware::Middleware;
use crate::BoxError;

/// Failure of a chain run.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// A continuation was invoked more than once.
    #[error("continuation for middleware step {step} invoked more than once")]
    DoubleInvocation { step: usize },

    /// A middleware returned an error.
    #[error("middleware failed: {0}")]
    Middleware(#[source] BoxError),
}

/// How a chain run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOutcome {
    /// Every middleware forwarded; the route should be dispatched.
    Completed,
    /// Some middleware did not forward and owns the response.
    ShortCircuited,
}

impl ChainOutcome {
    pub fn ran_to_completion(self) -> bool {
        self == ChainOutcome::Completed
    }
}

struct ChainRun<'a> {
    middlewares: &'a [Arc<dyn Middleware>],
    cursor: AtomicIsize,
    completed: AtomicBool,
    violation: OnceLock<usize>,
}

impl<'a> ChainRun<'a> {
    fn new(middlewares: &'a [Arc<dyn Middleware>]) -> Self {
        Self {
            middlewares,
            cursor: AtomicIsize::new(-1),
            completed: AtomicBool::new(false),
            violation: OnceLock::new(),
        }
    }

    fn dispatch<'s>(&'s self, step: usize, ctx: &'s mut Context) -> BoxFuture<'s, Result<(), BoxError>> {
        let requested = step as isize;
        if requested <= self.cursor.load(Ordering::SeqCst) {
            let _ = self.violation.set(step);
            return Box::pin(future::ready(Err(
                ChainError::DoubleInvocation { step }.into()
            )));
        }
        self.cursor.store(requested, Ordering::SeqCst);

        match self.middlewares.get(step) {
            Some(middleware) => middleware.handle(ctx, Next { run: self, step: step + 1 }),
            None => {
                self.completed.store(true, Ordering::SeqCst);
                Box::pin(future::ready(Ok(())))
            }
        }
    }
}

/// Continuation handed to a middleware.
///
/// `run` hands control to the next middleware, or ends the chain when called
/// by the last one. Calling it a second time fails with
/// [`ChainError::DoubleInvocation`] and fails the request.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    run: &'a ChainRun<'a>,
    step: usize,
}

impl Next<'_> {
    pub async fn run(&self, ctx: &mut Context) -> Result<(), BoxError> {
        self.run.dispatch(self.step, ctx).await
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("step", &self.step)
            .field("len", &self.run.middlewares.len())
            .finish()
    }
}

/// Run the middleware chain over one context.
pub async fn run_chain(
    middlewares: &[Arc<dyn Middleware>],
    ctx: &mut Context,
) -> Result<ChainOutcome, ChainError> {
    let run = ChainRun::new(middlewares);
    let result = run.dispatch(0, ctx).await;

    if let Some(step) = run.violation.get() {
        return Err(ChainError::DoubleInvocation { step: *step });
    }
    result.map_err(ChainError::Middleware)?;

    if run.completed.load(Ordering::SeqCst) {
        Ok(ChainOutcome::Completed)
    } else {
        Ok(ChainOutcome::ShortCircuited)
    }
}
