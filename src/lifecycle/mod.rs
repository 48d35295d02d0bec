//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve config → Build application → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Trigger or Ctrl+C → Stop accepting → Drain → Close instances
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then application, then listener
//! - Instances are closed only after the server has drained

pub mod shutdown;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::serve;
