//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     Routes (declared method, path, handler)
//!     → route.rs (parse path, detect :name markers)
//!     → table.rs (partition static / dynamic)
//!     → matcher.rs (compile segment patterns)
//!     → Freeze as immutable RouteTable
//!
//! Incoming Request (method, path?query)
//!     → table.rs (strip query, static lookup, dynamic scan)
//!     → Return: MatchResult { route, params } or None
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Static routes are an O(1) exact lookup and always win over dynamic ones
//! - Dynamic routes are scanned per method in declaration order; first match wins
//! - No regex in hot path (segment-wise comparison after a prefix check)

pub mod matcher;
pub mod route;
pub mod table;

pub use matcher::PathPattern;
pub use route::{Handler, HandlerResult, RouteDefinition, RouteError, Routes};
pub use table::{MatchResult, Params, RouteTable};
