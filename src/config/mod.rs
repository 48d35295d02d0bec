//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config/config.default.toml + config/config.<env>.toml
//!     → loader.rs (read, deep-merge, deserialize)
//!     → validation.rs (semantic checks)
//!     → PlantConfig (validated, immutable)
//!     → owned by the Application, shared via Arc
//! ```
//!
//! # Design Decisions
//! - Resolved once at startup; never re-read while serving
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{resolve, ConfigError};
pub use schema::{LogFormat, LoggingConfig, PlantConfig, ServerConfig};
pub use validation::ValidationError;
