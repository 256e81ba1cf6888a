//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → CLI overrides applied by the binary
//!     → read once at startup by the server and observability setup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the rewrite chain built from it never
//!   changes while connections are being served
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    LimitsConfig, ListenerConfig, LogFormat, ObservabilityConfig, OriginConfig, RelayConfig,
    RewriteConfig, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
