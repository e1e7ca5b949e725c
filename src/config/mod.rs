//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! crypto-transfer.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!
//! config/networks.json (optional)
//!     → networks.rs (parse, validate, fall back to built-ins)
//!     → NetworkConfigStore (passed to the CLI, never global)
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A broken network file degrades to built-ins instead of aborting

pub mod loader;
pub mod networks;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, ConfigError};
pub use networks::NetworkConfigStore;
pub use schema::{AppConfig, ClientSettings, LogFormat, LoggingConfig, NetworkConfig, RpcConfig};
