//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! CLI and transfer flow produce:
//!     → logging.rs (subscriber setup, pretty or JSON)
//!     → spans.rs (transfer spans with attempt IDs)
//! ```
//!
//! # Design Decisions
//! - Structured fields only; secrets are never recorded
//! - `RUST_LOG` overrides the configured level

pub mod logging;
pub mod spans;

pub use logging::init_logging;
