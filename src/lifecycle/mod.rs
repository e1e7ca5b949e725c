//! Process lifecycle.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGINT (Ctrl-C) → stop waiting for a receipt, keep the hash
//! ```

pub mod signals;

pub use signals::interrupted;
