//! Command-line front end.
//!
//! Collects input, prompts for secrets without echo, asks for confirmation
//! before anything irreversible, and renders results. All chain logic lives in
//! `blockchain`.

pub mod args;
pub mod commands;
pub mod prompt;

pub use args::{Cli, Command};
pub use commands::{run, AppContext};
