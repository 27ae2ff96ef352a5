//! Command handlers, one module per subcommand.
//!
//! Handlers run on a blocking thread. Each takes the wired [`kiln_core::Context`]
//! and, where it loops over packages, an `interrupted` check.

pub mod install;
pub mod list;
pub mod remove;
pub mod upgrade;
