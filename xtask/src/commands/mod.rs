//! One module per xtask subcommand.

pub mod completions;
pub mod install;
pub mod man;
