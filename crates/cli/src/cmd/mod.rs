//! CLI command implementations

pub mod touch;
pub mod watch;
