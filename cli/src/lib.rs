//! LANDREG CLI library: HTTP client for a running node

mod commands;

pub use commands::*;
