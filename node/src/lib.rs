//! LANDREG Node Implementation
//! 
//! Hosts the record store and combines:
//! - World state backend selection
//! - One ledger transaction per invocation, with conflict detection
//! - HTTP API

mod api;
mod node;
mod runtime;

pub use api::*;
pub use node::*;
pub use runtime::*;
