//! LANDREG Property Registry
//! 
//! Implements the record store run inside every ledger transaction:
//! - Seeding demonstration records
//! - Record creation with an explicit key-collision policy
//! - Point reads, full-range listing and owner transfer
//! - Owner queries through typed selectors

pub mod contract;
pub mod invocation;
pub mod seed;

pub use contract::*;
pub use invocation::*;
pub use seed::*;
