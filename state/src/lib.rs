//! LANDREG State Management
//! 
//! Provides the versioned world state, per-invocation transaction contexts
//! with optimistic conflict detection, ledger cursors, and the translation
//! of typed selectors into Mango queries.
//! Uses a key-value model where state = { key → (value, version) }

pub mod store;
pub mod memory;
pub mod persistent;
pub mod iterator;
pub mod query;
pub mod transaction;

pub use store::*;
pub use memory::*;
pub use persistent::*;
pub use iterator::*;
pub use query::*;
pub use transaction::*;
