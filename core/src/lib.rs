//! LANDREG Core Library
//! 
//! Core types, traits, and abstractions for the LANDREG property registry.
//! This crate provides the record model, the storage port every backend
//! implements, and the shared error and configuration types.

pub mod types;
pub mod traits;
pub mod error;
pub mod config;

pub use types::*;
pub use traits::*;
pub use error::*;
pub use config::*;
