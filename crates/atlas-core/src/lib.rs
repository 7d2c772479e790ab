//! Atlas Core - shared data model and backend abstractions for the CRM dashboard
//!
//! This crate provides the types every other Atlas crate depends on:
//!
//! - `Value` / `Record` - dynamic, caller-defined row shape
//! - `ValueExt` - display, equality and numeric coercion rules used by the grid
//! - `RecordStore` - trait for the hosted backend (CRUD + bulk upsert)
//! - `MemoryRecordStore` - in-process store used by tests and demos
//! - `Capability` - opaque authorization check

mod capability;
mod error;
mod store;
mod types;

pub use capability::*;
pub use error::*;
pub use store::*;
pub use types::*;
