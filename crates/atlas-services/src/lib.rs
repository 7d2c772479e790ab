//! Atlas Services Layer
//!
//! Glue between the synchronous grid engine and the async record store.
//!
//! # Architecture
//!
//! ```text
//! Host UI
//!     ↓ actions            ↑ GridEvent
//! Grid engine (atlas-grid, single-threaded)
//!     ↓ CellEdit over an unbounded channel
//! Service Layer (atlas-services) ← This crate
//!     ↓ capability check, then async calls
//! RecordStore (atlas-core)
//! ```
//!
//! # Services
//!
//! - [`TableService`] - Capability-gated table loads, inserts and deletes
//! - [`EditForwarder`] / [`EditPump`] - Committed cell edits to store updates
//! - [`SavedView`] - Binds a grid to its persisted column layout and sort

mod edit_service;
mod error;
mod saved_view;
mod table_service;

pub use edit_service::{CellEdit, EditForwarder, EditOutcome, EditPump, EditStream, PumpStats, build_patch};
pub use error::{ServiceError, ServiceResult};
pub use saved_view::SavedView;
pub use table_service::TableService;
