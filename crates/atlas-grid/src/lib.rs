//! Atlas Grid - in-memory state engine behind the CRM data table
//!
//! The engine derives everything a view layer needs to render a table from
//! raw records and column definitions:
//!
//! ```text
//! raw rows ─► filter ─► sort ─► paginate | virtualize ─► rendered rows
//!                                      columns ─► order/visibility ─► visible columns
//! ```
//!
//! Selection (rows, cells, merged regions) runs orthogonally and is keyed by
//! displayed row index and column id. [`GridState`] owns every piece of state
//! and is only mutated through its actions; each action re-runs the stages
//! whose inputs changed and notifies subscribers with a [`GridEvent`].
//!
//! The engine is single-threaded (`Rc`/`RefCell` throughout) and never awaits:
//! edits leave through [`GridEvent::CellEdited`] and the host decides what to
//! do with them.

mod accessor;
mod column;
mod debounce;
mod events;
mod export;
mod filter;
mod memo;
mod options;
mod pagination;
mod selection;
mod sort;
mod state;
mod virtualization;

pub use accessor::*;
pub use column::*;
pub use debounce::*;
pub use events::*;
pub use export::*;
pub use filter::*;
pub use options::*;
pub use pagination::*;
pub use selection::*;
pub use sort::*;
pub use state::*;
pub use virtualization::*;
