//! State-transition engine for virtualized lists, grids, and tables.
//!
//! This crate materializes only the cells needed to cover a viewport plus a
//! small buffer, reusing cell instances across scrolls and data mutations so
//! that per-frame work and memory stay bounded regardless of total item
//! count. It is the reusable core behind a lazy-list/grid/table widget; it
//! owns no scene graph, no rendering, and no scroll-bar chrome (those are
//! the host's job, see [`cell::Cell`] and [`items::ItemSource`] for the two
//! seams the host implements).
//!
//! Five cooperating pieces, leaves first:
//! - [`helper`] - pure range/position/extent arithmetic per container variant.
//! - [`cache`] - bounded pool of retired cells, reused before building new ones.
//! - [`state_map`] - the `index -> Cell` map with a duplicate-item index.
//! - [`engine`] - the intersection algorithm: old state + new range -> new state.
//! - [`manager`] - observes input changes, classifies them, drives the engine.
//!
//! [`grid_manager`] is the 2-D sibling of [`manager`]: same state machine,
//! same engine family, but composed over two independent axes.

pub mod buffer;
pub mod cache;
pub mod cell;
pub mod change;
pub mod config;
pub mod engine;
pub mod error;
pub mod grid_manager;
pub mod helper;
pub mod index;
pub mod items;
pub mod manager;
pub mod state;
pub mod state_map;

#[cfg(test)]
mod tests;

pub use buffer::BufferSize;
pub use cache::CellCache;
pub use cell::Cell;
pub use change::{ChangeKind, ItemsMutation};
pub use config::{ColumnLayoutMode, Configuration, Orientation};
pub use engine::CellFactory;
pub use error::{Result, VirtError};
pub use grid_manager::GridManager;
pub use index::{Index, IntegerRange, INVALID_INDEX};
pub use items::ItemSource;
pub use manager::{LayoutSignal, LinearManager, ManagerPhase};
pub use state::{GridLayout, State};
pub use state_map::StateMap;
