//! Sortable, selectable record tables.
//!
//! [`state::TableViewState`] owns the rows and the sort, selection and hover
//! state drawn on top of them. The remaining modules make up the terminal
//! front-end that drives it.

pub mod controller;
pub mod display;
pub mod domain;
pub mod inputter;
pub mod loader;
pub mod model;
pub mod record;
pub mod sample;
pub mod state;
pub mod ui;

pub use display::{DisplayOptions, Emphasis, Layout, RowStyleHint, SelectionMode};
pub use domain::{TVError, TableError};
pub use record::{ColorTag, Column, ColumnKind, Record, Value};
pub use state::{Selection, SortIndicator, SortState, StateChange, TableViewState};
