//! SQLite library store.
//!
//! One database per medium holds the live library: series, their units,
//! categories and category memberships, consumption history and tracker
//! links. The snapshot engine only ever talks to it through a
//! [`Transaction`] obtained from a [`Repository`], so that a whole capture
//! reads one consistent state and a whole restore lands (or rolls back) as
//! one unit.

mod db;
pub mod error;
mod models;
mod repo;

pub use crate::db::Database;
pub use crate::repo::{HistoryEntry, Repository, Transaction};
