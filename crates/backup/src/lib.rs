//! Snapshot capture and restore for the hoard library.
//!
//! A snapshot is a portable copy of the favourite series of both library
//! stores, optionally with their units, categories, history and tracker
//! links, plus the host application's preferences. Which of those are
//! included is decided by a [`CaptureSelector`].
//!
//! Capture goes [`assemble`] → [`codec::encode`] → storage backend, with
//! [`retention`] pruning old automatic snapshots on the way. Restore goes
//! [`read_snapshot`] → [`restore_snapshot`], which drives the natural-key
//! merge steps in [`reconcile`].

mod assemble;
pub mod codec;
mod context;
mod create;
pub mod error;
pub mod prefs;
pub mod reconcile;
mod restore;
pub mod retention;
mod selector;
pub mod snapshot;
pub mod source;
#[cfg(test)]
mod test_support;
mod validate;

pub use crate::assemble::assemble;
pub use crate::codec::read_snapshot;
pub use crate::context::{Context, Library};
pub use crate::create::{Target, create_snapshot};
pub use crate::restore::{RestoreIssue, RestoreOptions, RestoreReport, restore_snapshot};
pub use crate::selector::CaptureSelector;
pub use crate::snapshot::Snapshot;
pub use crate::validate::{ValidationReport, validate};
