//! Core library for the boq-sync command line application.
//!
//! The crate keeps an element snapshot of a building-services model and a
//! bill-of-quantities workbook in step, in both directions. The modules are
//! structured to keep responsibilities narrow and composable: value
//! canonicalization in [`key`], the store and element boundaries under
//! [`store`] and [`model`], the per-category configuration in [`schema`] and
//! [`catalog`], the reconciliation engine under [`engine`], and the
//! multi-schema orchestration in [`sync`].

pub mod catalog;
pub mod engine;
pub mod error;
pub mod key;
pub mod logging;
pub mod model;
pub mod schema;
pub mod store;
pub mod sync;

pub use error::{Result, SyncError};
