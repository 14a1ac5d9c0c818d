//! Flat-file backend for the Rollcall record store.
//!
//! Subjects and attendance events live in two pretty-printed JSON documents
//! inside one directory. The whole data set is held in memory and written
//! through on every change.

mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::JsonStore;
