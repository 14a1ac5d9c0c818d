//! Core types, the record-store contract, and the attendance rules for
//! Rollcall.
//!
//! This crate is free of HTTP, spreadsheet and database dependencies. The
//! storage adapters, the QR generator and the API layer all depend on it.

// Native `async fn` in traits; the returned futures are `Send` where the
// trait says so.
#![allow(async_fn_in_trait)]

pub mod attendance;
pub mod day;
pub mod error;
pub mod event;
pub mod import;
pub mod memory;
pub mod report;
pub mod store;
pub mod subject;

pub use error::{Error, Result};
