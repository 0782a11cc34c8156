//! Service layer for the art studio companion.
//!
//! Each module owns one area of the studio and exposes async operations
//! over a [`sqlx::SqlitePool`]; file-backed operations also take a
//! [`storage::StorageLayout`]. All operations return [`error::Result`].

pub mod agent;
pub mod error;
pub mod inventory;
pub mod portfolio;
pub mod preferences;
pub mod projects;
pub mod reconcile;
pub mod storage;
pub mod suggest;
pub mod tools;

pub use error::{Result, StudioError};
