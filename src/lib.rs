//! Real-Debrid manager.
//!
//! A typed client for the Real-Debrid REST API with a small TTL cache in front
//! of it, plus the pieces the `rdm` binary is built from.

pub mod app;
pub mod cache;
pub mod commands;
pub mod config;
pub mod debrid;
pub mod error;
pub mod logging;
pub mod magnet;

pub use error::{classify, AppError};
