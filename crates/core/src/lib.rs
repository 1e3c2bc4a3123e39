//! Core types and shared functionality for the coinstash offline worker.
//!
//! This crate provides:
//! - Named, versioned cache stores with a SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CacheNames, StoredResponse};
pub use config::AppConfig;
pub use error::Error;
