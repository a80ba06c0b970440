//! Core types and shared functionality for vidrelay.
//!
//! This crate provides:
//! - In-memory LRU store backing the fetch cache
//! - Bounded, insertion-ordered admission table for in-flight resolutions
//! - Unified error types
//! - Configuration structures

pub mod admission;
pub mod cache;
pub mod config;
pub mod error;

pub use admission::{Admission, AdmissionTable, Admitted};
pub use cache::{CacheStats, DocumentCache};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
