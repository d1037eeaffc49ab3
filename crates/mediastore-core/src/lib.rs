//! Mediastore Core Library
//!
//! This crate provides the domain models, error types, settings, and content
//! hashing that are shared across all mediastore components.

pub mod config;
pub mod error;
pub mod hash;
pub mod models;

// Re-export commonly used types
pub use config::MediaSettings;
pub use error::{AppError, AppResult};
pub use hash::ContentHash;
pub use models::storage::StorageBackend;
