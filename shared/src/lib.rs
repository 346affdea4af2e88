//! Shared types for the SACCO back-office
//!
//! Common types used across multiple crates including error types,
//! response structures, domain models and utility helpers.

pub mod client;
pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};
