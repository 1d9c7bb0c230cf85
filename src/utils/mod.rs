//! Shared utilities

pub mod error;
pub mod timestamp;
pub mod validation;

pub use error::{AppError, AppResult, ErrorResponse};
pub use timestamp::{TimestampError, TimestampParts};
