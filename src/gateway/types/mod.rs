//! Gateway types module
//!
//! - [`ApiResponse<T>`]: Unified API response wrapper
//! - [`ApiError`] / [`ApiResult`]: handler error path, built from `PlacementError`
//! - [`error_codes`]: numeric codes used in the envelope

pub mod response;

// Re-export commonly used types at module root
pub use response::{ApiError, ApiResponse, ApiResult, error_codes, ok};
