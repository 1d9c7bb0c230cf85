//! Middleware components
//!
//! This module contains middleware for:
//! - API key authentication
//! - Security and cache-control response headers

pub mod api_key;
pub mod security_headers;

pub use api_key::{api_key_middleware, ApiKeyError, API_KEY_HEADER};
pub use security_headers::{api_cache_control_middleware, security_headers_middleware};
