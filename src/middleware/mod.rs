// ABOUTME: HTTP middleware for request authentication
// ABOUTME: Bearer token extraction and validation against the correlation provider

pub mod auth;

// Authentication middleware
pub use auth::{extract_bearer, BearerAuthMiddleware};
