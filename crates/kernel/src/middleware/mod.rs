//! HTTP middleware components.
//!
//! Provides bearer token authentication and request metrics.

pub mod bearer_auth;
pub mod request_metrics;

pub use bearer_auth::{SubjectClaims, TokenVerifier, authenticate_bearer_token};
pub use request_metrics::track_requests;
