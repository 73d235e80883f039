//! API middleware

pub mod auth;
pub mod metrics;

pub use auth::RequireAuth;
pub use metrics::metrics_middleware;
