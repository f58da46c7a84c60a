//! # Middleware
//!
//! Request metrics and per-client rate limiting. Request tracing is
//! `tower_http::trace::TraceLayer`, applied in [`crate::app`].

pub mod metrics;
pub mod rate_limit;
