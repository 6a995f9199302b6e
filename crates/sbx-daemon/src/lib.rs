//! HTTP façade over the broker simulation core.
//!
//! Thin by design: route handlers translate between HTTP and the
//! `sbx-broker` API and add nothing else. Business rejections surface as
//! 400 responses carrying the recorded order; unknown accounts are 404.

pub mod api_types;
pub mod routes;
pub mod state;
