//! Remote store access: record types and the HTTP client.

pub mod api;
pub mod types;
