//! Integration tests against the public container API.

pub mod lifecycle;
pub mod properties;
