//! Application module for the container core.
//!
//! The container service orchestrating the five-phase load pipeline, and
//! the scope strategies governing instance identity.

pub mod container;
pub mod scopes;

pub use container::Container;
pub use scopes::{Scope, ScopeRegistry};
