//! Adapters module for the container core.
//!
//! In-memory implementations of the outbound ports, sufficient for embedding
//! the container and for every test in the repo.

mod class_registry;
mod conversions;
mod layered_config;

pub use class_registry::{ClassBuilder, ClassRegistry};
pub use conversions::DefaultConversions;
pub use layered_config::LayeredConfig;
