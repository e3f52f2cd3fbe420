//! Ports module for the container core.
//!
//! Defines the inbound retrieval API and the outbound interfaces through
//! which the container consumes its external collaborators: class metadata,
//! configuration values, value conversions, and post-processors.

pub mod api;
pub mod configuration;
pub mod conversion;
pub mod metadata;
pub mod processor;

pub use api::ContainerApi;
pub use configuration::ConfigSource;
pub use conversion::{ConversionFn, ConversionRegistry};
pub use metadata::{MetadataProvider, ProductFactory};
pub use processor::BeanPostProcessor;
