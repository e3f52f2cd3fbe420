//! # Wirebox
//!
//! A declarative object-construction container: bean declarations in, a
//! validated, topologically-ordered, fully-wired object graph out.
//!
//! Declarations describe future objects (class, scope, properties,
//! dependency hints). The container builds a dependency graph from four
//! independent edge sources (explicit `requires`, parent-template
//! inheritance, embedded beans, autowire-by-type), rejects cycles with a
//! precise strongly-connected-component report, resolves configuration
//! placeholders with recursive defaults, coerces values to declared property
//! types, and constructs instances under pluggable scope strategies.
//!
//! ## Architecture
//!
//! - **Domain**: declarations, value sources, dependency graph, errors,
//!   order invariants
//! - **Algorithms**: Kahn linearization, Tarjan cycle reporting, placeholder
//!   interpolation
//! - **Ports**: metadata provider, configuration store, conversion registry,
//!   post-processors, retrieval API
//! - **Adapters**: in-memory class registry, layered configuration, default
//!   conversions
//! - **Application**: container orchestration and scope strategies
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use wirebox::{
//!     BeanDeclaration, ClassRegistry, Container, DefaultConversions, LayeredConfig,
//!     ValueSource,
//! };
//!
//! #[derive(Default)]
//! struct Logger {
//!     level: String,
//! }
//!
//! let mut registry = ClassRegistry::new();
//! registry
//!     .describe::<Logger>("Logger")
//!     .constructor(Logger::default)
//!     .string_property("level", |l| l.level.clone(), |l, v| l.level = v)
//!     .optional()
//!     .register();
//!
//! let mut container = Container::new(
//!     Arc::new(registry),
//!     Arc::new(LayeredConfig::new()),
//!     Arc::new(DefaultConversions::new()),
//! );
//! container.define(
//!     BeanDeclaration::of_class("Logger")
//!         .with_id("logger")
//!         .with_property("level", ValueSource::placeholder("${log.level=info}")),
//! );
//! container.startup().unwrap();
//!
//! let logger = container.bean_as::<Logger>("logger").unwrap();
//! assert_eq!(logger.level, "info");
//! ```

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::{ClassBuilder, ClassRegistry, DefaultConversions, LayeredConfig};
pub use application::{Container, Scope, ScopeRegistry};
pub use config::ContainerConfig;
pub use domain::declaration::{
    BeanDeclaration, DeclId, DeclarationRef, FactoryKind, Origin, PropertyDeclaration,
    PropertySpec, Requirement, SCOPE_PROTOTYPE, SCOPE_SINGLETON,
};
pub use domain::errors::{ContainerError, ConversionError, FactoryError, MetadataError};
pub use domain::graph::{Edge, EdgeKind, GraphSnapshot};
pub use domain::value::{BeanBox, BeanHandle, ClassName, TypeSpec, Value};
pub use domain::value_source::{InjectSelector, ValueSource};
pub use ports::{
    BeanPostProcessor, ConfigSource, ContainerApi, ConversionFn, ConversionRegistry,
    MetadataProvider, ProductFactory,
};
