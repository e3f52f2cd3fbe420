//! Domain module for the container core.
//!
//! Contains the declaration model, runtime value model, dependency graph,
//! errors, and order invariants.

pub mod declaration;
pub mod errors;
pub mod graph;
pub mod invariants;
pub mod value;
pub mod value_source;

pub use declaration::*;
pub use errors::*;
pub use graph::*;
pub use value::*;
pub use value_source::*;
