//! Algorithms module for the container core.
//!
//! Contains:
//! - Kahn's topological sort (the expected path)
//! - Tarjan strongly-connected components (cycle reporting on failure)
//! - Recursive placeholder template resolution

pub mod kahns;
pub mod placeholder;
pub mod tarjan;

pub use kahns::kahns_topological_sort;
pub use placeholder::resolve_template;
pub use tarjan::{cycle_components, strongly_connected_components};
