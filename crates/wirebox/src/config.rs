//! Container load configuration.

use serde::{Deserialize, Serialize};

/// Load limits enforced by the lifecycle pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Maximum declarations in one container, embedded and synthesized
    /// nodes included.
    pub max_declarations: usize,
    /// Maximum edges in the dependency graph (anti-runaway guard).
    pub max_edges: usize,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            max_declarations: 10_000,
            max_edges: 100_000,
        }
    }
}
