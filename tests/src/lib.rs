//! # Wirebox Test Suite
//!
//! Unified test crate for the container.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Shared demo domain and container builders
//! └── integration/      # Scenario tests against the public API
//!     ├── lifecycle.rs  # Startup pipeline, scopes, factories, processors
//!     ├── wiring.rs     # Inheritance, autowiring, references, failures
//!     ├── placeholders.rs # Configuration interpolation end to end
//!     └── properties.rs # Property tests over ordering and cycle reporting
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p wirebox-tests
//!
//! # By area
//! cargo test -p wirebox-tests integration::lifecycle
//! cargo test -p wirebox-tests integration::properties
//! ```

#![allow(dead_code)]

pub mod fixtures;
pub mod integration;
