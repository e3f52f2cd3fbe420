//! Error types for container loading and lookup.
//!
//! Every error here is fatal to the current load: the orchestrator stops at
//! the first failure and the container is left unusable, never half-wired.

use thiserror::Error;

use crate::domain::declaration::DeclarationRef;
use crate::domain::value::ClassName;

/// All errors that can abort a container load or fail a lookup.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// No declaration registered under the requested id.
    #[error("no bean declared with id `{id}`")]
    UnknownBeanById { id: String },

    /// Two declarations claim the same id.
    #[error("duplicate bean id `{id}`; ids must be unique across the declaration set")]
    AmbiguousBeanById { id: String },

    /// Type-based retrieval found nothing.
    #[error("no bean of type `{class}` is declared")]
    UnknownBeanByType { class: ClassName },

    /// Type-based retrieval found more than one match.
    #[error("multiple beans of type `{class}` match; qualify the request by id")]
    AmbiguousBeanByType { class: ClassName },

    /// Candidate search for a wiring site found nothing.
    #[error("no candidate of type `{class}` for {site}")]
    NoCandidateForType { class: ClassName, site: String },

    /// Candidate search found several; ambiguity is never resolved by heuristic.
    #[error("{count} candidates of type `{class}` for {site}; wiring is ambiguous")]
    AmbiguousCandidatesForType {
        class: ClassName,
        count: usize,
        site: String,
    },

    /// A declared property name is missing from the target class metadata.
    #[error("class `{class}` has no property `{property}` ({declaration})")]
    UnknownProperty {
        class: ClassName,
        property: String,
        declaration: String,
    },

    /// The dependency graph is not a DAG. Carries every strongly-connected
    /// component of size > 1, each as an ordered list of declarations.
    #[error("dependency cycles detected: {}", render_cycles(.cycles))]
    CyclicDependencies { cycles: Vec<Vec<DeclarationRef>> },

    /// A declaration names a scope that was never registered.
    #[error("scope `{scope}` is not registered ({declaration})")]
    UnknownScope { scope: String, declaration: String },

    /// A resolved value does not fit the property's declared type.
    #[error("type mismatch for {site}: expected `{expected}`, actual `{actual}`")]
    TypeMismatch {
        expected: String,
        actual: String,
        site: String,
    },

    /// A value could not be coerced to the property's declared type.
    #[error("cannot convert `{value}` from `{from}` to `{to}` for {site}")]
    ConversionFailed {
        value: String,
        from: String,
        to: String,
        site: String,
    },

    /// A non-optional property ended the resolve phase with no value.
    #[error("required property `{property}` of {declaration} has no value")]
    RequiredPropertyUnset {
        property: String,
        declaration: String,
    },

    /// Load limit: declaration count.
    #[error("declaration limit exceeded: {count} > {max}")]
    TooManyDeclarations { count: usize, max: usize },

    /// Load limit: edge count.
    #[error("edge limit exceeded: {count} > {max}")]
    TooManyEdges { count: usize, max: usize },

    /// Generic configuration-source failure.
    #[error("configuration error: {0}")]
    Configuration(String),
}

fn render_cycles(cycles: &[Vec<DeclarationRef>]) -> String {
    let mut out = String::new();
    for (i, cycle) in cycles.iter().enumerate() {
        if i > 0 {
            out.push_str("; ");
        }
        out.push('[');
        for (j, member) in cycle.iter().enumerate() {
            if j > 0 {
                out.push_str(" -> ");
            }
            out.push_str(&member.to_string());
        }
        out.push(']');
    }
    out
}

/// Errors raised by a metadata provider.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("class `{0}` is not described")]
    UnknownClass(ClassName),

    #[error("class `{class}` has no property `{property}`")]
    UnknownProperty { class: ClassName, property: String },

    #[error("expected `{expected}`, got `{actual}`")]
    TypeMismatch { expected: String, actual: String },

    #[error("class `{0}` has no registered constructor")]
    NoConstructor(ClassName),

    #[error("{0}")]
    Failed(String),
}

/// A conversion function rejected its input.
#[derive(Debug, Error)]
#[error("cannot convert `{value}` from `{from}` to `{to}`")]
pub struct ConversionError {
    pub value: String,
    pub from: String,
    pub to: String,
}

/// A user factory failed to produce an instance.
#[derive(Debug, Error)]
#[error("factory failed: {0}")]
pub struct FactoryError(pub String);
