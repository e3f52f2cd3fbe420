//! Inbound container API.

use crate::domain::errors::ContainerError;
use crate::domain::value::{BeanHandle, ClassName};

/// Primary retrieval API, available after a successful `startup`.
///
/// Type-based retrieval uses candidate lookup: declarations of the exact
/// class plus, recursively, declarations of every known subclass. Abstract
/// declarations never appear in any result.
pub trait ContainerApi: Send + Sync {
    /// The sole bean declared under this id.
    fn bean_by_id(&self, id: &str) -> Result<BeanHandle, ContainerError>;

    /// The sole bean assignable to this class.
    fn bean_by_type(&self, class: &str) -> Result<BeanHandle, ContainerError>;

    /// Every bean assignable to this class, in declaration order.
    fn beans_by_type(&self, class: &str) -> Result<Vec<BeanHandle>, ContainerError>;

    /// Classes with at least one instantiable declaration.
    fn known_classes(&self) -> Vec<ClassName>;
}
