//! Post-construction processing port.

use std::any::Any;

use crate::domain::declaration::BeanDeclaration;
use crate::domain::errors::ContainerError;

/// Hook run over every freshly constructed instance, in registration order,
/// after property injection. Implementations may perform field injection or
/// invoke post-construction lifecycle methods on the instance.
pub trait BeanPostProcessor: Send + Sync {
    fn process(
        &self,
        declaration: &BeanDeclaration,
        instance: &mut (dyn Any + Send + Sync),
    ) -> Result<(), ContainerError>;
}
