//! Metadata provider port: the reflection substitute.
//!
//! A provider is an explicit per-type registry built once per class from a
//! supplied description, exposing declared properties, typed get/set by name,
//! default constructors, and the class hierarchy used by candidate lookup.

use std::any::Any;

use crate::domain::declaration::PropertySpec;
use crate::domain::errors::{FactoryError, MetadataError};
use crate::domain::value::{BeanBox, ClassName, Value};

/// Contract a factory bean's instance exposes to produce its product.
pub trait ProductFactory: Send + Sync {
    fn produce(&self) -> Result<BeanBox, FactoryError>;
}

/// Class metadata and accessor registry.
pub trait MetadataProvider: Send + Sync {
    fn has_class(&self, class: &str) -> bool;

    /// Declared properties of a class, own properties only.
    fn properties_of(&self, class: &str) -> Result<Vec<PropertySpec>, MetadataError>;

    /// Default-construct an instance of the class.
    fn construct(&self, class: &str) -> Result<BeanBox, MetadataError>;

    /// Read a property by name.
    fn get(
        &self,
        class: &str,
        instance: &(dyn Any + Send + Sync),
        property: &str,
    ) -> Result<Value, MetadataError>;

    /// Write a property by name.
    fn set(
        &self,
        class: &str,
        instance: &mut (dyn Any + Send + Sync),
        property: &str,
        value: Value,
    ) -> Result<(), MetadataError>;

    /// Direct subclasses, for the recursive candidate traversal.
    fn direct_subclasses_of(&self, class: &str) -> Vec<ClassName>;

    /// The class a live instance belongs to, when its type is registered.
    /// Backs lazy class derivation for value-backed declarations.
    fn class_of(&self, instance: &(dyn Any + Send + Sync)) -> Option<ClassName>;

    /// Cast an instance to the product-factory contract, when the class
    /// registered one.
    fn product_factory<'a>(
        &self,
        class: &str,
        instance: &'a (dyn Any + Send + Sync),
    ) -> Option<&'a dyn ProductFactory>;
}
