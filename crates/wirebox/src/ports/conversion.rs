//! Conversion registry port.

use crate::domain::errors::ConversionError;
use crate::domain::value::{TypeSpec, Value};

/// A single source-to-target conversion.
pub type ConversionFn = Box<dyn Fn(&Value) -> Result<Value, ConversionError> + Send + Sync>;

/// Registry of value conversions keyed by (source, target) type.
///
/// The resolver consults this whenever a resolved value's type differs from
/// the property's declared type; an absent conversion is a fatal load error,
/// never a silent skip.
pub trait ConversionRegistry: Send + Sync {
    fn get_conversion(&self, from: &TypeSpec, to: &TypeSpec) -> Option<&ConversionFn>;
}
