//! Default scalar conversions.

use std::collections::HashMap;

use crate::domain::errors::ConversionError;
use crate::domain::value::{TypeSpec, Value};
use crate::ports::conversion::{ConversionFn, ConversionRegistry};

/// Registry pre-loaded with the string↔scalar and widening numeric
/// conversions the resolver needs for placeholder-fed properties.
pub struct DefaultConversions {
    table: HashMap<(TypeSpec, TypeSpec), ConversionFn>,
}

impl DefaultConversions {
    pub fn new() -> Self {
        let mut conversions = Self {
            table: HashMap::new(),
        };

        conversions.register(TypeSpec::Str, TypeSpec::Int, |v| {
            let s = expect_str(v)?;
            s.trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| failed(v, &TypeSpec::Str, &TypeSpec::Int))
        });
        conversions.register(TypeSpec::Str, TypeSpec::Float, |v| {
            let s = expect_str(v)?;
            s.trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| failed(v, &TypeSpec::Str, &TypeSpec::Float))
        });
        conversions.register(TypeSpec::Str, TypeSpec::Bool, |v| {
            let s = expect_str(v)?;
            match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(failed(v, &TypeSpec::Str, &TypeSpec::Bool)),
            }
        });
        conversions.register(TypeSpec::Int, TypeSpec::Float, |v| match v {
            Value::Int(i) => Ok(Value::Float(*i as f64)),
            _ => Err(failed(v, &TypeSpec::Int, &TypeSpec::Float)),
        });
        conversions.register(TypeSpec::Int, TypeSpec::Str, |v| {
            Ok(Value::Str(format!("{v:?}")))
        });
        conversions.register(TypeSpec::Float, TypeSpec::Str, |v| {
            Ok(Value::Str(format!("{v:?}")))
        });
        conversions.register(TypeSpec::Bool, TypeSpec::Str, |v| {
            Ok(Value::Str(format!("{v:?}")))
        });

        conversions
    }

    /// Add or replace a conversion.
    pub fn register(
        &mut self,
        from: TypeSpec,
        to: TypeSpec,
        f: impl Fn(&Value) -> Result<Value, ConversionError> + Send + Sync + 'static,
    ) {
        self.table.insert((from, to), Box::new(f));
    }
}

impl Default for DefaultConversions {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionRegistry for DefaultConversions {
    fn get_conversion(&self, from: &TypeSpec, to: &TypeSpec) -> Option<&ConversionFn> {
        self.table.get(&(from.clone(), to.clone()))
    }
}

fn expect_str<'a>(v: &'a Value) -> Result<&'a str, ConversionError> {
    v.as_str()
        .ok_or_else(|| failed(v, &TypeSpec::Str, &TypeSpec::Str))
}

fn failed(value: &Value, from: &TypeSpec, to: &TypeSpec) -> ConversionError {
    ConversionError {
        value: format!("{value:?}"),
        from: from.to_string(),
        to: to.to_string(),
    }
}
