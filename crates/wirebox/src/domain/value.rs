//! Runtime values and declared value types.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Class names are plain strings; the metadata provider owns their meaning.
pub type ClassName = String;

/// A fully constructed bean, shared by every holder of a reference to it.
pub type BeanHandle = Arc<dyn Any + Send + Sync>;

/// A bean under construction, before it is published as a [`BeanHandle`].
pub type BeanBox = Box<dyn Any + Send + Sync>;

/// Declared type of a property or conversion endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeSpec {
    Str,
    Int,
    Float,
    Bool,
    Bean(ClassName),
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Str => write!(f, "string"),
            TypeSpec::Int => write!(f, "int"),
            TypeSpec::Float => write!(f, "float"),
            TypeSpec::Bool => write!(f, "bool"),
            TypeSpec::Bean(class) => write!(f, "bean<{class}>"),
        }
    }
}

/// A concrete runtime value held by a resolved property.
#[derive(Clone)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// A constructed bean instance together with its class name, so
    /// assignability checks and diagnostics never need runtime introspection.
    Bean { class: ClassName, handle: BeanHandle },
}

impl Value {
    /// The type this value inhabits.
    pub fn type_spec(&self) -> TypeSpec {
        match self {
            Value::Str(_) => TypeSpec::Str,
            Value::Int(_) => TypeSpec::Int,
            Value::Float(_) => TypeSpec::Float,
            Value::Bool(_) => TypeSpec::Bool,
            Value::Bean { class, .. } => TypeSpec::Bean(class.clone()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_bean(&self) -> Option<&BeanHandle> {
        match self {
            Value::Bean { handle, .. } => Some(handle),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Bean { class, .. } => write!(f, "<bean {class}>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            // Bean identity, not structural equality.
            (Value::Bean { handle: a, .. }, Value::Bean { handle: b, .. }) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
