//! Property value sources prior to resolution.
//!
//! Sources move through the load pipeline: collect may register embedded
//! declarations, connect binds symbolic references to arena ids, resolve
//! replaces placeholders with literals. After resolve a source is final.

use crate::domain::declaration::{BeanDeclaration, DeclId};
use crate::domain::value::Value;

/// How an injected bean is selected when no explicit reference is given.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InjectSelector {
    /// Inject the bean declared under this id.
    ById(String),
    /// Inject the sole candidate of the property's declared bean type.
    ByType,
}

/// The source a property value is produced from.
#[derive(Clone, Debug)]
pub enum ValueSource {
    /// A concrete value, either declared directly or produced by resolve.
    Literal(Value),
    /// Reference to another declaration by id.
    BeanRef {
        target_id: String,
        resolved: Option<DeclId>,
    },
    /// Injection by id or by declared type.
    InjectedBean {
        selector: InjectSelector,
        resolved: Option<DeclId>,
    },
    /// An anonymous declaration nested inside this property. Collect moves
    /// the inline declaration into the arena and records its id.
    EmbeddedBean {
        inline: Option<Box<BeanDeclaration>>,
        registered: Option<DeclId>,
    },
    /// A `${namespace:key=default}` template string.
    Placeholder { template: String },
}

impl ValueSource {
    pub fn literal(value: Value) -> Self {
        ValueSource::Literal(value)
    }

    pub fn literal_str(s: impl Into<String>) -> Self {
        ValueSource::Literal(Value::Str(s.into()))
    }

    pub fn literal_int(i: i64) -> Self {
        ValueSource::Literal(Value::Int(i))
    }

    pub fn literal_float(x: f64) -> Self {
        ValueSource::Literal(Value::Float(x))
    }

    pub fn literal_bool(b: bool) -> Self {
        ValueSource::Literal(Value::Bool(b))
    }

    pub fn bean_ref(target_id: impl Into<String>) -> Self {
        ValueSource::BeanRef {
            target_id: target_id.into(),
            resolved: None,
        }
    }

    pub fn inject_by_id(id: impl Into<String>) -> Self {
        ValueSource::InjectedBean {
            selector: InjectSelector::ById(id.into()),
            resolved: None,
        }
    }

    pub fn inject_by_type() -> Self {
        ValueSource::InjectedBean {
            selector: InjectSelector::ByType,
            resolved: None,
        }
    }

    pub fn embedded(declaration: BeanDeclaration) -> Self {
        ValueSource::EmbeddedBean {
            inline: Some(Box::new(declaration)),
            registered: None,
        }
    }

    pub fn placeholder(template: impl Into<String>) -> Self {
        ValueSource::Placeholder {
            template: template.into(),
        }
    }

    /// The declaration this source was bound to during connect, if any.
    pub(crate) fn resolved_target(&self) -> Option<DeclId> {
        match self {
            ValueSource::BeanRef { resolved, .. } => *resolved,
            ValueSource::InjectedBean { resolved, .. } => *resolved,
            ValueSource::EmbeddedBean { registered, .. } => *registered,
            ValueSource::Literal(_) | ValueSource::Placeholder { .. } => None,
        }
    }
}
