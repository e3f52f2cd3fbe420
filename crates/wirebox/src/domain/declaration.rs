//! Bean declarations: the static description of a future object.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::domain::errors::FactoryError;
use crate::domain::value::{BeanBox, BeanHandle, ClassName, TypeSpec};
use crate::domain::value_source::ValueSource;

/// Built-in scope names, pre-registered by every container.
pub const SCOPE_SINGLETON: &str = "singleton";
pub const SCOPE_PROTOTYPE: &str = "prototype";
/// Internal scope of synthesized factory product nodes.
pub const SCOPE_FACTORY_PRODUCT: &str = "factory-product";

/// Index of a declaration in the container's arena.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct DeclId(pub usize);

impl fmt::Display for DeclId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decl#{}", self.0)
    }
}

/// Where a declaration came from, for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Origin {
    pub source: String,
    pub line: u32,
    pub column: u32,
}

impl Origin {
    pub fn new(source: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            source: source.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.column)
    }
}

/// Property metadata as exposed by the metadata provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySpec {
    pub name: String,
    pub ty: TypeSpec,
    pub optional: bool,
    pub autowired: bool,
}

impl PropertySpec {
    /// A required, non-autowired property.
    pub fn new(name: impl Into<String>, ty: TypeSpec) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
            autowired: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn autowired(mut self) -> Self {
        self.autowired = true;
        self
    }
}

/// Explicit predecessor constraint on a declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Requirement {
    /// Must be ordered after the declaration with this id.
    ById(String),
    /// Must be ordered after the sole candidate of this type.
    ByType(ClassName),
    /// Must be ordered after this already-registered declaration.
    ByDecl(DeclId),
}

/// A user factory function producing a fresh raw instance per call.
pub type FactoryFn = Arc<dyn Fn() -> Result<BeanBox, FactoryError> + Send + Sync>;

/// Construction strategy for a declaration.
#[derive(Clone)]
pub enum FactoryKind {
    /// Default-construct through the metadata provider.
    Constructor,
    /// A pre-built instance; value-backed, handed out as-is.
    Instance(BeanHandle),
    /// A user factory function.
    Function(FactoryFn),
}

impl fmt::Debug for FactoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactoryKind::Constructor => write!(f, "Constructor"),
            FactoryKind::Instance(_) => write!(f, "Instance(..)"),
            FactoryKind::Function(_) => write!(f, "Function(..)"),
        }
    }
}

/// One property assignment on a declaration.
#[derive(Clone, Debug)]
pub struct PropertyDeclaration {
    pub name: String,
    pub value: ValueSource,
    /// Metadata handle, bound during the connect phase.
    pub spec: Option<PropertySpec>,
}

impl PropertyDeclaration {
    pub fn new(name: impl Into<String>, value: ValueSource) -> Self {
        Self {
            name: name.into(),
            value,
            spec: None,
        }
    }
}

/// Static description of a future object: class, scope, properties and
/// dependency hints. Registered with the container before load; owned by the
/// arena afterwards.
pub struct BeanDeclaration {
    pub id: Option<String>,
    pub class: Option<ClassName>,
    pub scope: String,
    pub lazy: bool,
    pub is_abstract: bool,
    /// Id of a declaration supplying inherited class and unset properties.
    pub parent: Option<String>,
    pub requires: Vec<Requirement>,
    pub properties: Vec<PropertyDeclaration>,
    pub factory: FactoryKind,
    /// For factory-bean declarations, the class the factory produces.
    pub target: Option<ClassName>,
    pub origin: Option<Origin>,
    /// Factory declaration a synthesized product node belongs to.
    pub(crate) produced_by: Option<DeclId>,
    /// Memoized singleton instance; the lock doubles as the construct-once
    /// guard for lazy first access.
    pub(crate) singleton: Mutex<Option<BeanHandle>>,
    /// Class derived from the first constructed instance when not declared.
    pub(crate) derived_class: Mutex<Option<ClassName>>,
}

impl BeanDeclaration {
    /// A declaration of a known class, default-constructed, singleton scope.
    pub fn of_class(class: impl Into<ClassName>) -> Self {
        Self {
            class: Some(class.into()),
            ..Self::anonymous()
        }
    }

    /// A declaration with no class; the class is derived from the factory
    /// instance or the first constructed object.
    pub fn anonymous() -> Self {
        Self {
            id: None,
            class: None,
            scope: SCOPE_SINGLETON.to_string(),
            lazy: false,
            is_abstract: false,
            parent: None,
            requires: Vec::new(),
            properties: Vec::new(),
            factory: FactoryKind::Constructor,
            target: None,
            origin: None,
            produced_by: None,
            singleton: Mutex::new(None),
            derived_class: Mutex::new(None),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Singleton-only: defer first construction past the prepare phase.
    pub fn lazy(mut self) -> Self {
        self.lazy = true;
        self
    }

    /// Mark as a template: never instantiated, excluded from lookups.
    pub fn abstract_template(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn with_parent(mut self, id: impl Into<String>) -> Self {
        self.parent = Some(id.into());
        self
    }

    pub fn requires_id(mut self, id: impl Into<String>) -> Self {
        self.requires.push(Requirement::ById(id.into()));
        self
    }

    pub fn requires_type(mut self, class: impl Into<ClassName>) -> Self {
        self.requires.push(Requirement::ByType(class.into()));
        self
    }

    pub fn requires_decl(mut self, decl: DeclId) -> Self {
        self.requires.push(Requirement::ByDecl(decl));
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: ValueSource) -> Self {
        self.properties.push(PropertyDeclaration::new(name, value));
        self
    }

    pub fn with_factory_instance(mut self, instance: BeanHandle) -> Self {
        self.factory = FactoryKind::Instance(instance);
        self
    }

    pub fn with_factory_fn(
        mut self,
        f: impl Fn() -> Result<BeanBox, FactoryError> + Send + Sync + 'static,
    ) -> Self {
        self.factory = FactoryKind::Function(Arc::new(f));
        self
    }

    /// Mark as a factory bean producing instances of `target`.
    pub fn producing(mut self, target: impl Into<ClassName>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn at(mut self, origin: Origin) -> Self {
        self.origin = Some(origin);
        self
    }

    /// The declared or lazily-derived class, if known.
    pub(crate) fn effective_class(&self) -> Option<ClassName> {
        self.class
            .clone()
            .or_else(|| self.derived_class.lock().clone())
    }

    /// Serializable handle naming this declaration in diagnostics.
    pub fn reference(&self) -> DeclarationRef {
        DeclarationRef {
            id: self.id.clone(),
            class: self.effective_class(),
            origin: self.origin.clone(),
        }
    }
}

impl Clone for BeanDeclaration {
    /// Clones get fresh runtime cells; cloning only happens pre-startup
    /// during parent-property merges.
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            class: self.class.clone(),
            scope: self.scope.clone(),
            lazy: self.lazy,
            is_abstract: self.is_abstract,
            parent: self.parent.clone(),
            requires: self.requires.clone(),
            properties: self.properties.clone(),
            factory: self.factory.clone(),
            target: self.target.clone(),
            origin: self.origin.clone(),
            produced_by: self.produced_by,
            singleton: Mutex::new(None),
            derived_class: Mutex::new(None),
        }
    }
}

impl fmt::Debug for BeanDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDeclaration")
            .field("id", &self.id)
            .field("class", &self.class)
            .field("scope", &self.scope)
            .field("lazy", &self.lazy)
            .field("is_abstract", &self.is_abstract)
            .field("parent", &self.parent)
            .field("requires", &self.requires)
            .field("properties", &self.properties)
            .field("factory", &self.factory)
            .field("target", &self.target)
            .field("origin", &self.origin)
            .finish()
    }
}

/// Lightweight serializable handle naming a declaration in diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationRef {
    pub id: Option<String>,
    pub class: Option<ClassName>,
    pub origin: Option<Origin>,
}

impl fmt::Display for DeclarationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.id, &self.class) {
            (Some(id), Some(class)) => write!(f, "bean `{id}` (class `{class}`)")?,
            (Some(id), None) => write!(f, "bean `{id}`")?,
            (None, Some(class)) => write!(f, "anonymous bean (class `{class}`)")?,
            (None, None) => write!(f, "anonymous bean")?,
        }
        if let Some(origin) = &self.origin {
            write!(f, " at {origin}")?;
        }
        Ok(())
    }
}
