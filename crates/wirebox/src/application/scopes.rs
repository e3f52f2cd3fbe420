//! Scope strategies: instantiation policy per declaration.

use std::collections::HashMap;
use std::sync::Arc;

use crate::application::container::Container;
use crate::domain::declaration::{
    DeclId, SCOPE_FACTORY_PRODUCT, SCOPE_PROTOTYPE, SCOPE_SINGLETON,
};
use crate::domain::errors::ContainerError;
use crate::domain::value::BeanHandle;

/// Instantiation policy governing identity and caching of a declaration's
/// instances. Strategies are shared; declarations hold only the scope name.
pub trait Scope: Send + Sync {
    /// Registry key for this strategy.
    fn name(&self) -> &str;

    /// Load-time hook, run once per declaration in sorted order.
    fn prepare(&self, container: &Container, decl: DeclId) -> Result<(), ContainerError>;

    /// Produce an instance for the declaration.
    fn get(&self, container: &Container, decl: DeclId) -> Result<BeanHandle, ContainerError>;
}

/// Name-keyed scope registry; the built-in strategies are pre-registered.
pub struct ScopeRegistry {
    scopes: HashMap<String, Arc<dyn Scope>>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            scopes: HashMap::new(),
        };
        registry.register(Arc::new(SingletonScope));
        registry.register(Arc::new(PrototypeScope));
        registry.register(Arc::new(FactoryProductScope));
        registry
    }

    pub fn register(&mut self, scope: Arc<dyn Scope>) {
        self.scopes.insert(scope.name().to_string(), scope);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Scope>> {
        self.scopes.get(name).cloned()
    }
}

impl Default for ScopeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// First `get` constructs and memoizes on the declaration; every later call
/// returns the identical reference. Eagerly constructed during prepare
/// unless the declaration is lazy.
pub(crate) struct SingletonScope;

impl Scope for SingletonScope {
    fn name(&self) -> &str {
        SCOPE_SINGLETON
    }

    fn prepare(&self, container: &Container, decl: DeclId) -> Result<(), ContainerError> {
        if !container.declaration(decl).lazy {
            self.get(container, decl)?;
        }
        Ok(())
    }

    fn get(&self, container: &Container, decl: DeclId) -> Result<BeanHandle, ContainerError> {
        let declaration = container.declaration(decl);

        // The lock is held across construction: concurrent first access on a
        // lazy singleton serializes instead of constructing twice. The sort
        // phase proved the graph acyclic, so construction cannot re-enter
        // this declaration.
        let mut slot = declaration.singleton.lock();
        if let Some(handle) = slot.as_ref() {
            return Ok(handle.clone());
        }

        let handle = container.create(decl)?;
        *slot = Some(handle.clone());
        Ok(handle)
    }
}

/// Every `get` constructs a brand-new instance; nothing is memoized.
pub(crate) struct PrototypeScope;

impl Scope for PrototypeScope {
    fn name(&self) -> &str {
        SCOPE_PROTOTYPE
    }

    fn prepare(&self, _container: &Container, _decl: DeclId) -> Result<(), ContainerError> {
        Ok(())
    }

    fn get(&self, container: &Container, decl: DeclId) -> Result<BeanHandle, ContainerError> {
        container.create(decl)
    }
}

/// Scope of synthesized product nodes: delegates to the owning factory
/// declaration's instance and asks it to produce. The factory may cache
/// internally; this scope never does.
pub(crate) struct FactoryProductScope;

impl Scope for FactoryProductScope {
    fn name(&self) -> &str {
        SCOPE_FACTORY_PRODUCT
    }

    fn prepare(&self, _container: &Container, _decl: DeclId) -> Result<(), ContainerError> {
        Ok(())
    }

    fn get(&self, container: &Container, decl: DeclId) -> Result<BeanHandle, ContainerError> {
        container.produce_from_factory(decl)
    }
}
