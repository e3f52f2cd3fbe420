//! Container service: lifecycle orchestration over the declaration arena.
//!
//! The load pipeline runs five strictly ordered phases, each applied to
//! every declaration before the next begins:
//!
//! 1. Collect: register declarations, hoist embedded beans into the arena
//! 2. Connect: merge parent templates, build every dependency edge, bind
//!    property metadata
//! 3. Sort: linearize the graph or abort with a cycle report
//! 4. Resolve: turn every value source into a final typed literal or a
//!    validated reference
//! 5. Prepare: eagerly construct non-lazy singletons in sorted order
//!
//! The pipeline runs exactly once. A failed load permanently poisons the
//! container; no partial object graph is ever observable.

use std::any::Any;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info};

use crate::algorithms::kahns::kahns_topological_sort;
use crate::algorithms::placeholder::resolve_template;
use crate::algorithms::tarjan::cycle_components;
use crate::application::scopes::{Scope, ScopeRegistry};
use crate::config::ContainerConfig;
use crate::domain::declaration::{
    BeanDeclaration, DeclId, DeclarationRef, FactoryKind, PropertyDeclaration, PropertySpec,
    Requirement, SCOPE_FACTORY_PRODUCT,
};
use crate::domain::errors::{ContainerError, MetadataError};
use crate::domain::graph::{DependencyGraph, EdgeKind, GraphSnapshot};
use crate::domain::value::{BeanHandle, ClassName, TypeSpec, Value};
use crate::domain::value_source::{InjectSelector, ValueSource};
use crate::ports::api::ContainerApi;
use crate::ports::configuration::ConfigSource;
use crate::ports::conversion::ConversionRegistry;
use crate::ports::metadata::MetadataProvider;
use crate::ports::processor::BeanPostProcessor;

/// Load pipeline state.
#[derive(Clone, Debug)]
enum LoadState {
    Fresh,
    Started,
    Failed(String),
}

/// Parent-merge bookkeeping.
#[derive(Clone, Copy, PartialEq)]
enum MergeState {
    Pending,
    InProgress,
    Done,
}

/// Edges and bindings computed for one declaration during connect.
#[derive(Default)]
struct ConnectPlan {
    /// Predecessors of this declaration.
    edges: Vec<(DeclId, EdgeKind)>,
    /// Property index -> bound metadata.
    bindings: Vec<(usize, PropertySpec)>,
    /// Property index -> resolved reference target.
    resolutions: Vec<(usize, DeclId)>,
    /// Properties synthesized by the autowire scan.
    synthesized: Vec<PropertyDeclaration>,
}

/// The declarative object-construction container.
pub struct Container {
    metadata: Arc<dyn MetadataProvider>,
    config_source: Arc<dyn ConfigSource>,
    conversions: Arc<dyn ConversionRegistry>,
    limits: ContainerConfig,
    scopes: ScopeRegistry,
    processors: Vec<Arc<dyn BeanPostProcessor>>,
    declarations: Vec<BeanDeclaration>,
    /// Raw id index: includes abstract declarations, which only the parent
    /// lookup may see.
    by_id: HashMap<String, DeclId>,
    /// Type index: instantiable declarations only.
    by_class: HashMap<ClassName, Vec<DeclId>>,
    graph: DependencyGraph,
    order: Vec<DeclId>,
    state: LoadState,
}

impl Container {
    /// Providers are passed explicitly; the container holds no ambient
    /// global state.
    pub fn new(
        metadata: Arc<dyn MetadataProvider>,
        config_source: Arc<dyn ConfigSource>,
        conversions: Arc<dyn ConversionRegistry>,
    ) -> Self {
        Self {
            metadata,
            config_source,
            conversions,
            limits: ContainerConfig::default(),
            scopes: ScopeRegistry::new(),
            processors: Vec::new(),
            declarations: Vec::new(),
            by_id: HashMap::new(),
            by_class: HashMap::new(),
            graph: DependencyGraph::default(),
            order: Vec::new(),
            state: LoadState::Fresh,
        }
    }

    pub fn with_limits(mut self, limits: ContainerConfig) -> Self {
        self.limits = limits;
        self
    }

    /// Register a declaration. The returned arena id is stable and can be
    /// used as a by-reference `requires` constraint.
    pub fn define(&mut self, declaration: BeanDeclaration) -> DeclId {
        let id = DeclId(self.declarations.len());
        debug!(declaration = %declaration.reference(), arena = %id, "declaration registered");
        self.declarations.push(declaration);
        id
    }

    /// Register a custom scope strategy, before startup.
    pub fn register_scope(&mut self, scope: Arc<dyn Scope>) {
        self.scopes.register(scope);
    }

    /// Append to the post-processor chain; processors run in registration
    /// order over every constructed instance.
    pub fn add_post_processor(&mut self, processor: Arc<dyn BeanPostProcessor>) {
        self.processors.push(processor);
    }

    /// Run the load pipeline once. A second call after success is a no-op;
    /// after failure it reports the recorded failure.
    pub fn startup(&mut self) -> Result<(), ContainerError> {
        match &self.state {
            LoadState::Started => return Ok(()),
            LoadState::Failed(reason) => {
                return Err(ContainerError::Configuration(format!(
                    "container load failed: {reason}"
                )))
            }
            LoadState::Fresh => {}
        }

        match self.load() {
            Ok(()) => {
                self.state = LoadState::Started;
                Ok(())
            }
            Err(err) => {
                self.state = LoadState::Failed(err.to_string());
                Err(err)
            }
        }
    }

    /// Serializable view of the dependency graph, for debugging a load.
    pub fn graph_snapshot(&self) -> GraphSnapshot {
        let refs: Vec<DeclarationRef> =
            self.declarations.iter().map(|d| d.reference()).collect();
        self.graph.snapshot(&refs)
    }

    /// Downcasting sugar over [`ContainerApi::bean_by_id`].
    pub fn bean_as<T: Any + Send + Sync>(&self, id: &str) -> Result<Arc<T>, ContainerError> {
        let handle = self.bean_by_id(id)?;
        self.downcast_handle(handle, id)
    }

    /// Downcasting sugar over [`ContainerApi::bean_by_type`].
    pub fn bean_by_type_as<T: Any + Send + Sync>(
        &self,
        class: &str,
    ) -> Result<Arc<T>, ContainerError> {
        let handle = self.bean_by_type(class)?;
        self.downcast_handle(handle, class)
    }

    // ------------------------------------------------------------------
    // Load pipeline
    // ------------------------------------------------------------------

    fn load(&mut self) -> Result<(), ContainerError> {
        self.collect()?;
        self.connect()?;
        self.sort()?;
        self.resolve()?;
        self.prepare()?;
        Ok(())
    }

    /// Phase 1: index ids and hoist embedded declarations into the arena.
    fn collect(&mut self) -> Result<(), ContainerError> {
        let mut i = 0;
        while i < self.declarations.len() {
            if self.declarations.len() > self.limits.max_declarations {
                return Err(ContainerError::TooManyDeclarations {
                    count: self.declarations.len(),
                    max: self.limits.max_declarations,
                });
            }

            if let Some(id) = self.declarations[i].id.clone() {
                if self.by_id.contains_key(&id) {
                    return Err(ContainerError::AmbiguousBeanById { id });
                }
                self.by_id.insert(id, DeclId(i));
            }

            for p in 0..self.declarations[i].properties.len() {
                let inline = match &mut self.declarations[i].properties[p].value {
                    ValueSource::EmbeddedBean { inline, .. } => inline.take(),
                    _ => None,
                };
                let Some(embedded) = inline else { continue };

                let inner = DeclId(self.declarations.len());
                debug!(outer = %DeclId(i), inner = %inner, "embedded declaration hoisted");
                self.declarations.push(*embedded);
                if let ValueSource::EmbeddedBean { registered, .. } =
                    &mut self.declarations[i].properties[p].value
                {
                    *registered = Some(inner);
                }
            }

            i += 1;
        }

        info!(declarations = self.declarations.len(), "collect complete");
        Ok(())
    }

    /// Phase 2: inheritance, product synthesis, type index, edges, bindings.
    fn connect(&mut self) -> Result<(), ContainerError> {
        self.merge_parents()?;
        self.synthesize_products()?;

        if self.declarations.len() > self.limits.max_declarations {
            return Err(ContainerError::TooManyDeclarations {
                count: self.declarations.len(),
                max: self.limits.max_declarations,
            });
        }

        self.build_type_index()?;

        let arena_len = self.declarations.len();
        self.graph = DependencyGraph::with_capacity(arena_len);
        for i in 0..arena_len {
            if !self.declarations[i].is_abstract {
                self.graph.add_node(DeclId(i));
            }
        }

        for i in 0..arena_len {
            let plan = self.plan_connect(DeclId(i))?;
            self.apply_connect(DeclId(i), plan);
        }

        if self.graph.edge_count() > self.limits.max_edges {
            return Err(ContainerError::TooManyEdges {
                count: self.graph.edge_count(),
                max: self.limits.max_edges,
            });
        }

        info!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "connect complete"
        );
        Ok(())
    }

    /// Phase 3: linearize or abort with the full cycle report.
    fn sort(&mut self) -> Result<(), ContainerError> {
        match kahns_topological_sort(&self.graph) {
            Ok(order) => {
                info!(ordered = order.len(), "sort complete");
                self.order = order;
                Ok(())
            }
            Err(_) => {
                let cycles = cycle_components(&self.graph)
                    .into_iter()
                    .map(|component| {
                        component
                            .into_iter()
                            .map(|id| self.reference(id))
                            .collect()
                    })
                    .collect();
                Err(ContainerError::CyclicDependencies { cycles })
            }
        }
    }

    /// Phase 4: in sorted order, resolve every property to its final source
    /// and validate it against the bound metadata.
    fn resolve(&mut self) -> Result<(), ContainerError> {
        let order = self.order.clone();
        for id in order {
            let replacements = self.plan_resolve(id)?;
            let declaration = &mut self.declarations[id.0];
            for (idx, source) in replacements {
                declaration.properties[idx].value = source;
            }
        }

        info!("resolve complete");
        Ok(())
    }

    /// Phase 5: scope prepare in sorted order; eager singleton construction.
    fn prepare(&self) -> Result<(), ContainerError> {
        for &id in &self.order {
            let scope = self.scope_of(id)?;
            scope.prepare(self, id)?;
        }

        info!(prepared = self.order.len(), "prepare complete");
        Ok(())
    }

    // ------------------------------------------------------------------
    // Connect internals
    // ------------------------------------------------------------------

    /// Copy parent class and unset properties into every child, once,
    /// depth-first so grandparents land before parents.
    fn merge_parents(&mut self) -> Result<(), ContainerError> {
        let mut states = vec![MergeState::Pending; self.declarations.len()];
        for i in 0..self.declarations.len() {
            let mut path = Vec::new();
            self.merge_parent_of(i, &mut states, &mut path)?;
        }
        Ok(())
    }

    fn merge_parent_of(
        &mut self,
        i: usize,
        states: &mut [MergeState],
        path: &mut Vec<usize>,
    ) -> Result<(), ContainerError> {
        match states[i] {
            MergeState::Done => return Ok(()),
            MergeState::InProgress => {
                let cycle = path.iter().map(|&j| self.reference(DeclId(j))).collect();
                return Err(ContainerError::CyclicDependencies {
                    cycles: vec![cycle],
                });
            }
            MergeState::Pending => {}
        }

        states[i] = MergeState::InProgress;
        path.push(i);

        if let Some(parent_id) = self.declarations[i].parent.clone() {
            let parent = self
                .by_id
                .get(&parent_id)
                .copied()
                .ok_or(ContainerError::UnknownBeanById { id: parent_id })?;
            self.merge_parent_of(parent.0, states, path)?;

            let parent_class = self.declarations[parent.0].class.clone();
            let parent_props = self.declarations[parent.0].properties.clone();
            let child = &mut self.declarations[i];
            if child.class.is_none() {
                child.class = parent_class;
            }
            for prop in parent_props {
                if !child.properties.iter().any(|own| own.name == prop.name) {
                    child.properties.push(prop);
                }
            }
        }

        path.pop();
        states[i] = MergeState::Done;
        Ok(())
    }

    /// Every factory-bean declaration gets an artificial product node of the
    /// target class, found transparently by type-based lookups.
    fn synthesize_products(&mut self) -> Result<(), ContainerError> {
        let count = self.declarations.len();
        for i in 0..count {
            let (target, is_abstract) = {
                let d = &self.declarations[i];
                (d.target.clone(), d.is_abstract)
            };
            let Some(target) = target else { continue };
            if is_abstract {
                continue;
            }

            let mut product =
                BeanDeclaration::of_class(target).with_scope(SCOPE_FACTORY_PRODUCT);
            product.produced_by = Some(DeclId(i));
            let product_id = DeclId(self.declarations.len());
            debug!(factory = %DeclId(i), product = %product_id, "factory product synthesized");
            self.declarations.push(product);
        }
        Ok(())
    }

    fn build_type_index(&mut self) -> Result<(), ContainerError> {
        self.by_class.clear();
        for i in 0..self.declarations.len() {
            let (class, constructed, abstract_decl) = {
                let d = &self.declarations[i];
                let class = match &d.class {
                    Some(c) => Some(c.clone()),
                    None => match &d.factory {
                        FactoryKind::Instance(handle) => {
                            let derived = self.metadata.class_of(handle.as_ref());
                            if let Some(c) = &derived {
                                *d.derived_class.lock() = Some(c.clone());
                            }
                            derived
                        }
                        _ => None,
                    },
                };
                (
                    class,
                    matches!(d.factory, FactoryKind::Constructor),
                    d.is_abstract,
                )
            };

            if abstract_decl {
                continue;
            }
            match class {
                Some(c) => self.by_class.entry(c).or_default().push(DeclId(i)),
                None if constructed => {
                    return Err(ContainerError::Configuration(format!(
                        "{} has neither a class nor a factory",
                        self.reference(DeclId(i))
                    )));
                }
                None => {}
            }
        }
        Ok(())
    }

    fn plan_connect(&self, id: DeclId) -> Result<ConnectPlan, ContainerError> {
        let declaration = &self.declarations[id.0];
        let mut plan = ConnectPlan::default();

        // Templates are merged into children and never wired themselves.
        if declaration.is_abstract {
            return Ok(plan);
        }

        let owner = declaration.reference();

        if self.scopes.get(&declaration.scope).is_none() {
            return Err(ContainerError::UnknownScope {
                scope: declaration.scope.clone(),
                declaration: owner.to_string(),
            });
        }

        if let Some(factory) = declaration.produced_by {
            plan.edges.push((factory, EdgeKind::Product));
        }

        if let Some(parent_id) = &declaration.parent {
            if let Some(&parent) = self.by_id.get(parent_id) {
                if !self.declarations[parent.0].is_abstract {
                    plan.edges.push((parent, EdgeKind::Parent));
                }
            }
        }

        for requirement in &declaration.requires {
            let site = format!("`requires` of {owner}");
            let target = match requirement {
                Requirement::ById(rid) => self.lookup_instantiable_id(rid)?,
                Requirement::ByType(class) => self.sole_candidate(class, &site)?,
                Requirement::ByDecl(decl) => {
                    if decl.0 >= self.declarations.len()
                        || self.declarations[decl.0].is_abstract
                    {
                        return Err(ContainerError::Configuration(format!(
                            "{site} names {decl}, which is not an instantiable declaration"
                        )));
                    }
                    *decl
                }
            };
            plan.edges.push((target, EdgeKind::Requires));
        }

        let class = declaration.effective_class();
        let specs = match &class {
            Some(c) => Some(
                self.metadata
                    .properties_of(c)
                    .map_err(|e| self.metadata_context(&owner, e))?,
            ),
            None => None,
        };

        let Some(spec_list) = &specs else {
            if declaration.properties.is_empty() {
                return Ok(plan);
            }
            return Err(ContainerError::Configuration(format!(
                "{owner} declares properties but has no class metadata"
            )));
        };

        for (idx, property) in declaration.properties.iter().enumerate() {
            let spec = spec_list
                .iter()
                .find(|s| s.name == property.name)
                .cloned()
                .ok_or_else(|| ContainerError::UnknownProperty {
                    class: class.clone().unwrap_or_default(),
                    property: property.name.clone(),
                    declaration: owner.to_string(),
                })?;

            let site = format!("property `{}` of {owner}", property.name);
            match &property.value {
                ValueSource::Literal(_) | ValueSource::Placeholder { .. } => {}
                ValueSource::BeanRef { target_id, .. } => {
                    let target = self.lookup_instantiable_id(target_id)?;
                    plan.resolutions.push((idx, target));
                    plan.edges.push((target, EdgeKind::Reference));
                }
                ValueSource::InjectedBean { selector, .. } => {
                    let target = match selector {
                        InjectSelector::ById(rid) => self.lookup_instantiable_id(rid)?,
                        InjectSelector::ByType => {
                            let class = bean_class_of(&spec, &site)?;
                            self.sole_candidate(&class, &site)?
                        }
                    };
                    plan.resolutions.push((idx, target));
                    plan.edges.push((target, EdgeKind::Autowire));
                }
                ValueSource::EmbeddedBean { registered, .. } => {
                    let inner = registered.ok_or_else(|| {
                        ContainerError::Configuration(format!(
                            "embedded declaration for {site} was never collected"
                        ))
                    })?;
                    plan.edges.push((inner, EdgeKind::Embedded));
                }
            }

            plan.bindings.push((idx, spec));
        }

        // Autowire scan: metadata-marked properties with no explicit value.
        for spec in spec_list.iter().filter(|s| s.autowired) {
            if declaration.properties.iter().any(|p| p.name == spec.name) {
                continue;
            }
            let site = format!("autowired property `{}` of {owner}", spec.name);
            let class = bean_class_of(spec, &site)?;
            let target = self.sole_candidate(&class, &site)?;
            plan.edges.push((target, EdgeKind::Autowire));
            plan.synthesized.push(PropertyDeclaration {
                name: spec.name.clone(),
                value: ValueSource::InjectedBean {
                    selector: InjectSelector::ByType,
                    resolved: Some(target),
                },
                spec: Some(spec.clone()),
            });
        }

        Ok(plan)
    }

    fn apply_connect(&mut self, id: DeclId, plan: ConnectPlan) {
        for (from, kind) in plan.edges {
            self.graph.add_edge(from, id, kind);
        }

        let declaration = &mut self.declarations[id.0];
        for (idx, spec) in plan.bindings {
            declaration.properties[idx].spec = Some(spec);
        }
        for (idx, target) in plan.resolutions {
            match &mut declaration.properties[idx].value {
                ValueSource::BeanRef { resolved, .. } => *resolved = Some(target),
                ValueSource::InjectedBean { resolved, .. } => *resolved = Some(target),
                _ => {}
            }
        }
        declaration.properties.extend(plan.synthesized);
    }

    // ------------------------------------------------------------------
    // Resolve internals
    // ------------------------------------------------------------------

    fn plan_resolve(&self, id: DeclId) -> Result<Vec<(usize, ValueSource)>, ContainerError> {
        let declaration = &self.declarations[id.0];
        let owner = declaration.reference();
        let mut replacements = Vec::new();

        for (idx, property) in declaration.properties.iter().enumerate() {
            let spec = property.spec.as_ref().ok_or_else(|| {
                ContainerError::Configuration(format!(
                    "property `{}` of {owner} was never bound",
                    property.name
                ))
            })?;
            let site = format!("property `{}` of {owner}", property.name);

            match &property.value {
                ValueSource::Literal(value) => {
                    if let Some(coerced) = self.coerce_literal(value, &spec.ty, &site)? {
                        replacements.push((idx, ValueSource::Literal(coerced)));
                    }
                }
                ValueSource::Placeholder { template } => {
                    let text = resolve_template(template, self.config_source.as_ref())
                        .map_err(|e| match e {
                            ContainerError::Configuration(msg) => {
                                ContainerError::Configuration(format!("{site}: {msg}"))
                            }
                            other => other,
                        })?;
                    let value = if spec.ty == TypeSpec::Str {
                        Value::Str(text)
                    } else {
                        self.convert(&Value::Str(text), &spec.ty, &site)?
                    };
                    replacements.push((idx, ValueSource::Literal(value)));
                }
                reference => {
                    let target = reference.resolved_target().ok_or_else(|| {
                        ContainerError::Configuration(format!("unbound reference for {site}"))
                    })?;
                    self.check_assignable(target, &spec.ty, &site)?;
                }
            }
        }

        // Construction contract: a non-optional metadata property with no
        // value is an error, caught here so lazy beans fail the load too.
        // Value-backed declarations are handed out as-is and skip the check.
        if !matches!(declaration.factory, FactoryKind::Instance(_)) {
            if let Some(class) = declaration.effective_class() {
                if self.metadata.has_class(&class) {
                    let specs = self
                        .metadata
                        .properties_of(&class)
                        .map_err(|e| self.metadata_context(&owner, e))?;
                    for spec in specs.iter().filter(|s| !s.optional) {
                        if !declaration.properties.iter().any(|p| p.name == spec.name) {
                            return Err(ContainerError::RequiredPropertyUnset {
                                property: spec.name.clone(),
                                declaration: owner.to_string(),
                            });
                        }
                    }
                }
            }
        }

        Ok(replacements)
    }

    fn coerce_literal(
        &self,
        value: &Value,
        declared: &TypeSpec,
        site: &str,
    ) -> Result<Option<Value>, ContainerError> {
        let actual = value.type_spec();
        if actual == *declared {
            return Ok(None);
        }

        if let (TypeSpec::Bean(actual_class), TypeSpec::Bean(declared_class)) =
            (&actual, declared)
        {
            if self.is_assignable(declared_class, actual_class) {
                return Ok(None);
            }
            return Err(ContainerError::TypeMismatch {
                expected: declared.to_string(),
                actual: actual.to_string(),
                site: site.to_string(),
            });
        }

        match self.conversions.get_conversion(&actual, declared) {
            Some(convert) => convert(value)
                .map(Some)
                .map_err(|e| ContainerError::ConversionFailed {
                    value: e.value,
                    from: e.from,
                    to: e.to,
                    site: site.to_string(),
                }),
            None => Err(ContainerError::TypeMismatch {
                expected: declared.to_string(),
                actual: actual.to_string(),
                site: site.to_string(),
            }),
        }
    }

    fn convert(
        &self,
        value: &Value,
        declared: &TypeSpec,
        site: &str,
    ) -> Result<Value, ContainerError> {
        let from = value.type_spec();
        match self.conversions.get_conversion(&from, declared) {
            Some(convert) => {
                convert(value).map_err(|e| ContainerError::ConversionFailed {
                    value: e.value,
                    from: e.from,
                    to: e.to,
                    site: site.to_string(),
                })
            }
            None => Err(ContainerError::ConversionFailed {
                value: format!("{value:?}"),
                from: from.to_string(),
                to: declared.to_string(),
                site: site.to_string(),
            }),
        }
    }

    fn check_assignable(
        &self,
        target: DeclId,
        declared: &TypeSpec,
        site: &str,
    ) -> Result<(), ContainerError> {
        let TypeSpec::Bean(declared_class) = declared else {
            let actual = self
                .declarations[target.0]
                .effective_class()
                .unwrap_or_else(|| "unknown".to_string());
            return Err(ContainerError::TypeMismatch {
                expected: declared.to_string(),
                actual: format!("bean<{actual}>"),
                site: site.to_string(),
            });
        };

        match self.declarations[target.0].effective_class() {
            Some(actual) if self.is_assignable(declared_class, &actual) => Ok(()),
            Some(actual) => Err(ContainerError::TypeMismatch {
                expected: declared.to_string(),
                actual: format!("bean<{actual}>"),
                site: site.to_string(),
            }),
            None => Err(ContainerError::TypeMismatch {
                expected: declared.to_string(),
                actual: "bean<unknown>".to_string(),
                site: site.to_string(),
            }),
        }
    }

    // ------------------------------------------------------------------
    // Construction contract
    // ------------------------------------------------------------------

    /// Construct one raw instance for the declaration: factory strategy,
    /// property injection, post-processor chain. Public for custom [`Scope`]
    /// implementations; ordinary retrieval goes through the scope's `get`.
    pub fn create(&self, id: DeclId) -> Result<BeanHandle, ContainerError> {
        let declaration = self.declaration(id);

        let raw = match &declaration.factory {
            FactoryKind::Constructor => {
                let owner = declaration.reference();
                let class = declaration.effective_class().ok_or_else(|| {
                    ContainerError::Configuration(format!("{owner} has no class to construct"))
                })?;
                self.metadata
                    .construct(&class)
                    .map_err(|e| self.metadata_context(&owner, e))?
            }
            // Value-backed: handed out as-is, no injection, no processing.
            FactoryKind::Instance(handle) => return Ok(handle.clone()),
            FactoryKind::Function(factory) => factory().map_err(|e| {
                ContainerError::Configuration(format!("{}: {e}", declaration.reference()))
            })?,
        };

        self.finish_raw(id, raw)
    }

    /// Ask the owning factory declaration's instance for a product.
    pub(crate) fn produce_from_factory(&self, id: DeclId) -> Result<BeanHandle, ContainerError> {
        let declaration = self.declaration(id);
        let owner = declaration.reference();

        let factory_id = declaration.produced_by.ok_or_else(|| {
            ContainerError::Configuration(format!("{owner} is not a factory product"))
        })?;
        let factory_handle = self.instance_of(factory_id)?;
        let factory_class = self
            .declaration(factory_id)
            .effective_class()
            .ok_or_else(|| {
                ContainerError::Configuration(format!(
                    "factory of {owner} has no known class"
                ))
            })?;

        let factory = self
            .metadata
            .product_factory(&factory_class, factory_handle.as_ref())
            .ok_or_else(|| {
                ContainerError::Configuration(format!(
                    "class `{factory_class}` does not expose a product factory for {owner}"
                ))
            })?;
        let raw = factory
            .produce()
            .map_err(|e| ContainerError::Configuration(format!("{owner}: {e}")))?;

        self.finish_raw(id, raw)
    }

    fn finish_raw(
        &self,
        id: DeclId,
        mut raw: Box<dyn Any + Send + Sync>,
    ) -> Result<BeanHandle, ContainerError> {
        let declaration = self.declaration(id);
        let owner = declaration.reference();

        if let Some(class) = declaration.effective_class() {
            if self.metadata.has_class(&class) {
                for property in &declaration.properties {
                    let value = self.runtime_value(id, property)?;
                    self.metadata
                        .set(&class, raw.as_mut(), &property.name, value)
                        .map_err(|e| self.metadata_context(&owner, e))?;
                }
            }
        }

        for processor in &self.processors {
            processor.process(declaration, raw.as_mut())?;
        }

        let handle: BeanHandle = Arc::from(raw);

        if declaration.class.is_none() && declaration.derived_class.lock().is_none() {
            if let Some(class) = self.metadata.class_of(handle.as_ref()) {
                *declaration.derived_class.lock() = Some(class);
            }
        }

        Ok(handle)
    }

    fn runtime_value(
        &self,
        owner: DeclId,
        property: &PropertyDeclaration,
    ) -> Result<Value, ContainerError> {
        match &property.value {
            ValueSource::Literal(value) => Ok(value.clone()),
            source => match source.resolved_target() {
                Some(target) => {
                    let handle = self.instance_of(target)?;
                    let class = self
                        .declaration(target)
                        .effective_class()
                        .unwrap_or_default();
                    Ok(Value::Bean { class, handle })
                }
                None => Err(ContainerError::Configuration(format!(
                    "unresolved value source for property `{}` of {}",
                    property.name,
                    self.reference(owner)
                ))),
            },
        }
    }

    // ------------------------------------------------------------------
    // Lookup internals
    // ------------------------------------------------------------------

    pub(crate) fn declaration(&self, id: DeclId) -> &BeanDeclaration {
        &self.declarations[id.0]
    }

    pub(crate) fn instance_of(&self, id: DeclId) -> Result<BeanHandle, ContainerError> {
        let scope = self.scope_of(id)?;
        scope.get(self, id)
    }

    fn scope_of(&self, id: DeclId) -> Result<Arc<dyn Scope>, ContainerError> {
        let declaration = self.declaration(id);
        self.scopes
            .get(&declaration.scope)
            .ok_or_else(|| ContainerError::UnknownScope {
                scope: declaration.scope.clone(),
                declaration: declaration.reference().to_string(),
            })
    }

    fn reference(&self, id: DeclId) -> DeclarationRef {
        self.declarations[id.0].reference()
    }

    /// Id lookup excluding abstract declarations, which never appear in
    /// lookup results.
    fn lookup_instantiable_id(&self, id: &str) -> Result<DeclId, ContainerError> {
        let decl = self
            .by_id
            .get(id)
            .copied()
            .ok_or_else(|| ContainerError::UnknownBeanById { id: id.to_string() })?;
        if self.declarations[decl.0].is_abstract {
            return Err(ContainerError::UnknownBeanById { id: id.to_string() });
        }
        Ok(decl)
    }

    /// All instantiable declarations of the class or, recursively, of any
    /// known subclass, in declaration order.
    fn candidates_for(&self, class: &str) -> Vec<DeclId> {
        let mut found = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![class.to_string()];

        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if let Some(ids) = self.by_class.get(&current) {
                found.extend(ids.iter().copied());
            }
            stack.extend(self.metadata.direct_subclasses_of(&current));
        }

        found.sort();
        found.dedup();
        found
    }

    fn sole_candidate(&self, class: &str, site: &str) -> Result<DeclId, ContainerError> {
        let candidates = self.candidates_for(class);
        match candidates.len() {
            0 => Err(ContainerError::NoCandidateForType {
                class: class.to_string(),
                site: site.to_string(),
            }),
            1 => Ok(candidates[0]),
            n => Err(ContainerError::AmbiguousCandidatesForType {
                class: class.to_string(),
                count: n,
                site: site.to_string(),
            }),
        }
    }

    fn is_assignable(&self, declared: &str, actual: &str) -> bool {
        if declared == actual {
            return true;
        }
        let mut visited = HashSet::new();
        let mut stack = vec![declared.to_string()];
        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            if current == actual {
                return true;
            }
            stack.extend(self.metadata.direct_subclasses_of(&current));
        }
        false
    }

    fn metadata_context(&self, owner: &DeclarationRef, err: MetadataError) -> ContainerError {
        match err {
            MetadataError::UnknownProperty { class, property } => {
                ContainerError::UnknownProperty {
                    class,
                    property,
                    declaration: owner.to_string(),
                }
            }
            MetadataError::TypeMismatch { expected, actual } => ContainerError::TypeMismatch {
                expected,
                actual,
                site: owner.to_string(),
            },
            other => ContainerError::Configuration(format!("{owner}: {other}")),
        }
    }

    fn downcast_handle<T: Any + Send + Sync>(
        &self,
        handle: BeanHandle,
        requested: &str,
    ) -> Result<Arc<T>, ContainerError> {
        handle
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                actual: format!("bean `{requested}`"),
                site: format!("typed retrieval of `{requested}`"),
            })
    }

    fn ensure_started(&self) -> Result<(), ContainerError> {
        match &self.state {
            LoadState::Started => Ok(()),
            LoadState::Fresh => Err(ContainerError::Configuration(
                "container has not been started".to_string(),
            )),
            LoadState::Failed(reason) => Err(ContainerError::Configuration(format!(
                "container load failed: {reason}"
            ))),
        }
    }
}

impl ContainerApi for Container {
    fn bean_by_id(&self, id: &str) -> Result<BeanHandle, ContainerError> {
        self.ensure_started()?;
        let decl = self.lookup_instantiable_id(id)?;
        self.instance_of(decl)
    }

    fn bean_by_type(&self, class: &str) -> Result<BeanHandle, ContainerError> {
        self.ensure_started()?;
        let candidates = self.candidates_for(class);
        match candidates.len() {
            0 => Err(ContainerError::UnknownBeanByType {
                class: class.to_string(),
            }),
            1 => self.instance_of(candidates[0]),
            _ => Err(ContainerError::AmbiguousBeanByType {
                class: class.to_string(),
            }),
        }
    }

    fn beans_by_type(&self, class: &str) -> Result<Vec<BeanHandle>, ContainerError> {
        self.ensure_started()?;
        self.candidates_for(class)
            .into_iter()
            .map(|decl| self.instance_of(decl))
            .collect()
    }

    fn known_classes(&self) -> Vec<ClassName> {
        let mut classes: Vec<ClassName> = self.by_class.keys().cloned().collect();
        classes.sort();
        classes
    }
}

fn bean_class_of(spec: &PropertySpec, site: &str) -> Result<ClassName, ContainerError> {
    match &spec.ty {
        TypeSpec::Bean(class) => Ok(class.clone()),
        other => Err(ContainerError::TypeMismatch {
            expected: "a bean type".to_string(),
            actual: other.to_string(),
            site: site.to_string(),
        }),
    }
}
