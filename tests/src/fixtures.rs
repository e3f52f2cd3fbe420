//! Shared test fixtures: a small demo domain described once for the whole
//! suite, plus container builders over the in-memory adapters.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use wirebox::{
    BeanBox, ClassRegistry, Container, DefaultConversions, FactoryError, LayeredConfig,
    ProductFactory,
};

// =============================================================================
// DEMO DOMAIN
// =============================================================================

#[derive(Default)]
pub struct Logger {
    pub level: String,
}

#[derive(Default)]
pub struct Service {
    pub logger: Option<Arc<Logger>>,
    pub retries: i64,
    pub endpoint: String,
}

/// Base of the storage hierarchy; usually only subclasses are declared.
#[derive(Default)]
pub struct Store;

#[derive(Default)]
pub struct SqlStore {
    pub dsn: String,
}

/// Has an autowired property of the base class `Store`.
#[derive(Default)]
pub struct Indexer {
    pub store: Option<Arc<SqlStore>>,
}

/// Two-field bean for inheritance-merge scenarios.
#[derive(Default)]
pub struct Pair {
    pub p1: i64,
    pub p2: i64,
}

/// Bean with a required (non-optional) property.
#[derive(Default)]
pub struct Widget {
    pub name: String,
}

pub struct Connection {
    pub serial: usize,
}

/// Factory bean producing [`Connection`] instances with running serials.
#[derive(Default)]
pub struct ConnectionFactory {
    counter: AtomicUsize,
}

impl ProductFactory for ConnectionFactory {
    fn produce(&self) -> Result<BeanBox, FactoryError> {
        let serial = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(Connection { serial }))
    }
}

/// Constructed through a counting constructor; used by lazy/eager tests.
pub struct Probe;

// =============================================================================
// REGISTRY AND CONTAINER BUILDERS
// =============================================================================

/// Class registry describing the full demo domain.
pub fn registry() -> ClassRegistry {
    let mut registry = ClassRegistry::new();

    registry
        .describe::<Logger>("Logger")
        .constructor(Logger::default)
        .string_property("level", |l| l.level.clone(), |l, v| l.level = v)
        .optional()
        .register();

    registry
        .describe::<Service>("Service")
        .constructor(Service::default)
        .bean_property::<Logger>("logger", "Logger", |s, l| s.logger = Some(l))
        .optional()
        .int_property("retries", |s| s.retries, |s, v| s.retries = v)
        .optional()
        .string_property("endpoint", |s| s.endpoint.clone(), |s, v| s.endpoint = v)
        .optional()
        .register();

    registry
        .describe::<Store>("Store")
        .constructor(Store::default)
        .register();

    registry
        .describe::<SqlStore>("SqlStore")
        .extends("Store")
        .constructor(SqlStore::default)
        .string_property("dsn", |s| s.dsn.clone(), |s, v| s.dsn = v)
        .optional()
        .register();

    registry
        .describe::<Indexer>("Indexer")
        .constructor(Indexer::default)
        .bean_property::<SqlStore>("store", "Store", |i, s| i.store = Some(s))
        .optional()
        .autowired()
        .register();

    registry
        .describe::<Pair>("Pair")
        .constructor(Pair::default)
        .int_property("p1", |p| p.p1, |p, v| p.p1 = v)
        .optional()
        .int_property("p2", |p| p.p2, |p, v| p.p2 = v)
        .optional()
        .register();

    registry
        .describe::<Widget>("Widget")
        .constructor(Widget::default)
        .string_property("name", |w| w.name.clone(), |w, v| w.name = v)
        .register();

    registry
        .describe::<ConnectionFactory>("ConnectionFactory")
        .constructor(ConnectionFactory::default)
        .product_factory()
        .register();

    registry.describe::<Connection>("Connection").register();

    registry
}

/// Registry with an extra `Probe` class whose constructor bumps `counter`.
pub fn registry_with_probe(counter: Arc<AtomicUsize>) -> ClassRegistry {
    let mut registry = registry();
    registry
        .describe::<Probe>("Probe")
        .constructor(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Probe
        })
        .register();
    registry
}

/// Container over the demo registry with empty configuration.
pub fn container() -> Container {
    container_with(registry(), LayeredConfig::new())
}

/// Container over the demo registry with the given configuration store.
pub fn container_with_config(config: LayeredConfig) -> Container {
    container_with(registry(), config)
}

/// Container over an arbitrary registry and configuration store.
pub fn container_with(registry: ClassRegistry, config: LayeredConfig) -> Container {
    Container::new(
        Arc::new(registry),
        Arc::new(config),
        Arc::new(DefaultConversions::new()),
    )
}
