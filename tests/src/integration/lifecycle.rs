//! Lifecycle tests: the five-phase pipeline, scope semantics, factory
//! beans, post-processors, and load poisoning.

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use wirebox::{
        BeanDeclaration, BeanHandle, BeanPostProcessor, Container, ContainerApi,
        ContainerError, DeclId, LayeredConfig, Scope, ValueSource, SCOPE_PROTOTYPE,
    };

    use crate::fixtures::{self, Connection, ConnectionFactory, Logger, Service};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn init_logging() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    /// Post-processor that records which declarations it saw.
    struct RecordingProcessor {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl BeanPostProcessor for RecordingProcessor {
        fn process(
            &self,
            declaration: &BeanDeclaration,
            _instance: &mut (dyn Any + Send + Sync),
        ) -> Result<(), ContainerError> {
            let id = declaration.id.clone().unwrap_or_else(|| "?".to_string());
            self.log.lock().unwrap().push(format!("{}:{id}", self.tag));
            Ok(())
        }
    }

    /// Custom scope behaving like prototype, registered under its own name.
    struct FreshScope;

    impl Scope for FreshScope {
        fn name(&self) -> &str {
            "fresh"
        }

        fn prepare(&self, _container: &Container, _decl: DeclId) -> Result<(), ContainerError> {
            Ok(())
        }

        fn get(&self, container: &Container, decl: DeclId) -> Result<BeanHandle, ContainerError> {
            container.create(decl)
        }
    }

    // =========================================================================
    // END-TO-END WIRING
    // =========================================================================

    /// Scenario: a singleton logger, a service referencing it, and a
    /// placeholder-fed retry count with no configuration override.
    #[test]
    fn test_service_wires_logger_and_placeholder_default() {
        init_logging();
        let mut container = fixtures::container();
        container.define(BeanDeclaration::of_class("Logger").with_id("logger"));
        container.define(
            BeanDeclaration::of_class("Service")
                .with_id("service")
                .with_property("logger", ValueSource::bean_ref("logger"))
                .with_property("retries", ValueSource::placeholder("${service.retries=3}")),
        );
        container.startup().unwrap();

        let service = container.bean_as::<Service>("service").unwrap();
        let logger = container.bean_as::<Logger>("logger").unwrap();
        assert!(Arc::ptr_eq(service.logger.as_ref().unwrap(), &logger));
        assert_eq!(service.retries, 3);
    }

    /// The same wiring with a configured override wins over the default.
    #[test]
    fn test_configured_value_overrides_placeholder_default() {
        let mut config = LayeredConfig::new();
        config.set("", "service.retries", "5").unwrap();

        let mut container = fixtures::container_with_config(config);
        container.define(BeanDeclaration::of_class("Logger").with_id("logger"));
        container.define(
            BeanDeclaration::of_class("Service")
                .with_id("service")
                .with_property("logger", ValueSource::bean_ref("logger"))
                .with_property("retries", ValueSource::placeholder("${service.retries=3}")),
        );
        container.startup().unwrap();

        let service = container.bean_as::<Service>("service").unwrap();
        assert_eq!(service.retries, 5);
    }

    // =========================================================================
    // SCOPE SEMANTICS
    // =========================================================================

    /// Repeated lookups of a singleton return the identical reference.
    #[test]
    fn test_singleton_identity() {
        let mut container = fixtures::container();
        container.define(BeanDeclaration::of_class("Logger").with_id("logger"));
        container.startup().unwrap();

        let first = container.bean_by_id("logger").unwrap();
        for _ in 0..4 {
            let again = container.bean_by_id("logger").unwrap();
            assert!(Arc::ptr_eq(&first, &again));
        }
    }

    /// Repeated lookups of a prototype return pairwise-distinct instances.
    #[test]
    fn test_prototype_distinctness() {
        let mut container = fixtures::container();
        container.define(
            BeanDeclaration::of_class("Logger")
                .with_id("logger")
                .with_scope(SCOPE_PROTOTYPE),
        );
        container.startup().unwrap();

        let handles: Vec<_> = (0..3)
            .map(|_| container.bean_by_id("logger").unwrap())
            .collect();
        for i in 0..handles.len() {
            for j in (i + 1)..handles.len() {
                assert!(!Arc::ptr_eq(&handles[i], &handles[j]));
            }
        }
    }

    /// Non-lazy singletons are constructed during prepare, before any lookup.
    #[test]
    fn test_eager_singleton_constructed_at_startup() {
        let counter = Arc::new(AtomicUsize::new(0));
        let registry = fixtures::registry_with_probe(counter.clone());
        let mut container = fixtures::container_with(registry, LayeredConfig::new());
        container.define(BeanDeclaration::of_class("Probe").with_id("probe"));
        container.startup().unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        container.bean_by_id("probe").unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    /// Lazy singletons defer construction to first access, and only once.
    #[test]
    fn test_lazy_singleton_constructed_on_first_access() {
        let counter = Arc::new(AtomicUsize::new(0));
        let registry = fixtures::registry_with_probe(counter.clone());
        let mut container = fixtures::container_with(registry, LayeredConfig::new());
        container.define(BeanDeclaration::of_class("Probe").with_id("probe").lazy());
        container.startup().unwrap();

        assert_eq!(counter.load(Ordering::SeqCst), 0);
        let first = container.bean_by_id("probe").unwrap();
        let again = container.bean_by_id("probe").unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&first, &again));
    }

    /// A user-registered scope is honoured by name.
    #[test]
    fn test_custom_scope_registration() {
        let mut container = fixtures::container();
        container.register_scope(Arc::new(FreshScope));
        container.define(
            BeanDeclaration::of_class("Logger")
                .with_id("logger")
                .with_scope("fresh"),
        );
        container.startup().unwrap();

        let a = container.bean_by_id("logger").unwrap();
        let b = container.bean_by_id("logger").unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    // =========================================================================
    // FACTORY BEANS
    // =========================================================================

    /// The synthesized product node is found by type; the factory is asked
    /// for a product on every lookup.
    #[test]
    fn test_factory_bean_produces_by_type() {
        let mut container = fixtures::container();
        container.define(
            BeanDeclaration::of_class("ConnectionFactory")
                .with_id("conns")
                .producing("Connection"),
        );
        container.startup().unwrap();

        let first = container.bean_by_type_as::<Connection>("Connection").unwrap();
        let second = container.bean_by_type_as::<Connection>("Connection").unwrap();
        assert_ne!(first.serial, second.serial);

        // The factory itself stays a singleton, reachable by id.
        let factory_a = container.bean_as::<ConnectionFactory>("conns").unwrap();
        let factory_b = container.bean_as::<ConnectionFactory>("conns").unwrap();
        assert!(Arc::ptr_eq(&factory_a, &factory_b));
    }

    /// A user factory function backs a declaration without a constructor.
    #[test]
    fn test_factory_function_declaration() {
        let mut container = fixtures::container();
        container.define(
            BeanDeclaration::of_class("Logger")
                .with_id("logger")
                .with_factory_fn(|| {
                    Ok(Box::new(Logger {
                        level: "trace".into(),
                    }))
                }),
        );
        container.startup().unwrap();

        let logger = container.bean_as::<Logger>("logger").unwrap();
        assert_eq!(logger.level, "trace");
    }

    /// A fixed-instance declaration hands out the registered value as-is.
    #[test]
    fn test_fixed_instance_declaration() {
        let shared: Arc<Logger> = Arc::new(Logger {
            level: "warn".into(),
        });
        let mut container = fixtures::container();
        container.define(
            BeanDeclaration::anonymous()
                .with_id("shared-logger")
                .with_factory_instance(shared.clone()),
        );
        container.startup().unwrap();

        let looked_up = container.bean_as::<Logger>("shared-logger").unwrap();
        assert!(Arc::ptr_eq(&looked_up, &shared));
        // Class is derived from the instance: type lookup finds it too.
        let by_type = container.bean_by_type_as::<Logger>("Logger").unwrap();
        assert!(Arc::ptr_eq(&by_type, &shared));
    }

    // =========================================================================
    // POST-PROCESSORS AND POISONING
    // =========================================================================

    /// Processors run in registration order over every constructed bean.
    #[test]
    fn test_post_processor_chain_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut container = fixtures::container();
        container.add_post_processor(Arc::new(RecordingProcessor {
            tag: "first",
            log: log.clone(),
        }));
        container.add_post_processor(Arc::new(RecordingProcessor {
            tag: "second",
            log: log.clone(),
        }));
        container.define(BeanDeclaration::of_class("Logger").with_id("logger"));
        container.startup().unwrap();

        let seen = log.lock().unwrap().clone();
        assert_eq!(seen, vec!["first:logger", "second:logger"]);
    }

    /// Scenario: `a` requires `b` and `b` requires `a`; the load fails with
    /// the {a, b} component and the container stays unusable.
    #[test]
    fn test_requires_cycle_reported_and_poisons() {
        let mut container = fixtures::container();
        container.define(
            BeanDeclaration::of_class("Logger")
                .with_id("a")
                .requires_id("b"),
        );
        container.define(
            BeanDeclaration::of_class("Logger")
                .with_id("b")
                .requires_id("a"),
        );

        let err = container.startup().unwrap_err();
        match err {
            ContainerError::CyclicDependencies { cycles } => {
                assert_eq!(cycles.len(), 1);
                let mut ids: Vec<String> = cycles[0]
                    .iter()
                    .filter_map(|r| r.id.clone())
                    .collect();
                ids.sort();
                assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected cycle report, got {other}"),
        }

        // No partial container: every later call reports the failure.
        assert!(container.bean_by_id("a").is_err());
        assert!(container.startup().is_err());
    }
}
