//! Configuration store port.

/// Hierarchical key/value configuration, looked up by namespace + key.
///
/// Values are raw strings; typing happens in the resolver through the
/// conversion registry. Lookups are synchronous and must not block.
pub trait ConfigSource: Send + Sync {
    fn has_value(&self, namespace: &str, key: &str) -> bool;

    fn get_value(&self, namespace: &str, key: &str) -> Option<String>;
}
