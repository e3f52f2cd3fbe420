//! In-memory class metadata registry with typed accessors.
//!
//! The reflection substitute: each class is described once, up front, through
//! a typed [`ClassBuilder`] that erases getter/setter closures over
//! `dyn Any`. The registry also records the `extends` relation feeding
//! candidate lookup and a `TypeId` reverse map for lazily-derived classes.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::domain::declaration::PropertySpec;
use crate::domain::errors::MetadataError;
use crate::domain::value::{BeanBox, ClassName, TypeSpec, Value};
use crate::ports::metadata::{MetadataProvider, ProductFactory};

type GetterFn = Box<dyn Fn(&(dyn Any + Send + Sync)) -> Result<Value, MetadataError> + Send + Sync>;
type SetterFn =
    Box<dyn Fn(&mut (dyn Any + Send + Sync), Value) -> Result<(), MetadataError> + Send + Sync>;
type ConstructorFn = Box<dyn Fn() -> BeanBox + Send + Sync>;
type FactoryCastFn = Box<
    dyn for<'a> Fn(&'a (dyn Any + Send + Sync)) -> Option<&'a dyn ProductFactory> + Send + Sync,
>;

struct PropertyEntry {
    spec: PropertySpec,
    getter: GetterFn,
    setter: SetterFn,
}

struct ClassEntry {
    extends: Option<ClassName>,
    constructor: Option<ConstructorFn>,
    properties: Vec<PropertyEntry>,
    factory_cast: Option<FactoryCastFn>,
}

/// Registry of class descriptions, keyed by class name.
#[derive(Default)]
pub struct ClassRegistry {
    classes: HashMap<ClassName, ClassEntry>,
    by_type_id: HashMap<TypeId, ClassName>,
    subclasses: HashMap<ClassName, Vec<ClassName>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start describing the Rust type `T` under the given class name.
    pub fn describe<T: Any + Send + Sync>(&mut self, name: &str) -> ClassBuilder<'_, T> {
        ClassBuilder {
            registry: self,
            name: name.to_string(),
            entry: ClassEntry {
                extends: None,
                constructor: None,
                properties: Vec::new(),
                factory_cast: None,
            },
            _marker: PhantomData,
        }
    }

    fn entry(&self, class: &str) -> Result<&ClassEntry, MetadataError> {
        self.classes
            .get(class)
            .ok_or_else(|| MetadataError::UnknownClass(class.to_string()))
    }

    fn property(&self, class: &str, name: &str) -> Result<&PropertyEntry, MetadataError> {
        self.entry(class)?
            .properties
            .iter()
            .find(|p| p.spec.name == name)
            .ok_or_else(|| MetadataError::UnknownProperty {
                class: class.to_string(),
                property: name.to_string(),
            })
    }
}

impl MetadataProvider for ClassRegistry {
    fn has_class(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    fn properties_of(&self, class: &str) -> Result<Vec<PropertySpec>, MetadataError> {
        Ok(self
            .entry(class)?
            .properties
            .iter()
            .map(|p| p.spec.clone())
            .collect())
    }

    fn construct(&self, class: &str) -> Result<BeanBox, MetadataError> {
        let entry = self.entry(class)?;
        let constructor = entry
            .constructor
            .as_ref()
            .ok_or_else(|| MetadataError::NoConstructor(class.to_string()))?;
        Ok(constructor())
    }

    fn get(
        &self,
        class: &str,
        instance: &(dyn Any + Send + Sync),
        property: &str,
    ) -> Result<Value, MetadataError> {
        (self.property(class, property)?.getter)(instance)
    }

    fn set(
        &self,
        class: &str,
        instance: &mut (dyn Any + Send + Sync),
        property: &str,
        value: Value,
    ) -> Result<(), MetadataError> {
        (self.property(class, property)?.setter)(instance, value)
    }

    fn direct_subclasses_of(&self, class: &str) -> Vec<ClassName> {
        self.subclasses.get(class).cloned().unwrap_or_default()
    }

    fn class_of(&self, instance: &(dyn Any + Send + Sync)) -> Option<ClassName> {
        self.by_type_id.get(&Any::type_id(instance)).cloned()
    }

    fn product_factory<'a>(
        &self,
        class: &str,
        instance: &'a (dyn Any + Send + Sync),
    ) -> Option<&'a dyn ProductFactory> {
        let cast = self.classes.get(class)?.factory_cast.as_ref()?;
        cast(instance)
    }
}

/// Typed fluent builder for one class description.
///
/// Property modifiers (`optional`, `autowired`) apply to the most recently
/// added property. Call [`ClassBuilder::register`] to commit the description.
pub struct ClassBuilder<'r, T> {
    registry: &'r mut ClassRegistry,
    name: ClassName,
    entry: ClassEntry,
    _marker: PhantomData<fn() -> T>,
}

impl<'r, T: Any + Send + Sync> ClassBuilder<'r, T> {
    /// Name the direct superclass, feeding candidate lookup. Accessors are
    /// not inherited: Rust types carry their own fields.
    pub fn extends(mut self, parent: &str) -> Self {
        self.entry.extends = Some(parent.to_string());
        self
    }

    pub fn constructor(mut self, f: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.entry.constructor = Some(Box::new(move || Box::new(f()) as BeanBox));
        self
    }

    pub fn string_property(
        self,
        name: &str,
        get: impl Fn(&T) -> String + Send + Sync + 'static,
        set: impl Fn(&mut T, String) + Send + Sync + 'static,
    ) -> Self {
        self.scalar_property(
            name,
            TypeSpec::Str,
            move |t| Value::Str(get(t)),
            move |t, v| match v {
                Value::Str(s) => {
                    set(t, s);
                    Ok(())
                }
                other => Err(kind_mismatch(&TypeSpec::Str, &other)),
            },
        )
    }

    pub fn int_property(
        self,
        name: &str,
        get: impl Fn(&T) -> i64 + Send + Sync + 'static,
        set: impl Fn(&mut T, i64) + Send + Sync + 'static,
    ) -> Self {
        self.scalar_property(
            name,
            TypeSpec::Int,
            move |t| Value::Int(get(t)),
            move |t, v| match v {
                Value::Int(i) => {
                    set(t, i);
                    Ok(())
                }
                other => Err(kind_mismatch(&TypeSpec::Int, &other)),
            },
        )
    }

    pub fn float_property(
        self,
        name: &str,
        get: impl Fn(&T) -> f64 + Send + Sync + 'static,
        set: impl Fn(&mut T, f64) + Send + Sync + 'static,
    ) -> Self {
        self.scalar_property(
            name,
            TypeSpec::Float,
            move |t| Value::Float(get(t)),
            move |t, v| match v {
                Value::Float(x) => {
                    set(t, x);
                    Ok(())
                }
                other => Err(kind_mismatch(&TypeSpec::Float, &other)),
            },
        )
    }

    pub fn bool_property(
        self,
        name: &str,
        get: impl Fn(&T) -> bool + Send + Sync + 'static,
        set: impl Fn(&mut T, bool) + Send + Sync + 'static,
    ) -> Self {
        self.scalar_property(
            name,
            TypeSpec::Bool,
            move |t| Value::Bool(get(t)),
            move |t, v| match v {
                Value::Bool(b) => {
                    set(t, b);
                    Ok(())
                }
                other => Err(kind_mismatch(&TypeSpec::Bool, &other)),
            },
        )
    }

    /// A bean-valued property of declared class `class`, injected as
    /// `Arc<P>`. Bean properties are write-only through the registry.
    pub fn bean_property<P: Any + Send + Sync>(
        mut self,
        name: &str,
        class: &str,
        set: impl Fn(&mut T, Arc<P>) + Send + Sync + 'static,
    ) -> Self {
        let spec = PropertySpec::new(name, TypeSpec::Bean(class.to_string()));
        let declared = TypeSpec::Bean(class.to_string());
        let property = name.to_string();

        let getter: GetterFn = Box::new(move |_| {
            Err(MetadataError::Failed(format!(
                "bean property `{property}` is write-only"
            )))
        });
        let setter: SetterFn = Box::new(move |any, value| {
            let t = downcast_mut::<T>(any)?;
            match value {
                Value::Bean { handle, class } => match handle.downcast::<P>() {
                    Ok(p) => {
                        set(t, p);
                        Ok(())
                    }
                    Err(_) => Err(MetadataError::TypeMismatch {
                        expected: declared.to_string(),
                        actual: format!("bean<{class}>"),
                    }),
                },
                other => Err(kind_mismatch(&declared, &other)),
            }
        });

        self.entry.properties.push(PropertyEntry {
            spec,
            getter,
            setter,
        });
        self
    }

    /// Mark the most recently added property as optional.
    pub fn optional(mut self) -> Self {
        if let Some(last) = self.entry.properties.last_mut() {
            last.spec.optional = true;
        }
        self
    }

    /// Mark the most recently added property as autowired.
    pub fn autowired(mut self) -> Self {
        if let Some(last) = self.entry.properties.last_mut() {
            last.spec.autowired = true;
        }
        self
    }

    /// Register this class as a product factory: instances can be cast to
    /// [`ProductFactory`] by the container's factory-product scope.
    pub fn product_factory(mut self) -> Self
    where
        T: ProductFactory,
    {
        self.entry.factory_cast = Some(Box::new(|any| {
            any.downcast_ref::<T>().map(|t| t as &dyn ProductFactory)
        }));
        self
    }

    /// Commit the description to the registry.
    pub fn register(self) {
        let Self {
            registry,
            name,
            entry,
            ..
        } = self;

        registry.by_type_id.insert(TypeId::of::<T>(), name.clone());
        if let Some(parent) = &entry.extends {
            let children = registry.subclasses.entry(parent.clone()).or_default();
            if !children.contains(&name) {
                children.push(name.clone());
            }
        }
        registry.classes.insert(name, entry);
    }

    fn scalar_property(
        mut self,
        name: &str,
        ty: TypeSpec,
        get: impl Fn(&T) -> Value + Send + Sync + 'static,
        set: impl Fn(&mut T, Value) -> Result<(), MetadataError> + Send + Sync + 'static,
    ) -> Self {
        let spec = PropertySpec::new(name, ty);
        let getter: GetterFn = Box::new(move |any| {
            let t = downcast_ref::<T>(any)?;
            Ok(get(t))
        });
        let setter: SetterFn = Box::new(move |any, value| {
            let t = downcast_mut::<T>(any)?;
            set(t, value)
        });

        self.entry.properties.push(PropertyEntry {
            spec,
            getter,
            setter,
        });
        self
    }
}

fn downcast_ref<T: Any>(any: &(dyn Any + Send + Sync)) -> Result<&T, MetadataError> {
    any.downcast_ref::<T>().ok_or_else(|| {
        MetadataError::Failed(format!(
            "instance is not a `{}`",
            std::any::type_name::<T>()
        ))
    })
}

fn downcast_mut<T: Any>(any: &mut (dyn Any + Send + Sync)) -> Result<&mut T, MetadataError> {
    any.downcast_mut::<T>().ok_or_else(|| {
        MetadataError::Failed(format!(
            "instance is not a `{}`",
            std::any::type_name::<T>()
        ))
    })
}

fn kind_mismatch(expected: &TypeSpec, actual: &Value) -> MetadataError {
    MetadataError::TypeMismatch {
        expected: expected.to_string(),
        actual: actual.type_spec().to_string(),
    }
}
