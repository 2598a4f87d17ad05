use std::{
    any::{Any, TypeId},
    borrow::Cow,
    sync::Arc,
};

/// All errors must be Send + Sync so they can be shared with `Arc`
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Anything injectable may be shared between threads and lives for `'static`.
///
/// Unsized views such as `dyn Trait` qualify as long as the trait is `Send + Sync`.
pub trait Injectable: Send + Sync + 'static {}
impl<T: ?Sized + Send + Sync + 'static> Injectable for T {}

/// A constructed component, erased to `Any`
///
/// The stored value is always an `Arc<T>` of the component's concrete type.
#[derive(Clone)]
pub struct Instance {
    pub info: TypeInfo,
    pub instance: Arc<dyn Any + Send + Sync + 'static>,
}

impl Instance {
    pub(crate) fn new<ExistingInstance: Injectable>(instance: ExistingInstance) -> Self {
        Instance {
            info: TypeInfo::of::<ExistingInstance>(),
            instance: Arc::new(instance),
        }
    }

    pub fn downcast<T: Injectable>(&self) -> Result<Arc<T>, &'static str> {
        match Arc::downcast::<T>(self.instance.clone()) {
            Ok(downcasted) => Ok(downcasted),
            Err(_) => Err(self.info.type_name),
        }
    }
}

/// Type Name and Type Id
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }

    /// True for the scalar types which are never handed out by a container
    pub fn is_primitive(&self) -> bool {
        const PRIMITIVES: [fn() -> TypeId; 16] = [
            TypeId::of::<bool>,
            TypeId::of::<char>,
            TypeId::of::<u8>,
            TypeId::of::<u16>,
            TypeId::of::<u32>,
            TypeId::of::<u64>,
            TypeId::of::<u128>,
            TypeId::of::<usize>,
            TypeId::of::<i8>,
            TypeId::of::<i16>,
            TypeId::of::<i32>,
            TypeId::of::<i64>,
            TypeId::of::<i128>,
            TypeId::of::<isize>,
            TypeId::of::<f32>,
            TypeId::of::<f64>,
        ];
        PRIMITIVES.iter().any(|id| id() == self.type_id)
    }
}

/// How a component is looked up
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum ComponentKey {
    Name(Cow<'static, str>),
    Type(TypeInfo),
}
impl ComponentKey {
    pub fn name(name: impl Into<Cow<'static, str>>) -> Self {
        ComponentKey::Name(name.into())
    }

    pub fn of<T: ?Sized + 'static>() -> Self {
        ComponentKey::Type(TypeInfo::of::<T>())
    }
}
impl std::fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentKey::Name(name) => write!(f, "'{name}'"),
            ComponentKey::Type(info) => write!(f, "<{info}>"),
        }
    }
}

/// Information about a Factory dependency
#[derive(Debug, Clone)]
pub struct DependencyInfo {
    /// The required component
    pub key: ComponentKey,
    /// If it is optional or required
    pub optional: bool,
    /// If the Dependency is resolved lazily
    pub lazy: bool,
}
impl DependencyInfo {
    pub fn required<T: ?Sized + 'static>() -> Self {
        DependencyInfo {
            key: ComponentKey::of::<T>(),
            optional: false,
            lazy: false,
        }
    }

    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        DependencyInfo {
            key: ComponentKey::name(name),
            optional: false,
            lazy: false,
        }
    }

    pub fn optional(self) -> Self {
        DependencyInfo {
            optional: true,
            ..self
        }
    }

    pub fn lazy(self) -> Self {
        DependencyInfo { lazy: true, ..self }
    }
}

/// Controls when factories are constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    /// Components are constructed on first lookup
    #[default]
    Warm,
    /// Every component is constructed while the container is built
    Cold,
}
