use std::{
    any::{type_name, TypeId},
    collections::HashMap,
    fmt::Debug,
    mem,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, PoisonError, RwLock, Weak,
    },
};

use crate::{
    component::{ComponentDef, ComponentState, ErasedComponent, Registration},
    cycle::ResolutionGuard,
    errors::{RegisterError, RequireError},
    resolver::Resolver,
    types::{ComponentKey, DeploymentMode, Injectable, Instance, TypeInfo},
};

static NEXT_SERIAL: AtomicU64 = AtomicU64::new(1);

/// Handle to a configured container
///
/// Cloning the handle is cheap, all clones refer to the same container.
#[derive(Clone)]
pub struct DiContainer(Arc<DiContainerInner>);
pub(crate) struct DiContainerInner {
    serial: u64,
    mode: DeploymentMode,
    table: RwLock<ComponentTable>,
    /// Components holding an instance, in construction order
    constructed: Mutex<Vec<Arc<ComponentDef>>>,
    destroyed: AtomicBool,
}

#[derive(Default)]
struct ComponentTable {
    components: Vec<Arc<ComponentDef>>,
    by_name: HashMap<String, usize>,
    by_type: HashMap<TypeId, Vec<usize>>,
}
impl ComponentTable {
    fn insert(&mut self, component: ComponentDef) -> Result<Arc<ComponentDef>, RegisterError> {
        let index = self.components.len();
        if let Some(name) = &component.name {
            if self.by_name.contains_key(&**name) {
                return Err(RegisterError::DuplicateName(name.to_string()));
            }
            self.by_name.insert(name.to_string(), index);
        }
        for view in &component.views {
            self.by_type.entry(view.info.type_id).or_default().push(index);
        }

        let component = Arc::new(component);
        self.components.push(component.clone());
        Ok(component)
    }

    fn find(&self, key: &ComponentKey) -> Result<Arc<ComponentDef>, RequireError> {
        match key {
            ComponentKey::Name(name) => self
                .by_name
                .get(&**name)
                .map(|index| self.components[*index].clone())
                .ok_or_else(|| RequireError::Missing(key.clone())),
            ComponentKey::Type(info) => match self.by_type.get(&info.type_id).map(Vec::as_slice) {
                None | Some([]) => Err(RequireError::Missing(key.clone())),
                Some([index]) => Ok(self.components[*index].clone()),
                Some(many) => Err(RequireError::Ambiguous {
                    requested: *info,
                    count: many.len(),
                }),
            },
        }
    }
}

impl Debug for DiContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_struct("DiContainer");
        map.field("serial", &self.0.serial);
        if self.is_destroyed() {
            map.field("state", &"destroyed");
            return map.finish();
        }
        for component in &self.read_table().components {
            let val = if component.is_ready() {
                "constructed"
            } else {
                "pending"
            };
            map.field(component.label(), &val);
        }
        map.finish()
    }
}

impl DiContainer {
    pub(crate) fn new(mode: DeploymentMode) -> Self {
        Self(Arc::new(DiContainerInner {
            serial: NEXT_SERIAL.fetch_add(1, Ordering::Relaxed),
            mode,
            table: RwLock::new(ComponentTable::default()),
            constructed: Mutex::new(Vec::new()),
            destroyed: AtomicBool::new(false),
        }))
    }

    pub(crate) fn downgrade(&self) -> Weak<DiContainerInner> {
        Arc::downgrade(&self.0)
    }

    pub(crate) fn upgrade(inner: &Weak<DiContainerInner>) -> Option<Self> {
        inner.upgrade().map(DiContainer)
    }

    fn read_table(&self) -> std::sync::RwLockReadGuard<'_, ComponentTable> {
        self.0.table.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Process unique number identifying this container
    pub fn serial(&self) -> u64 {
        self.0.serial
    }

    /// True if both handles refer to the same container
    pub fn ptr_eq(&self, other: &DiContainer) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn mode(&self) -> DeploymentMode {
        self.0.mode
    }

    /// Number of registered components
    pub fn len(&self) -> usize {
        self.read_table().components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_destroyed(&self) -> bool {
        self.0.destroyed.load(Ordering::Acquire)
    }

    /// Adds a component to an existing container
    ///
    /// Components added after build are always constructed lazily.
    pub fn register<T: Injectable>(
        &self,
        registration: Registration<T>,
    ) -> Result<(), RegisterError> {
        if self.is_destroyed() {
            return Err(RegisterError::Destroyed);
        }

        self.insert_def(registration.into_def())
    }

    pub(crate) fn insert_def(&self, component: ComponentDef) -> Result<(), RegisterError> {
        let component = self
            .0
            .table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(component)?;

        tracing::debug!(
            "Registered {} in container #{}",
            component.label(),
            self.serial()
        );
        if component.is_ready() {
            self.mark_constructed(component);
        }
        Ok(())
    }

    /// Checks if a component is registered under the given key
    pub fn has_component(&self, key: &ComponentKey) -> bool {
        if self.is_destroyed() {
            return false;
        }
        let table = self.read_table();
        match key {
            ComponentKey::Name(name) => table.by_name.contains_key(&**name),
            ComponentKey::Type(info) => table
                .by_type
                .get(&info.type_id)
                .is_some_and(|components| !components.is_empty()),
        }
    }

    /// All types the component registered under `name` can be handed out as
    pub fn component_types(&self, name: &str) -> Option<Vec<TypeInfo>> {
        let table = self.read_table();
        let index = table.by_name.get(name)?;
        Some(table.components[*index].exposed_types())
    }

    /// True if the component named `name` can be assigned to `target`
    pub fn is_assignable(&self, name: &str, target: TypeInfo) -> bool {
        self.component_types(name)
            .is_some_and(|types| types.contains(&target))
    }

    /// Looks up a component and hands it out as `as_type`
    ///
    /// The returned box contains an `Arc<V>` where `V` is the type described by `as_type`.
    /// Constructs the component first if it has not been constructed yet.
    pub fn get_component(
        &self,
        key: &ComponentKey,
        as_type: TypeInfo,
    ) -> Result<ErasedComponent, RequireError> {
        if self.is_destroyed() {
            return Err(RequireError::Destroyed);
        }

        // Release the table before constructing - factories look up further components
        let component = self.read_table().find(key)?;
        let not_assignable = || RequireError::NotAssignable {
            key: key.clone(),
            required_type: as_type.type_name,
            actual_type: component.info.type_name,
        };

        let view = component.view(as_type).ok_or_else(not_assignable)?;
        let instance = self.instantiate(&component, key)?;
        view.cast(&instance).ok_or_else(not_assignable)
    }

    /// Attempts to get the single component exposing `V`
    pub fn require<V: ?Sized + Injectable>(&self) -> Result<Arc<V>, RequireError> {
        self.require_key(&ComponentKey::of::<V>())
    }

    /// Attempts to get the component registered under `name` as `V`
    pub fn require_named<V: ?Sized + Injectable>(
        &self,
        name: &str,
    ) -> Result<Arc<V>, RequireError> {
        self.require_key(&ComponentKey::name(name.to_string()))
    }

    fn require_key<V: ?Sized + Injectable>(
        &self,
        key: &ComponentKey,
    ) -> Result<Arc<V>, RequireError> {
        let erased = self.get_component(key, TypeInfo::of::<V>())?;
        match erased.downcast::<Arc<V>>() {
            Ok(component) => Ok(*component),
            Err(_) => Err(RequireError::NotAssignable {
                key: key.clone(),
                required_type: type_name::<V>(),
                actual_type: "unknown",
            }),
        }
    }

    /// Resolves anything implementing [Resolver], e.g. `Option<Arc<T>>` or `Lazy<T>`
    pub fn resolve<T: Resolver>(&self) -> Result<T, RequireError> {
        T::resolve(self)
    }

    /// Constructs all components which are not constructed yet, in registration order
    pub(crate) fn instantiate_all(&self) -> Result<(), RequireError> {
        let components = self.read_table().components.clone();
        for component in components {
            let key = match &component.name {
                Some(name) => ComponentKey::Name(name.clone()),
                None => ComponentKey::Type(component.info),
            };
            self.instantiate(&component, &key)?;
        }
        Ok(())
    }

    fn instantiate(
        &self,
        component: &Arc<ComponentDef>,
        key: &ComponentKey,
    ) -> Result<Instance, RequireError> {
        let _guard = ResolutionGuard::enter(
            self.serial(),
            Arc::as_ptr(component) as usize,
            component.label(),
            key,
        )?;

        let mut state = component
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let instance = match &mut *state {
            ComponentState::Ready(instance) => return Ok(instance.clone()),
            ComponentState::Disposed => return Err(RequireError::Destroyed),
            ComponentState::Pending(factory) => {
                factory
                    .construct(self)
                    .map_err(|error| RequireError::FactoryFailed {
                        product: component.label(),
                        error: Arc::new(error),
                    })?
            }
        };

        if self.is_destroyed() {
            return Err(RequireError::Destroyed);
        }

        tracing::debug!(
            "Constructed instance of {} in container #{}",
            instance.info.type_name,
            self.serial()
        );
        *state = ComponentState::Ready(instance.clone());
        drop(state);

        self.mark_constructed(component.clone());
        Ok(instance)
    }

    fn mark_constructed(&self, component: Arc<ComponentDef>) {
        self.0
            .constructed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(component);
    }

    /// Destroys the container
    ///
    /// Destroy hooks of constructed components run in reverse construction order, afterwards
    /// every instance is dropped. Any later lookup fails with [RequireError::Destroyed].
    /// Destroying twice is a no-op.
    pub fn destroy(&self) {
        if self.0.destroyed.swap(true, Ordering::AcqRel) {
            return;
        }

        let constructed = mem::take(
            &mut *self
                .0
                .constructed
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for component in constructed.iter().rev() {
            let previous = mem::replace(
                &mut *component
                    .state
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner),
                ComponentState::Disposed,
            );
            if let (ComponentState::Ready(instance), Some(hook)) =
                (previous, &component.on_destroy)
            {
                tracing::debug!("Running destroy hook of {}", component.label());
                hook(&instance);
            }
        }

        let table = mem::take(&mut *self.0.table.write().unwrap_or_else(PoisonError::into_inner));
        tracing::debug!(
            "Destroyed container #{} with {} components",
            self.serial(),
            table.components.len()
        );
    }
}
