use std::{
    any::Any,
    borrow::Cow,
    sync::{Arc, Mutex},
};

use crate::{
    container::DiContainer,
    factories::{DynFactory, FnFactory, InstanceFactory},
    types::{DependencyInfo, DynError, Injectable, Instance, TypeInfo},
};

/// A resolved component, boxed as `Box<Arc<V>>` for the requested view `V`
pub type ErasedComponent = Box<dyn Any + Send + Sync>;

type CastFn = Box<dyn Fn(&Instance) -> Option<ErasedComponent> + Send + Sync>;
type DestroyFn = Box<dyn Fn(&Instance) + Send + Sync>;

/// A type a component can be handed out as
pub(crate) struct View {
    pub info: TypeInfo,
    cast: CastFn,
}
impl View {
    fn identity<T: Injectable>() -> Self {
        View {
            info: TypeInfo::of::<T>(),
            cast: Box::new(|instance| {
                instance
                    .downcast::<T>()
                    .ok()
                    .map(|arc| Box::new(arc) as ErasedComponent)
            }),
        }
    }

    pub fn cast(&self, instance: &Instance) -> Option<ErasedComponent> {
        (self.cast)(instance)
    }
}

pub(crate) enum ComponentState {
    Ready(Instance),
    Pending(Box<dyn DynFactory>),
    Disposed,
}

/// Describes how one component is provided
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use wrapp_di::{DiBuilder, Registration};
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".into()
///     }
/// }
///
/// let container = DiBuilder::new()
///     .add_component(
///         Registration::instance(English)
///             .named("greeter")
///             .expose::<dyn Greeter>(|english| english),
///     )
///     .build()
///     .unwrap();
///
/// let greeter = container.require_named::<dyn Greeter>("greeter").unwrap();
/// assert_eq!(greeter.greet(), "hello");
/// ```
pub struct Registration<T: Injectable> {
    name: Option<Cow<'static, str>>,
    views: Vec<View>,
    dependencies: Vec<DependencyInfo>,
    state: ComponentState,
    on_destroy: Option<DestroyFn>,
    _provides: std::marker::PhantomData<fn() -> T>,
}

impl<T: Injectable> Registration<T> {
    fn with_state(state: ComponentState, dependencies: Vec<DependencyInfo>) -> Self {
        Registration {
            name: None,
            views: vec![View::identity::<T>()],
            dependencies,
            state,
            on_destroy: None,
            _provides: std::marker::PhantomData,
        }
    }

    /// An already created instance
    pub fn instance(instance: T) -> Self {
        Self::with_state(ComponentState::Ready(Instance::new(instance)), vec![])
    }

    /// A factory which is constructed lazily, or eagerly in cold deployment
    pub fn factory<Factory: InstanceFactory<Provides = T>>(factory: Factory) -> Self {
        let dependencies = Factory::get_dependencies();
        Self::with_state(ComponentState::Pending(Box::new(factory)), dependencies)
    }

    /// A closure constructing the component
    pub fn factory_fn<F>(construct: F) -> Self
    where
        F: FnMut(&DiContainer) -> Result<T, DynError> + Send + Sync + 'static,
    {
        Self::factory(FnFactory::new(construct))
    }

    /// Registers the component under a name
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Allows the component to be handed out as `V`, typically a trait object
    ///
    /// Lookups by type `V` will find this component and named lookups may assign it to `V`.
    pub fn expose<V: ?Sized + Injectable>(mut self, cast: fn(Arc<T>) -> Arc<V>) -> Self {
        let info = TypeInfo::of::<V>();
        if self.views.iter().any(|view| view.info == info) {
            return self;
        }

        self.views.push(View {
            info,
            cast: Box::new(move |instance| {
                instance
                    .downcast::<T>()
                    .ok()
                    .map(|arc| Box::new(cast(arc)) as ErasedComponent)
            }),
        });
        self
    }

    /// Declares an additional dependency, used for graph validation
    pub fn depends_on(mut self, dependency: DependencyInfo) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Called when the container is destroyed, if the component was constructed
    pub fn on_destroy(mut self, hook: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_destroy = Some(Box::new(move |instance| {
            if let Ok(component) = instance.downcast::<T>() {
                hook(&component)
            }
        }));
        self
    }

    pub(crate) fn into_def(self) -> ComponentDef {
        ComponentDef {
            name: self.name,
            info: TypeInfo::of::<T>(),
            views: self.views,
            dependencies: self.dependencies,
            state: Mutex::new(self.state),
            on_destroy: self.on_destroy,
        }
    }
}

/// Type erased [Registration] as stored by builder and container
pub(crate) struct ComponentDef {
    pub name: Option<Cow<'static, str>>,
    pub info: TypeInfo,
    pub views: Vec<View>,
    pub dependencies: Vec<DependencyInfo>,
    pub state: Mutex<ComponentState>,
    pub on_destroy: Option<DestroyFn>,
}
impl ComponentDef {
    pub fn view(&self, info: TypeInfo) -> Option<&View> {
        self.views.iter().find(|view| view.info == info)
    }

    pub fn exposed_types(&self) -> Vec<TypeInfo> {
        self.views.iter().map(|view| view.info).collect()
    }

    pub fn label(&self) -> &'static str {
        self.info.type_name
    }

    pub fn is_ready(&self) -> bool {
        matches!(
            *self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner),
            ComponentState::Ready(_)
        )
    }
}
