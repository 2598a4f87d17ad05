//! Metadata of test classes.
//!
//! Rust has no runtime reflection, so a test class describes itself once through
//! [TestClass::describe]: its name, the configuration it runs against, the fields a container
//! may fill and the rules taking part in its lifecycle.

use std::{
    any::TypeId,
    borrow::Cow,
    collections::HashSet,
    fmt::Debug,
    sync::{Arc, Mutex},
};

use wrapp_di::{DiContainer, DynError, ErasedComponent, Injectable, TypeInfo};

use crate::rules::TestRule;

/// A test instance, shared between the runner and the rules preparing it
pub type TestInstance<C> = Arc<Mutex<C>>;

/// Runs against a freshly created container before it is handed out
pub type ContainerInclude = Arc<dyn Fn(&DiContainer) -> Result<(), DynError> + Send + Sync>;

/// Shared handle to a rule
pub type RuleRef<C> = Arc<dyn TestRule<C>>;

/// A type holding tests
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use wrapp_test::{ClassBuilder, ContextConfiguration, TestClass};
///
/// struct Mailer;
///
/// #[derive(Default)]
/// struct MailerTest {
///     mailer: Option<Arc<Mailer>>,
/// }
///
/// impl TestClass for MailerTest {
///     fn describe(class: &mut ClassBuilder<Self>) {
///         class
///             .configuration(ContextConfiguration::new("mail"))
///             .field("mailer", |test| &mut test.mailer);
///     }
/// }
/// ```
pub trait TestClass: Sized + Send + 'static {
    fn describe(class: &mut ClassBuilder<Self>);
}

/// Declared modifiers of a field
///
/// Static and final fields are never injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub is_static: bool,
    pub is_final: bool,
}
impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        is_static: false,
        is_final: false,
    };
    pub const STATIC: Modifiers = Modifiers {
        is_static: true,
        is_final: false,
    };
    pub const FINAL: Modifiers = Modifiers {
        is_static: false,
        is_final: true,
    };
}

type IsSetFn<C> = Arc<dyn Fn(&mut C) -> bool + Send + Sync>;
type AssignFn<C> = Arc<dyn Fn(&mut C, ErasedComponent) -> bool + Send + Sync>;

/// A field of a test class which may receive a component
pub struct InjectableField<C> {
    name: &'static str,
    declared_by: TypeInfo,
    declared_type: TypeInfo,
    modifiers: Modifiers,
    /// Indices of the `extends` calls leading to the declaring class
    path: Vec<usize>,
    is_set: IsSetFn<C>,
    assign: AssignFn<C>,
}
impl<C> Clone for InjectableField<C> {
    fn clone(&self) -> Self {
        InjectableField {
            name: self.name,
            declared_by: self.declared_by,
            declared_type: self.declared_type,
            modifiers: self.modifiers,
            path: self.path.clone(),
            is_set: self.is_set.clone(),
            assign: self.assign.clone(),
        }
    }
}
impl<C> Debug for InjectableField<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectableField")
            .field("name", &self.name)
            .field("declared_by", &self.declared_by.type_name)
            .field("declared_type", &self.declared_type.type_name)
            .field("modifiers", &self.modifiers)
            .finish()
    }
}

impl<C: 'static> InjectableField<C> {
    fn new<V: ?Sized + Injectable>(
        name: &'static str,
        modifiers: Modifiers,
        slot: fn(&mut C) -> &mut Option<Arc<V>>,
    ) -> Self {
        InjectableField {
            name,
            declared_by: TypeInfo::of::<C>(),
            declared_type: TypeInfo::of::<V>(),
            modifiers,
            path: Vec::new(),
            is_set: Arc::new(move |instance: &mut C| slot(instance).is_some()),
            assign: Arc::new(move |instance: &mut C, component: ErasedComponent| {
                match component.downcast::<Arc<V>>() {
                    Ok(component) => {
                        *slot(instance) = Some(*component);
                        true
                    }
                    Err(_) => false,
                }
            }),
        }
    }

    /// Makes the field of an embedded parent reachable from the child
    fn project<Child: 'static>(
        self,
        parent: usize,
        project: fn(&mut Child) -> &mut C,
    ) -> InjectableField<Child> {
        let (is_set, assign) = (self.is_set, self.assign);
        let mut path = Vec::with_capacity(self.path.len() + 1);
        path.push(parent);
        path.extend(self.path);
        InjectableField {
            name: self.name,
            declared_by: self.declared_by,
            declared_type: self.declared_type,
            modifiers: self.modifiers,
            path,
            is_set: Arc::new(move |child: &mut Child| is_set(project(child))),
            assign: Arc::new(move |child: &mut Child, component: ErasedComponent| {
                assign(project(child), component)
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The name a component is bound by under the default naming convention
    pub fn normalized_name(&self) -> String {
        self.name.replace('_', "")
    }

    /// The class declaring the field
    pub fn declared_by(&self) -> TypeInfo {
        self.declared_by
    }

    pub fn declared_type(&self) -> TypeInfo {
        self.declared_type
    }

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Static, final and primitive fields are never bound
    pub fn is_auto_bindable(&self) -> bool {
        !self.modifiers.is_static && !self.modifiers.is_final && !self.declared_type.is_primitive()
    }

    pub fn is_set(&self, instance: &mut C) -> bool {
        (self.is_set)(instance)
    }

    /// Writes a component resolved as the declared type into the field
    ///
    /// Returns false if the component is not an `Arc` of the declared type.
    pub fn assign(&self, instance: &mut C, component: ErasedComponent) -> bool {
        (self.assign)(instance, component)
    }

    /// The same parent embedded twice yields distinct fields
    fn identity(&self) -> (TypeId, Vec<usize>, &'static str) {
        (self.declared_by.type_id, self.path.clone(), self.name)
    }
}

/// Configuration override of a test class
#[derive(Clone, Default)]
pub struct ContextConfiguration {
    path: Cow<'static, str>,
    includes: Vec<ContainerInclude>,
}
impl Debug for ContextConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextConfiguration")
            .field("path", &self.path)
            .field("includes", &self.includes.len())
            .finish()
    }
}
impl ContextConfiguration {
    /// Use the configuration source named `path`, an empty path means an empty container
    pub fn new(path: impl Into<Cow<'static, str>>) -> Self {
        ContextConfiguration {
            path: path.into(),
            includes: Vec::new(),
        }
    }

    /// Run against an empty container
    pub fn empty() -> Self {
        Self::new("")
    }

    /// Adds an action run once against every newly created container, in declaration order
    pub fn include<F>(mut self, include: F) -> Self
    where
        F: Fn(&DiContainer) -> Result<(), DynError> + Send + Sync + 'static,
    {
        self.includes.push(Arc::new(include));
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn includes(&self) -> &[ContainerInclude] {
        &self.includes
    }
}

/// A test method as seen by rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestMethod {
    name: Cow<'static, str>,
    dirty: bool,
}
impl TestMethod {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        TestMethod {
            name: name.into(),
            dirty: false,
        }
    }

    /// Marks the method as leaving the container in an unusable state
    pub fn dirty(mut self) -> Self {
        self.dirty = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Collects the description of a [TestClass]
pub struct ClassBuilder<C> {
    name: Cow<'static, str>,
    configuration: Option<ContextConfiguration>,
    fields: Vec<InjectableField<C>>,
    inherited: Vec<InjectableField<C>>,
    parents: usize,
    class_rules: Vec<RuleRef<C>>,
    instance_rules: Vec<RuleRef<C>>,
    method_rules: Vec<RuleRef<C>>,
    dependency_injection: bool,
}

impl<C: TestClass> ClassBuilder<C> {
    fn new() -> Self {
        ClassBuilder {
            name: Cow::Borrowed(simple_name(std::any::type_name::<C>())),
            configuration: None,
            fields: Vec::new(),
            inherited: Vec::new(),
            parents: 0,
            class_rules: Vec::new(),
            instance_rules: Vec::new(),
            method_rules: Vec::new(),
            dependency_injection: true,
        }
    }

    /// Overrides the simple name, which names the default configuration
    pub fn name(&mut self, name: impl Into<Cow<'static, str>>) -> &mut Self {
        self.name = name.into();
        self
    }

    pub fn configuration(&mut self, configuration: ContextConfiguration) -> &mut Self {
        self.configuration = Some(configuration);
        self
    }

    /// Declares a field which may be filled from the container
    ///
    /// The field is bound by its name with underscores removed (`dummy_service` looks for a
    /// component named `dummyservice`), or else by the type `V`.
    pub fn field<V: ?Sized + Injectable>(
        &mut self,
        name: &'static str,
        slot: fn(&mut C) -> &mut Option<Arc<V>>,
    ) -> &mut Self {
        self.field_with(name, Modifiers::NONE, slot)
    }

    pub fn field_with<V: ?Sized + Injectable>(
        &mut self,
        name: &'static str,
        modifiers: Modifiers,
        slot: fn(&mut C) -> &mut Option<Arc<V>>,
    ) -> &mut Self {
        self.fields.push(InjectableField::new(name, modifiers, slot));
        self
    }

    /// Inherits the fields of an embedded parent class
    ///
    /// Inherited fields are discovered after the class' own fields. Only fields are inherited,
    /// configuration and rules stay with the class declaring them.
    pub fn extends<P: TestClass>(&mut self, project: fn(&mut C) -> &mut P) -> &mut Self {
        let parent = ClassDescriptor::<P>::of();
        let index = self.parents;
        self.parents += 1;
        self.inherited.extend(
            parent
                .fields
                .iter()
                .cloned()
                .map(|field| field.project(index, project)),
        );
        self
    }

    /// A rule receiving the test context when the class is prepared
    pub fn class_rule<R: TestRule<C> + 'static>(&mut self, rule: Arc<R>) -> &mut Self {
        self.class_rules.push(rule);
        self
    }

    /// A rule preparing every new test instance, after the listeners
    pub fn instance_rule<R: TestRule<C> + 'static>(&mut self, rule: Arc<R>) -> &mut Self {
        self.instance_rules.push(rule);
        self
    }

    /// A rule wrapping every test method
    pub fn method_rule<R: TestRule<C> + 'static>(&mut self, rule: Arc<R>) -> &mut Self {
        self.method_rules.push(rule);
        self
    }

    /// Disables the default dependency injection listener
    pub fn without_dependency_injection(&mut self) -> &mut Self {
        self.dependency_injection = false;
        self
    }

    fn build(self) -> ClassDescriptor<C> {
        let mut seen = HashSet::new();
        let fields = self
            .fields
            .into_iter()
            .chain(self.inherited)
            .filter(|field| seen.insert(field.identity()))
            .collect();

        ClassDescriptor {
            name: self.name,
            info: TypeInfo::of::<C>(),
            configuration: self.configuration,
            fields,
            class_rules: self.class_rules,
            instance_rules: self.instance_rules,
            method_rules: self.method_rules,
            dependency_injection: self.dependency_injection,
        }
    }
}

/// The description of a [TestClass]
pub struct ClassDescriptor<C> {
    name: Cow<'static, str>,
    info: TypeInfo,
    configuration: Option<ContextConfiguration>,
    /// Own fields followed by inherited ones, without duplicates
    fields: Vec<InjectableField<C>>,
    class_rules: Vec<RuleRef<C>>,
    instance_rules: Vec<RuleRef<C>>,
    method_rules: Vec<RuleRef<C>>,
    dependency_injection: bool,
}
impl<C> Debug for ClassDescriptor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("configuration", &self.configuration)
            .field("fields", &self.fields)
            .field("class_rules", &self.class_rules.len())
            .field("instance_rules", &self.instance_rules.len())
            .field("method_rules", &self.method_rules.len())
            .field("dependency_injection", &self.dependency_injection)
            .finish()
    }
}

impl<C: TestClass> ClassDescriptor<C> {
    /// Describes `C`
    pub fn of() -> Self {
        let mut builder = ClassBuilder::new();
        C::describe(&mut builder);
        builder.build()
    }

    /// Simple name of the class
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_info(&self) -> TypeInfo {
        self.info
    }

    pub fn configuration(&self) -> Option<&ContextConfiguration> {
        self.configuration.as_ref()
    }

    /// All declared fields, including those which are never bound
    pub fn fields(&self) -> &[InjectableField<C>] {
        &self.fields
    }

    pub fn class_rules(&self) -> &[RuleRef<C>] {
        &self.class_rules
    }

    pub fn instance_rules(&self) -> &[RuleRef<C>] {
        &self.instance_rules
    }

    pub fn method_rules(&self) -> &[RuleRef<C>] {
        &self.method_rules
    }

    pub fn uses_dependency_injection(&self) -> bool {
        self.dependency_injection
    }
}

/// `a::b::FooTest<x::Y>` -> `FooTest`
fn simple_name(type_name: &'static str) -> &'static str {
    let path = type_name.split('<').next().unwrap_or(type_name);
    path.rsplit("::").next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Service;

    #[derive(Default)]
    struct Base {
        shared: Option<Arc<Service>>,
    }
    impl TestClass for Base {
        fn describe(class: &mut ClassBuilder<Self>) {
            class.field("shared", |base| &mut base.shared);
        }
    }

    #[derive(Default)]
    struct Derived {
        base: Base,
        own: Option<Arc<Service>>,
        count: Option<Arc<u32>>,
    }
    impl TestClass for Derived {
        fn describe(class: &mut ClassBuilder<Self>) {
            class
                .extends(|derived| &mut derived.base)
                .field("own", |derived| &mut derived.own)
                .field("count", |derived| &mut derived.count)
                .field("own", |derived| &mut derived.own);
        }
    }

    #[test]
    fn simple_names_drop_paths_and_generics() {
        assert_eq!(simple_name("crate::tests::FooTest"), "FooTest");
        assert_eq!(simple_name("crate::Wrapper<crate::Inner>"), "Wrapper");
        assert_eq!(simple_name("Bar"), "Bar");
        assert_eq!(ClassDescriptor::<Derived>::of().name(), "Derived");
    }

    #[test]
    fn own_fields_come_before_inherited_ones() {
        let descriptor = ClassDescriptor::<Derived>::of();
        let names: Vec<&str> = descriptor.fields().iter().map(InjectableField::name).collect();

        assert_eq!(names, vec!["own", "count", "shared"]);
        assert_eq!(descriptor.fields()[2].declared_by(), TypeInfo::of::<Base>());
    }

    #[test]
    fn inherited_fields_write_through_the_projection() {
        let descriptor = ClassDescriptor::<Derived>::of();
        let shared = &descriptor.fields()[2];
        let mut instance = Derived::default();

        assert!(!shared.is_set(&mut instance));
        let component: ErasedComponent = Box::new(Arc::new(Service));
        assert!(shared.assign(&mut instance, component));
        assert!(instance.base.shared.is_some());
        assert!(shared.is_set(&mut instance));
    }

    #[test]
    fn a_parent_embedded_twice_keeps_both_fields() {
        #[derive(Default)]
        struct TwoBases {
            left: Base,
            right: Base,
        }
        impl TestClass for TwoBases {
            fn describe(class: &mut ClassBuilder<Self>) {
                class
                    .extends(|two| &mut two.left)
                    .extends(|two| &mut two.right);
            }
        }

        let descriptor = ClassDescriptor::<TwoBases>::of();
        assert_eq!(descriptor.fields().len(), 2);

        let mut instance = TwoBases::default();
        for field in descriptor.fields() {
            let component: ErasedComponent = Box::new(Arc::new(Service));
            assert!(field.assign(&mut instance, component));
        }
        assert!(instance.left.shared.is_some());
        assert!(instance.right.shared.is_some());
    }

    #[test]
    fn primitive_static_and_final_fields_are_not_bindable() {
        let descriptor = ClassDescriptor::<Derived>::of();
        assert!(!descriptor.fields()[1].is_auto_bindable());
        assert!(descriptor.fields()[0].is_auto_bindable());

        struct Modified {
            fixed: Option<Arc<Service>>,
            global: Option<Arc<Service>>,
        }
        impl TestClass for Modified {
            fn describe(class: &mut ClassBuilder<Self>) {
                class
                    .field_with("fixed", Modifiers::FINAL, |m| &mut m.fixed)
                    .field_with("global", Modifiers::STATIC, |m| &mut m.global);
            }
        }
        let descriptor = ClassDescriptor::<Modified>::of();
        assert!(descriptor.fields().iter().all(|f| !f.is_auto_bindable()));
    }

    #[test]
    fn normalized_names_drop_underscores() {
        #[derive(Default)]
        struct Named {
            dummy_service: Option<Arc<Service>>,
        }
        impl TestClass for Named {
            fn describe(class: &mut ClassBuilder<Self>) {
                class.field("dummy_service", |n| &mut n.dummy_service);
            }
        }
        let descriptor = ClassDescriptor::<Named>::of();
        assert_eq!(descriptor.fields()[0].normalized_name(), "dummyservice");
    }
}
