mod common;

use std::sync::{Arc, Mutex};

use wrapp_config::ConfigurationSource;
use wrapp_di::DynError;
use wrapp_test::{
    ClassBuilder, DirtyContainerRule, Mode, TestClass, TestContextManager, TestMethod, TestSuite,
};

struct Session;

fn sessions() -> ConfigurationSource {
    ConfigurationSource::new("Sessions", |builder| {
        Ok(builder.add_factory_fn(|_| Ok::<_, DynError>(Session)))
    })
}

#[derive(Default)]
struct DirtyModeTest {
    session: Option<Arc<Session>>,
}

impl TestClass for DirtyModeTest {
    fn describe(class: &mut ClassBuilder<Self>) {
        class
            .configuration(wrapp_test::ContextConfiguration::new("Sessions"))
            .method_rule(Arc::new(DirtyContainerRule::new(Mode::Dirty)))
            .field("session", |test| &mut test.session);
    }
}

#[test]
fn only_dirty_methods_reset_the_container() {
    let registry = common::registry([sessions()]);
    let manager = TestContextManager::<DirtyModeTest>::new(registry);
    let seen = Arc::new(Mutex::new(Vec::new()));

    let suite = {
        let record = |seen: &Arc<Mutex<Vec<Arc<Session>>>>| {
            let seen = seen.clone();
            move |test: &mut DirtyModeTest| -> Result<(), DynError> {
                let session = test.session.clone().ok_or("session not injected")?;
                seen.lock().unwrap().push(session);
                Ok(())
            }
        };
        TestSuite::<DirtyModeTest>::new(manager.test_context().registry().clone())
            .test("clean", record(&seen))
            .method(TestMethod::new("dirty").dirty(), record(&seen))
            .test("after_dirty", record(&seen))
    };

    let report = suite.run_with(&manager);
    assert!(report.is_success(), "{report:?}");
    assert_eq!(report.passed(), 3);

    let seen = seen.lock().unwrap();
    assert!(Arc::ptr_eq(&seen[0], &seen[1]), "clean methods keep the container");
    assert!(!Arc::ptr_eq(&seen[1], &seen[2]), "dirty methods reset it");
}

#[derive(Default)]
struct AlwaysResetTest {
    session: Option<Arc<Session>>,
}

impl TestClass for AlwaysResetTest {
    fn describe(class: &mut ClassBuilder<Self>) {
        class
            .name("Sessions")
            .method_rule(Arc::new(DirtyContainerRule::default()))
            .field("session", |test| &mut test.session);
    }
}

#[test]
fn reset_mid_class_rebuilds_from_the_same_configuration() {
    let registry = common::registry([sessions()]);
    let manager = TestContextManager::<AlwaysResetTest>::new(registry);
    let context = manager.test_context().clone();

    let before = context.container().unwrap();
    let instance = Arc::new(Mutex::new(AlwaysResetTest::default()));
    manager.prepare_instance(instance.clone()).unwrap();
    manager.prepare_method_rules();
    wrapp_test::statements::run_test_method(&manager, &instance, &TestMethod::new("m"), |_| Ok(()))
        .unwrap();

    assert!(before.is_destroyed());
    let after = context.container().unwrap();
    assert!(!before.ptr_eq(&after));
    assert_eq!(context.configuration_id().as_str(), "Sessions");
    assert!(after.require::<Session>().is_ok());
}
