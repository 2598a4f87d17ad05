mod common;

use serial_test::serial;
use wrapp_config::ConfigurationSource;
use wrapp_di::current;
use wrapp_test::ConfigurationId;

#[test]
#[serial]
fn creation_publishes_the_current_container() {
    let registry = common::registry([ConfigurationSource::new("Ambient", Ok)]);
    let id = ConfigurationId::new("Ambient");

    let container = registry.get(&id).unwrap();
    assert!(current::current().unwrap().ptr_eq(&container));

    // Cached lookups do not publish again
    let other = registry.get(&ConfigurationId::empty()).unwrap();
    registry.get(&id).unwrap();
    assert!(current::current().unwrap().ptr_eq(&other));
}

#[test]
#[serial]
fn reset_clears_the_current_container() {
    let registry = common::registry([ConfigurationSource::new("Ambient", Ok)]);
    let id = ConfigurationId::new("Ambient");

    let container = registry.get(&id).unwrap();
    registry.reset(&id);
    assert!(current::current().is_none());
    assert!(container.is_destroyed());

    let rebuilt = registry.get(&id).unwrap();
    assert!(current::current().unwrap().ptr_eq(&rebuilt));
}
