mod common;

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    thread,
};

use rstest::rstest;
use wrapp_config::{ConfigurationSource, SourceCatalog};
use wrapp_di::{ComponentKey, Registration};
use wrapp_test::{ConfigurationId, ContainerRegistry};

struct Connection;

fn registry() -> Arc<ContainerRegistry> {
    common::registry([
        ConfigurationSource::new("Database", |builder| {
            Ok(builder.add_named_instance("connection", Connection))
        }),
        ConfigurationSource::new("Destroyable", |builder| {
            Ok(builder.add_component(
                Registration::instance(Connection)
                    .named("connection")
                    .on_destroy(|_| tracing::debug!("closing connection")),
            ))
        }),
    ])
}

#[rstest]
#[case::named("Database")]
#[case::with_destroy_hook("Destroyable")]
#[case::empty("")]
fn get_returns_the_same_container_until_reset(#[case] id: &'static str) {
    let registry = registry();
    let id = ConfigurationId::new(id);

    let first = registry.get(&id).unwrap();
    let second = registry.get(&id).unwrap();
    assert!(first.ptr_eq(&second));

    assert!(registry.reset(&id));
    let third = registry.get(&id).unwrap();
    assert!(!first.ptr_eq(&third));
    assert!(first.is_destroyed());
    assert!(!third.is_destroyed());
}

#[test]
fn identifiers_get_separate_containers() {
    let registry = registry();
    let database = registry.get(&"Database".into()).unwrap();
    let empty = registry.get(&ConfigurationId::empty()).unwrap();

    assert!(!database.ptr_eq(&empty));
    assert!(database.has_component(&ComponentKey::name("connection")));
    assert_eq!(registry.len(), 2);

    registry.reset(&ConfigurationId::empty());
    assert!(!database.is_destroyed());
}

#[test]
fn concurrent_first_access_builds_one_container() {
    let registry = registry();
    let id = ConfigurationId::new("Database");

    let containers: Vec<_> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| registry.get(&id).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(containers.windows(2).all(|pair| pair[0].ptr_eq(&pair[1])));
    assert_eq!(registry.len(), 1);
}

struct Session(u64);

#[test]
fn get_never_returns_a_container_being_destroyed() {
    // Serials of containers, logged when their destruction starts
    let destroyed: Arc<Mutex<Vec<u64>>> = Arc::default();
    let log = destroyed.clone();
    let mut catalog = SourceCatalog::new();
    catalog
        .add_source(ConfigurationSource::new("Sessions", move |builder| {
            let log = log.clone();
            Ok(builder.add_component(
                Registration::factory_fn(|di| Ok(Session(di.serial())))
                    .on_destroy(move |session: &Session| log.lock().unwrap().push(session.0)),
            ))
        }))
        .unwrap();
    // No deployment markers, so every container constructs its session eagerly
    let registry = ContainerRegistry::with_catalog(catalog);
    let id = ConfigurationId::new("Sessions");
    let done = AtomicBool::new(false);

    thread::scope(|scope| {
        scope.spawn(|| {
            for _ in 0..200 {
                registry.reset(&id);
                thread::yield_now();
            }
            done.store(true, Ordering::SeqCst);
        });
        for _ in 0..4 {
            scope.spawn(|| {
                while !done.load(Ordering::SeqCst) {
                    let destroyed_before = destroyed.lock().unwrap().clone();
                    let container = registry.get(&id).unwrap();
                    assert!(!destroyed_before.contains(&container.serial()));
                }
            });
        }
    });

    let last = registry.get(&id).unwrap();
    assert!(!last.is_destroyed());
    assert!(!destroyed.lock().unwrap().contains(&last.serial()));
}
