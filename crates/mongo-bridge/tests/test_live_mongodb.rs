//! Integration tests against a running MongoDB server.
//!
//! These tests require a MongoDB server to be running.
//! Set MONGODB_URL (default mongodb://localhost:27017) and run with --ignored.

use std::sync::Arc;

use bson::{doc, Document};
use mongo_bridge::{
    id_to_object_id, Driver, EventBus, ObjectEntityId, RegisterOptions, Repository, ServiceRegistry,
};

fn live_options(database: &str) -> RegisterOptions {
    let url = std::env::var("MONGODB_URL").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
    RegisterOptions::new(url, database, 10, 1)
}

#[tokio::test]
#[ignore] // Only run with --ignored flag when database is available
async fn test_register_reachable_target() {
    let registry = Arc::new(ServiceRegistry::new());
    let events = EventBus::new();

    let hook = Driver::register_in(live_options("bridge_live_test"), Arc::clone(&registry), events);
    assert!(hook().await);

    let driver = Driver::registered_in(&registry).expect("driver registered");
    assert_eq!(driver.database_name(), "bridge_live_test");
    assert!(driver.ping().await);

    assert!(Driver::cleanup_in(&registry).await);
    assert!(Driver::registered_in(&registry).is_none());
}

#[tokio::test]
#[ignore]
async fn test_repository_write_then_read() {
    let driver = Driver::connect(&live_options("bridge_live_test")).await.unwrap();
    let repository = Repository::new(&driver).with_events(EventBus::new());
    let id = ObjectEntityId::new();

    repository
        .write(
            |db| async move {
                db.collection::<Document>("widgets")
                    .insert_one(doc! { "_id": id, "name": "sprocket" })
                    .await?;
                Ok::<(), anyhow::Error>(())
            },
            None,
        )
        .await
        .unwrap();

    let hex = id.to_hex();
    let found = repository
        .read(
            |db| async move {
                let oid = id_to_object_id(hex.as_str())?;
                let found = db
                    .collection::<Document>("widgets")
                    .find_one(doc! { "_id": oid })
                    .await?;
                Ok::<_, anyhow::Error>(found)
            },
            None,
        )
        .await
        .unwrap()
        .expect("document exists");
    assert_eq!(found.get_str("name").unwrap(), "sprocket");

    repository
        .write(
            |db| async move {
                db.collection::<Document>("widgets").drop().await?;
                Ok::<(), anyhow::Error>(())
            },
            None,
        )
        .await
        .unwrap();

    driver.close().await;
}

#[tokio::test]
#[ignore]
async fn test_repository_server_error_is_wrapped() {
    let driver = Driver::connect(&live_options("bridge_live_test")).await.unwrap();
    let events = EventBus::new();
    let mut rx = events.subscribe();
    let repository = Repository::new(&driver).with_events(events);

    let err = repository
        .read(
            |db| async move {
                db.run_command(doc! { "definitelyNotACommand": 1 }).await?;
                Ok::<(), anyhow::Error>(())
            },
            Some("bridge_live_other"),
        )
        .await
        .unwrap_err();

    assert_eq!(err.status().code(), 503);
    assert!(err.downcast_cause::<mongodb::error::Error>().is_some());
    assert!(rx.try_recv().is_ok());

    driver.close().await;
}
