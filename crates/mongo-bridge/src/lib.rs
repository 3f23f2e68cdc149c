//! MongoDB integration layer for mongo-bridge
//!
//! This crate wires an application to MongoDB without hiding the client:
//!
//! # Features
//! - Deferred driver registration gated by a ping health check
//! - Process-wide service registry (or explicit registries for injection)
//! - Repository helper that turns every callback failure into a `DatabaseError`
//! - Error events published on an in-process bus for observability
//! - ObjectId identifier adapters and input validation

pub mod bootstrap;
pub mod config;
pub mod driver;
pub mod entity_id;
pub mod events;
pub mod registry;
pub mod repository;
pub mod sanitize;
pub mod schema;

pub use bootstrap::{Bootstrap, BootstrapReport};
pub use config::RegisterOptions;
pub use driver::{Driver, RegisterHook, DRIVER_KEY};
pub use entity_id::{id_to_object_id, IdRef, ObjectEntityId};
pub use events::{ErrorEvent, Event, EventBus};
pub use mongo_bridge_common::{BridgeError, DatabaseError, HttpStatus, Result};
pub use registry::ServiceRegistry;
pub use repository::Repository;
pub use schema::ObjectIdSchema;
