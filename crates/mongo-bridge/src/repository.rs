//! Repository helper running read/write callbacks against a database handle
//!
//! Every failure raised by a callback reaches the caller as a
//! [`DatabaseError`]. Failures caused by the MongoDB client are additionally
//! published as an [`ErrorEvent`].
//!
//! # Example
//!
//! ```rust,no_run
//! use bson::{doc, Document};
//! use mongo_bridge::{Driver, Repository};
//!
//! # async fn example() -> Result<(), mongo_bridge::DatabaseError> {
//! let driver = Driver::registered().expect("driver registered at startup");
//! let repository = Repository::new(&driver);
//!
//! let user = repository
//!     .read(
//!         |db| async move {
//!             let users = db.collection::<Document>("users");
//!             let user = users.find_one(doc! { "email": "ada@example.com" }).await?;
//!             Ok::<_, anyhow::Error>(user)
//!         },
//!         None,
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;

use mongodb::Database;

use crate::driver::Driver;
use crate::events::{ErrorEvent, EventBus};
use crate::sanitize::redact_connection_string;
use crate::DatabaseError;

/// Executes callbacks against databases of a borrowed [`Driver`]
#[derive(Debug, Clone)]
pub struct Repository<'a> {
    driver: &'a Driver,
    events: EventBus,
}

impl<'a> Repository<'a> {
    /// Create a repository publishing errors on the process-wide bus
    pub fn new(driver: &'a Driver) -> Self {
        Self {
            driver,
            events: EventBus::global(),
        }
    }

    /// Publish error events on `events` instead of the process-wide bus
    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn driver(&self) -> &'a Driver {
        self.driver
    }

    /// Read from the database
    ///
    /// `database` selects a database other than the driver's default. The
    /// handle given to `context` is only meant to be used until the returned
    /// future completes.
    pub async fn read<T, F, Fut>(&self, context: F, database: Option<&str>) -> Result<T, DatabaseError>
    where
        F: FnOnce(Database) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        self.raw(context, database).await
    }

    /// Write to the database
    ///
    /// Same execution as [`Repository::read`]; no extra isolation is applied.
    pub async fn write<T, F, Fut>(&self, context: F, database: Option<&str>) -> Result<T, DatabaseError>
    where
        F: FnOnce(Database) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        self.raw(context, database).await
    }

    async fn raw<T, F, Fut>(&self, context: F, database: Option<&str>) -> Result<T, DatabaseError>
    where
        F: FnOnce(Database) -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let db = match database {
            Some(name) => self.driver.use_database(name),
            None => self.driver.database(),
        };
        let db_name = db.name().to_string();

        match context(db).await {
            Ok(value) => Ok(value),
            Err(error) => {
                tracing::error!(
                    database = %db_name,
                    error = %redact_connection_string(&format!("{:#}", error)),
                    "Query failed"
                );

                if let Some(client_error) = client_error(&error) {
                    ErrorEvent::publish(&self.events, client_error.clone());
                }

                Err(DatabaseError::new(error))
            }
        }
    }
}

/// Finds a MongoDB client error anywhere in the error chain
fn client_error(error: &anyhow::Error) -> Option<&mongodb::error::Error> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<mongodb::error::Error>())
}
