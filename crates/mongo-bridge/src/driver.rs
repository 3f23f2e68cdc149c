//! MongoDB driver lifecycle: connect, health check, registration and cleanup
//!
//! A `Driver` owns the pooled client and the default database name. It is
//! normally created by the deferred hook returned from [`Driver::register`],
//! which only stores the driver in the service registry once the server has
//! answered a ping.

use std::sync::Arc;

use bson::doc;
use futures::future::{BoxFuture, FutureExt};
use mongodb::{options::ClientOptions, Client, Database};

use crate::config::RegisterOptions;
use crate::events::{ErrorEvent, EventBus};
use crate::registry::ServiceRegistry;
use crate::sanitize::redact_connection_string;
use crate::Result;

/// Registry key the driver is stored under
pub const DRIVER_KEY: &str = "MongoDBDriver";

/// Deferred registration; resolves to `true` once the driver is registered
pub type RegisterHook = Box<dyn Fn() -> BoxFuture<'static, bool> + Send + Sync>;

/// MongoDB connection owner
#[derive(Debug, Clone)]
pub struct Driver {
    client: Client,
    database: String,
}

impl Driver {
    /// Wrap an existing client
    pub fn new(client: Client, database: impl Into<String>) -> Self {
        Self {
            client,
            database: database.into(),
        }
    }

    /// Build a client from `options`
    ///
    /// No network round-trip happens here; use [`Driver::ping`] to check the
    /// server is reachable.
    pub async fn connect(options: &RegisterOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::open(options).await?)
    }

    async fn open(options: &RegisterOptions) -> mongodb::error::Result<Self> {
        let mut client_options = ClientOptions::parse(options.url.as_str()).await?;

        client_options.connect_timeout = Some(options.connect_timeout());
        // The Rust client has no socket timeout; bound server selection instead
        client_options.server_selection_timeout = Some(options.socket_timeout());
        client_options.max_pool_size = Some(options.max_poll);
        client_options.min_pool_size = Some(options.min_poll);
        if let Some(app) = &options.app_name {
            client_options.app_name = Some(app.clone());
        }

        let client = Client::with_options(client_options)?;
        Ok(Self::new(client, options.database.clone()))
    }

    /// Get the default database name
    pub fn database_name(&self) -> &str {
        &self.database
    }

    /// Get a reference to the client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Get a handle to the default database
    pub fn database(&self) -> Database {
        self.client.database(&self.database)
    }

    /// Get a handle to a different database on the same client
    pub fn use_database(&self, name: &str) -> Database {
        self.client.database(name)
    }

    /// Run `{ ping: 1 }` against the default database
    pub async fn try_ping(&self) -> mongodb::error::Result<()> {
        self.database().run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    /// Check if the server is reachable; failures are swallowed
    pub async fn ping(&self) -> bool {
        match self.try_ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(database = %self.database, error = %e, "Ping failed");
                false
            }
        }
    }

    /// Close the client. Operations issued afterwards are not supported.
    pub async fn close(&self) {
        self.client.clone().shutdown().await;
    }

    /// Deferred registration into the process-wide registry
    pub fn register(options: RegisterOptions) -> RegisterHook {
        Self::register_in(options, ServiceRegistry::global(), EventBus::global())
    }

    /// Deferred registration into `registry`, publishing failures on `events`
    ///
    /// The hook never fails: connection problems are logged, published as an
    /// [`ErrorEvent`] and reported as `false`.
    pub fn register_in(
        options: RegisterOptions,
        registry: Arc<ServiceRegistry>,
        events: EventBus,
    ) -> RegisterHook {
        Box::new(move || {
            let options = options.clone();
            let registry = Arc::clone(&registry);
            let events = events.clone();
            async move { Self::register_now(&options, &registry, &events).await }.boxed()
        })
    }

    async fn register_now(options: &RegisterOptions, registry: &ServiceRegistry, events: &EventBus) -> bool {
        let attempt = async {
            let driver = Self::open(options).await?;
            driver.try_ping().await?;
            Ok::<_, mongodb::error::Error>(driver)
        };

        match attempt.await {
            Ok(driver) => {
                tracing::info!(database = %driver.database_name(), "MongoDB is available");
                registry.register(DRIVER_KEY, Arc::new(driver));
                true
            }
            Err(e) => {
                tracing::warn!(
                    url = %redact_connection_string(&options.url),
                    error = %redact_connection_string(&e.to_string()),
                    "MongoDB is unavailable"
                );
                ErrorEvent::publish(events, e);
                false
            }
        }
    }

    /// Close the driver registered in the process-wide registry, if any
    pub async fn cleanup() -> bool {
        Self::cleanup_in(&ServiceRegistry::global()).await
    }

    /// Close and unregister the driver stored in `registry`, if any
    ///
    /// Always returns `true`; a missing driver is not an error.
    pub async fn cleanup_in(registry: &ServiceRegistry) -> bool {
        if let Some(driver) = registry.remove::<Driver>(DRIVER_KEY) {
            driver.close().await;
            tracing::debug!(database = %driver.database_name(), "MongoDB connection closed");
        }
        true
    }

    /// Driver stored in the process-wide registry
    pub fn registered() -> Option<Arc<Driver>> {
        Self::registered_in(&ServiceRegistry::global())
    }

    pub fn registered_in(registry: &ServiceRegistry) -> Option<Arc<Driver>> {
        registry.get::<Driver>(DRIVER_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Nothing listens on port 1; short timeouts keep the tests fast
    fn unreachable_options() -> RegisterOptions {
        RegisterOptions::new("mongodb://127.0.0.1:1", "bridge_test", 4, 0)
            .with_timeouts(Duration::from_millis(200), Duration::from_millis(300))
    }

    #[tokio::test]
    async fn test_connect_is_lazy() {
        let driver = Driver::connect(&unreachable_options()).await.unwrap();
        assert_eq!(driver.database_name(), "bridge_test");
        assert_eq!(driver.database().name(), "bridge_test");
        assert_eq!(driver.use_database("other").name(), "other");
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_url() {
        let options = RegisterOptions::new("not-a-mongodb-url", "bridge_test", 4, 0);
        let err = Driver::connect(&options).await.unwrap_err();
        assert!(err.as_mongodb().is_some());
    }

    #[tokio::test]
    async fn test_ping_unreachable_returns_false() {
        let driver = Driver::connect(&unreachable_options()).await.unwrap();
        assert!(!driver.ping().await);
        assert!(driver.try_ping().await.is_err());
    }

    #[tokio::test]
    async fn test_register_unreachable_returns_false_and_publishes() {
        let registry = Arc::new(ServiceRegistry::new());
        let events = EventBus::new();
        let mut rx = events.subscribe();

        let hook = Driver::register_in(unreachable_options(), Arc::clone(&registry), events.clone());
        assert!(!hook().await);

        assert!(Driver::registered_in(&registry).is_none());
        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), ErrorEvent::NAME);
        assert!(ErrorEvent::from_event(event.as_ref()).is_some());
    }

    #[tokio::test]
    async fn test_register_invalid_url_returns_false() {
        let registry = Arc::new(ServiceRegistry::new());
        let events = EventBus::new();
        let mut rx = events.subscribe();
        let options = RegisterOptions::new("not-a-mongodb-url", "bridge_test", 4, 0);

        let hook = Driver::register_in(options, Arc::clone(&registry), events);
        assert!(!hook().await);
        assert!(registry.is_empty());
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_connect_validates_options() {
        let options = RegisterOptions::new("mongodb://127.0.0.1:1", "", 4, 0);
        let err = Driver::connect(&options).await.unwrap_err();
        assert!(matches!(err, crate::BridgeError::Configuration(_)));
    }

    #[test]
    fn test_cleanup_without_driver() {
        let registry = ServiceRegistry::new();
        assert!(tokio_test::block_on(Driver::cleanup_in(&registry)));
        assert!(tokio_test::block_on(Driver::cleanup_in(&registry)));
    }

    #[tokio::test]
    async fn test_cleanup_closes_and_unregisters() {
        let registry = ServiceRegistry::new();
        let driver = Driver::connect(&unreachable_options()).await.unwrap();
        registry.register(DRIVER_KEY, Arc::new(driver));
        assert!(Driver::registered_in(&registry).is_some());

        assert!(Driver::cleanup_in(&registry).await);
        assert!(Driver::registered_in(&registry).is_none());
    }
}
