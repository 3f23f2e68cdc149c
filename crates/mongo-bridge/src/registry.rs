//! Named service registry
//!
//! Long-lived services (the driver, mostly) are stored under a string key and
//! resolved by type. A process-wide instance is available through
//! [`ServiceRegistry::global`]; tests and applications that prefer explicit
//! wiring can create their own and pass it around.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

type Service = Arc<dyn Any + Send + Sync>;

static GLOBAL_REGISTRY: Lazy<Arc<ServiceRegistry>> = Lazy::new(|| Arc::new(ServiceRegistry::new()));

/// Key-value store of shared services
#[derive(Default)]
pub struct ServiceRegistry {
    services: RwLock<HashMap<String, Service>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry
    pub fn global() -> Arc<ServiceRegistry> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    /// Store `service` under `key`, replacing any previous entry
    pub fn register<T>(&self, key: impl Into<String>, service: Arc<T>)
    where
        T: Any + Send + Sync,
    {
        let key = key.into();
        if self.services.write().insert(key.clone(), service).is_some() {
            tracing::debug!(service = %key, "Replaced registered service");
        }
    }

    /// Resolve the service stored under `key`
    ///
    /// Returns `None` if nothing is registered or the entry is not a `T`.
    pub fn get<T>(&self, key: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let service = self.services.read().get(key).cloned()?;
        service.downcast::<T>().ok()
    }

    /// Remove and return the service stored under `key`
    pub fn remove<T>(&self, key: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        let mut services = self.services.write();
        let is_t = services.get(key).map(|s| s.is::<T>()).unwrap_or(false);
        if !is_t {
            return None;
        }
        services.remove(key)?.downcast::<T>().ok()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.services.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.services.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let services = self.services.read();
        let mut keys: Vec<&String> = services.keys().collect();
        keys.sort();
        f.debug_struct("ServiceRegistry").field("services", &keys).finish()
    }
}
