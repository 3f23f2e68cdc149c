//! Startup sequencing for service registrations
//!
//! Registration hooks (such as the one returned by `Driver::register`) all
//! share the same shape: a deferred async call resolving to a success flag.
//! `Bootstrap` runs them in order, collects the failures and runs cleanup
//! hooks in reverse order on shutdown.
//!
//! ```rust,no_run
//! use mongo_bridge::{Bootstrap, Driver, RegisterOptions};
//!
//! # async fn example() {
//! let mut bootstrap = Bootstrap::new();
//! bootstrap.register(
//!     "mongodb",
//!     Driver::register(RegisterOptions::new("mongodb://localhost:27017", "app", 20, 5)),
//! );
//! bootstrap.on_cleanup("mongodb", Driver::cleanup);
//!
//! let report = bootstrap.startup().await;
//! if !report.is_ok() {
//!     eprintln!("unavailable services: {:?}", report.failed());
//! }
//!
//! // ... application runs ...
//!
//! bootstrap.shutdown().await;
//! # }
//! ```

use std::future::Future;

use futures::future::{BoxFuture, FutureExt};

use crate::driver::RegisterHook;

/// Boxed async cleanup hook (best effort)
pub type CleanupHook = Box<dyn Fn() -> BoxFuture<'static, bool> + Send + Sync>;

/// Outcome of [`Bootstrap::startup`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    registered: Vec<String>,
    failed: Vec<String>,
}

impl BootstrapReport {
    /// True when every registration succeeded
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn registered(&self) -> &[String] {
        &self.registered
    }

    pub fn failed(&self) -> &[String] {
        &self.failed
    }
}

/// Ordered collection of registration and cleanup hooks
#[derive(Default)]
pub struct Bootstrap {
    registrations: Vec<(String, RegisterHook)>,
    cleanups: Vec<(String, CleanupHook)>,
}

impl Bootstrap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a registration hook; hooks run in the order they are added
    pub fn register(&mut self, name: impl Into<String>, hook: RegisterHook) -> &mut Self {
        self.registrations.push((name.into(), hook));
        self
    }

    /// Add a cleanup hook; hooks run in reverse order on shutdown
    pub fn on_cleanup<F, Fut>(&mut self, name: impl Into<String>, hook: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.cleanups
            .push((name.into(), Box::new(move || hook().boxed())));
        self
    }

    /// Run every registration hook
    ///
    /// A failed registration does not stop the following ones.
    pub async fn startup(&self) -> BootstrapReport {
        let mut report = BootstrapReport::default();

        for (name, hook) in &self.registrations {
            tracing::info!(service = %name, "Registering service");

            if hook().await {
                tracing::debug!(service = %name, "Service registered");
                report.registered.push(name.clone());
            } else {
                tracing::warn!(service = %name, "Service registration failed");
                report.failed.push(name.clone());
            }
        }

        report
    }

    /// Run every cleanup hook, last added first
    pub async fn shutdown(&self) {
        for (name, hook) in self.cleanups.iter().rev() {
            tracing::info!(service = %name, "Cleaning up service");

            if !hook().await {
                tracing::warn!(service = %name, "Service cleanup reported failure");
            }
        }
    }

    pub fn registration_count(&self) -> usize {
        self.registrations.len()
    }

    pub fn cleanup_count(&self) -> usize {
        self.cleanups.len()
    }
}

impl std::fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrap")
            .field("registrations", &self.registrations.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .field("cleanups", &self.cleanups.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}
