//! Services manager for long-lived components.
//!
//! Services register with the manager and are started/stopped together.
//! Start order respects [dependencies](Service::dependencies); a service is only
//! started after all of its dependencies, and services are stopped in reverse.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Health status of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Result of a service health check.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ServiceHealth {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            message: None,
        }
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// A component with an explicit lifecycle.
///
/// Log lifecycle events with [tracing] and a `service = "<name>"` field so
/// logs are filterable.
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Unique name for logging and lookup (e.g. "database", "http").
    fn name(&self) -> &str;

    /// Names of services that must be started before this one.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    async fn start(&self) -> Result<()>;

    async fn stop(&self) -> Result<()>;

    async fn health(&self) -> Result<ServiceHealth> {
        Ok(ServiceHealth::healthy())
    }
}

/// Registry and lifecycle controller for services.
#[derive(Default)]
pub struct ServicesManager {
    services: RwLock<HashMap<String, Arc<dyn Service>>>,
    started: RwLock<HashSet<String>>,
}

impl ServicesManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service. Does not start it. A service with the same name is replaced.
    pub async fn register(&self, service: Arc<dyn Service>) {
        let name = service.name().to_string();
        let mut guard = self.services.write().await;
        if guard.insert(name.clone(), service).is_some() {
            warn!(service = %name, "Service '{}' reregistered, overwriting previous", name);
        } else {
            info!(service = %name, "Service '{}' registered", name);
        }
    }

    /// Topological start order (dependencies first). Errors on unknown deps or cycles.
    async fn start_order(&self) -> Result<Vec<String>> {
        let guard = self.services.read().await;

        // Sorted so that independent services start in a stable order
        let deps: BTreeMap<String, Vec<String>> = guard
            .iter()
            .map(|(name, svc)| (name.clone(), svc.dependencies()))
            .collect();
        drop(guard);

        for (name, d) in &deps {
            for dep in d {
                if !deps.contains_key(dep) {
                    anyhow::bail!("Service {} depends on {} which is not registered", name, dep);
                }
            }
        }

        // Kahn's algorithm
        let mut in_degree: BTreeMap<&str, usize> =
            deps.iter().map(|(name, d)| (name.as_str(), d.len())).collect();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
        for (name, d) in &deps {
            for dep in d {
                dependents.entry(dep.as_str()).or_default().push(name.as_str());
            }
        }

        let mut ready: Vec<&str> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(n, _)| *n)
            .rev()
            .collect();
        let mut order = Vec::with_capacity(deps.len());
        while let Some(n) = ready.pop() {
            order.push(n.to_string());
            for s in dependents.get(n).into_iter().flatten() {
                if let Some(deg) = in_degree.get_mut(s) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.push(*s);
                    }
                }
            }
        }

        if order.len() != deps.len() {
            anyhow::bail!("Service dependency cycle detected");
        }
        Ok(order)
    }

    /// Start all registered services in dependency order. If one fails, the
    /// services already started are stopped in reverse order before the error
    /// is returned.
    pub async fn start_all(&self) -> Result<()> {
        let order = self.start_order().await?;
        for name in &order {
            let svc = self.services.read().await.get(name).cloned();
            if let Some(s) = svc {
                if let Err(e) = s.start().await {
                    warn!(service = %name, error = %e, "Service '{}' start failed", name);
                    if let Err(stop_err) = self.stop_all().await {
                        warn!(error = %stop_err, "Rollback after failed start incomplete");
                    }
                    return Err(e).context(format!("failed to start service {}", name));
                }
                self.started.write().await.insert(name.clone());
                info!(service = %name, "Service '{}' started", name);
            }
        }
        Ok(())
    }

    /// Stop all started services in reverse dependency order. Stop failures are
    /// logged and do not prevent the remaining services from stopping.
    pub async fn stop_all(&self) -> Result<()> {
        let order = self.start_order().await?;
        for name in order.into_iter().rev() {
            if !self.started.read().await.contains(&name) {
                continue;
            }
            let svc = self.services.read().await.get(&name).cloned();
            if let Some(s) = svc {
                if let Err(e) = s.stop().await {
                    warn!(service = %name, error = %e, "Service '{}' stop failed", name);
                } else {
                    info!(service = %name, "Service '{}' stopped", name);
                }
                self.started.write().await.remove(&name);
            }
        }
        Ok(())
    }

    /// Health of every registered service. Services not started, or whose check
    /// errors, are reported unhealthy.
    pub async fn health_all(&self) -> BTreeMap<String, ServiceHealth> {
        let services: Vec<(String, Arc<dyn Service>)> = self
            .services
            .read()
            .await
            .iter()
            .map(|(n, s)| (n.clone(), s.clone()))
            .collect();

        let mut out = BTreeMap::new();
        for (name, svc) in services {
            let health = if !self.is_started(&name).await {
                ServiceHealth::unhealthy("not started")
            } else {
                match svc.health().await {
                    Ok(h) => h,
                    Err(e) => ServiceHealth::unhealthy(e.to_string()),
                }
            };
            out.insert(name, health);
        }
        out
    }

    /// Whether the given service is currently started.
    pub async fn is_started(&self, name: &str) -> bool {
        self.started.read().await.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    use super::*;

    struct Recorder {
        name: String,
        deps: Vec<String>,
        log: Arc<Mutex<Vec<String>>>,
        fail_start: bool,
    }

    impl Recorder {
        fn new(name: &str, deps: &[&str], log: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                deps: deps.iter().map(|d| d.to_string()).collect(),
                log: log.clone(),
                fail_start: false,
            })
        }
    }

    #[async_trait]
    impl Service for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn dependencies(&self) -> Vec<String> {
            self.deps.clone()
        }

        async fn start(&self) -> Result<()> {
            if self.fail_start {
                anyhow::bail!("boom");
            }
            self.log.lock().push(format!("start {}", self.name));
            Ok(())
        }

        async fn stop(&self) -> Result<()> {
            self.log.lock().push(format!("stop {}", self.name));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_start_and_stop_follow_dependencies() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = ServicesManager::new();
        manager.register(Recorder::new("http", &["graphql"], &log)).await;
        manager.register(Recorder::new("graphql", &["database"], &log)).await;
        manager.register(Recorder::new("database", &[], &log)).await;

        manager.start_all().await.unwrap();
        manager.stop_all().await.unwrap();

        assert_eq!(
            *log.lock(),
            vec![
                "start database",
                "start graphql",
                "start http",
                "stop http",
                "stop graphql",
                "stop database",
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_dependency_is_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = ServicesManager::new();
        manager.register(Recorder::new("http", &["missing"], &log)).await;
        assert!(manager.start_all().await.is_err());
    }

    #[tokio::test]
    async fn test_cycle_is_error() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = ServicesManager::new();
        manager.register(Recorder::new("a", &["b"], &log)).await;
        manager.register(Recorder::new("b", &["a"], &log)).await;
        assert!(manager.start_all().await.is_err());
    }

    #[tokio::test]
    async fn test_failed_start_leaves_service_stopped() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = ServicesManager::new();
        manager
            .register(Arc::new(Recorder {
                name: "broken".to_string(),
                deps: vec![],
                log: log.clone(),
                fail_start: true,
            }))
            .await;

        assert!(manager.start_all().await.is_err());
        assert!(!manager.is_started("broken").await);

        let health = manager.health_all().await;
        assert!(!health["broken"].is_healthy());
    }

    #[tokio::test]
    async fn test_failed_start_stops_already_started_services() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let manager = ServicesManager::new();
        manager.register(Recorder::new("database", &[], &log)).await;
        manager.register(Recorder::new("graphql", &["database"], &log)).await;
        manager
            .register(Arc::new(Recorder {
                name: "http".to_string(),
                deps: vec!["graphql".to_string()],
                log: log.clone(),
                fail_start: true,
            }))
            .await;

        assert!(manager.start_all().await.is_err());
        assert_eq!(
            *log.lock(),
            vec![
                "start database",
                "start graphql",
                "stop graphql",
                "stop database",
            ]
        );
        assert!(!manager.is_started("database").await);
        assert!(!manager.is_started("graphql").await);
    }
}
