// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! In-memory `ContainerManager` fake.

use async_trait::async_trait;
use cicd_core::{
    Container, ContainerConfig, ContainerFilter, ContainerManager, ContainerStats,
    ContainerStatus, CoreError,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Default)]
pub struct FakeContainerManager {
    containers: Mutex<HashMap<String, Container>>,
    next_id: Mutex<u64>,
    /// When set, `create_container` beyond this count fails with `Capacity`.
    pub max_containers: Option<usize>,
}

impl FakeContainerManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(max_containers: usize) -> Self {
        Self {
            max_containers: Some(max_containers),
            ..Self::default()
        }
    }

    /// Test hook: force a container straight to `Exited` with the given code.
    pub fn mark_exited(&self, id: &str, exit_code: i32) {
        if let Some(c) = self.containers.lock().get_mut(id) {
            c.status = ContainerStatus::Exited;
            c.exit_code = Some(exit_code);
        }
    }

    pub fn count(&self) -> usize {
        self.containers.lock().len()
    }
}

#[async_trait]
impl ContainerManager for FakeContainerManager {
    async fn create_container(&self, config: ContainerConfig) -> Result<Container, CoreError> {
        if let Some(max) = self.max_containers {
            if self.containers.lock().len() >= max {
                return Err(CoreError::Capacity);
            }
        }
        let mut next_id = self.next_id.lock();
        *next_id += 1;
        let id = format!("fake-container-{}", *next_id);
        let container = Container {
            id: id.clone(),
            name: config.name,
            status: ContainerStatus::Created,
            exit_code: None,
        };
        self.containers.lock().insert(id, container.clone());
        Ok(container)
    }

    async fn start(&self, id: &str) -> Result<(), CoreError> {
        let mut containers = self.containers.lock();
        let container = containers
            .get_mut(id)
            .ok_or_else(|| CoreError::Infra(format!("no such container: {id}")))?;
        container.status = ContainerStatus::Running;
        Ok(())
    }

    async fn stop(&self, id: &str, _timeout: Duration) -> Result<(), CoreError> {
        let mut containers = self.containers.lock();
        let container = containers
            .get_mut(id)
            .ok_or_else(|| CoreError::Infra(format!("no such container: {id}")))?;
        container.status = ContainerStatus::Exited;
        Ok(())
    }

    async fn remove(&self, id: &str, _force: bool) -> Result<(), CoreError> {
        self.containers.lock().remove(id);
        Ok(())
    }

    async fn restart(&self, id: &str) -> Result<(), CoreError> {
        self.start(id).await
    }

    async fn inspect(&self, id: &str) -> Result<Container, CoreError> {
        self.containers
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::Infra(format!("no such container: {id}")))
    }

    async fn list(&self, filter: ContainerFilter) -> Result<Vec<Container>, CoreError> {
        Ok(self
            .containers
            .lock()
            .values()
            .filter(|c| {
                filter
                    .name_prefix
                    .as_ref()
                    .map(|p| c.name.starts_with(p))
                    .unwrap_or(true)
                    && filter.status.map(|s| c.status == s).unwrap_or(true)
            })
            .cloned()
            .collect())
    }

    async fn stats(&self, id: &str) -> Result<ContainerStats, CoreError> {
        if self.containers.lock().contains_key(id) {
            Ok(ContainerStats::default())
        } else {
            Err(CoreError::Infra(format!("no such container: {id}")))
        }
    }

    async fn system_prune(&self) -> Result<(), CoreError> {
        self.containers
            .lock()
            .retain(|_, c| c.status != ContainerStatus::Exited);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: &str) -> ContainerConfig {
        ContainerConfig {
            name: name.to_string(),
            image: "ubuntu:20.04".to_string(),
            command: vec![],
            env: HashMap::new(),
            volumes: vec![],
            cpu_limit: 1.0,
            memory_limit_bytes: 0,
            disk_limit_bytes: 0,
            security: Default::default(),
            health_check: Default::default(),
            restart_policy: "no".to_string(),
            auto_remove: false,
        }
    }

    #[tokio::test]
    async fn create_beyond_capacity_fails() {
        let mgr = FakeContainerManager::with_capacity(1);
        mgr.create_container(config("a")).await.unwrap();
        let err = mgr.create_container(config("b")).await;
        assert!(matches!(err, Err(CoreError::Capacity)));
    }

    #[tokio::test]
    async fn system_prune_removes_only_exited_containers() {
        let mgr = FakeContainerManager::new();
        let c1 = mgr.create_container(config("a")).await.unwrap();
        let c2 = mgr.create_container(config("b")).await.unwrap();
        mgr.mark_exited(&c1.id, 0);

        mgr.system_prune().await.unwrap();
        assert_eq!(mgr.count(), 1);
        assert!(mgr.inspect(&c2.id).await.is_ok());
    }
}
