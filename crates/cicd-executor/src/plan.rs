// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! Container plan construction: turns a persisted [`Job`] into the
//! `ContainerConfig` the `ContainerManager` creates. Pure and synchronous
//! on purpose, so the rules can be unit-tested without a container
//! runtime.

use crate::config::ExecutorConfig;
use cicd_core::{ContainerConfig, HealthCheckConfig, Job, SecurityConfig};

const DEFAULT_IMAGE: &str = "ubuntu:20.04";
const WORKSPACE_ROOT: &str = "/tmp/cicd-workspaces";
const CACHE_ROOT: &str = "/tmp/cicd-cache";

/// Host-side workspace directory for a job's container mount.
pub fn workspace_dir(job: &Job) -> String {
    format!("{WORKSPACE_ROOT}/job-{}", job.id)
}

/// Host-side cache directory for a job's container mount.
pub fn cache_dir(job: &Job) -> String {
    format!("{CACHE_ROOT}/job-{}", job.id)
}

/// Builds the `/bin/bash -c` script that runs every step in order, stopping
/// at the first failing command (`set -e`) and banner-echoing each step's
/// name so the combined log output stays readable.
fn build_script(job: &Job) -> String {
    let mut lines = vec!["set -e".to_string()];
    for step in &job.steps {
        lines.push(format!("echo '--- step: {} ---'", step.name));
        lines.extend(step.commands.iter().cloned());
    }
    lines.join("\n")
}

fn build_env(job: &Job) -> std::collections::HashMap<String, String> {
    let mut env = std::collections::HashMap::new();
    env.insert("HOME".to_string(), "/workspace".to_string());
    env.insert("PATH".to_string(), "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin".to_string());
    env.insert("JOB_ID".to_string(), job.id.to_string());
    env.insert("JOB_NAME".to_string(), job.name.clone());
    env.insert("PIPELINE_RUN_ID".to_string(), job.run_id.to_string());
    env.extend(job.config.environment.clone());
    env
}

fn build_volumes(job: &Job) -> Vec<(String, String)> {
    let mut volumes = vec![
        (workspace_dir(job), "/workspace".to_string()),
        (cache_dir(job), "/cache".to_string()),
    ];
    volumes.extend(job.config.volumes.clone());
    volumes
}

/// Builds the full container creation request for `job`, applying the
/// executor's configured defaults wherever the job itself declares none.
pub fn build_container_config(job: &Job, config: &ExecutorConfig) -> ContainerConfig {
    ContainerConfig {
        name: format!("cicd-job-{}", job.id),
        image: job.config.image.clone().unwrap_or_else(|| DEFAULT_IMAGE.to_string()),
        command: vec!["/bin/bash".to_string(), "-c".to_string(), build_script(job)],
        env: build_env(job),
        volumes: build_volumes(job),
        cpu_limit: job.config.cpu_limit.unwrap_or(config.default_cpu_limit),
        memory_limit_bytes: job.config.memory_limit.unwrap_or(config.default_memory_limit_bytes),
        disk_limit_bytes: config.default_disk_limit_bytes,
        security: SecurityConfig {
            read_only_rootfs: job.config.read_only_rootfs,
            ..SecurityConfig::default()
        },
        health_check: HealthCheckConfig::default(),
        restart_policy: "no".to_string(),
        auto_remove: false,
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
