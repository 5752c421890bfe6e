use super::*;
use cicd_core::{JobId, JobStep, JobType, RunId, WhenPolicy};
use std::collections::HashMap;
use std::time::Duration;

fn step(name: &str, commands: &[&str]) -> JobStep {
    JobStep {
        name: name.to_string(),
        commands: commands.iter().map(|s| s.to_string()).collect(),
        working_dir: None,
        env: HashMap::new(),
        timeout: Duration::from_secs(60),
        allow_failure: false,
        when: WhenPolicy::OnSuccess,
    }
}

fn job(steps: Vec<JobStep>) -> Job {
    Job::new(JobId::new("j1"), RunId::new("r1"), "build", JobType::Build, vec![], steps)
}

#[test]
fn image_defaults_to_ubuntu_when_the_job_declares_none() {
    let j = job(vec![]);
    let cfg = build_container_config(&j, &ExecutorConfig::default());
    assert_eq!(cfg.image, "ubuntu:20.04");
}

#[test]
fn declared_image_overrides_the_default() {
    let mut j = job(vec![]);
    j.config.image = Some("rust:1.75".to_string());
    let cfg = build_container_config(&j, &ExecutorConfig::default());
    assert_eq!(cfg.image, "rust:1.75");
}

#[test]
fn script_runs_under_set_dash_e_with_a_banner_per_step() {
    let j = job(vec![step("build", &["cargo build"]), step("test", &["cargo test"])]);
    let cfg = build_container_config(&j, &ExecutorConfig::default());
    assert_eq!(cfg.command[0], "/bin/bash");
    assert_eq!(cfg.command[1], "-c");
    let script = &cfg.command[2];
    assert!(script.starts_with("set -e\n"));
    assert!(script.contains("--- step: build ---"));
    assert!(script.contains("cargo build"));
    assert!(script.contains("--- step: test ---"));
    assert!(script.contains("cargo test"));
}

#[test]
fn base_env_carries_job_identity_and_run_id() {
    let j = job(vec![]);
    let cfg = build_container_config(&j, &ExecutorConfig::default());
    assert_eq!(cfg.env.get("JOB_ID").unwrap(), "j1");
    assert_eq!(cfg.env.get("PIPELINE_RUN_ID").unwrap(), "r1");
    assert_eq!(cfg.env.get("HOME").unwrap(), "/workspace");
}

#[test]
fn declared_environment_overlays_the_base_env() {
    let mut j = job(vec![]);
    j.config.environment.insert("HOME".to_string(), "/custom".to_string());
    j.config.environment.insert("FOO".to_string(), "bar".to_string());
    let cfg = build_container_config(&j, &ExecutorConfig::default());
    assert_eq!(cfg.env.get("HOME").unwrap(), "/custom");
    assert_eq!(cfg.env.get("FOO").unwrap(), "bar");
}

#[test]
fn volumes_include_workspace_and_cache_plus_declared_mounts() {
    let mut j = job(vec![]);
    j.config.volumes.push(("/host/extra".to_string(), "/extra".to_string()));
    let cfg = build_container_config(&j, &ExecutorConfig::default());
    assert_eq!(cfg.volumes[0], (workspace_dir(&j), "/workspace".to_string()));
    assert_eq!(cfg.volumes[1], (cache_dir(&j), "/cache".to_string()));
    assert_eq!(cfg.volumes[2], ("/host/extra".to_string(), "/extra".to_string()));
}

#[test]
fn resource_limits_fall_back_to_executor_defaults() {
    let j = job(vec![]);
    let config = ExecutorConfig::default();
    let cfg = build_container_config(&j, &config);
    assert_eq!(cfg.cpu_limit, config.default_cpu_limit);
    assert_eq!(cfg.memory_limit_bytes, config.default_memory_limit_bytes);
    assert_eq!(cfg.disk_limit_bytes, config.default_disk_limit_bytes);
}

#[test]
fn declared_resource_limits_override_the_defaults() {
    let mut j = job(vec![]);
    j.config.cpu_limit = Some(2.5);
    j.config.memory_limit = Some(1024);
    let cfg = build_container_config(&j, &ExecutorConfig::default());
    assert_eq!(cfg.cpu_limit, 2.5);
    assert_eq!(cfg.memory_limit_bytes, 1024);
}

#[test]
fn security_defaults_to_non_root_and_not_privileged() {
    let j = job(vec![]);
    let cfg = build_container_config(&j, &ExecutorConfig::default());
    assert_eq!(cfg.security.uid, 1000);
    assert_eq!(cfg.security.gid, 1000);
    assert!(cfg.security.no_new_privileges);
    assert!(!cfg.security.privileged);
    assert!(!cfg.security.read_only_rootfs);
}

#[test]
fn read_only_rootfs_is_threaded_through_from_job_config() {
    let mut j = job(vec![]);
    j.config.read_only_rootfs = true;
    let cfg = build_container_config(&j, &ExecutorConfig::default());
    assert!(cfg.security.read_only_rootfs);
}

#[test]
fn restart_policy_is_never_and_auto_remove_is_off() {
    let j = job(vec![]);
    let cfg = build_container_config(&j, &ExecutorConfig::default());
    assert_eq!(cfg.restart_policy, "no");
    assert!(!cfg.auto_remove);
}
