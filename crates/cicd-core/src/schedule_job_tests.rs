use super::*;

#[test]
fn clone_preserves_all_fields() {
    let job = ScheduleJob {
        job_id: JobId::new("job-1"),
        run_id: RunId::new("run-1"),
        name: "build".to_string(),
        kind: JobType::Build,
        priority: 7,
        required_labels: vec!["linux".to_string()],
        created_at: Utc::now(),
        config: JobConfig::default(),
        dependencies: vec![JobId::new("job-0")],
        retry_count: 1,
        max_retries: 3,
        estimated_duration: Some(std::time::Duration::from_secs(60)),
        resources: ResourceRequest::default(),
    };

    let cloned = job.clone();
    assert_eq!(cloned.job_id, job.job_id);
    assert_eq!(cloned.priority, job.priority);
    assert_eq!(cloned.dependencies, job.dependencies);
}
