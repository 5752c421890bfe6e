use super::*;
use cicd_core::{Job, JobId, JobType, Repository, RunId};
use cicd_testing::InMemoryRepository;

fn schedule_job(job_id: &str, deps: Vec<JobId>) -> ScheduleJob {
    ScheduleJob {
        job_id: JobId::new(job_id),
        run_id: RunId::new("run-1"),
        name: "consumer".to_string(),
        kind: JobType::Test,
        priority: 5,
        required_labels: vec![],
        created_at: chrono::Utc::now(),
        config: cicd_core::JobConfig::default(),
        dependencies: deps,
        retry_count: 0,
        max_retries: 3,
        estimated_duration: None,
        resources: cicd_core::ResourceRequest::default(),
    }
}

#[tokio::test]
async fn satisfied_when_every_dependency_succeeded() {
    let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let cancel = CancelToken::never();

    let mut dep = Job::new(JobId::new("dep-1"), RunId::new("run-1"), "a", JobType::Build, vec![], vec![]);
    dep.status = JobStatus::Success;
    repo.create_job(dep, &cancel).await.unwrap();

    let job = schedule_job("job-1", vec![JobId::new("dep-1")]);
    assert!(dependencies_satisfied(&repo, &job, &cancel).await.unwrap());
}

#[tokio::test]
async fn unsatisfied_while_dependency_still_running() {
    let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let cancel = CancelToken::never();

    let dep = Job::new(JobId::new("dep-1"), RunId::new("run-1"), "a", JobType::Build, vec![], vec![]);
    repo.create_job(dep, &cancel).await.unwrap();

    let job = schedule_job("job-1", vec![JobId::new("dep-1")]);
    assert!(!dependencies_satisfied(&repo, &job, &cancel).await.unwrap());
    assert!(!dependencies_permanently_blocked(&repo, &job, &cancel).await.unwrap());
}

#[tokio::test]
async fn permanently_blocked_when_dependency_exhausted_retries() {
    let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let cancel = CancelToken::never();

    let mut dep = Job::new(JobId::new("dep-1"), RunId::new("run-1"), "a", JobType::Build, vec![], vec![]);
    dep.status = JobStatus::Failed;
    dep.retry_count = dep.max_retries;
    repo.create_job(dep, &cancel).await.unwrap();

    let job = schedule_job("job-1", vec![JobId::new("dep-1")]);
    assert!(dependencies_permanently_blocked(&repo, &job, &cancel).await.unwrap());
}

#[tokio::test]
async fn not_blocked_when_dependency_can_still_retry() {
    let repo: Arc<dyn Repository> = Arc::new(InMemoryRepository::new());
    let cancel = CancelToken::never();

    let mut dep = Job::new(JobId::new("dep-1"), RunId::new("run-1"), "a", JobType::Build, vec![], vec![]);
    dep.status = JobStatus::Failed;
    dep.retry_count = 0;
    repo.create_job(dep, &cancel).await.unwrap();

    let job = schedule_job("job-1", vec![JobId::new("dep-1")]);
    assert!(!dependencies_permanently_blocked(&repo, &job, &cancel).await.unwrap());
}
