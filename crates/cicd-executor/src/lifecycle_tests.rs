use super::*;
use cicd_core::{CancelToken, ContainerFilter, FakeClock, JobId, JobStep, JobType, RunId, WhenPolicy};
use cicd_testing::{FakeContainerManager, InMemoryRepository};
use parking_lot::Mutex as PMutex;
use std::collections::HashMap;
use std::time::Duration as StdDuration;

struct RecordingSink {
    outcomes: PMutex<Vec<(JobId, JobOutcome)>>,
}

impl RecordingSink {
    fn new() -> Self {
        Self { outcomes: PMutex::new(Vec::new()) }
    }
}

#[async_trait::async_trait]
impl JobResultSink for RecordingSink {
    async fn handle_job_result(&self, job_id: &JobId, outcome: JobOutcome) -> Result<(), CoreError> {
        self.outcomes.lock().push((job_id.clone(), outcome));
        Ok(())
    }
}

fn step(name: &str) -> JobStep {
    JobStep {
        name: name.to_string(),
        commands: vec!["true".to_string()],
        working_dir: None,
        env: HashMap::new(),
        timeout: StdDuration::from_secs(60),
        allow_failure: false,
        when: WhenPolicy::OnSuccess,
    }
}

fn schedule_job_for(job: &Job, clock: &FakeClock) -> ScheduleJob {
    ScheduleJob {
        job_id: job.id.clone(),
        run_id: job.run_id.clone(),
        name: job.name.clone(),
        kind: job.kind,
        priority: job.priority,
        required_labels: job.required_labels.clone(),
        created_at: clock.utc_now(),
        config: job.config.clone(),
        dependencies: job.dependencies.clone(),
        retry_count: job.retry_count,
        max_retries: job.max_retries,
        estimated_duration: None,
        resources: job.resources,
    }
}

/// Waits until the fake container manager has created exactly one
/// container, returning its id. Paused tokio time auto-advances any
/// sleeps in between, so this settles almost immediately.
async fn await_one_container(mgr: &FakeContainerManager) -> String {
    loop {
        let containers = mgr.list(ContainerFilter::default()).await.unwrap();
        if let Some(c) = containers.into_iter().next() {
            return c.id;
        }
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn successful_exit_marks_the_job_success_and_reports_through_the_sink() {
    let repo = Arc::new(InMemoryRepository::new());
    let mgr = Arc::new(FakeContainerManager::new());
    let sink = Arc::new(RecordingSink::new());
    let clock = FakeClock::new();
    let cancel = CancelToken::never();

    let job = Job::new(JobId::new("j1"), RunId::new("r1"), "build", JobType::Build, vec![], vec![step("build")]);
    repo.create_job(job.clone(), &cancel).await.unwrap();
    let schedule_job = schedule_job_for(&job, &clock);

    let executor = Arc::new(Executor::new(ExecutorConfig::default(), repo.clone(), mgr.clone(), sink.clone(), clock));
    let task = tokio::spawn({
        let executor = executor.clone();
        async move { executor.run_job(schedule_job).await }
    });

    let container_id = await_one_container(&mgr).await;
    mgr.mark_exited(&container_id, 0);

    task.await.unwrap().unwrap();

    let stored = repo.get_job(&JobId::new("j1"), &cancel).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Success);
    assert_eq!(stored.exit_code, Some(0));

    let outcomes = sink.outcomes.lock();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].1.status, JobStatus::Success);
}

#[tokio::test(start_paused = true)]
async fn nonzero_exit_marks_the_job_failed() {
    let repo = Arc::new(InMemoryRepository::new());
    let mgr = Arc::new(FakeContainerManager::new());
    let sink = Arc::new(RecordingSink::new());
    let clock = FakeClock::new();
    let cancel = CancelToken::never();

    let job = Job::new(JobId::new("j2"), RunId::new("r1"), "build", JobType::Build, vec![], vec![step("build")]);
    repo.create_job(job.clone(), &cancel).await.unwrap();
    let schedule_job = schedule_job_for(&job, &clock);

    let executor = Arc::new(Executor::new(ExecutorConfig::default(), repo.clone(), mgr.clone(), sink.clone(), clock));
    let task = tokio::spawn({
        let executor = executor.clone();
        async move { executor.run_job(schedule_job).await }
    });

    let container_id = await_one_container(&mgr).await;
    mgr.mark_exited(&container_id, 7);

    task.await.unwrap().unwrap();

    let stored = repo.get_job(&JobId::new("j2"), &cancel).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert_eq!(stored.exit_code, Some(7));
}

#[tokio::test(start_paused = true)]
async fn container_creation_failure_retries_the_job_when_retries_remain() {
    let repo = Arc::new(InMemoryRepository::new());
    let mgr = Arc::new(FakeContainerManager::with_capacity(0));
    let sink = Arc::new(RecordingSink::new());
    let clock = FakeClock::new();
    let cancel = CancelToken::never();

    let job = Job::new(JobId::new("j3"), RunId::new("r1"), "build", JobType::Build, vec![], vec![step("build")]);
    repo.create_job(job.clone(), &cancel).await.unwrap();
    let schedule_job = schedule_job_for(&job, &clock);

    let executor = Executor::new(ExecutorConfig::default(), repo.clone(), mgr, sink, clock);
    let err = executor.run_job(schedule_job).await.unwrap_err();
    assert!(matches!(err, ExecutorError::Core(CoreError::Capacity)));

    let stored = repo.get_job(&JobId::new("j3"), &cancel).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Pending);
    assert_eq!(stored.retry_count, 1);
}

#[tokio::test(start_paused = true)]
async fn cancel_job_stops_the_container_and_marks_the_job_cancelled() {
    let repo = Arc::new(InMemoryRepository::new());
    let mgr = Arc::new(FakeContainerManager::new());
    let sink = Arc::new(RecordingSink::new());
    let clock = FakeClock::new();
    let cancel = CancelToken::never();

    let job = Job::new(JobId::new("j4"), RunId::new("r1"), "build", JobType::Build, vec![], vec![step("build")]);
    repo.create_job(job.clone(), &cancel).await.unwrap();
    let schedule_job = schedule_job_for(&job, &clock);

    let executor = Arc::new(Executor::new(ExecutorConfig::default(), repo.clone(), mgr.clone(), sink, clock));
    let task = tokio::spawn({
        let executor = executor.clone();
        async move { executor.run_job(schedule_job).await }
    });

    await_one_container(&mgr).await;
    executor.cancel_job(&JobId::new("j4")).unwrap();

    task.await.unwrap().unwrap();

    let stored = repo.get_job(&JobId::new("j4"), &cancel).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Cancelled);
}

#[tokio::test]
async fn cancel_job_on_an_unknown_job_is_an_error() {
    let repo = Arc::new(InMemoryRepository::new());
    let mgr = Arc::new(FakeContainerManager::new());
    let sink = Arc::new(RecordingSink::new());
    let executor = Executor::new(ExecutorConfig::default(), repo, mgr, sink, FakeClock::new());
    let err = executor.cancel_job(&JobId::new("ghost")).unwrap_err();
    assert!(matches!(err, ExecutorError::UnknownJob(_)));
}
