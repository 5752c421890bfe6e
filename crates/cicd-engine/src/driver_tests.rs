use super::*;
use crate::engine::EngineSink;
use async_trait::async_trait;
use cicd_core::{
    CancelToken, ContainerFilter, CoreError, FakeClock, JobConfig, JobDefinition, JobId,
    JobMessage, JobOutcome, JobResultSink, JobStep, JobType, PipelineDefinition, PipelineId,
    PipelineRun, Repository, ResourceRequest, Runner, RunnerId, RunnerStatus, TriggerKind,
    WhenPolicy,
};
use cicd_executor::{Executor, ExecutorConfig};
use cicd_scheduler::{RunnerDispatch, Scheduler, SchedulerConfig};
use cicd_testing::{FakeContainerManager, FakeStorage, InMemoryRepository};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const POLL: Duration = Duration::from_millis(20);
const MAX_POLLS: usize = 300;

struct NoRunnerDispatch;

#[async_trait]
impl RunnerDispatch for NoRunnerDispatch {
    async fn send_job(&self, _runner_id: &RunnerId, _msg: JobMessage) -> Result<(), CoreError> {
        Err(CoreError::NotConnected)
    }

    async fn cancel_job(&self, _runner_id: &RunnerId, _job_id: &JobId) -> Result<(), CoreError> {
        Ok(())
    }

    async fn online_runners(&self) -> Vec<RunnerId> {
        Vec::new()
    }
}

fn step(name: &str, command: &str) -> JobStep {
    JobStep {
        name: name.to_string(),
        commands: vec![command.to_string()],
        working_dir: None,
        env: HashMap::new(),
        timeout: std::time::Duration::from_secs(60),
        allow_failure: false,
        when: WhenPolicy::OnSuccess,
    }
}

fn job_def(name: &str, depends_on: &[&str]) -> JobDefinition {
    JobDefinition {
        name: name.to_string(),
        kind: JobType::Build,
        depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
        priority: 5,
        required_labels: Vec::new(),
        max_retries: 0,
        resources: ResourceRequest::default(),
        steps: vec![step(name, "true")],
        config: JobConfig::default(),
    }
}

fn new_run() -> PipelineRun {
    PipelineRun::new(
        RunId::generate(),
        PipelineId::new("p1"),
        TriggerKind::Manual,
        "deadbeef",
        None,
        HashMap::new(),
    )
}

struct Harness {
    engine: Arc<Engine<FakeClock>>,
    container_manager: Arc<FakeContainerManager>,
    repository: Arc<InMemoryRepository>,
}

fn build_harness() -> Harness {
    let repository = Arc::new(InMemoryRepository::new());
    let storage = Arc::new(FakeStorage::new());
    let container_manager = Arc::new(FakeContainerManager::new());
    let clock = FakeClock::new();
    let dispatch: Arc<dyn RunnerDispatch> = Arc::new(NoRunnerDispatch);

    let mut scheduler_config = SchedulerConfig::default();
    scheduler_config.worker_count = 2;
    scheduler_config.poll_interval = POLL;

    let engine = Arc::new_cyclic(|weak: &std::sync::Weak<Engine<FakeClock>>| {
        let sink = Arc::new(EngineSink(weak.clone()));
        let executor = Arc::new(Executor::new(
            ExecutorConfig::default(),
            repository.clone(),
            container_manager.clone(),
            sink,
            clock.clone(),
        ));

        let (scheduler, workers) = Scheduler::new(
            scheduler_config,
            repository.clone(),
            dispatch.clone(),
            executor.clone(),
            clock.clone(),
        );

        for (worker, inbox) in workers {
            tokio::spawn(worker.run(inbox, CancelToken::never()));
        }
        tokio::spawn(cicd_scheduler::run_main_loop(scheduler.clone(), CancelToken::never()));

        Engine::new(
            repository.clone(),
            storage,
            scheduler,
            dispatch,
            executor,
            clock,
            CancelToken::never(),
        )
    });

    Harness { engine, container_manager, repository }
}

/// Waits, on the paused virtual clock, until at least one container
/// exists, then marks every such container exited. `tokio::time::sleep`
/// (rather than a busy `yield_now` loop) is what lets paused time
/// auto-advance past the scheduler's own poll-interval timer in between.
async fn let_a_container_finish(mgr: &FakeContainerManager, exit_code: i32) {
    for _ in 0..MAX_POLLS {
        let containers = mgr.list(ContainerFilter::default()).await.unwrap();
        if !containers.is_empty() {
            for c in containers {
                mgr.mark_exited(&c.id, exit_code);
            }
            return;
        }
        tokio::time::sleep(POLL).await;
    }
    panic!("no container appeared in time");
}

async fn await_run_terminal(repository: &InMemoryRepository, run_id: &RunId) -> PipelineRun {
    let cancel = CancelToken::never();
    for _ in 0..MAX_POLLS {
        let run = repository.get_pipeline_run(run_id, &cancel).await.unwrap().unwrap();
        if run.status.is_terminal() {
            return run;
        }
        tokio::time::sleep(POLL).await;
    }
    panic!("run never reached a terminal status");
}

#[tokio::test(start_paused = true)]
async fn a_two_job_pipeline_runs_to_success_in_dependency_order() {
    let harness = build_harness();
    let run = new_run();
    let run_id = run.id.clone();
    let def = PipelineDefinition { jobs: vec![job_def("build", &[]), job_def("test", &["build"])] };

    harness.engine.execute_pipeline(run, def).await.unwrap();

    // "build" has no dependency, it is the only job that can start first.
    let_a_container_finish(&harness.container_manager, 0).await;
    // "test" becomes ready once "build" is Success.
    let_a_container_finish(&harness.container_manager, 0).await;

    let run = await_run_terminal(&harness.repository, &run_id).await;
    assert_eq!(run.status, RunStatus::Success);
}

#[tokio::test(start_paused = true)]
async fn a_failed_job_skips_its_dependent_and_fails_the_run() {
    let harness = build_harness();
    let run = new_run();
    let run_id = run.id.clone();
    let def = PipelineDefinition { jobs: vec![job_def("build", &[]), job_def("test", &["build"])] };

    harness.engine.execute_pipeline(run, def).await.unwrap();
    let_a_container_finish(&harness.container_manager, 1).await;

    let run = await_run_terminal(&harness.repository, &run_id).await;
    assert_eq!(run.status, RunStatus::Failed);

    let cancel = CancelToken::never();
    let jobs = harness.repository.jobs_by_run(&run_id, &cancel).await.unwrap();
    let test_job = jobs.iter().find(|j| j.name == "test").unwrap();
    assert_eq!(test_job.status, JobStatus::Skipped);
}

#[tokio::test(start_paused = true)]
async fn cancelling_a_run_marks_every_non_terminal_job_cancelled() {
    let harness = build_harness();
    let run = new_run();
    let run_id = run.id.clone();
    let def = PipelineDefinition { jobs: vec![job_def("build", &[])] };

    harness.engine.execute_pipeline(run, def).await.unwrap();

    for _ in 0..MAX_POLLS {
        let containers = harness.container_manager.list(ContainerFilter::default()).await.unwrap();
        if !containers.is_empty() {
            break;
        }
        tokio::time::sleep(POLL).await;
    }

    harness.engine.cancel_pipeline(&run_id).await.unwrap();

    let run = await_run_terminal(&harness.repository, &run_id).await;
    assert_eq!(run.status, RunStatus::Cancelled);

    let cancel = CancelToken::never();
    let jobs = harness.repository.jobs_by_run(&run_id, &cancel).await.unwrap();
    assert!(jobs.iter().all(|j| j.status == JobStatus::Cancelled));
}

#[tokio::test]
async fn cancel_pipeline_on_an_unknown_run_is_an_error() {
    let harness = build_harness();
    let err = harness.engine.cancel_pipeline(&RunId::new("ghost")).await.unwrap_err();
    assert!(matches!(err, EngineError::UnknownRun(_)));
}

#[tokio::test]
async fn handle_job_result_is_idempotent_once_a_job_is_terminal() {
    let harness = build_harness();
    let cancel = CancelToken::never();
    let run = new_run();
    let run_id = run.id.clone();
    harness.repository.create_pipeline_run(run, &cancel).await.unwrap();

    let job = Job::new(JobId::new("j1"), run_id, "build", JobType::Build, vec![], vec![step("build", "true")]);
    harness.repository.create_job(job.clone(), &cancel).await.unwrap();

    let outcome = JobOutcome {
        status: JobStatus::Success,
        exit_code: Some(0),
        output: "ok".to_string(),
        started_at: None,
        finished_at: None,
        artifacts: vec!["artifact.tar".to_string()],
        reported_by: None,
    };
    harness.engine.handle_job_result(&job.id, outcome.clone()).await.unwrap();

    let stored = harness.repository.get_job(&job.id, &cancel).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Success);
    assert_eq!(stored.artifact_paths, vec!["artifact.tar".to_string()]);

    // A second report for the same terminal job is a silent no-op.
    let second = JobOutcome { status: JobStatus::Failed, exit_code: Some(1), ..outcome };
    harness.engine.handle_job_result(&job.id, second).await.unwrap();

    let stored = harness.repository.get_job(&job.id, &cancel).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Success);
}

#[tokio::test]
async fn a_job_whose_runner_disappears_is_requeued_while_retries_remain() {
    let harness = build_harness();
    let cancel = CancelToken::never();
    let run = new_run();
    let run_id = run.id.clone();
    harness.repository.create_pipeline_run(run, &cancel).await.unwrap();

    let runner_id = RunnerId::new("r1");
    let mut runner = Runner::new(runner_id.clone(), "default", "runner-1");
    runner.status = RunnerStatus::Offline;
    harness.repository.register_runner(runner, &cancel).await.unwrap();

    let mut job = Job::new(JobId::new("j1"), run_id, "build", JobType::Build, vec![], vec![step("build", "true")]);
    job.max_retries = 1;
    job.start(Some(runner_id.clone()), chrono::Utc::now()).unwrap();
    harness.repository.create_job(job.clone(), &cancel).await.unwrap();

    let jobs = harness.repository.jobs_by_run(&job.run_id, &cancel).await.unwrap();
    let handle = RunHandle {
        notify: Arc::new(tokio::sync::Notify::new()),
        cancel_tx: tokio::sync::watch::channel(false).0,
        submitted: parking_lot::Mutex::new(std::collections::HashSet::from([job.id.clone()])),
    };
    reap_jobs_on_lost_runners(&harness.engine, &jobs, &handle, &cancel).await.unwrap();

    let stored = harness.repository.get_job(&job.id, &cancel).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Pending);
    assert_eq!(stored.retry_count, 1);
    assert!(stored.assigned_runner.is_none());
    assert!(!handle.submitted.lock().contains(&job.id));
}

#[tokio::test]
async fn a_job_whose_runner_disappears_fails_once_retries_are_exhausted() {
    let harness = build_harness();
    let cancel = CancelToken::never();
    let run = new_run();
    let run_id = run.id.clone();
    harness.repository.create_pipeline_run(run, &cancel).await.unwrap();

    let runner_id = RunnerId::new("r1");
    // Runner was never registered at all: also treated as lost.
    let mut job = Job::new(JobId::new("j1"), run_id, "build", JobType::Build, vec![], vec![step("build", "true")]);
    job.max_retries = 0;
    job.start(Some(runner_id), chrono::Utc::now()).unwrap();
    harness.repository.create_job(job.clone(), &cancel).await.unwrap();

    let jobs = harness.repository.jobs_by_run(&job.run_id, &cancel).await.unwrap();
    let handle = RunHandle {
        notify: Arc::new(tokio::sync::Notify::new()),
        cancel_tx: tokio::sync::watch::channel(false).0,
        submitted: parking_lot::Mutex::new(std::collections::HashSet::new()),
    };
    reap_jobs_on_lost_runners(&harness.engine, &jobs, &handle, &cancel).await.unwrap();

    let stored = harness.repository.get_job(&job.id, &cancel).await.unwrap().unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
}
