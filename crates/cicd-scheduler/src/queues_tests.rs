use super::*;
use cicd_core::{JobConfig, JobId, JobType, ResourceRequest, RunId};

fn job(priority: u8) -> ScheduleJob {
    ScheduleJob {
        job_id: JobId::generate(),
        run_id: RunId::new("run-1"),
        name: "build".to_string(),
        kind: JobType::Build,
        priority,
        required_labels: vec![],
        created_at: chrono::Utc::now(),
        config: JobConfig::default(),
        dependencies: vec![],
        retry_count: 0,
        max_retries: 3,
        estimated_duration: None,
        resources: ResourceRequest::default(),
    }
}

#[test]
fn bounded_queue_rejects_beyond_capacity() {
    let mut q: BoundedQueue<i32> = BoundedQueue::new(2);
    q.push_back(1).unwrap();
    q.push_back(2).unwrap();
    assert!(matches!(q.push_back(3), Err(CoreError::QueueFull)));
}

#[test]
fn pop_highest_priority_drains_ten_down_to_one() {
    let mut set = QueueSet::new(1000);
    for p in [1u8, 10, 5, 10, 9] {
        set.push_priority(job(p)).unwrap();
    }

    let order: Vec<u8> = std::iter::from_fn(|| set.pop_highest_priority())
        .map(|j| j.priority)
        .collect();
    assert_eq!(order, vec![10, 10, 9, 5, 1]);
}

#[test]
fn each_priority_bucket_is_capped_at_queue_size_over_ten() {
    let mut set = QueueSet::new(20);
    set.push_priority(job(5)).unwrap();
    set.push_priority(job(5)).unwrap();
    assert!(matches!(set.push_priority(job(5)), Err(CoreError::QueueFull)));
}

#[test]
fn least_loaded_priority_prefers_the_emptiest_bucket() {
    let mut set = QueueSet::new(1000);
    set.push_priority(job(1)).unwrap();
    set.push_priority(job(1)).unwrap();
    assert_ne!(set.least_loaded_priority(), 1);
}

#[test]
fn history_evicts_oldest_sample_once_full() {
    let mut history = QueueDepthHistory::new(2);
    history.record(QueueDepthSample { total_depth: 1, ready_depth: 0 });
    history.record(QueueDepthSample { total_depth: 2, ready_depth: 0 });
    history.record(QueueDepthSample { total_depth: 3, ready_depth: 0 });

    let depths: Vec<usize> = history.samples().map(|s| s.total_depth).collect();
    assert_eq!(depths, vec![2, 3]);
}
