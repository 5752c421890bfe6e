use super::*;
use cicd_core::{RunnerId, RunnerStatus};
use chrono::{Duration, Utc};

fn runner(id: &str, status: RunnerStatus, last_contact: Option<chrono::DateTime<Utc>>) -> Runner {
    let mut r = Runner::new(RunnerId::new(id), "tenant-a", id);
    r.status = status;
    r.last_contact = last_contact;
    r
}

#[test]
fn prefers_a_runner_with_no_prior_contact() {
    let now = Utc::now();
    let runners = vec![
        runner("r1", RunnerStatus::Online, Some(now)),
        runner("r2", RunnerStatus::Online, None),
    ];
    let selected = select_runner(&runners).unwrap();
    assert_eq!(selected.id, RunnerId::new("r2"));
}

#[test]
fn falls_back_to_oldest_last_contact() {
    let now = Utc::now();
    let runners = vec![
        runner("r1", RunnerStatus::Online, Some(now)),
        runner("r2", RunnerStatus::Online, Some(now - Duration::minutes(5))),
    ];
    let selected = select_runner(&runners).unwrap();
    assert_eq!(selected.id, RunnerId::new("r2"));
}

#[test]
fn ties_broken_by_identity_order() {
    let now = Utc::now();
    let runners = vec![
        runner("zzz", RunnerStatus::Online, None),
        runner("aaa", RunnerStatus::Online, None),
    ];
    let selected = select_runner(&runners).unwrap();
    assert_eq!(selected.id, RunnerId::new("aaa"));
    let _ = now;
}

#[test]
fn eligible_runners_excludes_offline_and_unmatched_labels() {
    let mut online_matching = runner("r1", RunnerStatus::Online, None);
    online_matching.labels.insert("linux".to_string());
    let offline = runner("r2", RunnerStatus::Offline, None);
    let mut online_unmatched = runner("r3", RunnerStatus::Idle, None);
    online_unmatched.labels.insert("windows".to_string());

    let runners = vec![online_matching, offline, online_unmatched];
    let eligible = eligible_runners(&runners, &["linux".to_string()]);
    assert_eq!(eligible.len(), 1);
    assert_eq!(eligible[0].id, RunnerId::new("r1"));
}
