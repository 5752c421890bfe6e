use super::*;

fn runner_with_labels(labels: &[&str]) -> Runner {
    let mut r = Runner::new(RunnerId::new("r1"), "tenant-a", "runner-1");
    r.labels = labels.iter().map(|s| s.to_string()).collect();
    r
}

#[test]
fn has_labels_requires_every_required_label() {
    let r = runner_with_labels(&["linux", "amd64"]);
    assert!(r.has_labels(&["linux".to_string()]));
    assert!(r.has_labels(&["linux".to_string(), "amd64".to_string()]));
    assert!(!r.has_labels(&["linux".to_string(), "arm64".to_string()]));
}

#[test]
fn empty_requirement_always_matches() {
    let r = runner_with_labels(&[]);
    assert!(r.has_labels(&[]));
}

#[test]
fn only_online_and_idle_are_available() {
    assert!(RunnerStatus::Online.is_available());
    assert!(RunnerStatus::Idle.is_available());
    assert!(!RunnerStatus::Busy.is_available());
    assert!(!RunnerStatus::Offline.is_available());
}
