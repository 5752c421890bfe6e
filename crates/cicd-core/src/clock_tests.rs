use super::*;

#[test]
fn fake_clock_advances_monotonic_and_wall_time_together() {
    let clock = FakeClock::new();
    let start_instant = clock.now();
    let start_utc = clock.utc_now();

    clock.advance(Duration::from_secs(30));

    assert_eq!(clock.now() - start_instant, Duration::from_secs(30));
    assert_eq!(clock.utc_now() - start_utc, chrono::Duration::seconds(30));
}

#[test]
fn system_clock_now_is_monotonically_non_decreasing() {
    let clock = SystemClock;
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
}
