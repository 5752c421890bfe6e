// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! Observable scheduler metrics: jobs/second, success rate, average job
//! duration, runner utilisation. Plain structs sampled on an interval
//! task; no metrics-exporter crate pulled in, `tracing` events carry the
//! same numbers.

use cicd_core::RunnerId;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
struct JobOutcome {
    succeeded: bool,
    duration: Duration,
}

/// Accumulates completed-job outcomes and runner dispatch counts, and
/// derives the observable metrics on demand.
#[derive(Default)]
pub struct SchedulerMetrics {
    outcomes: Vec<JobOutcome>,
    window_start: Option<std::time::Instant>,
    runner_dispatch_counts: HashMap<RunnerId, u64>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    pub jobs_completed: u64,
    pub jobs_per_second: f64,
    pub success_rate: f64,
    pub average_duration: Duration,
}

impl SchedulerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_completion(&mut self, succeeded: bool, duration: Duration, now: std::time::Instant) {
        if self.window_start.is_none() {
            self.window_start = Some(now);
        }
        self.outcomes.push(JobOutcome { succeeded, duration });
    }

    pub fn record_dispatch(&mut self, runner_id: RunnerId) {
        *self.runner_dispatch_counts.entry(runner_id).or_insert(0) += 1;
    }

    pub fn runner_utilisation(&self) -> &HashMap<RunnerId, u64> {
        &self.runner_dispatch_counts
    }

    pub fn snapshot(&self, now: std::time::Instant) -> MetricsSnapshot {
        let jobs_completed = self.outcomes.len() as u64;
        if jobs_completed == 0 {
            return MetricsSnapshot::default();
        }

        let succeeded = self.outcomes.iter().filter(|o| o.succeeded).count() as f64;
        let total_duration: Duration = self.outcomes.iter().map(|o| o.duration).sum();
        let elapsed = self
            .window_start
            .map(|start| (now - start).as_secs_f64())
            .filter(|secs| *secs > 0.0)
            .unwrap_or(1.0);

        MetricsSnapshot {
            jobs_completed,
            jobs_per_second: jobs_completed as f64 / elapsed,
            success_rate: succeeded / jobs_completed as f64,
            average_duration: total_duration / jobs_completed as u32,
        }
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
