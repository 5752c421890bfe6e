// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! `SchedulingStrategy` — how a submitted job is routed to a queue.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingStrategy {
    /// Submissions land directly in the ready queue.
    Fifo,
    /// Submissions land in the priority queue matching their priority.
    Priority,
    /// Submission priority is rewritten to the least-loaded bucket.
    LoadBalance,
    /// Named but not implemented; rejected at submission.
    ShortestJob,
    /// Named but not implemented; rejected at submission.
    Deadline,
}

impl SchedulingStrategy {
    /// Whether the main loop knows how to dispatch this strategy.
    pub fn is_implemented(self) -> bool {
        !matches!(self, SchedulingStrategy::ShortestJob | SchedulingStrategy::Deadline)
    }
}

impl Default for SchedulingStrategy {
    fn default() -> Self {
        SchedulingStrategy::Priority
    }
}

#[cfg(test)]
#[path = "strategy_tests.rs"]
mod tests;
