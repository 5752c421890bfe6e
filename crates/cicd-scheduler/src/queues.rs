// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! Bounded queues: ten priority buckets plus one ready queue, and a
//! FIFO-evicted queue-depth history ring buffer.

use cicd_core::{CoreError, ScheduleJob};
use std::collections::VecDeque;

/// A `VecDeque` that refuses to grow past `capacity` (a plain in-memory
/// queue rather than a `tokio::mpsc`, since the scheduler's main loop is
/// the sole consumer and needs to inspect/reorder by priority rather
/// than just await the next item).
#[derive(Debug)]
pub struct BoundedQueue<T> {
    items: VecDeque<T>,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            capacity,
        }
    }

    pub fn push_back(&mut self, item: T) -> Result<(), CoreError> {
        if self.items.len() >= self.capacity {
            return Err(CoreError::QueueFull);
        }
        self.items.push_back(item);
        Ok(())
    }

    pub fn pop_front(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Ten priority buckets (levels 1..=10) plus one ready queue.
pub struct QueueSet {
    /// Index 0 holds priority 1, index 9 holds priority 10.
    priority_queues: Vec<BoundedQueue<ScheduleJob>>,
    ready_queue: BoundedQueue<ScheduleJob>,
}

fn priority_index(priority: u8) -> usize {
    priority.clamp(1, 10) as usize - 1
}

impl QueueSet {
    pub fn new(queue_size: usize) -> Self {
        let bucket_capacity = queue_size / 10;
        Self {
            priority_queues: (0..10).map(|_| BoundedQueue::new(bucket_capacity)).collect(),
            ready_queue: BoundedQueue::new(queue_size),
        }
    }

    pub fn push_priority(&mut self, job: ScheduleJob) -> Result<(), CoreError> {
        let idx = priority_index(job.priority);
        self.priority_queues[idx].push_back(job)
    }

    pub fn push_ready(&mut self, job: ScheduleJob) -> Result<(), CoreError> {
        self.ready_queue.push_back(job)
    }

    pub fn pop_ready(&mut self) -> Option<ScheduleJob> {
        self.ready_queue.pop_front()
    }

    /// Pops one job from the highest non-empty priority bucket (10 down to
    /// 1), preserving FIFO within a level and one-pop-per-tick fairness
    /// across levels.
    pub fn pop_highest_priority(&mut self) -> Option<ScheduleJob> {
        for idx in (0..10).rev() {
            if let Some(job) = self.priority_queues[idx].pop_front() {
                return Some(job);
            }
        }
        None
    }

    /// The bucket index (0-based, priority-1) with the fewest queued jobs;
    /// used by `LoadBalance` to rewrite submission priority.
    pub fn least_loaded_priority(&self) -> u8 {
        self.priority_queues
            .iter()
            .enumerate()
            .min_by_key(|(_, q)| q.len())
            .map(|(idx, _)| idx as u8 + 1)
            .unwrap_or(cicd_core::DEFAULT_PRIORITY)
    }

    pub fn priority_depth(&self, priority: u8) -> usize {
        self.priority_queues[priority_index(priority)].len()
    }

    pub fn ready_depth(&self) -> usize {
        self.ready_queue.len()
    }

    pub fn ready_is_empty(&self) -> bool {
        self.ready_queue.is_empty()
    }

    pub fn total_depth(&self) -> usize {
        self.priority_queues.iter().map(BoundedQueue::len).sum::<usize>() + self.ready_queue.len()
    }
}

/// A single sample of queue occupancy, taken by the queue-depth sampler.
#[derive(Debug, Clone, Copy)]
pub struct QueueDepthSample {
    pub total_depth: usize,
    pub ready_depth: usize,
}

/// FIFO-evicted history of queue-depth samples, bounded at `MaxHistorySize`.
pub struct QueueDepthHistory {
    samples: VecDeque<QueueDepthSample>,
    max_size: usize,
}

impl QueueDepthHistory {
    pub fn new(max_size: usize) -> Self {
        Self {
            samples: VecDeque::new(),
            max_size,
        }
    }

    pub fn record(&mut self, sample: QueueDepthSample) {
        if self.samples.len() >= self.max_size {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn samples(&self) -> impl Iterator<Item = &QueueDepthSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
#[path = "queues_tests.rs"]
mod tests;
