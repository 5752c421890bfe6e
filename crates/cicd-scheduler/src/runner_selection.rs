// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! Runner selection policy for `LoadBalance` dispatch.

use cicd_core::Runner;

/// Picks a runner from `available` (already filtered to `Online`/`Idle`
/// and label-matching): prefers a runner with no prior contact, else the
/// one whose last contact is oldest, ties broken by identity order.
pub fn select_runner(available: &[Runner]) -> Option<&Runner> {
    available
        .iter()
        .min_by(|a, b| {
            match (a.last_contact, b.last_contact) {
                (None, None) => a.id.as_str().cmp(b.id.as_str()),
                (None, Some(_)) => std::cmp::Ordering::Less,
                (Some(_), None) => std::cmp::Ordering::Greater,
                (Some(a_contact), Some(b_contact)) => a_contact
                    .cmp(&b_contact)
                    .then_with(|| a.id.as_str().cmp(b.id.as_str())),
            }
        })
}

/// Filters `runners` to those available for dispatch and carrying every
/// label in `required`.
pub fn eligible_runners<'a>(runners: &'a [Runner], required: &[String]) -> Vec<&'a Runner> {
    runners
        .iter()
        .filter(|r| r.status.is_available() && r.has_labels(required))
        .collect()
}

#[cfg(test)]
#[path = "runner_selection_tests.rs"]
mod tests;
