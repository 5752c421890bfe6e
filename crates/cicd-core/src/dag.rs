// SPDX-License-Identifier: MIT
// Copyright (c) 2026 CI/CD Execution Core Contributors

//! Generic cycle detection over a `depends-on` edge list, shared by the
//! pipeline engine when it expands a run into a job DAG.

use crate::error::CoreError;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Walks `edges` (node -> its dependencies) with a DFS + recursion-set,
/// returning `CoreError::Cycle` if any node depends on itself transitively.
///
/// `edges` must contain an entry for every node, even ones with no
/// dependencies (an empty `Vec`).
pub fn detect_cycle<N>(edges: &HashMap<N, Vec<N>>) -> Result<(), CoreError>
where
    N: Eq + Hash + Clone,
{
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        InProgress,
        Done,
    }

    let mut marks: HashMap<N, Mark> = HashMap::new();

    for start in edges.keys() {
        if marks.contains_key(start) {
            continue;
        }
        // Explicit stack DFS to avoid recursion depth limits on large DAGs.
        let mut stack: Vec<(N, usize)> = vec![(start.clone(), 0)];
        let mut on_stack: HashSet<N> = HashSet::new();
        on_stack.insert(start.clone());

        while let Some((node, next_dep_idx)) = stack.pop() {
            let deps = edges.get(&node).map(Vec::as_slice).unwrap_or(&[]);

            if next_dep_idx >= deps.len() {
                on_stack.remove(&node);
                marks.insert(node, Mark::Done);
                continue;
            }

            // Re-push this frame to resume at the next dependency once its
            // subtree (if any) has been explored.
            stack.push((node.clone(), next_dep_idx + 1));

            let dep = &deps[next_dep_idx];
            match marks.get(dep) {
                Some(Mark::Done) => continue,
                _ if on_stack.contains(dep) => return Err(CoreError::Cycle),
                _ => {
                    if !marks.contains_key(dep) {
                        on_stack.insert(dep.clone());
                        stack.push((dep.clone(), 0));
                    }
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[path = "dag_tests.rs"]
mod tests;
