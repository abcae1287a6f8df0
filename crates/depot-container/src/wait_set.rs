// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Readiness bookkeeping for the nodes of a dependency graph.
//!
//! A node becomes ready once two independent conditions hold: its own data has
//! loaded, and every `PreLoad` child it waits on is ready. Either can happen
//! first; whichever completes last triggers the node's readiness, which may in
//! turn complete a parent, and so on up the graph.
//!
//! Propagation is logically recursive. It is drained from an explicit work queue
//! so a deep chain completes within one call without recursing on the stack.

use depot_core::asset::AssetId;
use std::collections::{HashMap, HashSet, VecDeque};

#[derive(Debug, Default)]
struct NodeState {
    waiting_for: HashSet<AssetId>,
    data_loaded: bool,
    ready: bool,
    failed: bool,
}

impl NodeState {
    fn is_settled(&self) -> bool {
        self.ready || self.failed
    }
}

/// Tracks, per node, which children it still waits on and who waits on it.
#[derive(Debug, Default)]
pub struct WaitSetTracker {
    nodes: HashMap<AssetId, NodeState>,
    /// Reverse index: child -> parents still waiting on it.
    waiters: HashMap<AssetId, HashSet<AssetId>>,
}

impl WaitSetTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking `id`. Returns `false` if it was already tracked.
    pub fn track(&mut self, id: AssetId) -> bool {
        if self.nodes.contains_key(&id) {
            return false;
        }
        self.nodes.insert(id, NodeState::default());
        true
    }

    /// Returns `true` if `id` is tracked.
    pub fn is_tracked(&self, id: &AssetId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Makes `parent`'s readiness wait on `child`'s. Both are tracked if they were not.
    ///
    /// Returns `false` when no wait was added: the child is already ready, the
    /// parent is already settled, or the edge would close a cycle of waits (which
    /// could never complete).
    pub fn register_preload_wait(&mut self, parent: AssetId, child: AssetId) -> bool {
        self.track(parent);
        self.track(child);

        if parent == child || self.nodes[&child].ready || self.nodes[&parent].is_settled() {
            return false;
        }
        if self.waits_on(child, parent) {
            log::warn!("Ignoring circular PreLoad dependency {parent} -> {child}.");
            return false;
        }

        if let Some(node) = self.nodes.get_mut(&parent) {
            node.waiting_for.insert(child);
        }
        self.waiters.entry(child).or_default().insert(parent);
        true
    }

    /// Records that `id`'s own data has loaded.
    ///
    /// Returns every node that became ready as a result, children before parents.
    /// Unknown or already settled ids are ignored.
    pub fn on_data_loaded(&mut self, id: AssetId) -> Vec<AssetId> {
        let Some(node) = self.nodes.get_mut(&id) else {
            return Vec::new();
        };
        if node.is_settled() {
            return Vec::new();
        }
        node.data_loaded = true;
        if node.waiting_for.is_empty() {
            self.on_child_ready(id)
        } else {
            log::trace!("{id} loaded, still waiting on {} children.", node.waiting_for.len());
            Vec::new()
        }
    }

    /// Marks `child` ready and releases every parent waiting on it.
    ///
    /// A parent whose wait set empties and whose data has loaded becomes ready
    /// too, and the cascade continues upwards. Returns every node that became
    /// ready, children before parents. Calling this again for the same id is a
    /// no-op.
    pub fn on_child_ready(&mut self, child: AssetId) -> Vec<AssetId> {
        let mut became_ready = Vec::new();
        let mut pending = VecDeque::from([child]);

        while let Some(id) = pending.pop_front() {
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            if node.is_settled() {
                continue;
            }
            node.ready = true;
            node.data_loaded = true;
            became_ready.push(id);

            for parent in self.waiters.remove(&id).unwrap_or_default() {
                let Some(parent_node) = self.nodes.get_mut(&parent) else {
                    continue;
                };
                parent_node.waiting_for.remove(&id);
                if parent_node.waiting_for.is_empty()
                    && parent_node.data_loaded
                    && !parent_node.is_settled()
                {
                    pending.push_back(parent);
                }
            }
        }
        became_ready
    }

    /// Records that `id` failed to load. It will never become ready, and neither
    /// will any parent waiting on it. Returns `false` if `id` was unknown or settled.
    pub fn on_failed(&mut self, id: AssetId) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) if !node.is_settled() => {
                node.failed = true;
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if `id` is tracked and ready.
    pub fn is_ready(&self, id: &AssetId) -> bool {
        self.nodes.get(id).is_some_and(|node| node.ready)
    }

    /// Returns `true` if `id` is tracked and either ready or failed.
    pub fn is_settled(&self, id: &AssetId) -> bool {
        self.nodes.get(id).is_some_and(NodeState::is_settled)
    }

    /// Returns `true` if `id`'s own data has loaded.
    pub fn is_data_loaded(&self, id: &AssetId) -> bool {
        self.nodes.get(id).is_some_and(|node| node.data_loaded)
    }

    /// The children `id` still waits on.
    pub fn waiting_for(&self, id: &AssetId) -> Option<&HashSet<AssetId>> {
        self.nodes.get(id).map(|node| &node.waiting_for)
    }

    /// The number of parents still waiting on `id`.
    pub fn waiter_count(&self, id: &AssetId) -> usize {
        self.waiters.get(id).map_or(0, HashSet::len)
    }

    /// The number of tracked nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // Whether `from` waits, directly or transitively, on `target`.
    fn waits_on(&self, from: AssetId, target: AssetId) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(id) = stack.pop() {
            if id == target {
                return true;
            }
            if !seen.insert(id) {
                continue;
            }
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.waiting_for.iter().copied());
            }
        }
        false
    }
}
