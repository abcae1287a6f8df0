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

//! The public-facing asset container.

use crate::resolver::{AssetFilter, AssetFilterInfo, DependencyResolver};
use crate::wait_set::WaitSetTracker;
use depot_core::asset::{AssetHandle, AssetId, AssetStatus, AssetType, DependencyRules};
use depot_core::services::{
    AssetCatalog, AssetEventHandler, AssetLoader, AssetNotificationBus, SubscriptionId,
};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The host services a container works with.
#[derive(Clone)]
pub struct ContainerServices {
    /// Answers dependency queries.
    pub catalog: Arc<dyn AssetCatalog>,
    /// Starts loads and owns the assets.
    pub loader: Arc<dyn AssetLoader>,
    /// Delivers per-asset progress notifications.
    pub bus: Arc<dyn AssetNotificationBus>,
}

impl ContainerServices {
    /// Bundles the three services.
    pub fn new(
        catalog: Arc<dyn AssetCatalog>,
        loader: Arc<dyn AssetLoader>,
        bus: Arc<dyn AssetNotificationBus>,
    ) -> Self {
        Self {
            catalog,
            loader,
            bus,
        }
    }
}

impl fmt::Debug for ContainerServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerServices").finish_non_exhaustive()
    }
}

/// Lifecycle notifications published by a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerEvent {
    /// A dependency became ready from the container's point of view.
    DependencyReady {
        /// The container's root asset.
        root: AssetId,
        /// The dependency.
        id: AssetId,
    },
    /// A dependency failed to load.
    DependencyFailed {
        /// The container's root asset.
        root: AssetId,
        /// The dependency.
        id: AssetId,
    },
    /// The root and all of its transitive `PreLoad` dependencies are ready.
    /// Published exactly once per container.
    Ready {
        /// The container's root asset.
        root: AssetId,
    },
}

/// Construction options for an [`AssetContainer`].
#[derive(Clone, Default)]
pub struct ContainerOptions {
    /// How declared load behaviors are interpreted.
    pub rules: DependencyRules,
    /// Optional veto over which dependencies are part of the container.
    pub filter: Option<AssetFilter>,
    /// Where [`ContainerEvent`]s are sent, if anywhere.
    pub events: Option<flume::Sender<ContainerEvent>>,
}

impl ContainerOptions {
    /// Default options: load behaviors honored, no filter, no event channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the dependency rules.
    pub fn with_rules(mut self, rules: DependencyRules) -> Self {
        self.rules = rules;
        self
    }

    /// Sets a filter over dependencies.
    pub fn with_filter(
        mut self,
        filter: impl Fn(&AssetFilterInfo) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Attaches a channel receiving this container's [`ContainerEvent`]s.
    ///
    /// Events are never waited on: if a bounded channel is full, the event is
    /// dropped and a warning is logged.
    pub fn with_event_sender(mut self, sender: flume::Sender<ContainerEvent>) -> Self {
        self.events = Some(sender);
        self
    }
}

impl fmt::Debug for ContainerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerOptions")
            .field("rules", &self.rules)
            .field("filtered", &self.filter.is_some())
            .field("events", &self.events.is_some())
            .finish()
    }
}

/// The flattened dependency map. Guarded by its own lock.
#[derive(Debug, Default)]
pub(crate) struct DependencyState {
    pub(crate) dependencies: HashMap<AssetId, AssetHandle>,
    pub(crate) unloaded: HashMap<AssetId, AssetType>,
    pub(crate) invalid: HashSet<AssetId>,
}

/// Readiness bookkeeping. Guarded by its own lock, never held together with
/// the dependency map lock.
#[derive(Debug, Default)]
struct WaitState {
    tracker: WaitSetTracker,
    subscriptions: HashMap<AssetId, SubscriptionId>,
    ready_signalled: bool,
    shut_down: bool,
}

/// Everything needed to start tracking a batch of newly requested assets.
pub(crate) struct Activation {
    pub(crate) handles: Vec<AssetHandle>,
    pub(crate) preload_edges: Vec<(AssetId, AssetId)>,
    pub(crate) new_invalid: usize,
}

pub(crate) struct ContainerShared {
    pub(crate) root: AssetHandle,
    pub(crate) rules: DependencyRules,
    pub(crate) services: ContainerServices,
    events: Option<flume::Sender<ContainerEvent>>,
    pub(crate) dependency_state: Mutex<DependencyState>,
    wait_state: Mutex<WaitState>,
    init_complete: AtomicBool,
    ready: AtomicBool,
    root_pending: AtomicBool,
    waiting: AtomicUsize,
    invalid: AtomicUsize,
    failed: AtomicUsize,
}

/// Loads an asset together with its dependency graph and reports when the
/// part of the graph that matters is ready.
///
/// Construction walks the catalog, requests every `PreLoad` and `QueueLoad`
/// dependency, and subscribes to their notifications. The container becomes
/// ready exactly once, when the root and all of its transitive `PreLoad`
/// dependencies are ready. `QueueLoad` dependencies keep loading in the
/// background, and `NoLoad` dependencies wait for
/// [`load_dependency`](AssetContainer::load_dependency).
///
/// Dropping the container removes every remaining subscription. Loads already
/// in flight are not cancelled; their notifications are ignored.
pub struct AssetContainer {
    pub(crate) shared: Arc<ContainerShared>,
}

impl AssetContainer {
    /// Creates a container for `root` and starts loading it.
    pub fn new(
        services: ContainerServices,
        root: AssetId,
        root_type: AssetType,
        options: ContainerOptions,
    ) -> Self {
        let ContainerOptions {
            rules,
            filter,
            events,
        } = options;

        let root_handle = services.loader.request_load(root, root_type);
        let resolution = DependencyResolver::new(services.catalog.as_ref(), rules)
            .with_filter(filter.as_ref())
            .resolve(root);

        let handles: Vec<AssetHandle> = resolution
            .to_load
            .iter()
            .map(|dependency| services.loader.request_load(dependency.id, dependency.asset_type))
            .collect();

        let dependency_state = DependencyState {
            dependencies: handles.iter().map(|h| (h.id(), h.clone())).collect(),
            unloaded: resolution.deferred,
            invalid: resolution.invalid.iter().copied().collect(),
        };

        let container = Self {
            shared: Arc::new(ContainerShared {
                root: root_handle.clone(),
                rules,
                services,
                events,
                dependency_state: Mutex::new(dependency_state),
                wait_state: Mutex::new(WaitState::default()),
                init_complete: AtomicBool::new(false),
                ready: AtomicBool::new(false),
                root_pending: AtomicBool::new(true),
                waiting: AtomicUsize::new(0),
                invalid: AtomicUsize::new(0),
                failed: AtomicUsize::new(0),
            }),
        };

        let mut activation_handles = Vec::with_capacity(handles.len() + 1);
        activation_handles.push(root_handle);
        activation_handles.extend(handles);
        container.shared.activate(Activation {
            handles: activation_handles,
            preload_edges: resolution.preload_edges,
            new_invalid: resolution.invalid.len(),
        });
        container.shared.complete_init();

        log::debug!(
            "AssetContainer for {root}: {} dependencies requested, {} deferred, {} invalid.",
            resolution.to_load.len(),
            container.unloaded_dependencies().len(),
            container.invalid_dependencies()
        );
        container
    }

    /// The id of the root asset.
    pub fn root_id(&self) -> AssetId {
        self.shared.root.id()
    }

    /// The handle of the root asset.
    pub fn root_asset(&self) -> &AssetHandle {
        &self.shared.root
    }

    /// The rules the container was created with.
    pub fn rules(&self) -> DependencyRules {
        self.shared.rules
    }

    /// Returns `true` once the root and all of its transitive `PreLoad` dependencies are ready.
    pub fn is_ready(&self) -> bool {
        self.shared.ready.load(Ordering::Acquire)
    }

    /// Returns `true` while anything the container requested is still loading.
    pub fn is_loading(&self) -> bool {
        !self.shared.init_complete.load(Ordering::Acquire)
            || self.shared.root_pending.load(Ordering::Acquire)
            || self.shared.waiting.load(Ordering::Acquire) > 0
    }

    /// A snapshot of the flattened dependency map. The root is not included.
    pub fn dependencies(&self) -> HashMap<AssetId, AssetHandle> {
        self.shared.lock_dependencies().dependencies.clone()
    }

    /// The deferred `NoLoad` dependencies that have not been promoted.
    pub fn unloaded_dependencies(&self) -> HashSet<AssetId> {
        self.shared
            .lock_dependencies()
            .unloaded
            .keys()
            .copied()
            .collect()
    }

    /// The number of requested dependencies that have neither become ready nor failed.
    pub fn num_waiting_dependencies(&self) -> usize {
        self.shared.waiting.load(Ordering::Acquire)
    }

    /// The number of referenced dependencies the catalog did not know.
    pub fn invalid_dependencies(&self) -> usize {
        self.shared.invalid.load(Ordering::Acquire)
    }

    /// The number of dependencies the loader reported as failed.
    pub fn failed_dependencies(&self) -> usize {
        self.shared.failed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for AssetContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetContainer")
            .field("root", &self.root_id())
            .field("rules", &self.rules())
            .field("ready", &self.is_ready())
            .field("waiting", &self.num_waiting_dependencies())
            .finish()
    }
}

impl Drop for AssetContainer {
    fn drop(&mut self) {
        // Taking the wait lock joins any notification being handled right now;
        // later notifications see `shut_down` and return.
        let subscriptions: Vec<(AssetId, SubscriptionId)> = {
            let mut state = self.shared.lock_wait_state();
            state.shut_down = true;
            state.subscriptions.drain().collect()
        };
        for (id, subscription) in &subscriptions {
            self.shared.services.bus.unsubscribe(id, *subscription);
        }
        log::debug!(
            "AssetContainer for {} dropped, {} subscriptions removed.",
            self.root_id(),
            subscriptions.len()
        );
    }
}

impl ContainerShared {
    pub(crate) fn lock_dependencies(&self) -> MutexGuard<'_, DependencyState> {
        self.dependency_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_wait_state(&self) -> MutexGuard<'_, WaitState> {
        self.wait_state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn root_id(&self) -> AssetId {
        self.root.id()
    }

    /// Starts tracking and listening to a batch of requested assets.
    ///
    /// Every id is tracked before it is subscribed, and its current status is
    /// checked after it is subscribed, so a load finishing at any point in
    /// between is observed either through the bus or through the status.
    pub(crate) fn activate(self: &Arc<Self>, activation: Activation) {
        let Activation {
            handles,
            preload_edges,
            new_invalid,
        } = activation;
        let root = self.root_id();

        let to_subscribe: Vec<AssetId> = {
            let mut state = self.lock_wait_state();
            if state.shut_down {
                return;
            }
            for handle in &handles {
                if state.tracker.track(handle.id()) && handle.id() != root {
                    self.waiting.fetch_add(1, Ordering::AcqRel);
                }
            }
            for (parent, child) in &preload_edges {
                state.tracker.register_preload_wait(*parent, *child);
            }
            handles
                .iter()
                .map(AssetHandle::id)
                .filter(|id| !state.subscriptions.contains_key(id) && !state.tracker.is_settled(id))
                .collect()
        };
        self.invalid.fetch_add(new_invalid, Ordering::AcqRel);

        let handler: Arc<dyn AssetEventHandler> = self.clone();
        let subscribed: Vec<(AssetId, SubscriptionId)> = to_subscribe
            .into_iter()
            .map(|id| (id, self.services.bus.subscribe(id, Arc::clone(&handler))))
            .collect();

        let redundant: Vec<(AssetId, SubscriptionId)> = {
            let mut state = self.lock_wait_state();
            let mut redundant = Vec::new();
            for (id, subscription) in subscribed {
                if state.shut_down
                    || state.tracker.is_settled(&id)
                    || state.subscriptions.contains_key(&id)
                {
                    redundant.push((id, subscription));
                } else {
                    state.subscriptions.insert(id, subscription);
                }
            }
            redundant
        };
        for (id, subscription) in &redundant {
            self.services.bus.unsubscribe(id, *subscription);
        }

        for handle in &handles {
            match handle.status() {
                AssetStatus::Loaded | AssetStatus::Ready => self.handle_loaded(handle.id()),
                AssetStatus::Error => self.handle_failed(handle.id()),
                _ => {}
            }
        }
    }

    /// Marks the initial walk as finished and signals readiness if it is already due.
    fn complete_init(&self) {
        let mut state = self.lock_wait_state();
        self.init_complete.store(true, Ordering::Release);
        self.signal_ready_if_due(&mut state);
    }

    fn handle_loaded(&self, id: AssetId) {
        let to_unsubscribe = {
            let mut state = self.lock_wait_state();
            if state.shut_down {
                return;
            }
            let became_ready = state.tracker.on_data_loaded(id);
            let mut to_unsubscribe = Vec::with_capacity(became_ready.len());
            for ready_id in became_ready {
                if let Some(subscription) = state.subscriptions.remove(&ready_id) {
                    to_unsubscribe.push((ready_id, subscription));
                }
                if ready_id == self.root_id() {
                    self.root_pending.store(false, Ordering::Release);
                } else {
                    self.waiting.fetch_sub(1, Ordering::AcqRel);
                    log::trace!("Dependency {ready_id} of {} is ready.", self.root_id());
                    self.emit(ContainerEvent::DependencyReady {
                        root: self.root_id(),
                        id: ready_id,
                    });
                }
            }
            self.signal_ready_if_due(&mut state);
            to_unsubscribe
        };

        for (id, subscription) in &to_unsubscribe {
            self.services.bus.unsubscribe(id, *subscription);
        }
    }

    fn handle_failed(&self, id: AssetId) {
        let subscription = {
            let mut state = self.lock_wait_state();
            if state.shut_down || !state.tracker.on_failed(id) {
                return;
            }
            if id == self.root_id() {
                self.root_pending.store(false, Ordering::Release);
                log::warn!("Root asset {id} of container failed to load.");
            } else {
                self.waiting.fetch_sub(1, Ordering::AcqRel);
                self.failed.fetch_add(1, Ordering::AcqRel);
                log::warn!("Dependency {id} of {} failed to load.", self.root_id());
                self.emit(ContainerEvent::DependencyFailed {
                    root: self.root_id(),
                    id,
                });
            }
            state.subscriptions.remove(&id)
        };

        if let Some(subscription) = subscription {
            self.services.bus.unsubscribe(&id, subscription);
        }
    }

    fn signal_ready_if_due(&self, state: &mut WaitState) {
        if state.ready_signalled
            || !self.init_complete.load(Ordering::Acquire)
            || !state.tracker.is_ready(&self.root_id())
        {
            return;
        }
        state.ready_signalled = true;
        self.ready.store(true, Ordering::Release);
        log::debug!("AssetContainer for {} is ready.", self.root_id());
        self.emit(ContainerEvent::Ready {
            root: self.root_id(),
        });
    }

    /// Sends without blocking. Callers hold the wait lock, which keeps events in
    /// propagation order; a full channel drops the event instead of stalling
    /// every other notification and the container's drop.
    fn emit(&self, event: ContainerEvent) {
        let Some(sender) = &self.events else {
            return;
        };
        match sender.try_send(event) {
            Ok(()) => {}
            Err(flume::TrySendError::Full(_)) => {
                log::warn!("Container event channel is full, dropping {event:?}.");
            }
            Err(flume::TrySendError::Disconnected(_)) => {
                log::trace!("Container event receiver dropped, discarding {event:?}.");
            }
        }
    }
}

impl AssetEventHandler for ContainerShared {
    fn on_asset_data_loaded(&self, asset: &AssetHandle) {
        self.handle_loaded(asset.id());
    }

    fn on_asset_ready(&self, asset: &AssetHandle) {
        // Ready implies loaded. Whether the node itself becomes ready still
        // depends on its PreLoad children as seen by this container.
        self.handle_loaded(asset.id());
    }

    fn on_asset_error(&self, asset: &AssetHandle) {
        self.handle_failed(asset.id());
    }
}
