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

//! Deterministic collaborators for driving containers from tests.

#![allow(dead_code)]

use depot_container::{AssetContainer, ContainerEvent, ContainerOptions, ContainerServices};
use depot_core::asset::{
    AssetHandle, AssetId, AssetStatus, AssetType, LoadBehavior, ProductDependency,
};
use depot_core::catalog::{AssetIndex, AssetRecord};
use depot_core::services::{AssetEvent, AssetLoader};
use depot_infra::InProcessBus;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn id(name: &str) -> AssetId {
    AssetId::from_path(name)
}

pub fn ty() -> AssetType {
    AssetType::from_name("test")
}

/// A catalog record named `name` with `(child, behavior)` dependencies.
pub fn record(name: &str, dependencies: &[(&str, LoadBehavior)]) -> AssetRecord {
    dependencies
        .iter()
        .fold(AssetRecord::new(id(name), ty(), name), |record, (child, behavior)| {
            record.with_dependency(ProductDependency::new(id(child), ty(), *behavior))
        })
}

/// A loader that never loads anything on its own. It hands out handles and
/// counts how often each id was requested; tests move the assets along.
#[derive(Default)]
pub struct RecordingLoader {
    assets: Mutex<HashMap<AssetId, AssetHandle>>,
    requests: Mutex<HashMap<AssetId, usize>>,
}

impl RecordingLoader {
    pub fn requests(&self, id: &AssetId) -> usize {
        self.requests.lock().unwrap().get(id).copied().unwrap_or(0)
    }

    pub fn total_requests(&self) -> usize {
        self.requests.lock().unwrap().values().sum()
    }

    /// Makes `id` exist with `status` before anything requests it.
    pub fn preset(&self, id: AssetId, status: AssetStatus) -> AssetHandle {
        let handle = AssetHandle::new(id, ty(), id.to_string());
        handle.set_status(status);
        self.assets.lock().unwrap().insert(id, handle.clone());
        handle
    }
}

impl AssetLoader for RecordingLoader {
    fn request_load(&self, id: AssetId, asset_type: AssetType) -> AssetHandle {
        *self.requests.lock().unwrap().entry(id).or_insert(0) += 1;
        self.assets
            .lock()
            .unwrap()
            .entry(id)
            .or_insert_with(|| {
                let handle = AssetHandle::new(id, asset_type, id.to_string());
                handle.set_status(AssetStatus::Queued);
                handle
            })
            .clone()
    }

    fn find_asset(&self, id: &AssetId) -> Option<AssetHandle> {
        self.assets.lock().unwrap().get(id).cloned()
    }
}

/// A catalog, a recording loader and an in-process bus wired together.
pub struct Harness {
    pub catalog: Arc<AssetIndex>,
    pub loader: Arc<RecordingLoader>,
    pub bus: Arc<InProcessBus>,
}

impl Harness {
    pub fn new(records: impl IntoIterator<Item = AssetRecord>) -> Self {
        init_logging();
        Self {
            catalog: Arc::new(AssetIndex::from_records(records)),
            loader: Arc::new(RecordingLoader::default()),
            bus: Arc::new(InProcessBus::new()),
        }
    }

    pub fn services(&self) -> ContainerServices {
        ContainerServices::new(self.catalog.clone(), self.loader.clone(), self.bus.clone())
    }

    pub fn container(&self, root: &str, options: ContainerOptions) -> AssetContainer {
        AssetContainer::new(self.services(), id(root), ty(), options)
    }

    /// Builds a container whose events go to the returned receiver.
    pub fn observed(
        &self,
        root: &str,
        options: ContainerOptions,
    ) -> (AssetContainer, flume::Receiver<ContainerEvent>) {
        let (tx, rx) = flume::unbounded();
        (self.container(root, options.with_event_sender(tx)), rx)
    }

    fn handle(&self, name: &str) -> AssetHandle {
        self.loader
            .find_asset(&id(name))
            .unwrap_or_else(|| AssetHandle::new(id(name), ty(), name))
    }

    /// Marks `name` as loaded and notifies its subscribers. Returns how many were reached.
    pub fn data_loaded(&self, name: &str) -> usize {
        let handle = self.handle(name);
        handle.set_status(AssetStatus::Loaded);
        self.bus.notify(AssetEvent::DataLoaded(handle))
    }

    /// Marks `name` as ready and notifies its subscribers.
    pub fn ready(&self, name: &str) -> usize {
        let handle = self.handle(name);
        handle.set_status(AssetStatus::Ready);
        self.bus.notify(AssetEvent::Ready(handle))
    }

    /// Marks `name` as failed and notifies its subscribers.
    pub fn fail(&self, name: &str) -> usize {
        let handle = self.handle(name);
        handle.set_status(AssetStatus::Error);
        self.bus.notify(AssetEvent::Error(handle))
    }
}

pub fn drain(events: &flume::Receiver<ContainerEvent>) -> Vec<ContainerEvent> {
    events.try_iter().collect()
}

pub fn dependency_ready(root: &str, dependency: &str) -> ContainerEvent {
    ContainerEvent::DependencyReady {
        root: id(root),
        id: id(dependency),
    }
}

pub fn container_ready(root: &str) -> ContainerEvent {
    ContainerEvent::Ready { root: id(root) }
}
