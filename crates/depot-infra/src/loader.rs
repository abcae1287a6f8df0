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

//! A worker-pool asset loader that reports progress through an [`InProcessBus`].

use crate::bus::InProcessBus;
use crate::config::LoaderConfig;
use crossbeam_channel::{Receiver, Sender};
use depot_core::asset::{AssetHandle, AssetId, AssetStatus, AssetType};
use depot_core::services::{AssetEvent, AssetLoader};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

/// Produces an asset's data. Called on a worker thread once per requested asset.
///
/// Returning an error marks the asset as failed and publishes
/// [`AssetEvent::Error`].
pub type AssetSource = dyn Fn(&AssetHandle) -> anyhow::Result<()> + Send + Sync;

struct LoaderShared {
    assets: Mutex<HashMap<AssetId, AssetHandle>>,
    bus: Arc<InProcessBus>,
    source: Arc<AssetSource>,
    loads_started: AtomicUsize,
}

/// An [`AssetLoader`] backed by a fixed pool of worker threads.
///
/// Each requested asset is loaded once; later requests return the same handle.
/// Workers publish [`AssetEvent::DataLoaded`] followed by [`AssetEvent::Ready`]
/// (or [`AssetEvent::Error`]) on the worker thread, through
/// [`InProcessBus::notify`].
pub struct ThreadedAssetLoader {
    shared: Arc<LoaderShared>,
    job_tx: Option<Sender<AssetHandle>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl ThreadedAssetLoader {
    /// Starts a loader whose assets always load successfully.
    pub fn new(config: LoaderConfig, bus: Arc<InProcessBus>) -> Self {
        Self::with_source(
            config,
            bus,
            Arc::new(|_: &AssetHandle| -> anyhow::Result<()> { Ok(()) }),
        )
    }

    /// Starts a loader that produces asset data with `source`.
    pub fn with_source(
        config: LoaderConfig,
        bus: Arc<InProcessBus>,
        source: Arc<AssetSource>,
    ) -> Self {
        let shared = Arc::new(LoaderShared {
            assets: Mutex::new(HashMap::new()),
            bus,
            source,
            loads_started: AtomicUsize::new(0),
        });
        let (job_tx, job_rx) = crossbeam_channel::unbounded();

        let worker_count = config.worker_count.max(1);
        let mut workers = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let shared = Arc::clone(&shared);
            let job_rx: Receiver<AssetHandle> = job_rx.clone();
            let spawned = thread::Builder::new()
                .name(format!("{}-{index}", config.thread_name_prefix))
                .spawn(move || worker_loop(&shared, &job_rx));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => log::error!("Failed to spawn asset loader worker {index}: {e}"),
            }
        }
        log::info!("ThreadedAssetLoader started with {} workers.", workers.len());

        Self {
            shared,
            job_tx: Some(job_tx),
            workers,
        }
    }

    /// The number of loads actually started (repeat requests are not counted).
    pub fn loads_started(&self) -> usize {
        self.shared.loads_started.load(Ordering::Relaxed)
    }
}

fn worker_loop(shared: &LoaderShared, jobs: &Receiver<AssetHandle>) {
    for asset in jobs.iter() {
        asset.set_status(AssetStatus::Loading);
        match (shared.source)(&asset) {
            Ok(()) => {
                asset.set_status(AssetStatus::Loaded);
                shared.bus.notify(AssetEvent::DataLoaded(asset.clone()));
                asset.set_status(AssetStatus::Ready);
                shared.bus.notify(AssetEvent::Ready(asset));
            }
            Err(e) => {
                log::warn!("Failed to load asset {} ({}): {e:#}", asset.id(), asset.hint());
                asset.set_status(AssetStatus::Error);
                shared.bus.notify(AssetEvent::Error(asset));
            }
        }
    }
}

impl AssetLoader for ThreadedAssetLoader {
    fn request_load(&self, id: AssetId, asset_type: AssetType) -> AssetHandle {
        let mut assets = self
            .shared
            .assets
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = assets.get(&id) {
            return existing.clone();
        }

        let asset = AssetHandle::new(id, asset_type, id.to_string());
        asset.set_status(AssetStatus::Queued);
        assets.insert(id, asset.clone());
        drop(assets);

        self.shared.loads_started.fetch_add(1, Ordering::Relaxed);
        let queued = self
            .job_tx
            .as_ref()
            .is_some_and(|tx| tx.send(asset.clone()).is_ok());
        if !queued {
            log::error!("Asset loader is shut down, cannot load {id}.");
            asset.set_status(AssetStatus::Error);
        }
        asset
    }

    fn find_asset(&self, id: &AssetId) -> Option<AssetHandle> {
        self.shared
            .assets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }
}

impl Drop for ThreadedAssetLoader {
    fn drop(&mut self) {
        // Closing the channel ends every worker loop once the queue is drained.
        self.job_tx.take();
        let current = thread::current().id();
        for worker in self.workers.drain(..) {
            // The last reference can be released by a notification handler on a worker.
            if worker.thread().id() == current {
                continue;
            }
            if worker.join().is_err() {
                log::error!("An asset loader worker panicked.");
            }
        }
        log::debug!("ThreadedAssetLoader stopped.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::services::{AssetEventHandler, AssetNotificationBus};
    use std::time::Duration;

    struct Forward(flume::Sender<AssetEvent>);

    impl AssetEventHandler for Forward {
        fn on_asset_data_loaded(&self, asset: &AssetHandle) {
            let _ = self.0.send(AssetEvent::DataLoaded(asset.clone()));
        }

        fn on_asset_ready(&self, asset: &AssetHandle) {
            let _ = self.0.send(AssetEvent::Ready(asset.clone()));
        }

        fn on_asset_error(&self, asset: &AssetHandle) {
            let _ = self.0.send(AssetEvent::Error(asset.clone()));
        }
    }

    fn config() -> LoaderConfig {
        LoaderConfig {
            worker_count: 2,
            ..LoaderConfig::default()
        }
    }

    #[test]
    fn repeated_requests_share_one_load() {
        let bus = Arc::new(InProcessBus::new());
        let loader = ThreadedAssetLoader::new(config(), bus);
        let id = AssetId::from_path("meshes/barrel.mesh");

        let first = loader.request_load(id, AssetType::from_name("mesh"));
        let second = loader.request_load(id, AssetType::from_name("mesh"));
        assert_eq!(first, second);
        assert_eq!(loader.loads_started(), 1);
        assert_eq!(loader.find_asset(&id), Some(first));
    }

    #[test]
    fn data_loaded_precedes_ready() {
        let bus = Arc::new(InProcessBus::new());
        let (tx, rx) = flume::unbounded();
        let id = AssetId::from_path("meshes/barrel.mesh");
        bus.subscribe(id, Arc::new(Forward(tx)));

        let loader = ThreadedAssetLoader::new(config(), bus);
        let asset = loader.request_load(id, AssetType::from_name("mesh"));

        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first, AssetEvent::DataLoaded(asset.clone()));
        assert_eq!(second, AssetEvent::Ready(asset.clone()));
        assert!(asset.is_ready());
    }

    #[test]
    fn failing_source_reports_an_error() {
        let bus = Arc::new(InProcessBus::new());
        let (tx, rx) = flume::unbounded();
        let id = AssetId::from_path("meshes/corrupt.mesh");
        bus.subscribe(id, Arc::new(Forward(tx)));

        let loader = ThreadedAssetLoader::with_source(
            config(),
            bus,
            Arc::new(|asset: &AssetHandle| -> anyhow::Result<()> {
                anyhow::bail!("{} is truncated", asset.hint())
            }),
        );
        let asset = loader.request_load(id, AssetType::from_name("mesh"));

        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(event, AssetEvent::Error(asset.clone()));
        assert!(asset.is_error());
    }
}
