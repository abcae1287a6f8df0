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

mod common;

use anyhow::Result;
use common::{id, init_logging, record, ty};
use depot_container::{AssetContainer, ContainerEvent, ContainerOptions, ContainerServices};
use depot_core::asset::{AssetHandle, DependencyRules, LoadBehavior::*};
use depot_core::catalog::{AssetIndex, AssetRecord};
use depot_infra::{DepotConfig, InProcessBus, ThreadedAssetLoader};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const TIMEOUT: Duration = Duration::from_secs(10);

const DEPOT_RON: &str = r#"(
    default_rules: UseLoadBehavior,
    loader: (worker_count: 4, thread_name_prefix: "test-loader"),
)"#;

fn level_records(meshes: usize, textures: usize) -> Vec<AssetRecord> {
    let mut records = Vec::new();
    let mut level = record("level", &[("cinematic", NoLoad)]);
    for m in 0..meshes {
        let mesh = format!("mesh_{m}");
        level = level.with_dependency(depot_core::ProductDependency::preload(id(&mesh), ty()));
        let mut mesh_record = record(&mesh, &[]);
        for t in 0..textures {
            let texture = format!("texture_{m}_{t}");
            mesh_record = mesh_record
                .with_dependency(depot_core::ProductDependency::queue_load(id(&texture), ty()));
            records.push(record(&texture, &[]));
        }
        records.push(mesh_record);
    }
    records.push(level);
    records.push(record("cinematic", &[("mesh_0", PreLoad)]));
    records
}

struct World {
    bus: Arc<InProcessBus>,
    loader: Arc<ThreadedAssetLoader>,
    services: ContainerServices,
}

impl World {
    fn new(
        records: Vec<AssetRecord>,
        loader: impl FnOnce(Arc<InProcessBus>) -> ThreadedAssetLoader,
    ) -> Self {
        init_logging();
        let bus = Arc::new(InProcessBus::new());
        let loader = Arc::new(loader(bus.clone()));
        let services = ContainerServices::new(
            Arc::new(AssetIndex::from_records(records)),
            loader.clone(),
            bus.clone(),
        );
        Self {
            bus,
            loader,
            services,
        }
    }

    fn observed(&self, root: &str) -> (AssetContainer, flume::Receiver<ContainerEvent>) {
        let (tx, rx) = flume::unbounded();
        let options = ContainerOptions::new()
            .with_rules(config().default_rules)
            .with_event_sender(tx);
        (
            AssetContainer::new(self.services.clone(), id(root), ty(), options),
            rx,
        )
    }
}

fn config() -> DepotConfig {
    DepotConfig::from_ron_str(DEPOT_RON).expect("test configuration parses")
}

fn wait_for(events: &flume::Receiver<ContainerEvent>, expected: ContainerEvent) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while let Ok(event) = events.recv_deadline(deadline) {
        if event == expected {
            return true;
        }
    }
    false
}

fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    condition()
}

#[test]
fn test_level_loads_on_worker_threads() -> Result<()> {
    let world = World::new(level_records(16, 3), |bus| {
        ThreadedAssetLoader::new(config().loader, bus)
    });
    let (container, events) = world.observed("level");

    assert!(wait_for(&events, ContainerEvent::Ready { root: id("level") }));
    assert!(container.is_ready());
    for m in 0..16 {
        let mesh = &container.dependencies()[&id(&format!("mesh_{m}"))];
        assert!(mesh.status().has_data());
    }

    assert!(wait_until(|| !container.is_loading()));
    assert_eq!(world.loader.loads_started(), 1 + 16 + 16 * 3);
    assert_eq!(container.unloaded_dependencies().len(), 1);
    assert!(wait_until(|| world.bus.total_subscriptions() == 0));

    assert!(container.load_dependency(id("cinematic"), None, DependencyRules::UseLoadBehavior));
    assert!(wait_for(
        &events,
        ContainerEvent::DependencyReady {
            root: id("level"),
            id: id("cinematic"),
        }
    ));
    assert_eq!(world.loader.loads_started(), 1 + 16 + 16 * 3 + 1);
    Ok(())
}

#[test]
fn test_failed_load_on_worker_thread_keeps_container_pending() -> Result<()> {
    let broken = id("mesh_3");
    let world = World::new(level_records(8, 1), |bus| {
        ThreadedAssetLoader::with_source(
            config().loader,
            bus,
            Arc::new(move |asset: &AssetHandle| -> anyhow::Result<()> {
                if asset.id() == broken {
                    anyhow::bail!("corrupt mesh");
                }
                Ok(())
            }),
        )
    });
    let (container, events) = world.observed("level");

    assert!(wait_for(
        &events,
        ContainerEvent::DependencyFailed {
            root: id("level"),
            id: broken,
        }
    ));
    assert!(wait_until(|| container.num_waiting_dependencies() == 0));
    assert!(!container.is_ready());
    assert_eq!(container.failed_dependencies(), 1);
    assert_eq!(container.invalid_dependencies(), 0);
    Ok(())
}

#[test]
fn test_containers_dropped_mid_load_leave_no_subscriptions() -> Result<()> {
    let world = World::new(level_records(8, 2), |bus| {
        ThreadedAssetLoader::new(config().loader, bus)
    });

    for _ in 0..32 {
        let (container, _events) = world.observed("level");
        drop(container);
    }
    assert_eq!(world.bus.total_subscriptions(), 0);

    let (survivor, events) = world.observed("level");
    assert!(wait_for(&events, ContainerEvent::Ready { root: id("level") }));
    assert!(survivor.is_ready());
    assert_eq!(world.loader.loads_started(), 1 + 8 + 8 * 2);
    Ok(())
}
