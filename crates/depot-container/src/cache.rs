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

//! Shared containers keyed by root asset and dependency rules.

use crate::container::{AssetContainer, ContainerEvent, ContainerOptions, ContainerServices};
use crate::resolver::AssetFilter;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use depot_core::asset::{AssetId, AssetType, DependencyRules};
use std::sync::{Arc, Weak};

/// Hands out one shared [`AssetContainer`] per root asset and dependency rules.
///
/// Containers are cached weakly: an entry lives as long as some caller holds
/// the container, and a later request after the last holder is gone builds a
/// fresh one. Requests with a filter always get a private, uncached container,
/// since a filtered graph is not the graph other callers expect.
pub struct ContainerCache {
    services: ContainerServices,
    containers: DashMap<(AssetId, DependencyRules), Weak<AssetContainer>>,
    events: Option<flume::Sender<ContainerEvent>>,
}

impl ContainerCache {
    /// Creates an empty cache building containers over `services`.
    pub fn new(services: ContainerServices) -> Self {
        Self {
            services,
            containers: DashMap::new(),
            events: None,
        }
    }

    /// Connects every container this cache builds to an event channel.
    pub fn with_event_sender(mut self, sender: flume::Sender<ContainerEvent>) -> Self {
        self.events = Some(sender);
        self
    }

    /// Returns the live container for `root` built with `rules`, or builds one.
    ///
    /// Containers are built without holding any cache lock. When two callers
    /// race to build the same entry, the first one stored wins and the other
    /// container is dropped; the loader sees repeated requests for the same ids.
    pub fn get_container(
        &self,
        root: AssetId,
        asset_type: AssetType,
        rules: DependencyRules,
        filter: Option<AssetFilter>,
    ) -> Arc<AssetContainer> {
        if filter.is_some() {
            return self.build(root, asset_type, rules, filter);
        }

        let key = (root, rules);
        if let Some(container) = self.containers.get(&key).and_then(|entry| entry.upgrade()) {
            log::trace!("Reusing cached container for {root} ({rules:?}).");
            return container;
        }

        let built = self.build(root, asset_type, rules, None);
        let existing = match self.containers.entry(key) {
            Entry::Occupied(mut entry) => match entry.get().upgrade() {
                Some(existing) => Some(existing),
                None => {
                    entry.insert(Arc::downgrade(&built));
                    None
                }
            },
            Entry::Vacant(entry) => {
                entry.insert(Arc::downgrade(&built));
                None
            }
        };
        // The spare container is dropped here, after the shard lock is released.
        if let Some(existing) = existing {
            log::trace!("Container for {root} ({rules:?}) was built concurrently.");
            return existing;
        }
        built
    }

    /// Removes entries whose container has been dropped. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let before = self.containers.len();
        self.containers.retain(|_, container| container.strong_count() > 0);
        before - self.containers.len()
    }

    /// Number of cache entries, including expired ones not yet pruned.
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// Returns `true` if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    fn build(
        &self,
        root: AssetId,
        asset_type: AssetType,
        rules: DependencyRules,
        filter: Option<AssetFilter>,
    ) -> Arc<AssetContainer> {
        let mut options = ContainerOptions::new().with_rules(rules);
        options.filter = filter;
        options.events = self.events.clone();
        Arc::new(AssetContainer::new(
            self.services.clone(),
            root,
            asset_type,
            options,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::asset::{AssetHandle, AssetStatus, ProductDependency};
    use depot_core::catalog::{AssetIndex, AssetRecord};
    use depot_core::services::AssetLoader;
    use depot_infra::InProcessBus;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CountingLoader {
        assets: Mutex<HashMap<AssetId, AssetHandle>>,
        requests: Mutex<usize>,
    }

    impl AssetLoader for CountingLoader {
        fn request_load(&self, id: AssetId, asset_type: AssetType) -> AssetHandle {
            *self.requests.lock().unwrap() += 1;
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

    fn ty() -> AssetType {
        AssetType::from_name("test")
    }

    fn setup() -> (ContainerCache, Arc<CountingLoader>, Arc<InProcessBus>) {
        let root = AssetId::from_path("level");
        let child = AssetId::from_path("cinematic");
        let catalog = AssetIndex::from_records([
            AssetRecord::new(root, ty(), "level")
                .with_dependency(ProductDependency::no_load(child, ty())),
            AssetRecord::new(child, ty(), "cinematic"),
        ]);
        let loader = Arc::new(CountingLoader::default());
        let bus = Arc::new(InProcessBus::new());
        let services = ContainerServices::new(Arc::new(catalog), loader.clone(), bus.clone());
        (ContainerCache::new(services), loader, bus)
    }

    #[test]
    fn same_rules_share_a_container() {
        let (cache, loader, _bus) = setup();
        let root = AssetId::from_path("level");

        let first = cache.get_container(root, ty(), DependencyRules::UseLoadBehavior, None);
        let second = cache.get_container(root, ty(), DependencyRules::UseLoadBehavior, None);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*loader.requests.lock().unwrap(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn different_rules_get_different_containers() {
        let (cache, _loader, _bus) = setup();
        let root = AssetId::from_path("level");

        let deferred = cache.get_container(root, ty(), DependencyRules::UseLoadBehavior, None);
        let eager = cache.get_container(root, ty(), DependencyRules::LoadAll, None);

        assert!(!Arc::ptr_eq(&deferred, &eager));
        assert_eq!(eager.rules(), DependencyRules::LoadAll);
        assert!(eager.unloaded_dependencies().is_empty());
        assert_eq!(deferred.unloaded_dependencies().len(), 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn prune_removes_only_expired_entries() {
        let (cache, _loader, bus) = setup();
        let root = AssetId::from_path("level");

        let kept = cache.get_container(root, ty(), DependencyRules::UseLoadBehavior, None);
        let dropped = cache.get_container(root, ty(), DependencyRules::LoadAll, None);
        drop(dropped);

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.prune(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.prune(), 0);
        assert_eq!(bus.subscriber_count(&root), 1);

        drop(kept);
        assert_eq!(cache.prune(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn filtered_requests_are_not_stored() {
        let (cache, _loader, _bus) = setup();
        let root = AssetId::from_path("level");
        let filter: AssetFilter = Arc::new(|_: &crate::AssetFilterInfo| true);

        let _private =
            cache.get_container(root, ty(), DependencyRules::UseLoadBehavior, Some(filter));
        assert!(cache.is_empty());
    }
}
