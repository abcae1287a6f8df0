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

//! On-demand promotion of deferred `NoLoad` dependencies.

use crate::container::{Activation, AssetContainer};
use crate::resolver::{AssetFilter, AssetFilterInfo, DependencyResolver};
use depot_core::asset::{AssetHandle, AssetId, DependencyRules, LoadBehavior};
use std::collections::HashSet;
use thiserror::Error;

/// Why a deferred dependency could not be promoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PromotionError {
    /// The id is not one of the container's deferred dependencies. It may
    /// never have been referenced, or it was already promoted.
    #[error("asset {0} is not a deferred dependency of this container")]
    NotDeferred(AssetId),
    /// The catalog does not know the id. It stays deferred.
    #[error("asset {0} is not known to the catalog")]
    UnknownAsset(AssetId),
    /// The supplied filter rejected the id itself.
    #[error("asset {0} was rejected by the promotion filter")]
    Filtered(AssetId),
}

impl AssetContainer {
    /// Starts loading a deferred dependency and everything it needs.
    ///
    /// Returns `false` when the id is not deferred or the catalog does not
    /// know it. See [`try_load_dependency`](Self::try_load_dependency).
    pub fn load_dependency(
        &self,
        id: AssetId,
        filter: Option<AssetFilter>,
        rules: DependencyRules,
    ) -> bool {
        match self.try_load_dependency(id, filter, rules) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Cannot load dependency of {}: {e}", self.root_id());
                false
            }
        }
    }

    /// Promotes a deferred `NoLoad` dependency into an active load.
    ///
    /// The promoted asset's own graph is walked with `rules` and `filter` and
    /// merged into the existing one. Assets the container already loads are
    /// reused, never requested or subscribed a second time. The promoted asset
    /// is tracked like any other dependency, but it does not gate the
    /// container's own readiness.
    pub fn try_load_dependency(
        &self,
        id: AssetId,
        filter: Option<AssetFilter>,
        rules: DependencyRules,
    ) -> Result<(), PromotionError> {
        let shared = &self.shared;
        let root = shared.root.id();

        let (asset_type, known) = {
            let state = shared.lock_dependencies();
            let Some(asset_type) = state.unloaded.get(&id).copied() else {
                return Err(PromotionError::NotDeferred(id));
            };
            let mut known: HashSet<AssetId> = state.dependencies.keys().copied().collect();
            known.insert(root);
            (asset_type, known)
        };

        if let Some(filter) = &filter {
            let info = AssetFilterInfo {
                parent: root,
                id,
                asset_type,
                behavior: LoadBehavior::NoLoad,
            };
            if !filter(&info) {
                return Err(PromotionError::Filtered(id));
            }
        }

        let resolution = DependencyResolver::new(shared.services.catalog.as_ref(), rules)
            .with_filter(filter.as_ref())
            .resolve_into(id, &known);
        if !resolution.root_found {
            return Err(PromotionError::UnknownAsset(id));
        }

        let (handles, new_invalid) = {
            let mut state = shared.lock_dependencies();
            // Another thread may have promoted the same id while the graph was walked.
            if state.unloaded.remove(&id).is_none() {
                return Err(PromotionError::NotDeferred(id));
            }

            let mut handles: Vec<AssetHandle> = Vec::with_capacity(resolution.to_load.len() + 1);
            let promoted = shared.services.loader.request_load(id, asset_type);
            state.dependencies.insert(id, promoted.clone());
            handles.push(promoted);

            for dependency in &resolution.to_load {
                if state.dependencies.contains_key(&dependency.id) {
                    continue;
                }
                let handle = shared
                    .services
                    .loader
                    .request_load(dependency.id, dependency.asset_type);
                state.unloaded.remove(&dependency.id);
                state.dependencies.insert(dependency.id, handle.clone());
                handles.push(handle);
            }

            for (deferred, deferred_type) in &resolution.deferred {
                if *deferred != root && !state.dependencies.contains_key(deferred) {
                    state.unloaded.entry(*deferred).or_insert(*deferred_type);
                }
            }

            let new_invalid = resolution
                .invalid
                .iter()
                .filter(|invalid| state.invalid.insert(**invalid))
                .count();
            (handles, new_invalid)
        };

        log::debug!(
            "Promoted {id} in container {root}: {} assets requested, {new_invalid} new invalid.",
            handles.len()
        );
        shared.activate(Activation {
            handles,
            preload_edges: resolution.preload_edges,
            new_invalid,
        });
        Ok(())
    }
}
