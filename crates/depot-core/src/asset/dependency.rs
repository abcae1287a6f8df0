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

use super::id::{AssetId, AssetType};
use serde::{Deserialize, Serialize};

/// How a dependency edge affects the loading of its parent.
///
/// The behavior belongs to the edge, not to the dependency itself: the same
/// texture can be a `PreLoad` dependency of one material and a `NoLoad`
/// dependency of another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LoadBehavior {
    /// The parent is not ready until this dependency is ready.
    PreLoad,
    /// The dependency is loaded alongside the parent, but the parent does not wait for it.
    #[default]
    QueueLoad,
    /// The dependency is recorded but only loaded when explicitly requested.
    NoLoad,
}

impl LoadBehavior {
    /// Returns `true` if the parent's readiness depends on this edge.
    pub fn blocks_parent(self) -> bool {
        matches!(self, LoadBehavior::PreLoad)
    }

    /// Returns `true` if the dependency is requested as part of the parent's load.
    pub fn loads_with_parent(self) -> bool {
        !matches!(self, LoadBehavior::NoLoad)
    }
}

/// Selects how a container interprets the load behaviors it discovers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DependencyRules {
    /// Honor each edge's [`LoadBehavior`].
    #[default]
    UseLoadBehavior,
    /// Ignore load behaviors: every dependency is requested and blocks its parent.
    LoadAll,
}

impl DependencyRules {
    /// The behavior a container actually applies to an edge declared as `declared`.
    pub fn effective_behavior(self, declared: LoadBehavior) -> LoadBehavior {
        match self {
            DependencyRules::UseLoadBehavior => declared,
            DependencyRules::LoadAll => LoadBehavior::PreLoad,
        }
    }
}

/// One outgoing dependency edge as declared in the asset catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProductDependency {
    /// The asset that is depended upon.
    pub id: AssetId,
    /// The runtime type of the dependency, used when requesting its load.
    pub asset_type: AssetType,
    /// How the dependency affects the parent's loading.
    pub behavior: LoadBehavior,
}

impl ProductDependency {
    /// Creates a dependency edge.
    pub fn new(id: AssetId, asset_type: AssetType, behavior: LoadBehavior) -> Self {
        Self {
            id,
            asset_type,
            behavior,
        }
    }

    /// Shorthand for a [`LoadBehavior::PreLoad`] edge.
    pub fn preload(id: AssetId, asset_type: AssetType) -> Self {
        Self::new(id, asset_type, LoadBehavior::PreLoad)
    }

    /// Shorthand for a [`LoadBehavior::QueueLoad`] edge.
    pub fn queue_load(id: AssetId, asset_type: AssetType) -> Self {
        Self::new(id, asset_type, LoadBehavior::QueueLoad)
    }

    /// Shorthand for a [`LoadBehavior::NoLoad`] edge.
    pub fn no_load(id: AssetId, asset_type: AssetType) -> Self {
        Self::new(id, asset_type, LoadBehavior::NoLoad)
    }
}
