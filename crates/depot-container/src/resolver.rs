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

//! Walks the catalog to discover the dependency graph below an asset.

use depot_core::asset::{AssetId, AssetType, DependencyRules, LoadBehavior, ProductDependency};
use depot_core::services::AssetCatalog;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

/// What a filter gets to see about a dependency before it is included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetFilterInfo {
    /// The asset declaring the dependency.
    pub parent: AssetId,
    /// The dependency itself.
    pub id: AssetId,
    /// The dependency's runtime type.
    pub asset_type: AssetType,
    /// The load behavior declared on the edge, before dependency rules are applied.
    pub behavior: LoadBehavior,
}

/// Decides whether a dependency is part of a container at all.
///
/// Returning `false` drops the dependency and everything only reachable through it:
/// it is neither loaded nor deferred.
pub type AssetFilter = Arc<dyn Fn(&AssetFilterInfo) -> bool + Send + Sync>;

/// A dependency the resolver decided to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDependency {
    /// The dependency.
    pub id: AssetId,
    /// Its runtime type.
    pub asset_type: AssetType,
    /// The asset through which it was first discovered.
    pub parent: AssetId,
    /// The behavior in effect once dependency rules are applied.
    pub behavior: LoadBehavior,
}

/// The outcome of walking the graph below one asset.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Whether the walked asset itself was found in the catalog.
    pub root_found: bool,
    /// Every dependency to request, each id at most once, in discovery order.
    pub to_load: Vec<ResolvedDependency>,
    /// `NoLoad` dependencies that were recorded but not requested.
    pub deferred: HashMap<AssetId, AssetType>,
    /// `(parent, child)` pairs where the parent's readiness waits on the child.
    pub preload_edges: Vec<(AssetId, AssetId)>,
    /// Referenced ids the catalog does not know, each at most once.
    pub invalid: Vec<AssetId>,
}

/// Discovers and classifies the transitive dependencies of an asset.
///
/// The catalog is queried at most once per id. Edges back to the walked asset
/// are ignored, which also stops cycles through it.
pub struct DependencyResolver<'a> {
    catalog: &'a dyn AssetCatalog,
    rules: DependencyRules,
    filter: Option<&'a AssetFilter>,
}

impl fmt::Debug for DependencyResolver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyResolver")
            .field("rules", &self.rules)
            .field("filtered", &self.filter.is_some())
            .finish()
    }
}

impl<'a> DependencyResolver<'a> {
    /// Creates a resolver applying `rules` to every edge it reads from `catalog`.
    pub fn new(catalog: &'a dyn AssetCatalog, rules: DependencyRules) -> Self {
        Self {
            catalog,
            rules,
            filter: None,
        }
    }

    /// Sets the filter consulted for every edge.
    pub fn with_filter(mut self, filter: Option<&'a AssetFilter>) -> Self {
        self.filter = filter;
        self
    }

    /// Resolves a fresh graph below `root`. The root itself is never part of the result.
    pub fn resolve(&self, root: AssetId) -> Resolution {
        self.resolve_into(root, &HashSet::new())
    }

    /// Resolves the graph below `root` as an extension of an existing graph.
    ///
    /// Ids in `known` are already loading: they are not queried or requested
    /// again and their own dependencies are not walked, but `PreLoad` edges
    /// pointing at them are still reported so new parents wait on them.
    pub fn resolve_into(&self, root: AssetId, known: &HashSet<AssetId>) -> Resolution {
        let mut resolution = Resolution::default();
        let root_dependencies = match self.catalog.dependencies(&root) {
            Ok(dependencies) => {
                resolution.root_found = true;
                dependencies
            }
            Err(e) => {
                log::warn!("Cannot resolve dependencies of {root}: {e}");
                return resolution;
            }
        };

        let mut visited: HashSet<AssetId> = HashSet::from([root]);
        let mut invalid: HashSet<AssetId> = HashSet::new();
        let mut queue: VecDeque<(AssetId, Vec<ProductDependency>)> =
            VecDeque::from([(root, root_dependencies)]);

        while let Some((parent, dependencies)) = queue.pop_front() {
            for dependency in dependencies {
                let id = dependency.id;
                if id == root || !id.is_valid() || !self.accepts(parent, &dependency) {
                    continue;
                }

                let behavior = self.rules.effective_behavior(dependency.behavior);
                if !behavior.loads_with_parent() {
                    if !visited.contains(&id) && !known.contains(&id) && !invalid.contains(&id) {
                        resolution.deferred.insert(id, dependency.asset_type);
                    }
                    continue;
                }

                if !known.contains(&id) && !visited.contains(&id) {
                    if invalid.contains(&id) {
                        continue;
                    }
                    match self.catalog.dependencies(&id) {
                        Ok(child_dependencies) => {
                            visited.insert(id);
                            resolution.deferred.remove(&id);
                            resolution.to_load.push(ResolvedDependency {
                                id,
                                asset_type: dependency.asset_type,
                                parent,
                                behavior,
                            });
                            queue.push_back((id, child_dependencies));
                        }
                        Err(e) => {
                            log::warn!("Skipping dependency {id} of {parent}: {e}");
                            invalid.insert(id);
                            resolution.invalid.push(id);
                            continue;
                        }
                    }
                }

                if behavior.blocks_parent() {
                    resolution.preload_edges.push((parent, id));
                }
            }
        }

        log::trace!(
            "Resolved {root}: {} to load, {} deferred, {} invalid.",
            resolution.to_load.len(),
            resolution.deferred.len(),
            resolution.invalid.len()
        );
        resolution
    }

    fn accepts(&self, parent: AssetId, dependency: &ProductDependency) -> bool {
        let Some(filter) = self.filter else {
            return true;
        };
        let accepted = filter(&AssetFilterInfo {
            parent,
            id: dependency.id,
            asset_type: dependency.asset_type,
            behavior: dependency.behavior,
        });
        if !accepted {
            log::trace!("Filter rejected dependency {} of {parent}.", dependency.id);
        }
        accepted
    }
}
