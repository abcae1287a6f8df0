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

//! # Depot Container
//!
//! Loads an asset together with the assets it depends on and tells the caller
//! when the part of that graph it asked to wait for is usable.
//!
//! An [`AssetContainer`] walks the catalog below a root asset, requests every
//! dependency whose [`LoadBehavior`](depot_core::LoadBehavior) says it loads
//! with its parent, and listens to the notification bus. It becomes ready once
//! the root and all of its transitive `PreLoad` dependencies are ready.
//! `NoLoad` dependencies are only recorded and can be promoted later with
//! [`AssetContainer::load_dependency`].
//!
//! The container never spawns threads. It runs on the constructing thread and
//! on whatever thread the bus delivers notifications from.

#![warn(missing_docs)]

pub mod cache;
pub mod container;
pub mod gate;
pub mod resolver;
pub mod wait_set;

pub use cache::ContainerCache;
pub use container::{AssetContainer, ContainerEvent, ContainerOptions, ContainerServices};
pub use gate::PromotionError;
pub use resolver::{AssetFilter, AssetFilterInfo, DependencyResolver, Resolution};
pub use wait_set::WaitSetTracker;
