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

//! # Depot Core
//!
//! Foundational crate containing the identifiers, handles, and collaborator
//! contracts shared by the asset dependency container and its host.
//!
//! Nothing in this crate loads an asset. It only describes what an asset is,
//! how its dependencies are declared, and which services a container expects
//! its host application to provide.

#![warn(missing_docs)]

pub mod asset;
pub mod catalog;
pub mod event;
pub mod services;

pub use asset::{
    AssetHandle, AssetId, AssetStatus, AssetType, DependencyRules, LoadBehavior,
    ProductDependency,
};
