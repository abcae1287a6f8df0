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

//! Provides the foundational primitive types for Depot's asset system.
//!
//! This module defines the "common language" for all asset-related operations:
//! - [`AssetId`] and [`AssetType`]: stable identifiers for an asset and its runtime type.
//! - [`LoadBehavior`] and [`ProductDependency`]: how one asset declares its dependencies.
//! - [`AssetHandle`]: the shared, reference-counted view of an asset owned by the loader.

mod dependency;
mod handle;
mod id;

pub use dependency::*;
pub use handle::*;
pub use id::*;
