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

//! # Depot Infra
//!
//! Concrete, in-process implementations of the services an asset container
//! consumes: a notification bus, a worker-pool loader, and file-based
//! configuration. Hosts with their own job system or event dispatch implement
//! the `depot-core` traits instead.

#![warn(missing_docs)]

pub mod bus;
pub mod config;
pub mod loader;

pub use bus::InProcessBus;
pub use config::{ConfigError, DepotConfig, LoaderConfig};
pub use loader::{AssetSource, ThreadedAssetLoader};
