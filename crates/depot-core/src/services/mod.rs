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

//! Contracts for the services an asset container consumes from its host.
//!
//! A container never reads files, schedules jobs, or dispatches events on its
//! own. It talks to three collaborators through these traits:
//! - [`AssetCatalog`]: answers "what does this asset depend on?".
//! - [`AssetLoader`]: starts loads and hands out [`AssetHandle`](crate::AssetHandle)s.
//! - [`AssetNotificationBus`]: delivers per-asset [`AssetEvent`]s to subscribed handlers.

mod bus;
mod catalog;
mod loader;

pub use bus::*;
pub use catalog::*;
pub use loader::*;
