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

use crate::asset::{AssetHandle, AssetId};
use std::sync::Arc;

/// A progress notification for one asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetEvent {
    /// The asset's own data has been deserialized.
    DataLoaded(AssetHandle),
    /// The asset is fully usable.
    Ready(AssetHandle),
    /// The asset failed to load.
    Error(AssetHandle),
}

impl AssetEvent {
    /// The handle the event is about.
    pub fn asset(&self) -> &AssetHandle {
        match self {
            AssetEvent::DataLoaded(asset) | AssetEvent::Ready(asset) | AssetEvent::Error(asset) => {
                asset
            }
        }
    }

    /// The id of the asset the event is about. Events are routed by this id.
    pub fn asset_id(&self) -> AssetId {
        self.asset().id()
    }
}

/// Receives the notifications for the asset ids it is subscribed to.
///
/// Handlers may be invoked from any thread.
pub trait AssetEventHandler: Send + Sync {
    /// Called when an asset's own data has been deserialized.
    fn on_asset_data_loaded(&self, asset: &AssetHandle);

    /// Called when an asset is fully usable.
    fn on_asset_ready(&self, asset: &AssetHandle);

    /// Called when an asset failed to load.
    fn on_asset_error(&self, asset: &AssetHandle) {
        log::warn!("Asset {} ({}) failed to load.", asset.id(), asset.hint());
    }

    /// Routes an [`AssetEvent`] to the matching callback.
    fn handle_event(&self, event: &AssetEvent) {
        match event {
            AssetEvent::DataLoaded(asset) => self.on_asset_data_loaded(asset),
            AssetEvent::Ready(asset) => self.on_asset_ready(asset),
            AssetEvent::Error(asset) => self.on_asset_error(asset),
        }
    }
}

/// An opaque token identifying one subscription on an [`AssetNotificationBus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Wraps a bus-specific subscription number.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw subscription number.
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Per-asset publish/subscribe for [`AssetEvent`]s.
///
/// Events for the same asset id must be delivered in the order they were
/// published. No ordering is required across different ids.
pub trait AssetNotificationBus: Send + Sync {
    /// Registers `handler` for every event about `id`.
    fn subscribe(&self, id: AssetId, handler: Arc<dyn AssetEventHandler>) -> SubscriptionId;

    /// Removes a subscription. Returns `false` if it was not registered.
    ///
    /// Once this returns, no new delivery to the handler for `id` starts. A
    /// delivery that was already running on another thread may still finish.
    fn unsubscribe(&self, id: &AssetId, subscription: SubscriptionId) -> bool;
}
