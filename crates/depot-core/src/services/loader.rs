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

use crate::asset::{AssetHandle, AssetId, AssetType};

/// The asset manager a container requests loads from.
///
/// Implementations own the asset data and report progress through an
/// [`AssetNotificationBus`](super::AssetNotificationBus).
pub trait AssetLoader: Send + Sync {
    /// Starts loading `id` if it is not already loading or loaded, and returns its handle.
    ///
    /// This must not block on the load itself. Requesting an asset that is already
    /// known returns a clone of the existing handle, whose status may already be
    /// [`AssetStatus::Ready`](crate::AssetStatus::Ready); in that case no further
    /// notification is guaranteed.
    fn request_load(&self, id: AssetId, asset_type: AssetType) -> AssetHandle;

    /// Returns the handle of an asset the loader already knows, without starting a load.
    fn find_asset(&self, id: &AssetId) -> Option<AssetHandle>;
}
