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
use std::sync::{
    atomic::{AtomicU8, Ordering},
    Arc,
};

/// The loading state of an asset as reported by the loader that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AssetStatus {
    /// No load has been requested.
    NotLoaded = 0,
    /// A load was requested and is waiting for a worker.
    Queued = 1,
    /// A worker is reading or deserializing the asset.
    Loading = 2,
    /// The asset's own data is deserialized; its dependencies may still be loading.
    Loaded = 3,
    /// The asset is fully usable.
    Ready = 4,
    /// The load failed.
    Error = 5,
}

impl AssetStatus {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => AssetStatus::Queued,
            2 => AssetStatus::Loading,
            3 => AssetStatus::Loaded,
            4 => AssetStatus::Ready,
            5 => AssetStatus::Error,
            _ => AssetStatus::NotLoaded,
        }
    }

    /// Returns `true` while a requested load has not finished either way.
    pub fn is_loading(self) -> bool {
        matches!(self, AssetStatus::Queued | AssetStatus::Loading)
    }

    /// Returns `true` once the asset's own data has been deserialized.
    pub fn has_data(self) -> bool {
        matches!(self, AssetStatus::Loaded | AssetStatus::Ready)
    }
}

#[derive(Debug)]
struct AssetSlot {
    id: AssetId,
    asset_type: AssetType,
    hint: String,
    status: AtomicU8,
}

/// A thread-safe, reference-counted handle to a loading or loaded asset.
///
/// The loader owns the asset; containers and other clients only hold clones
/// of the handle. Cloning is cheap, as it only increments the reference count.
/// Two handles compare equal when they point at the same slot.
#[derive(Debug, Clone)]
pub struct AssetHandle(Arc<AssetSlot>);

impl AssetHandle {
    /// Creates a handle in the [`AssetStatus::NotLoaded`] state.
    ///
    /// This is typically called by an [`AssetLoader`](crate::services::AssetLoader)
    /// the first time an asset is requested.
    pub fn new(id: AssetId, asset_type: AssetType, hint: impl Into<String>) -> Self {
        Self(Arc::new(AssetSlot {
            id,
            asset_type,
            hint: hint.into(),
            status: AtomicU8::new(AssetStatus::NotLoaded as u8),
        }))
    }

    /// The id of the asset.
    pub fn id(&self) -> AssetId {
        self.0.id
    }

    /// The runtime type of the asset.
    pub fn asset_type(&self) -> AssetType {
        self.0.asset_type
    }

    /// A human readable hint, usually the product path.
    pub fn hint(&self) -> &str {
        &self.0.hint
    }

    /// The current loading state.
    pub fn status(&self) -> AssetStatus {
        AssetStatus::from_u8(self.0.status.load(Ordering::Acquire))
    }

    /// Updates the loading state. Only the owning loader should call this.
    pub fn set_status(&self, status: AssetStatus) {
        self.0.status.store(status as u8, Ordering::Release);
    }

    /// Shorthand for `status() == AssetStatus::Ready`.
    pub fn is_ready(&self) -> bool {
        self.status() == AssetStatus::Ready
    }

    /// Shorthand for `status() == AssetStatus::Error`.
    pub fn is_error(&self) -> bool {
        self.status() == AssetStatus::Error
    }

    /// The number of live clones of this handle.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl PartialEq for AssetHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for AssetHandle {}
