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

use crate::asset::{AssetId, ProductDependency};
use thiserror::Error;

/// An error raised while looking up or decoding catalog data.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog has no entry for the asset.
    #[error("asset {0} is not registered in the catalog")]
    NotFound(AssetId),
    /// The index bytes are not a valid, bincode-encoded list of records.
    #[error("failed to decode asset index: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    /// The index could not be encoded.
    #[error("failed to encode asset index: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    /// The index file could not be read or written.
    #[error("asset index I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Maps an asset id to the dependency edges declared for it.
pub trait AssetCatalog: Send + Sync {
    /// Returns the direct dependencies of `id`.
    ///
    /// # Errors
    /// Returns [`CatalogError::NotFound`] if the catalog does not know `id`.
    fn dependencies(&self, id: &AssetId) -> Result<Vec<ProductDependency>, CatalogError>;

    /// Returns `true` if the catalog knows `id`.
    fn contains(&self, id: &AssetId) -> bool {
        self.dependencies(id).is_ok()
    }
}
