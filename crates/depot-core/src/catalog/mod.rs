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

//! An in-memory asset catalog backed by a bincode-encoded index.
//!
//! The index is the build pipeline's output: one [`AssetRecord`] per product,
//! listing the product's declared dependencies. [`AssetIndex`] decodes it once
//! and answers dependency queries in O(1).

use crate::asset::{AssetId, AssetType, ProductDependency};
use crate::services::{AssetCatalog, CatalogError};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path};

/// Everything the catalog knows about one asset product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// The unique, stable identifier for this product.
    pub id: AssetId,

    /// The runtime type of the product.
    pub asset_type: AssetType,

    /// A human-readable hint, usually the product's relative path.
    pub hint: String,

    /// The dependencies this product declares, with their load behaviors.
    pub dependencies: Vec<ProductDependency>,
}

impl AssetRecord {
    /// Creates a record without dependencies.
    pub fn new(id: AssetId, asset_type: AssetType, hint: impl Into<String>) -> Self {
        Self {
            id,
            asset_type,
            hint: hint.into(),
            dependencies: Vec::new(),
        }
    }

    /// Adds a dependency edge, returning the record.
    pub fn with_dependency(mut self, dependency: ProductDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }
}

/// The runtime lookup table of asset records.
#[derive(Debug, Default, Clone)]
pub struct AssetIndex {
    /// The internal index mapping asset ids to their records.
    index: HashMap<AssetId, AssetRecord>,
}

impl AssetIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from records. Later records replace earlier ones with the same id.
    pub fn from_records(records: impl IntoIterator<Item = AssetRecord>) -> Self {
        let index = records
            .into_iter()
            .map(|record| (record.id, record))
            .collect();
        Self { index }
    }

    /// Decodes an index from the raw bytes of an index file.
    ///
    /// # Errors
    /// Returns [`CatalogError::Decode`] if the bytes are not a valid,
    /// bincode-encoded list of [`AssetRecord`]s.
    pub fn from_bytes(index_bytes: &[u8]) -> Result<Self, CatalogError> {
        let config = bincode::config::standard();
        let (records, _): (Vec<AssetRecord>, _) =
            bincode::serde::decode_from_slice(index_bytes, config)?;

        log::debug!("Decoded asset index with {} records.", records.len());
        Ok(Self::from_records(records))
    }

    /// Reads and decodes an index file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }

    /// Encodes the index. Records are sorted by id so the output is reproducible.
    pub fn to_bytes(&self) -> Result<Vec<u8>, CatalogError> {
        let mut records: Vec<&AssetRecord> = self.index.values().collect();
        records.sort_by_key(|record| record.id);
        let config = bincode::config::standard();
        Ok(bincode::serde::encode_to_vec(&records, config)?)
    }

    /// Adds or replaces a record.
    pub fn insert(&mut self, record: AssetRecord) {
        self.index.insert(record.id, record);
    }

    /// Retrieves the record for an asset id.
    pub fn get_record(&self, id: &AssetId) -> Option<&AssetRecord> {
        self.index.get(id)
    }

    /// The number of records.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the index holds no records.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl AssetCatalog for AssetIndex {
    fn dependencies(&self, id: &AssetId) -> Result<Vec<ProductDependency>, CatalogError> {
        self.index
            .get(id)
            .map(|record| record.dependencies.clone())
            .ok_or(CatalogError::NotFound(*id))
    }

    fn contains(&self, id: &AssetId) -> bool {
        self.index.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::LoadBehavior;

    fn sample_index() -> AssetIndex {
        let texture = AssetId::from_path("textures/bark.dds");
        let material = AssetRecord::new(
            AssetId::from_path("materials/bark.mat"),
            AssetType::from_name("material"),
            "materials/bark.mat",
        )
        .with_dependency(ProductDependency::preload(
            texture,
            AssetType::from_name("texture"),
        ));
        let texture = AssetRecord::new(texture, AssetType::from_name("texture"), "textures/bark.dds");
        AssetIndex::from_records([material, texture])
    }

    #[test]
    fn lookup_returns_declared_dependencies() {
        let index = sample_index();
        let deps = index
            .dependencies(&AssetId::from_path("materials/bark.mat"))
            .unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].id, AssetId::from_path("textures/bark.dds"));
        assert_eq!(deps[0].behavior, LoadBehavior::PreLoad);
    }

    #[test]
    fn unknown_asset_is_not_found() {
        let index = sample_index();
        let missing = AssetId::from_path("missing.dds");
        match index.dependencies(&missing) {
            Err(CatalogError::NotFound(id)) => assert_eq!(id, missing),
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert!(!index.contains(&missing));
    }

    #[test]
    fn index_survives_encoding() -> anyhow::Result<()> {
        let index = sample_index();
        let decoded = AssetIndex::from_bytes(&index.to_bytes()?)?;
        assert_eq!(decoded.len(), 2);
        assert_eq!(
            decoded.get_record(&AssetId::from_path("materials/bark.mat")),
            index.get_record(&AssetId::from_path("materials/bark.mat"))
        );
        Ok(())
    }

    #[test]
    fn open_reads_index_file_from_disk() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("index.bin");
        std::fs::write(&path, sample_index().to_bytes()?)?;

        let index = AssetIndex::open(&path)?;
        assert!(index.contains(&AssetId::from_path("textures/bark.dds")));
        Ok(())
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            AssetIndex::from_bytes(&[0xff, 0xff, 0xff]),
            Err(CatalogError::Decode(_))
        ));
    }
}
