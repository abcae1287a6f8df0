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

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A globally unique, persistent identifier for one asset product.
///
/// The `guid` names the source asset and the `sub_id` selects one of the
/// products built from it, so a model and the collision shape baked from the
/// same source file share a guid but not a sub id.
///
/// Equality and hashing are by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId {
    guid: Uuid,
    sub_id: u32,
}

impl AssetId {
    /// Creates an id from an explicit guid and sub id.
    pub const fn new(guid: Uuid, sub_id: u32) -> Self {
        Self { guid, sub_id }
    }

    /// Creates a new, random (version 4) `AssetId` with a sub id of zero.
    pub fn random() -> Self {
        Self::new(Uuid::new_v4(), 0)
    }

    /// Creates a deterministic (version 5) `AssetId` from a product path.
    ///
    /// The same path always produces the same id, which keeps test fixtures
    /// and tooling output stable across runs.
    pub fn from_path(path: &str) -> Self {
        Self::new(Uuid::new_v5(&Uuid::NAMESPACE_OID, path.as_bytes()), 0)
    }

    /// Returns a copy of this id pointing at another product of the same source.
    pub const fn with_sub_id(self, sub_id: u32) -> Self {
        Self::new(self.guid, sub_id)
    }

    /// The nil id. Never registered in a catalog.
    pub const fn invalid() -> Self {
        Self::new(Uuid::nil(), 0)
    }

    /// Returns `true` unless this is the nil id.
    pub fn is_valid(&self) -> bool {
        !self.guid.is_nil()
    }

    /// The guid of the source asset.
    pub fn guid(&self) -> Uuid {
        self.guid
    }

    /// The product index within the source asset.
    pub fn sub_id(&self) -> u32 {
        self.sub_id
    }
}

impl Default for AssetId {
    fn default() -> Self {
        Self::invalid()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}:{:x}", self.guid.hyphenated(), self.sub_id)
    }
}

/// A type tag identifying the runtime type of an asset (e.g. "texture", "mesh").
///
/// The loader uses it to select the handler that deserializes the asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetType(Uuid);

impl AssetType {
    /// Wraps an existing type guid.
    pub const fn new(guid: Uuid) -> Self {
        Self(guid)
    }

    /// Derives a stable type guid from a type name.
    pub fn from_name(name: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_URL, name.as_bytes()))
    }

    /// The type used when a dependency's type is not known up front.
    pub const fn unknown() -> Self {
        Self(Uuid::nil())
    }

    /// Returns the underlying guid.
    pub fn guid(&self) -> Uuid {
        self.0
    }
}

impl Default for AssetType {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_ids_are_deterministic() {
        assert_eq!(AssetId::from_path("textures/rock.dds"), AssetId::from_path("textures/rock.dds"));
        assert_ne!(AssetId::from_path("textures/rock.dds"), AssetId::from_path("textures/sand.dds"));
    }

    #[test]
    fn sub_id_distinguishes_products() {
        let mesh = AssetId::from_path("models/crate.fbx");
        let collision = mesh.with_sub_id(2);
        assert_eq!(mesh.guid(), collision.guid());
        assert_ne!(mesh, collision);
        assert_eq!(collision.sub_id(), 2);
    }

    #[test]
    fn default_id_is_invalid() {
        assert!(!AssetId::default().is_valid());
        assert!(AssetId::random().is_valid());
    }

    #[test]
    fn display_includes_sub_id_in_hex() {
        let id = AssetId::new(Uuid::nil(), 255);
        assert_eq!(id.to_string(), "{00000000-0000-0000-0000-000000000000}:ff");
    }

    #[test]
    fn type_names_map_to_stable_guids() {
        assert_eq!(AssetType::from_name("texture"), AssetType::from_name("texture"));
        assert_ne!(AssetType::from_name("texture"), AssetType::from_name("mesh"));
        assert_eq!(AssetType::default(), AssetType::unknown());
    }
}
