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

//! Configuration for the in-process asset services.

use depot_core::asset::DependencyRules;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// An error raised while reading or writing a [`DepotConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration text is not valid RON for [`DepotConfig`].
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// The configuration could not be serialized.
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] ron::Error),
}

/// Configuration for the [`ThreadedAssetLoader`](crate::ThreadedAssetLoader).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Number of worker threads loading assets in parallel.
    pub worker_count: usize,
    /// Prefix of the worker thread names; workers are named `{prefix}-{index}`.
    pub thread_name_prefix: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            thread_name_prefix: "depot-loader".to_string(),
        }
    }
}

/// Top-level configuration of the asset services, usually read from a `.ron` file.
///
/// Every field is optional in the file; missing fields take their default.
///
/// ```ron
/// (
///     default_rules: LoadAll,
///     loader: (worker_count: 2),
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepotConfig {
    /// The rules applied by containers that do not choose their own.
    pub default_rules: DependencyRules,
    /// Loader settings.
    pub loader: LoaderConfig,
}

impl DepotConfig {
    /// Parses a configuration from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Reads and parses a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&text)?;
        log::info!("Loaded depot configuration from '{}'.", path.display());
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed RON.
    pub fn to_ron_string(&self) -> Result<String, ConfigError> {
        let pretty_config = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        Ok(ron::ser::to_string_pretty(self, pretty_config)?)
    }
}
