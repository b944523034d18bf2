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

use super::{AssetDescriptor, AssetFile, AssetId, AssetRef};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The serialized form of a descriptor, as found in project asset lists.
///
/// ```json
/// { "id": 4, "name": "crate", "type": "model",
///   "file": { "url": "models/crate.json" },
///   "tags": ["props"], "preload": true }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetDefinition {
    /// Project ids are positive. Omitted ids get a runtime id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AssetId>,
    /// Display name; not unique.
    pub name: String,
    /// The type tag.
    #[serde(rename = "type")]
    pub asset_type: String,
    /// The backing file, for fetched types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<AssetFile>,
    /// Inline configuration.
    #[serde(default = "empty_object")]
    pub data: Value,
    /// Tags used by queries.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Load as soon as registered.
    #[serde(default)]
    pub preload: bool,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

impl AssetDefinition {
    /// Builds an unregistered descriptor from this definition.
    pub fn into_asset(self) -> AssetRef {
        let mut builder = AssetDescriptor::builder(self.name, self.asset_type)
            .data(self.data)
            .tags(self.tags)
            .preload(self.preload);
        if let Some(id) = self.id {
            builder = builder.id(id);
        }
        if let Some(file) = self.file {
            builder = builder.file(file);
        }
        builder.build()
    }
}
