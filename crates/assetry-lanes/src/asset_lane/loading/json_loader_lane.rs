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

//! JSON documents: models, materials and mapping files.

use super::AssetLoaderLane;
use serde_json::Value;

/// Parses a JSON document into a [`serde_json::Value`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLoaderLane;

impl AssetLoaderLane<Value> for JsonLoaderLane {
    fn load(&self, bytes: &[u8]) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
