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

//! Cubemaps are assembled from six texture descriptors named in their
//! inline data; they have no file of their own.

use assetry_core::asset::{Asset, AssetId, LoadError, ResourcePayload};
use serde_json::Value;

/// The six faces of a cubemap as texture descriptor ids, in
/// `+x, -x, +y, -y, +z, -z` order. Unassigned faces are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CubemapFaces {
    /// One entry per face.
    pub faces: [Option<AssetId>; 6],
}

impl Asset for CubemapFaces {}

/// Builds [`CubemapFaces`] from `{"textures": [id|null, ...]}`.
pub fn open_cubemap(data: &Value) -> Result<ResourcePayload, LoadError> {
    let mut faces = [None; 6];
    if let Some(textures) = data.get("textures") {
        let list = textures
            .as_array()
            .ok_or_else(|| LoadError::decode("cubemap", "'textures' is not an array"))?;
        if list.len() > faces.len() {
            return Err(LoadError::decode(
                "cubemap",
                format!("{} faces listed, expected at most 6", list.len()),
            ));
        }
        for (slot, entry) in faces.iter_mut().zip(list) {
            *slot = entry.as_i64().map(AssetId::new);
        }
    }
    Ok(ResourcePayload::single(CubemapFaces { faces }))
}
