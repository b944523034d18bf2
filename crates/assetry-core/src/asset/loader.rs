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

use super::{AssetId, AssetRef, LoadError, ResourceHandle, ResourcePayload};
use async_trait::async_trait;
use serde_json::Value;

/// What a loader is asked to fetch.
#[derive(Debug, Clone, Copy)]
pub struct LoadRequest<'a> {
    /// The URL to fetch, with the registry prefix already applied. `None`
    /// for types that load without a file of their own.
    pub url: Option<&'a str>,
    /// The type tag selecting the decoder.
    pub asset_type: &'a str,
    /// The descriptor being loaded, when the load is on behalf of one.
    pub asset: Option<&'a AssetRef>,
}

/// The result of a successful fetch.
#[derive(Debug, Clone)]
pub struct LoadedResource {
    /// The decoded resources, attached to the descriptor.
    pub payload: ResourcePayload,
    /// A per-type side channel (e.g. decode statistics or the raw document).
    pub extra: Option<ResourceHandle>,
}

impl LoadedResource {
    /// A result without a side channel.
    pub fn new(payload: ResourcePayload) -> Self {
        Self {
            payload,
            extra: None,
        }
    }

    /// Attaches a side channel value.
    pub fn with_extra(mut self, extra: ResourceHandle) -> Self {
        self.extra = Some(extra);
        self
    }
}

/// Read access to the registry, handed to [`ResourceLoader::patch`] so a
/// loader can link a descriptor to the descriptors its data references.
pub trait AssetLookup: Send + Sync {
    /// Looks a descriptor up by id.
    fn get(&self, id: AssetId) -> Option<AssetRef>;
    /// Looks a descriptor up by file URL.
    fn get_by_url(&self, url: &str) -> Option<AssetRef>;
    /// The first descriptor with the given name and, if set, type.
    fn find(&self, name: &str, asset_type: Option<&str>) -> Option<AssetRef>;
}

/// The boundary between the registry and the fetch/decode layer.
///
/// The registry never inspects decoded resources; it only stores what the
/// loader returns and decides when to call it.
#[async_trait]
pub trait ResourceLoader: Send + Sync {
    /// Fetches and decodes the resource at `request.url`.
    async fn load(&self, request: LoadRequest<'_>) -> Result<LoadedResource, LoadError>;

    /// Builds a resource directly from inline data, for types that load
    /// without a file (cubemaps assembled from other descriptors, for
    /// instance).
    fn open(&self, asset_type: &str, data: &Value) -> Result<ResourcePayload, LoadError>;

    /// Called after a descriptor's resources are attached and before any
    /// load notification fires. The default does nothing.
    fn patch(&self, asset: &AssetRef, assets: &dyn AssetLookup) {
        let _ = (asset, assets);
    }
}
