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

//! The default [`ResourceLoader`]: reads bytes from a [`ResourceSource`] and
//! dispatches them to the decoding lane registered for the asset type.

use super::loading::{open_cubemap, CubemapFaces, JsonLoaderLane, TextureLoaderLane};
use super::source::{read_data_url, ResourceSource};
use super::AssetLoaderLane;
use assetry_core::asset::{
    kinds, Asset, AssetLookup, AssetRef, LoadError, LoadRequest, LoadedResource, ResourceHandle,
    ResourcePayload, ResourceLoader,
};
use assetry_core::telemetry::MetricsResult;
use assetry_telemetry::{metrics::registry::HistogramHandle, MetricsRegistry, ScopedMetricTimer};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::error::Error;
use std::marker::PhantomData;
use std::sync::Arc;

/// Side-channel value attached to every load: where the bytes came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    /// The URL that was read.
    pub url: String,
    /// Number of bytes read.
    pub byte_len: usize,
}

impl Asset for SourceInfo {}

/// Type-erased lane.
trait AnyLoaderLane: Send + Sync {
    fn load_any(&self, bytes: &[u8]) -> Result<ResourceHandle, Box<dyn Error + Send + Sync>>;
}

struct AssetLoaderLaneWrapper<A: Asset, L: AssetLoaderLane<A>>(L, PhantomData<fn() -> A>);

impl<A: Asset, L: AssetLoaderLane<A>> AnyLoaderLane for AssetLoaderLaneWrapper<A, L> {
    fn load_any(&self, bytes: &[u8]) -> Result<ResourceHandle, Box<dyn Error + Send + Sync>> {
        self.0.load(bytes).map(ResourceHandle::new)
    }
}

type Opener = Box<dyn Fn(&Value) -> Result<ResourcePayload, LoadError> + Send + Sync>;

/// Loader built from per-type lanes and inline openers.
pub struct LaneResourceLoader {
    source: Arc<dyn ResourceSource>,
    lanes: HashMap<String, Arc<dyn AnyLoaderLane>>,
    openers: HashMap<String, Opener>,
    decode_time: Option<HistogramHandle>,
}

impl LaneResourceLoader {
    /// A loader with no lanes registered.
    pub fn new(source: impl ResourceSource + 'static) -> Self {
        Self {
            source: Arc::new(source),
            lanes: HashMap::new(),
            openers: HashMap::new(),
            decode_time: None,
        }
    }

    /// A loader with the bundled lanes: JSON documents for `json`, `model`
    /// and `material`, images for `texture`, and inline openers for
    /// `json`, `material` and `cubemap`.
    pub fn with_default_lanes(source: impl ResourceSource + 'static) -> Self {
        let mut loader = Self::new(source);
        for asset_type in [kinds::JSON, kinds::MODEL, kinds::MATERIAL] {
            loader.register_lane(asset_type, JsonLoaderLane);
        }
        loader.register_lane(kinds::TEXTURE, TextureLoaderLane);
        for asset_type in [kinds::JSON, kinds::MATERIAL] {
            loader.register_opener(asset_type, |data| Ok(ResourcePayload::single(data.clone())));
        }
        loader.register_opener(kinds::CUBEMAP, open_cubemap);
        loader
    }

    /// Records decode times into `assets:decode_time`.
    pub fn with_metrics(mut self, registry: &MetricsRegistry) -> MetricsResult<Self> {
        self.decode_time = Some(registry.register_histogram(
            "assets",
            "decode_time",
            "Time spent reading and decoding resource bytes",
            "ms",
            vec![1.0, 5.0, 16.0, 33.0, 100.0, 500.0],
        )?);
        Ok(self)
    }

    /// Registers (or replaces) the lane decoding `asset_type`.
    pub fn register_lane<A: Asset>(
        &mut self,
        asset_type: &str,
        lane: impl AssetLoaderLane<A> + 'static,
    ) {
        let wrapped = AssetLoaderLaneWrapper(lane, PhantomData);
        self.lanes.insert(asset_type.to_string(), Arc::new(wrapped));
    }

    /// Registers (or replaces) the inline opener for `asset_type`.
    pub fn register_opener(
        &mut self,
        asset_type: &str,
        opener: impl Fn(&Value) -> Result<ResourcePayload, LoadError> + Send + Sync + 'static,
    ) {
        self.openers
            .insert(asset_type.to_string(), Box::new(opener));
    }

    /// Returns `true` if a lane can fetch `asset_type`.
    pub fn supports(&self, asset_type: &str) -> bool {
        self.lanes.contains_key(asset_type)
    }
}

#[async_trait]
impl ResourceLoader for LaneResourceLoader {
    async fn load(&self, request: LoadRequest<'_>) -> Result<LoadedResource, LoadError> {
        let Some(url) = request.url else {
            // Fileless types (cubemaps) are assembled from the descriptor's data.
            let data = request.asset.map(|a| a.data()).unwrap_or(Value::Null);
            return self.open(request.asset_type, &data).map(LoadedResource::new);
        };
        let lane = self
            .lanes
            .get(request.asset_type)
            .cloned()
            .ok_or_else(|| LoadError::UnsupportedType(request.asset_type.to_string()))?;
        let source = self.source.clone();
        let decode_time = self.decode_time.clone();
        let url_for_error = url;
        let url = url.to_string();
        let asset_type = request.asset_type.to_string();

        let task = tokio::task::spawn_blocking(move || -> Result<LoadedResource, LoadError> {
            let _timer = decode_time.as_ref().map(ScopedMetricTimer::new);
            let bytes = match read_data_url(&url) {
                Some(inline) => inline,
                None => source.read(&url),
            }
            .map_err(|e| LoadError::fetch(&url, e))?;

            let resource = lane
                .load_any(&bytes)
                .map_err(|e| LoadError::decode(&asset_type, e))?;
            log::trace!("Decoded '{}' ({} bytes) as {}.", url, bytes.len(), asset_type);

            let info = SourceInfo {
                url,
                byte_len: bytes.len(),
            };
            Ok(LoadedResource::new(ResourcePayload::Single(resource))
                .with_extra(ResourceHandle::new(info)))
        });

        task.await
            .map_err(|e| LoadError::fetch(url_for_error, format!("load task failed: {e}")))?
    }

    fn open(&self, asset_type: &str, data: &Value) -> Result<ResourcePayload, LoadError> {
        let opener = self
            .openers
            .get(asset_type)
            .ok_or_else(|| LoadError::UnsupportedType(asset_type.to_string()))?;
        opener(data)
    }

    fn patch(&self, asset: &AssetRef, assets: &dyn AssetLookup) {
        match asset.asset_type() {
            // A material fetched from a file takes its document as data.
            kinds::MATERIAL if asset.file().is_some() => {
                if let Some(doc) = asset.resource_as::<Value>() {
                    asset.set_data(Value::clone(&doc));
                }
            }
            kinds::CUBEMAP => {
                let Some(faces) = asset.resource_as::<CubemapFaces>() else {
                    return;
                };
                for id in faces.faces.iter().flatten() {
                    if assets.get(*id).is_none() {
                        log::warn!(
                            "Cubemap '{}' references texture {} which is not registered.",
                            asset.name(),
                            id
                        );
                    }
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset_lane::{CpuTexture, MemorySource};
    use serde_json::json;
    use std::io::Cursor;

    fn request<'a>(url: &'a str, asset_type: &'a str) -> LoadRequest<'a> {
        LoadRequest {
            url: Some(url),
            asset_type,
            asset: None,
        }
    }

    fn png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 255, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[tokio::test]
    async fn dispatches_by_type() {
        let source = MemorySource::new()
            .with("wood.json", br#"{"diffuseMap":"wood.png"}"#.to_vec())
            .with("wood.png", png());
        let loader = LaneResourceLoader::with_default_lanes(source);

        let material = loader.load(request("wood.json", "material")).await.unwrap();
        let doc = material.payload.primary().unwrap().downcast_ref::<Value>().cloned();
        assert_eq!(doc, Some(json!({"diffuseMap": "wood.png"})));
        let info = material.extra.unwrap();
        assert_eq!(info.downcast_ref::<SourceInfo>().unwrap().byte_len, 25);

        let texture = loader.load(request("wood.png", "texture")).await.unwrap();
        assert!(texture.payload.primary().unwrap().is::<CpuTexture>());
    }

    #[tokio::test]
    async fn reports_fetch_decode_and_type_errors() {
        let source = MemorySource::new().with("bad.png", b"nope".to_vec());
        let loader = LaneResourceLoader::with_default_lanes(source);

        assert!(matches!(
            loader.load(request("missing.json", "json")).await,
            Err(LoadError::Fetch { .. })
        ));
        assert!(matches!(
            loader.load(request("bad.png", "texture")).await,
            Err(LoadError::Decode { .. })
        ));
        assert_eq!(
            loader.load(request("a.bin", "audio")).await.unwrap_err(),
            LoadError::UnsupportedType("audio".into())
        );
    }

    #[tokio::test]
    async fn reads_data_urls_without_the_source() {
        let loader = LaneResourceLoader::with_default_lanes(MemorySource::new());
        let loaded = loader
            .load(request("data:application/json;base64,eyJhIjoxfQ==", "json"))
            .await
            .unwrap();
        let doc = loaded.payload.primary().unwrap().downcast_ref::<Value>().cloned();
        assert_eq!(doc, Some(json!({"a": 1})));
    }

    #[tokio::test]
    async fn fileless_loads_use_the_descriptor_data() {
        let loader = LaneResourceLoader::with_default_lanes(MemorySource::new());
        let sky = assetry_core::asset::AssetDescriptor::builder("sky", "cubemap")
            .data(json!({"textures": [1, 2, 3, 4, 5, 6]}))
            .build();
        let loaded = loader
            .load(LoadRequest {
                url: None,
                asset_type: "cubemap",
                asset: Some(&sky),
            })
            .await
            .unwrap();
        let faces = loaded.payload.primary().unwrap().downcast_ref::<CubemapFaces>().cloned();
        assert_eq!(faces.unwrap().faces[5], Some(assetry_core::asset::AssetId::new(6)));
    }

    #[test]
    fn opens_inline_types() {
        let loader = LaneResourceLoader::with_default_lanes(MemorySource::new());
        let payload = loader.open("material", &json!({"shininess": 4})).unwrap();
        assert!(payload.primary().unwrap().is::<Value>());
        assert!(loader.open("cubemap", &json!({"textures": [1]})).is_ok());
        assert!(loader.open("texture", &json!({})).is_err());
    }

    struct NoAssets;

    impl AssetLookup for NoAssets {
        fn get(&self, _id: assetry_core::asset::AssetId) -> Option<AssetRef> {
            None
        }
        fn get_by_url(&self, _url: &str) -> Option<AssetRef> {
            None
        }
        fn find(&self, _name: &str, _asset_type: Option<&str>) -> Option<AssetRef> {
            None
        }
    }

    #[tokio::test]
    async fn patch_copies_material_documents_into_data() {
        let source = MemorySource::new().with("wood.json", r#"{"mappingFormat":"path"}"#);
        let loader = LaneResourceLoader::with_default_lanes(source);
        let wood = assetry_core::asset::AssetDescriptor::builder("wood", "material")
            .url("wood.json")
            .build();

        let loaded = loader.load(request("wood.json", "material")).await.unwrap();
        wood.begin_load(false);
        wood.attach_resources(loaded);
        loader.patch(&wood, &NoAssets);

        assert_eq!(wood.data(), json!({"mappingFormat": "path"}));
    }

    #[tokio::test]
    async fn records_decode_time() {
        let metrics = MetricsRegistry::new();
        let loader = LaneResourceLoader::with_default_lanes(MemorySource::new().with("a.json", "{}"))
            .with_metrics(&metrics)
            .unwrap();
        loader.load(request("a.json", "json")).await.unwrap();

        let snapshot = metrics.namespace("assets");
        assert_eq!(snapshot[0].value.sample_count(), Some(1));
    }
}
