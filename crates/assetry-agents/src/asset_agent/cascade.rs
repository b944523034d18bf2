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

//! Loading by URL, with the model and material dependency cascades.
//!
//! A model at a composite URL first fetches its mapping file and loads every
//! material it names; a material fetched by URL then loads every texture its
//! data names. Children are spawned into a [`JoinSet`] and joined before the
//! parent continues. A missing mapping file falls back to an empty mapping,
//! and a failed child is logged and left out: neither fails the parent.

use super::error::UrlLoadError;
use super::registry::AssetRegistry;
use assetry_core::asset::{kinds, path, AssetDescriptor, AssetFile, AssetRef, LoadRequest};
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;
use tokio::task::JoinSet;

/// A boxed, sendable future; URL loads recurse through the cascades.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The key under which a mapping file lists its materials.
const MAPPING_KEY: &str = "mapping";
/// Only materials with this `mappingFormat` reference textures by path.
const PATH_MAPPING_FORMAT: &str = "path";

impl AssetRegistry {
    /// Loads the asset at `url`, reusing the descriptor already registered
    /// for it or registering a new one named after the URL's last segment.
    ///
    /// See [`load_from_url_and_filename`](Self::load_from_url_and_filename).
    pub fn load_from_url(
        &self,
        url: &str,
        asset_type: &str,
    ) -> BoxFuture<'static, Result<AssetRef, UrlLoadError>> {
        self.load_from_url_and_filename(url, None, asset_type)
    }

    /// Loads the asset at `url`, naming a newly created descriptor after
    /// `filename` (useful when the URL carries no name, as with `blob:`
    /// URLs).
    ///
    /// Models and materials run their dependency cascade first; the future
    /// resolves once, after the descriptor and its cascade are done. Callers
    /// racing on the same URL share one descriptor and one underlying load.
    pub fn load_from_url_and_filename(
        &self,
        url: &str,
        filename: Option<&str>,
        asset_type: &str,
    ) -> BoxFuture<'static, Result<AssetRef, UrlLoadError>> {
        let registry = self.clone();
        let url = url.to_string();
        let filename = filename.map(str::to_string);
        let asset_type = asset_type.to_string();
        Box::pin(async move { registry.load_url(url, filename, asset_type).await })
    }

    async fn load_url(
        self,
        url: String,
        filename: Option<String>,
        asset_type: String,
    ) -> Result<AssetRef, UrlLoadError> {
        let asset = {
            // Lookup and registration must not interleave with another caller's.
            let _gate = self.url_gate();
            match self.get_by_url(&url) {
                Some(existing) => existing,
                None => {
                    let name = path::basename(filename.as_deref().unwrap_or(&url)).to_string();
                    let file = AssetFile::new(url.as_str())
                        .with_filename(filename.clone().unwrap_or_else(|| name.clone()));
                    let created = AssetDescriptor::builder(name, asset_type.as_str())
                        .file(file)
                        .build();
                    self.add(&created);
                    created
                }
            }
        };

        if asset.is_terminal() {
            return match asset.error() {
                Some(error) => Err(UrlLoadError { asset, error }),
                None => Ok(asset),
            };
        }

        if asset_type == kinds::MODEL {
            self.resolve_model(&asset).await;
        }

        let asset = self
            .loaded(&asset)
            .await
            .map_err(|error| UrlLoadError {
                asset: asset.clone(),
                error,
            })?;

        if asset_type == kinds::MATERIAL {
            self.load_textures(&asset).await;
        }
        Ok(asset)
    }

    /// Fetches the model's mapping file and loads the materials it names,
    /// then stores the mapping as the model's data.
    async fn resolve_model(&self, model: &AssetRef) {
        let Some(url) = model.file_url() else {
            return;
        };
        if !self.shared.settings.is_composite_model(url) {
            return;
        }

        let mapping_url = self.shared.settings.mapping_url(url);
        let fetch_url = self.shared.settings.fetch_url(&mapping_url);
        let request = LoadRequest {
            url: Some(&fetch_url),
            asset_type: kinds::JSON,
            asset: None,
        };
        let mapping = match self.shared.loader.load(request).await {
            Ok(loaded) => loaded
                .payload
                .primary()
                .and_then(|doc| doc.downcast_ref::<Value>().cloned()),
            Err(error) => {
                log::debug!(
                    "No mapping for model '{}' ({}); continuing without materials.",
                    model.name(),
                    error
                );
                None
            }
        };
        let Some(mapping) = mapping else {
            model.set_data(json!({ "mapping": [] }));
            return;
        };

        let material_urls: Vec<String> = mapping
            .get(MAPPING_KEY)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|entry| entry.get("path").and_then(Value::as_str))
            .filter(|path| !path.is_empty())
            .map(|path| model.resolve_url(path))
            .collect();

        let materials = self.load_children(material_urls, kinds::MATERIAL).await;
        log::debug!(
            "Model '{}' resolved {} material(s).",
            model.name(),
            materials.len()
        );
        model.set_data(mapping);
    }

    /// Loads the textures a material's data references by path.
    async fn load_textures(&self, material: &AssetRef) -> Vec<AssetRef> {
        let texture_urls: Option<Vec<String>> = material.with_data(|data| {
            if data.get("mappingFormat").and_then(Value::as_str) != Some(PATH_MAPPING_FORMAT) {
                return None;
            }
            Some(
                self.shared
                    .settings
                    .texture_properties
                    .iter()
                    .filter_map(|property| data.get(property).and_then(Value::as_str))
                    .filter(|path| !path.is_empty())
                    .map(str::to_string)
                    .collect(),
            )
        });
        let Some(texture_urls) = texture_urls else {
            log::warn!(
                "Skipping textures of material '{}': mappingFormat must be \"path\" to load textures from URL.",
                material.name()
            );
            return Vec::new();
        };

        let texture_urls = texture_urls
            .iter()
            .map(|path| material.resolve_url(path))
            .collect();
        self.load_children(texture_urls, kinds::TEXTURE).await
    }

    /// Fan-out/fan-in: loads every URL concurrently and returns the
    /// descriptors that loaded, once every child has reported.
    async fn load_children(&self, urls: Vec<String>, asset_type: &str) -> Vec<AssetRef> {
        if urls.is_empty() {
            return Vec::new();
        }

        let mut children = JoinSet::new();
        for url in &urls {
            children.spawn_on(self.load_from_url(url, asset_type), &self.shared.runtime);
        }

        let mut loaded = Vec::with_capacity(urls.len());
        while let Some(joined) = children.join_next().await {
            match joined {
                Ok(Ok(child)) => loaded.push(child),
                Ok(Err(failure)) => log::error!("Dependency failed: {failure}"),
                Err(e) => log::error!("Dependency task for {asset_type} aborted: {e}"),
            }
        }
        loaded
    }
}
