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

//! Drives one descriptor through `Unloaded -> Loading -> Loaded | Failed`.

use super::metrics::LoadMetrics;
use super::registry::AssetRegistry;
use assetry_core::asset::{
    AssetRef, AssetState, DescriptorEvent, DescriptorTopic, LoadError, LoadRequest,
    LoadedResource,
};
use assetry_core::event::{EventKey, RegistryEvent, Verb};
use assetry_telemetry::ScopedMetricTimer;

/// Options for [`AssetRegistry::load_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    /// Reload even if the last attempt completed. In-flight loads are never
    /// doubled.
    pub force: bool,
}

impl AssetRegistry {
    /// Starts loading a descriptor unless it is loading or already loaded.
    ///
    /// Returns `true` if this call started a load attempt. Completion is
    /// reported on the `load`/`error` channels, or awaited with
    /// [`loaded`](Self::loaded).
    pub fn load(&self, asset: &AssetRef) -> bool {
        self.load_with(asset, LoadOptions::default())
    }

    /// [`load`](Self::load) with options.
    pub fn load_with(&self, asset: &AssetRef, options: LoadOptions) -> bool {
        let fetched = asset.file().is_some()
            || self.shared.settings.loads_without_file(asset.asset_type());
        if !asset.begin_load(options.force) {
            log::trace!("Load of asset {} ignored; already {:?}.", asset.id(), asset.state());
            return false;
        }

        if !fetched {
            // Fully inline: open from data, no load:start.
            let result = self.shared.loader.open(asset.asset_type(), &asset.data());
            match result {
                Ok(payload) => self.finish_load(asset, LoadedResource::new(payload)),
                Err(error) => self.fail_load(asset, error),
            }
            return true;
        }

        LoadMetrics::record(&self.shared.metrics.started);
        log::debug!("Loading asset {} '{}'.", asset.id(), asset.name());
        let event = RegistryEvent::new(asset.clone());
        self.shared.events.publish(&EventKey::all(Verb::LoadStart), &event);
        self.shared
            .events
            .publish(&EventKey::id(Verb::LoadStart, asset.id()), &event);

        let registry = self.clone();
        let asset = asset.clone();
        self.shared.runtime.spawn(async move {
            let timer = ScopedMetricTimer::new(&registry.shared.metrics.load_time);
            let url = asset.file_url().map(|url| registry.shared.settings.fetch_url(url));
            let request = LoadRequest {
                url: url.as_deref(),
                asset_type: asset.asset_type(),
                asset: Some(&asset),
            };
            let result = registry.shared.loader.load(request).await;
            drop(timer);
            match result {
                Ok(loaded) => registry.finish_load(&asset, loaded),
                Err(error) => registry.fail_load(&asset, error),
            }
        });
        true
    }

    /// Waits until the descriptor's current load attempt completes,
    /// starting one first if it has never been loaded.
    ///
    /// Resolves immediately for a descriptor that is already `Loaded` or
    /// `Failed`.
    pub async fn loaded(&self, asset: &AssetRef) -> Result<AssetRef, LoadError> {
        let (sender, receiver) = flume::bounded::<Result<(), LoadError>>(1);
        let events = asset.events();
        let on_load = {
            let sender = sender.clone();
            events.subscribe_once(DescriptorTopic::Load, move |_| {
                let _ = sender.try_send(Ok(()));
            })
        };
        let on_error = events.subscribe_once(DescriptorTopic::Error, move |event| {
            if let DescriptorEvent::Failed(error) = event {
                let _ = sender.try_send(Err(error.clone()));
            }
        });

        if asset.state() == AssetState::Unloaded {
            self.load(asset);
        }
        let outcome = match asset.state() {
            AssetState::Loaded => Ok(()),
            AssetState::Failed => Err(asset
                .error()
                .unwrap_or(LoadError::Aborted(asset.id()))),
            AssetState::Loading | AssetState::Unloaded => receiver
                .recv_async()
                .await
                .unwrap_or(Err(LoadError::Aborted(asset.id()))),
        };

        events.unsubscribe(&DescriptorTopic::Load, on_load);
        events.unsubscribe(&DescriptorTopic::Error, on_error);
        outcome.map(|()| asset.clone())
    }

    /// `Loading -> Loaded`: attach, patch, then notify global, id, URL and
    /// descriptor channels in that order.
    ///
    /// The descriptor only reports `Loaded` once `patch` has returned.
    pub(crate) fn finish_load(&self, asset: &AssetRef, loaded: LoadedResource) {
        asset.attach_resources(loaded);
        self.shared.loader.patch(asset, self);
        asset.mark_loaded();
        LoadMetrics::record(&self.shared.metrics.loaded);
        log::debug!("Asset {} '{}' loaded.", asset.id(), asset.name());

        let event = RegistryEvent::new(asset.clone());
        self.publish_on(Verb::Load, asset, &event, true);
        asset
            .events()
            .publish(&DescriptorTopic::Load, &DescriptorEvent::Loaded);
    }

    /// `Loading -> Failed`: notify global, id and descriptor channels.
    pub(crate) fn fail_load(&self, asset: &AssetRef, error: LoadError) {
        log::warn!("Asset {} '{}' failed to load: {}", asset.id(), asset.name(), error);
        asset.fail_load(error.clone());
        LoadMetrics::record(&self.shared.metrics.failed);

        let event = RegistryEvent::failed(asset.clone(), error.clone());
        self.publish_on(Verb::Error, asset, &event, false);
        asset
            .events()
            .publish(&DescriptorTopic::Error, &DescriptorEvent::Failed(error));
    }
}
