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

//! The registry: owns the live descriptor set and its indices, and exposes
//! the registry-level notification channels.

use super::error::RegistryError;
use super::metrics::LoadMetrics;
use assetry_core::asset::{
    AssetDefinition, AssetId, AssetLookup, AssetRef, DescriptorEvent, DescriptorTopic,
    RegistrySettings, ResourceLoader,
};
use assetry_core::event::{EventBus, EventKey, RegistryEvent, SubscriptionId, Target, Verb};
use assetry_data::{AssetIndex, TagTerm};
use assetry_telemetry::MetricsRegistry;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::runtime::Handle;

/// Restricts [`AssetRegistry::list`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListFilter {
    /// Only descriptors whose preload flag equals this value.
    pub preload: Option<bool>,
}

type Watchers = Vec<(DescriptorTopic, SubscriptionId)>;

/// The live set: the indices plus the descriptor subscriptions that keep
/// them current. One lock covers both so registration and removal are
/// atomic with respect to each other and to index refreshes.
#[derive(Default)]
struct LiveSet {
    index: AssetIndex,
    watchers: HashMap<usize, Watchers>,
}

pub(crate) struct RegistryShared {
    live: Mutex<LiveSet>,
    url_gate: Mutex<()>,
    pub(crate) events: EventBus<EventKey, RegistryEvent>,
    pub(crate) loader: Arc<dyn ResourceLoader>,
    pub(crate) settings: RegistrySettings,
    pub(crate) runtime: Handle,
    pub(crate) metrics: LoadMetrics,
}

impl RegistryShared {
    fn live(&self) -> MutexGuard<'_, LiveSet> {
        self.live.lock().expect("asset index poisoned")
    }
}

fn identity(asset: &AssetRef) -> usize {
    Arc::as_ptr(asset) as usize
}

/// The asset registry.
///
/// Cheap to clone; clones share the same descriptors, indices and channels.
/// Loads run on the Tokio runtime captured when the registry was built.
///
/// ```no_run
/// # async fn demo() -> anyhow::Result<()> {
/// use assetry_agents::AssetRegistry;
/// use assetry_lanes::{DirectorySource, LaneResourceLoader};
/// use std::sync::Arc;
///
/// let loader = LaneResourceLoader::with_default_lanes(DirectorySource::new("assets"));
/// let registry = AssetRegistry::new(Arc::new(loader))?;
/// let model = registry.load_from_url("models/crate.json", "model").await?;
/// println!("{} is {:?}", model.name(), model.state());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AssetRegistry {
    pub(crate) shared: Arc<RegistryShared>,
}

/// Builds an [`AssetRegistry`].
pub struct AssetRegistryBuilder {
    loader: Arc<dyn ResourceLoader>,
    settings: RegistrySettings,
    metrics: Option<MetricsRegistry>,
    runtime: Option<Handle>,
}

impl AssetRegistryBuilder {
    /// Replaces the default settings.
    pub fn settings(mut self, settings: RegistrySettings) -> Self {
        self.settings = settings;
        self
    }

    /// Records load metrics into `metrics` instead of a private registry.
    pub fn metrics(mut self, metrics: &MetricsRegistry) -> Self {
        self.metrics = Some(metrics.clone());
        self
    }

    /// Spawns loads on `runtime` instead of the current one.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Finishes the registry.
    pub fn build(self) -> Result<AssetRegistry, RegistryError> {
        let runtime = match self.runtime {
            Some(handle) => handle,
            None => Handle::try_current()?,
        };
        let metrics = LoadMetrics::new(&self.metrics.unwrap_or_default())?;
        Ok(AssetRegistry {
            shared: Arc::new(RegistryShared {
                live: Mutex::new(LiveSet::default()),
                url_gate: Mutex::new(()),
                events: EventBus::new(),
                loader: self.loader,
                settings: self.settings,
                runtime,
                metrics,
            }),
        })
    }
}

/// An asset list in either of its serialized shapes.
#[derive(Deserialize)]
#[serde(untagged)]
enum DefinitionList {
    List(Vec<AssetDefinition>),
    ById(BTreeMap<String, AssetDefinition>),
}

impl AssetRegistry {
    /// Starts building a registry around `loader`.
    pub fn builder(loader: Arc<dyn ResourceLoader>) -> AssetRegistryBuilder {
        AssetRegistryBuilder {
            loader,
            settings: RegistrySettings::default(),
            metrics: None,
            runtime: None,
        }
    }

    /// A registry with default settings, spawning loads on the current
    /// Tokio runtime.
    pub fn new(loader: Arc<dyn ResourceLoader>) -> Result<Self, RegistryError> {
        Self::builder(loader).build()
    }

    /// The registry's settings.
    pub fn settings(&self) -> &RegistrySettings {
        &self.shared.settings
    }

    /// Registers a descriptor.
    ///
    /// Publishes `add` on the global, id and URL channels, then starts a
    /// load if the descriptor is flagged for preload. Adding a descriptor
    /// that is already live does nothing and returns `false`.
    pub fn add(&self, asset: &AssetRef) -> bool {
        {
            let mut live = self.shared.live();
            let key = identity(asset);
            if live.watchers.contains_key(&key) {
                return false;
            }
            // Subscribe before indexing so no rename or tag change is missed.
            let watchers = self.watch(asset);
            live.watchers.insert(key, watchers);
            live.index.add(asset);
            self.shared.metrics.adjust_registered(1.0);
        }
        log::debug!(
            "Registered asset {} '{}' ({}).",
            asset.id(),
            asset.name(),
            asset.asset_type()
        );

        self.publish_everywhere(Verb::Add, asset);
        if asset.preload() {
            self.load(asset);
        }
        true
    }

    /// Unregisters a descriptor.
    ///
    /// Publishes `remove` on the global, id and URL channels and on the
    /// descriptor's own channel. Returns `false` if it was not live. The
    /// descriptor object itself stays usable by whoever still holds it.
    pub fn remove(&self, asset: &AssetRef) -> bool {
        {
            let mut live = self.shared.live();
            let Some(watchers) = live.watchers.remove(&identity(asset)) else {
                return false;
            };
            live.index.remove(asset);
            for (topic, id) in watchers {
                asset.events().unsubscribe(&topic, id);
            }
            self.shared.metrics.adjust_registered(-1.0);
        }
        log::debug!("Removed asset {} '{}'.", asset.id(), asset.name());

        self.publish_everywhere(Verb::Remove, asset);
        asset
            .events()
            .publish(&DescriptorTopic::Remove, &DescriptorEvent::Removed);
        true
    }

    /// Looks a live descriptor up by id.
    pub fn get(&self, id: impl Into<AssetId>) -> Option<AssetRef> {
        self.shared.live().index.get(id.into())
    }

    /// Looks a live descriptor up by file URL.
    pub fn get_by_url(&self, url: &str) -> Option<AssetRef> {
        self.shared.live().index.get_by_url(url)
    }

    /// The first registered descriptor with this name and, if given, type.
    pub fn find(&self, name: &str, asset_type: Option<&str>) -> Option<AssetRef> {
        self.shared.live().index.find(name, asset_type)
    }

    /// Every live descriptor with this name and, if given, type.
    pub fn find_all(&self, name: &str, asset_type: Option<&str>) -> Vec<AssetRef> {
        self.shared.live().index.find_all(name, asset_type)
    }

    /// Every live descriptor matching `predicate`.
    ///
    /// The predicate runs with the index locked; it must not call back into
    /// the registry.
    pub fn filter(&self, predicate: impl FnMut(&AssetRef) -> bool) -> Vec<AssetRef> {
        self.shared.live().index.filter(predicate)
    }

    /// Every live descriptor matching any of the terms: a single tag matches
    /// on its own, a group matches descriptors carrying all its tags.
    ///
    /// ```ignore
    /// // (a AND b) OR c
    /// registry.find_by_tag([TagTerm::all(["a", "b"]), TagTerm::from("c")]);
    /// ```
    pub fn find_by_tag<I>(&self, terms: I) -> Vec<AssetRef>
    where
        I: IntoIterator,
        I::Item: Into<TagTerm>,
    {
        let terms: Vec<TagTerm> = terms.into_iter().map(Into::into).collect();
        self.shared.live().index.find_by_tag(&terms)
    }

    /// Live descriptors in registration order.
    pub fn list(&self, filter: ListFilter) -> Vec<AssetRef> {
        self.filter(|asset| filter.preload.map_or(true, |p| asset.preload() == p))
    }

    /// Returns `true` if this exact descriptor is live.
    pub fn contains(&self, asset: &AssetRef) -> bool {
        self.shared.live().index.contains(asset)
    }

    /// The number of live descriptors.
    pub fn len(&self) -> usize {
        self.shared.live().index.len()
    }

    /// Returns `true` if no descriptor is live.
    pub fn is_empty(&self) -> bool {
        self.shared.live().index.is_empty()
    }

    /// Creates and registers descriptors from definitions, in order.
    pub fn add_definitions(
        &self,
        definitions: impl IntoIterator<Item = AssetDefinition>,
    ) -> Vec<AssetRef> {
        definitions
            .into_iter()
            .map(|definition| {
                let asset = definition.into_asset();
                self.add(&asset);
                asset
            })
            .collect()
    }

    /// Parses an asset list (a JSON array of definitions, or an object of
    /// definitions keyed by id) and registers every entry.
    pub fn add_from_json(&self, json: &str) -> Result<Vec<AssetRef>, RegistryError> {
        let definitions = match serde_json::from_str(json)? {
            DefinitionList::List(list) => list,
            DefinitionList::ById(map) => map.into_values().collect(),
        };
        Ok(self.add_definitions(definitions))
    }

    /// Calls `handler` for every event on `key`.
    pub fn on(
        &self,
        key: EventKey,
        handler: impl Fn(&RegistryEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.shared.events.subscribe(key, handler)
    }

    /// Calls `handler` for the next event on `key` only.
    pub fn once(
        &self,
        key: EventKey,
        handler: impl Fn(&RegistryEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.shared.events.subscribe_once(key, handler)
    }

    /// Streams events on `key` into a channel. The subscription ends when
    /// the receiver is dropped.
    pub fn listen(&self, key: EventKey) -> flume::Receiver<RegistryEvent> {
        self.shared.events.listen(key)
    }

    /// Cancels a subscription made with [`on`](Self::on) or
    /// [`once`](Self::once).
    pub fn off(&self, key: &EventKey, id: SubscriptionId) -> bool {
        self.shared.events.unsubscribe(key, id)
    }

    /// Serializes find-or-create by URL.
    pub(crate) fn url_gate(&self) -> MutexGuard<'_, ()> {
        self.shared.url_gate.lock().expect("asset url gate poisoned")
    }

    /// Publishes on the global, id and (if present) URL channels of `verb`.
    pub(crate) fn publish_everywhere(&self, verb: Verb, asset: &AssetRef) {
        let event = RegistryEvent::new(asset.clone());
        self.publish_on(verb, asset, &event, true);
    }

    /// Publishes on the global and id channels of `verb`, and on its URL
    /// channel when `with_url` is set and the descriptor has a URL.
    pub(crate) fn publish_on(&self, verb: Verb, asset: &AssetRef, event: &RegistryEvent, with_url: bool) {
        let bus = &self.shared.events;
        bus.publish(&EventKey::all(verb), event);
        bus.publish(&EventKey::id(verb, asset.id()), event);
        if with_url {
            if let Some(url) = asset.file_url() {
                bus.publish(
                    &EventKey {
                        verb,
                        target: Target::Url(url.to_string()),
                    },
                    event,
                );
            }
        }
    }

    /// Keeps the name and tag indices in step with the descriptor.
    ///
    /// Change events only say that something moved; the index re-reads the
    /// descriptor under its lock, so concurrent changes whose events arrive
    /// out of order still converge on the descriptor's state.
    fn watch(&self, asset: &AssetRef) -> Watchers {
        let shared: Weak<RegistryShared> = Arc::downgrade(&self.shared);
        let target = Arc::downgrade(asset);
        let refresh = move |_: &DescriptorEvent| {
            let (Some(shared), Some(asset)) = (shared.upgrade(), target.upgrade()) else {
                return;
            };
            shared.live().index.refresh(&asset);
        };

        let name = asset.events().subscribe(DescriptorTopic::Name, refresh.clone());
        let tags = asset.events().subscribe(DescriptorTopic::Tags, refresh);
        vec![(DescriptorTopic::Name, name), (DescriptorTopic::Tags, tags)]
    }
}

impl AssetLookup for AssetRegistry {
    fn get(&self, id: AssetId) -> Option<AssetRef> {
        AssetRegistry::get(self, id)
    }

    fn get_by_url(&self, url: &str) -> Option<AssetRef> {
        AssetRegistry::get_by_url(self, url)
    }

    fn find(&self, name: &str, asset_type: Option<&str>) -> Option<AssetRef> {
        AssetRegistry::find(self, name, asset_type)
    }
}

impl std::fmt::Debug for AssetRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetRegistry")
            .field("assets", &self.len())
            .field("settings", &self.shared.settings)
            .finish_non_exhaustive()
    }
}
