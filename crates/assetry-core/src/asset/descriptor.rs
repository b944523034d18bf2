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

use super::{
    path, Asset, AssetHandle, AssetId, LoadError, LoadedResource, ResourceHandle, ResourcePayload,
};
use crate::event::EventBus;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared ownership of a descriptor. Identity is pointer identity.
pub type AssetRef = Arc<AssetDescriptor>;

/// The remote or local file backing a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetFile {
    /// Where the resource is fetched from; the key of the URL index.
    pub url: String,
    /// The original file name, when it differs from the URL's last segment
    /// (e.g. for `blob:` URLs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl AssetFile {
    /// A file known only by its URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            filename: None,
        }
    }

    /// Sets the original file name.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// The load state of a descriptor.
///
/// `Loaded` and `Failed` are terminal for a load attempt: a failure is a
/// completed attempt, not a return to `Unloaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetState {
    /// No load has been attempted (or the descriptor was unloaded).
    Unloaded,
    /// A fetch is in flight.
    Loading,
    /// Resources are attached.
    Loaded,
    /// The last attempt failed; the error is kept on the descriptor.
    Failed,
}

impl AssetState {
    /// Returns `true` once a load attempt has completed, successfully or not.
    pub fn is_terminal(self) -> bool {
        matches!(self, AssetState::Loaded | AssetState::Failed)
    }
}

/// The channels of a descriptor's own event bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorTopic {
    /// The descriptor finished loading.
    Load,
    /// The descriptor failed to load.
    Error,
    /// The descriptor's resources were released.
    Unload,
    /// The descriptor was removed from its registry.
    Remove,
    /// The descriptor was renamed.
    Name,
    /// A tag was added or removed.
    Tags,
}

/// Events published on a descriptor's own bus.
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorEvent {
    /// Published on [`DescriptorTopic::Load`].
    Loaded,
    /// Published on [`DescriptorTopic::Error`].
    Failed(LoadError),
    /// Published on [`DescriptorTopic::Unload`].
    Unloaded,
    /// Published on [`DescriptorTopic::Remove`].
    Removed,
    /// Published on [`DescriptorTopic::Name`].
    Renamed {
        /// The previous name.
        old: String,
        /// The current name.
        new: String,
    },
    /// Published on [`DescriptorTopic::Tags`].
    TagAdded(String),
    /// Published on [`DescriptorTopic::Tags`].
    TagRemoved(String),
}

impl DescriptorEvent {
    /// The channel this event belongs on.
    pub fn topic(&self) -> DescriptorTopic {
        match self {
            DescriptorEvent::Loaded => DescriptorTopic::Load,
            DescriptorEvent::Failed(_) => DescriptorTopic::Error,
            DescriptorEvent::Unloaded => DescriptorTopic::Unload,
            DescriptorEvent::Removed => DescriptorTopic::Remove,
            DescriptorEvent::Renamed { .. } => DescriptorTopic::Name,
            DescriptorEvent::TagAdded(_) | DescriptorEvent::TagRemoved(_) => DescriptorTopic::Tags,
        }
    }
}

struct DescriptorState {
    name: String,
    tags: BTreeSet<String>,
    preload: bool,
    data: Value,
    state: AssetState,
    resources: Option<ResourcePayload>,
    extra: Option<ResourceHandle>,
    error: Option<LoadError>,
}

/// A registered content record: identity, type tag, inline configuration,
/// load state and, once loaded, the decoded resources.
///
/// `id`, `asset_type` and `file` are fixed at construction. Everything else
/// is behind a lock and changes through methods that publish the matching
/// [`DescriptorEvent`] after the lock is released, which is how the registry
/// keeps its name and tag indices in step with the descriptor.
pub struct AssetDescriptor {
    id: AssetId,
    asset_type: String,
    file: Option<AssetFile>,
    state: RwLock<DescriptorState>,
    events: EventBus<DescriptorTopic, DescriptorEvent>,
}

impl AssetDescriptor {
    /// Starts building a descriptor.
    pub fn builder(name: impl Into<String>, asset_type: impl Into<String>) -> AssetBuilder {
        AssetBuilder {
            id: None,
            name: name.into(),
            asset_type: asset_type.into(),
            file: None,
            data: Value::Object(Default::default()),
            tags: Vec::new(),
            preload: false,
        }
    }

    /// The descriptor's immutable id.
    pub fn id(&self) -> AssetId {
        self.id
    }

    /// The type tag selecting the decoder and the cascade behaviour.
    pub fn asset_type(&self) -> &str {
        &self.asset_type
    }

    /// The backing file, if the resource is fetched.
    pub fn file(&self) -> Option<&AssetFile> {
        self.file.as_ref()
    }

    /// The backing file's URL.
    pub fn file_url(&self) -> Option<&str> {
        self.file.as_ref().map(|f| f.url.as_str())
    }

    /// The current name.
    pub fn name(&self) -> String {
        self.read().name.clone()
    }

    /// Renames the descriptor and publishes [`DescriptorEvent::Renamed`].
    /// Setting the current name again publishes nothing.
    pub fn set_name(&self, name: impl Into<String>) {
        let new = name.into();
        let old = {
            let mut state = self.write();
            if state.name == new {
                return;
            }
            std::mem::replace(&mut state.name, new.clone())
        };
        self.events.publish(
            &DescriptorTopic::Name,
            &DescriptorEvent::Renamed { old, new },
        );
    }

    /// The current tags, sorted.
    pub fn tags(&self) -> Vec<String> {
        self.read().tags.iter().cloned().collect()
    }

    /// Returns `true` if the descriptor carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.read().tags.contains(tag)
    }

    /// Returns `true` if the descriptor carries every tag in `tags`.
    pub fn has_all_tags<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        let state = self.read();
        tags.iter().all(|t| state.tags.contains(t.as_ref()))
    }

    /// Adds a tag. Returns `false` (and publishes nothing) if it was present.
    pub fn add_tag(&self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if !self.write().tags.insert(tag.clone()) {
            return false;
        }
        self.events
            .publish(&DescriptorTopic::Tags, &DescriptorEvent::TagAdded(tag));
        true
    }

    /// Removes a tag. Returns `false` (and publishes nothing) if it was absent.
    pub fn remove_tag(&self, tag: &str) -> bool {
        if !self.write().tags.remove(tag) {
            return false;
        }
        self.events.publish(
            &DescriptorTopic::Tags,
            &DescriptorEvent::TagRemoved(tag.to_string()),
        );
        true
    }

    /// Whether registration triggers a load.
    pub fn preload(&self) -> bool {
        self.read().preload
    }

    /// Changes the preload flag. Only consulted when the descriptor is added.
    pub fn set_preload(&self, preload: bool) {
        self.write().preload = preload;
    }

    /// A copy of the inline configuration.
    pub fn data(&self) -> Value {
        self.read().data.clone()
    }

    /// Runs `f` against the inline configuration without copying it.
    pub fn with_data<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.read().data)
    }

    /// Replaces the inline configuration.
    pub fn set_data(&self, data: Value) {
        self.write().data = data;
    }

    /// The current load state.
    pub fn state(&self) -> AssetState {
        self.read().state
    }

    /// Returns `true` while a fetch is in flight.
    pub fn is_loading(&self) -> bool {
        self.state() == AssetState::Loading
    }

    /// Returns `true` once the last attempt completed, successfully or not.
    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// The decoded resources, once loaded.
    pub fn resources(&self) -> Option<ResourcePayload> {
        self.read().resources.clone()
    }

    /// The primary decoded resource, once loaded.
    pub fn resource(&self) -> Option<ResourceHandle> {
        self.read()
            .resources
            .as_ref()
            .and_then(|r| r.primary().cloned())
    }

    /// The primary decoded resource as a `T`, if it is one.
    pub fn resource_as<T: Asset>(&self) -> Option<AssetHandle<T>> {
        self.resource().and_then(|r| r.downcast::<T>())
    }

    /// The loader's per-type side channel, if it produced one.
    pub fn extra(&self) -> Option<ResourceHandle> {
        self.read().extra.clone()
    }

    /// The error of the last failed attempt.
    pub fn error(&self) -> Option<LoadError> {
        self.read().error.clone()
    }

    /// The descriptor's own event bus.
    pub fn events(&self) -> &EventBus<DescriptorTopic, DescriptorEvent> {
        &self.events
    }

    /// Resolves a reference found in this descriptor's data against its file
    /// URL. Descriptors without a file return the reference unchanged.
    pub fn resolve_url(&self, reference: &str) -> String {
        match self.file_url() {
            Some(base) => path::resolve(base, reference),
            None => reference.to_string(),
        }
    }

    /// Releases the resources and returns the descriptor to `Unloaded`, so a
    /// later load fetches it again.
    ///
    /// Returns `false` if there is nothing to release or a fetch is in
    /// flight; in-flight loads always run to completion.
    pub fn unload(&self) -> bool {
        {
            let mut state = self.write();
            if matches!(state.state, AssetState::Unloaded | AssetState::Loading) {
                return false;
            }
            state.state = AssetState::Unloaded;
            state.resources = None;
            state.extra = None;
            state.error = None;
        }
        log::debug!("Asset {} unloaded.", self.id);
        self.events
            .publish(&DescriptorTopic::Unload, &DescriptorEvent::Unloaded);
        true
    }

    /// Claims the descriptor for a load attempt.
    ///
    /// Returns `false` if a load is in flight, or if the last attempt
    /// completed and `force` is not set. On `true` the state is `Loading` and
    /// the caller owns the attempt until it calls
    /// [`mark_loaded`](Self::mark_loaded) or [`fail_load`](Self::fail_load).
    pub fn begin_load(&self, force: bool) -> bool {
        let mut state = self.write();
        match state.state {
            AssetState::Loading => false,
            AssetState::Loaded | AssetState::Failed if !force => false,
            _ => {
                state.state = AssetState::Loading;
                true
            }
        }
    }

    /// Attaches decoded resources to an in-flight attempt.
    ///
    /// The state stays `Loading` so nobody observes the descriptor as ready
    /// before the loader has patched it; [`mark_loaded`](Self::mark_loaded)
    /// ends the attempt. Publishes nothing.
    pub fn attach_resources(&self, loaded: LoadedResource) {
        let mut state = self.write();
        state.resources = Some(loaded.payload);
        state.extra = loaded.extra;
        state.error = None;
    }

    /// `Loading -> Loaded`. Publishes nothing: the orchestrator owns the
    /// notification order.
    pub fn mark_loaded(&self) {
        self.write().state = AssetState::Loaded;
    }

    /// Records a failed attempt and marks the descriptor `Failed`.
    ///
    /// Publishes nothing: the orchestrator owns the notification order.
    pub fn fail_load(&self, error: LoadError) {
        let mut state = self.write();
        state.state = AssetState::Failed;
        state.resources = None;
        state.extra = None;
        state.error = Some(error);
    }

    fn read(&self) -> RwLockReadGuard<'_, DescriptorState> {
        self.state.read().expect("asset descriptor state poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, DescriptorState> {
        self.state.write().expect("asset descriptor state poisoned")
    }
}

impl fmt::Debug for AssetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("AssetDescriptor")
            .field("id", &self.id)
            .field("name", &state.name)
            .field("asset_type", &self.asset_type)
            .field("file", &self.file)
            .field("tags", &state.tags)
            .field("state", &state.state)
            .finish()
    }
}

/// Builds an [`AssetDescriptor`].
#[derive(Debug, Clone)]
pub struct AssetBuilder {
    id: Option<AssetId>,
    name: String,
    asset_type: String,
    file: Option<AssetFile>,
    data: Value,
    tags: Vec<String>,
    preload: bool,
}

impl AssetBuilder {
    /// Uses an explicit id instead of allocating a runtime one.
    pub fn id(mut self, id: impl Into<AssetId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the backing file.
    pub fn file(mut self, file: AssetFile) -> Self {
        self.file = Some(file);
        self
    }

    /// Sets the backing file from a bare URL.
    pub fn url(self, url: impl Into<String>) -> Self {
        self.file(AssetFile::new(url))
    }

    /// Sets the inline configuration.
    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Adds one tag.
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Adds several tags.
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Requests a load as soon as the descriptor is registered.
    pub fn preload(mut self, preload: bool) -> Self {
        self.preload = preload;
        self
    }

    /// Finishes the descriptor.
    pub fn build(self) -> AssetRef {
        Arc::new(AssetDescriptor {
            id: self.id.unwrap_or_else(AssetId::allocate),
            asset_type: self.asset_type,
            file: self.file,
            state: RwLock::new(DescriptorState {
                name: self.name,
                tags: self.tags.into_iter().collect(),
                preload: self.preload,
                data: self.data,
                state: AssetState::Unloaded,
                resources: None,
                extra: None,
                error: None,
            }),
            events: EventBus::new(),
        })
    }
}
