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

//! The co-maintained id, URL, name and tag indices over live descriptors.

use super::tags::{TagIndex, TagTerm};
use assetry_core::asset::{AssetId, AssetRef};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

/// Insertion order of a live descriptor. Never reused.
type Slot = u64;

/// The index's own view of a live descriptor.
///
/// Name and tags are tracked here rather than read back from the descriptor,
/// so removal always clears exactly what was indexed.
#[derive(Debug)]
struct Entry {
    asset: AssetRef,
    name: String,
    tags: BTreeSet<String>,
}

fn identity(asset: &AssetRef) -> usize {
    Arc::as_ptr(asset) as usize
}

/// The lookup structures over the live descriptor set.
///
/// Membership is by identity: two distinct descriptors may share an id or a
/// URL, in which case the later registration owns that key. Removing the
/// owner passes the key back to the most recent remaining registration that
/// shares it. Iteration and query results follow registration order.
#[derive(Debug, Default)]
pub struct AssetIndex {
    next_slot: Slot,
    entries: BTreeMap<Slot, Entry>,
    slots: HashMap<usize, Slot>,
    ids: HashMap<AssetId, AssetRef>,
    urls: HashMap<String, AssetRef>,
    names: HashMap<String, Vec<AssetRef>>,
    tags: TagIndex<Slot>,
}

impl AssetIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of live descriptors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no descriptor is live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if this exact descriptor is live.
    pub fn contains(&self, asset: &AssetRef) -> bool {
        self.slots.contains_key(&identity(asset))
    }

    /// Indexes a descriptor under its current id, URL, name and tags.
    ///
    /// Returns `false` without touching anything if the descriptor is
    /// already live.
    pub fn add(&mut self, asset: &AssetRef) -> bool {
        let key = identity(asset);
        if self.slots.contains_key(&key) {
            return false;
        }
        let slot = self.next_slot;
        self.next_slot += 1;

        let name = asset.name();
        let tags: BTreeSet<String> = asset.tags().into_iter().collect();

        if let Some(previous) = self.ids.insert(asset.id(), asset.clone()) {
            log::warn!(
                "Asset id {} re-registered; '{}' replaces '{}' in the id index.",
                asset.id(),
                name,
                previous.name()
            );
        }
        if let Some(url) = asset.file_url() {
            self.urls.insert(url.to_string(), asset.clone());
        }
        self.names.entry(name.clone()).or_default().push(asset.clone());
        for tag in &tags {
            self.tags.insert(tag, slot);
        }

        self.slots.insert(key, slot);
        self.entries.insert(
            slot,
            Entry {
                asset: asset.clone(),
                name,
                tags,
            },
        );
        true
    }

    /// Removes a descriptor from every index. Returns `false` if it was not
    /// live.
    pub fn remove(&mut self, asset: &AssetRef) -> bool {
        let Some(slot) = self.slots.remove(&identity(asset)) else {
            return false;
        };
        let Some(entry) = self.entries.remove(&slot) else {
            return false;
        };

        if self
            .ids
            .get(&asset.id())
            .is_some_and(|owner| Arc::ptr_eq(owner, asset))
        {
            self.ids.remove(&asset.id());
            // Hand the id back to the latest live registration that shared it.
            if let Some(heir) = self.latest(|e| e.asset.id() == asset.id()) {
                self.ids.insert(asset.id(), heir);
            }
        }
        if let Some(url) = asset.file_url() {
            if self.urls.get(url).is_some_and(|owner| Arc::ptr_eq(owner, asset)) {
                self.urls.remove(url);
                if let Some(heir) = self.latest(|e| e.asset.file_url() == Some(url)) {
                    self.urls.insert(url.to_string(), heir);
                }
            }
        }
        self.unlink_name(&entry.name, asset);
        for tag in &entry.tags {
            self.tags.remove(tag, slot);
        }
        true
    }

    /// Brings a live descriptor's name and tag entries in line with its
    /// current name and tags.
    ///
    /// Reads the descriptor rather than trusting a change notification, so
    /// notifications that arrive out of order still leave the index matching
    /// the descriptor. Returns `false` if the descriptor is not live or
    /// nothing changed.
    pub fn refresh(&mut self, asset: &AssetRef) -> bool {
        let Some(&slot) = self.slots.get(&identity(asset)) else {
            return false;
        };
        let name = asset.name();
        let tags: BTreeSet<String> = asset.tags().into_iter().collect();
        let Some(entry) = self.entries.get_mut(&slot) else {
            return false;
        };

        let renamed =
            (entry.name != name).then(|| std::mem::replace(&mut entry.name, name.clone()));
        let added: Vec<String> = tags.difference(&entry.tags).cloned().collect();
        let removed: Vec<String> = entry.tags.difference(&tags).cloned().collect();
        entry.tags = tags;

        if let Some(old) = &renamed {
            self.unlink_name(old, asset);
            self.names.entry(name).or_default().push(asset.clone());
        }
        for tag in &added {
            self.tags.insert(tag, slot);
        }
        for tag in &removed {
            self.tags.remove(tag, slot);
        }
        renamed.is_some() || !added.is_empty() || !removed.is_empty()
    }

    /// Looks a descriptor up by id.
    pub fn get(&self, id: AssetId) -> Option<AssetRef> {
        self.ids.get(&id).cloned()
    }

    /// Looks a descriptor up by file URL.
    pub fn get_by_url(&self, url: &str) -> Option<AssetRef> {
        self.urls.get(url).cloned()
    }

    /// The first registered descriptor with this name (and type, if given).
    pub fn find(&self, name: &str, asset_type: Option<&str>) -> Option<AssetRef> {
        self.named(name, asset_type).next().cloned()
    }

    /// Every live descriptor with this name (and type, if given), in
    /// registration order.
    pub fn find_all(&self, name: &str, asset_type: Option<&str>) -> Vec<AssetRef> {
        self.named(name, asset_type).cloned().collect()
    }

    /// Every live descriptor matching `predicate`, in registration order.
    pub fn filter(&self, mut predicate: impl FnMut(&AssetRef) -> bool) -> Vec<AssetRef> {
        self.iter().filter(|a| predicate(a)).cloned().collect()
    }

    /// Every live descriptor matching any of `terms`, in registration order.
    pub fn find_by_tag(&self, terms: &[TagTerm]) -> Vec<AssetRef> {
        self.tags
            .query(terms)
            .into_iter()
            .filter_map(|slot| self.entries.get(&slot).map(|e| e.asset.clone()))
            .collect()
    }

    /// The number of live descriptors carrying `tag`.
    pub fn tag_count(&self, tag: &str) -> usize {
        self.tags.count(tag)
    }

    /// Live descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &AssetRef> + '_ {
        self.entries.values().map(|e| &e.asset)
    }

    fn named<'a>(
        &'a self,
        name: &str,
        asset_type: Option<&'a str>,
    ) -> impl Iterator<Item = &'a AssetRef> + 'a {
        self.names
            .get(name)
            .into_iter()
            .flatten()
            .filter(move |a| asset_type.map_or(true, |t| a.asset_type() == t))
    }

    fn latest(&self, matches: impl Fn(&Entry) -> bool) -> Option<AssetRef> {
        self.entries
            .values()
            .rev()
            .find(|e| matches(e))
            .map(|e| e.asset.clone())
    }

    fn unlink_name(&mut self, name: &str, asset: &AssetRef) {
        let Some(bucket) = self.names.get_mut(name) else {
            return;
        };
        bucket.retain(|a| !Arc::ptr_eq(a, asset));
        if bucket.is_empty() {
            self.names.remove(name);
        }
    }
}
