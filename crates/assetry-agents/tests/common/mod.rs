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

//! Shared fixtures: a scriptable loader whose fetches can be held open.

#![allow(dead_code)]

use assetry_agents::AssetRegistry;
use assetry_core::asset::{
    AssetLookup, AssetRef, LoadError, LoadRequest, LoadedResource, ResourceLoader,
    ResourcePayload,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tokio::sync::Notify;

/// A loader serving JSON documents from a table.
///
/// Every fetch is logged as `start:<url>` and `done:<url>`, and a load
/// without a URL as `inline`. A gated URL does not complete until its gate
/// is notified. With a patch delay, `patch` logs `patch:<url>:<state>`,
/// blocks its thread for the delay, then patches.
#[derive(Default)]
pub struct FakeLoader {
    documents: Mutex<HashMap<String, Result<Value, LoadError>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    patch_delay: Mutex<Option<Duration>>,
    log: Mutex<Vec<String>>,
}

impl FakeLoader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn serve(&self, url: &str, document: Value) {
        self.documents
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(document));
    }

    pub fn fail(&self, url: &str, reason: &str) {
        self.documents
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(LoadError::fetch(url, reason)));
    }

    /// Holds fetches of `url` until the returned gate is notified.
    pub fn gate(&self, url: &str) -> Arc<Notify> {
        self.gates
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }

    /// Makes every `patch` block for `delay` before it touches the asset.
    pub fn slow_patch(&self, delay: Duration) {
        *self.patch_delay.lock().unwrap() = Some(delay);
    }

    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn fetches(&self, url: &str) -> usize {
        let entry = format!("start:{url}");
        self.log().iter().filter(|e| **e == entry).count()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.log().iter().position(|e| e == entry)
    }

    /// Yields until a fetch of `url` has started.
    pub async fn wait_started(&self, url: &str) {
        let entry = format!("start:{url}");
        self.wait_for(|e| *e == entry).await;
    }

    /// Yields until a log entry matches `matches`, and returns it.
    pub async fn wait_for(&self, matches: impl Fn(&String) -> bool) -> String {
        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if let Some(found) = self.log().into_iter().find(|e| matches(e)) {
                return found;
            }
            tokio::task::yield_now().await;
        }
        panic!("no matching loader activity; log: {:?}", self.log());
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl ResourceLoader for FakeLoader {
    async fn load(&self, request: LoadRequest<'_>) -> Result<LoadedResource, LoadError> {
        let Some(url) = request.url.map(str::to_string) else {
            self.record("inline".to_string());
            let data = request.asset.map(|a| a.data()).unwrap_or_default();
            return Ok(LoadedResource::new(ResourcePayload::single(data)));
        };
        self.record(format!("start:{url}"));

        let gate = self.gates.lock().unwrap().get(&url).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let result = self
            .documents
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .unwrap_or_else(|| Err(LoadError::fetch(&url, "not found")));
        self.record(format!("done:{url}"));
        result.map(|doc| LoadedResource::new(ResourcePayload::single(doc)))
    }

    fn open(&self, _asset_type: &str, data: &Value) -> Result<ResourcePayload, LoadError> {
        Ok(ResourcePayload::single(data.clone()))
    }

    fn patch(&self, asset: &AssetRef, _assets: &dyn AssetLookup) {
        let delay = *self.patch_delay.lock().unwrap();
        if let Some(delay) = delay {
            let url = asset.file_url().unwrap_or("-");
            self.record(format!("patch:{url}:{:?}", asset.state()));
            thread::sleep(delay);
        }
        if asset.asset_type() == "material" {
            if let Some(doc) = asset.resource_as::<Value>() {
                asset.set_data(Value::clone(&doc));
            }
        }
    }
}

pub fn registry(loader: &Arc<FakeLoader>) -> AssetRegistry {
    assetry_telemetry::logging::init_for_tests();
    AssetRegistry::new(loader.clone()).unwrap()
}

/// A thread-safe list the event handlers append to.
#[derive(Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub const NAMES: [&str; 3] = ["rock", "tree", "crate"];
pub const TAGS: [&str; 4] = ["a", "b", "c", "d"];

pub fn contains(list: &[AssetRef], asset: &AssetRef) -> bool {
    list.iter().any(|a| Arc::ptr_eq(a, asset))
}

/// Every lookup path must agree with the live set.
pub fn assert_consistent(registry: &AssetRegistry, pool: &[AssetRef], live: &[bool]) {
    let live_count = live.iter().filter(|l| **l).count();
    assert_eq!(registry.len(), live_count);

    for (asset, &is_live) in pool.iter().zip(live) {
        let by_id = registry.get(asset.id());
        let by_url = registry.get_by_url(asset.file_url().unwrap());
        let by_name = registry.find_all(&asset.name(), None);
        assert_eq!(registry.contains(asset), is_live);
        assert_eq!(by_id.is_some_and(|a| Arc::ptr_eq(&a, asset)), is_live);
        assert_eq!(by_url.is_some_and(|a| Arc::ptr_eq(&a, asset)), is_live);
        assert_eq!(contains(&by_name, asset), is_live);

        for tag in TAGS {
            let tagged = registry.find_by_tag([tag]);
            assert_eq!(
                contains(&tagged, asset),
                is_live && asset.has_tag(tag),
                "tag '{tag}' index out of date for asset {}",
                asset.id()
            );
        }
    }

    for name in NAMES {
        for asset in registry.find_all(name, None) {
            assert_eq!(asset.name(), name);
        }
    }
}
