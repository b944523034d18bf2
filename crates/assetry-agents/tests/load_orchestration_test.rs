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

mod common;

use assetry_agents::{AssetRegistry, LoadOptions};
use assetry_core::asset::{
    AssetDescriptor, AssetId, AssetRef, AssetState, DescriptorTopic, LoadError, RegistrySettings,
};
use assetry_core::event::{EventKey, Verb};
use assetry_core::telemetry::MetricId;
use assetry_telemetry::MetricsRegistry;
use common::{registry, FakeLoader, Recorder};
use serde_json::{json, Value};

fn texture(id: i64, url: &str) -> AssetRef {
    AssetDescriptor::builder(url, "texture").id(id).url(url).build()
}

fn record(registry: &AssetRegistry, seen: &Recorder, keys: impl IntoIterator<Item = EventKey>) {
    for key in keys {
        let seen = seen.clone();
        let label = key.to_string();
        registry.on(key, move |_| seen.push(label.clone()));
    }
}

fn document(asset: &AssetRef) -> Option<Value> {
    asset
        .resource()
        .and_then(|r| r.downcast_ref::<Value>().cloned())
}

#[tokio::test]
async fn repeated_loads_share_one_fetch() {
    let loader = FakeLoader::new();
    loader.serve("textures/a.png", json!({ "width": 4 }));
    let gate = loader.gate("textures/a.png");
    let registry = registry(&loader);
    let seen = Recorder::default();
    record(
        &registry,
        &seen,
        [EventKey::all(Verb::LoadStart), EventKey::all(Verb::Load)],
    );

    let asset = texture(1, "textures/a.png");
    registry.add(&asset);
    assert!(registry.load(&asset));
    assert!(!registry.load(&asset));
    assert!(asset.is_loading());

    loader.wait_started("textures/a.png").await;
    assert!(!registry.load(&asset));
    assert!(!asset.unload(), "an in-flight load cannot be unloaded");
    gate.notify_one();

    registry.loaded(&asset).await.unwrap();
    assert!(!registry.load(&asset));
    assert_eq!(asset.state(), AssetState::Loaded);
    assert_eq!(loader.fetches("textures/a.png"), 1);
    assert_eq!(seen.entries(), ["load:start", "load"]);
    assert_eq!(document(&asset), Some(json!({ "width": 4 })));
}

#[tokio::test]
async fn preloaded_definitions_notify_global_then_id_then_url() {
    let loader = FakeLoader::new();
    loader.serve("a.jpg", json!({}));
    let registry = registry(&loader);
    let seen = Recorder::default();
    record(
        &registry,
        &seen,
        [
            EventKey::all(Verb::Load),
            EventKey::id(Verb::Load, AssetId::new(1)),
            EventKey::url(Verb::Load, "a.jpg"),
        ],
    );

    let added = registry
        .add_from_json(
            r#"[{ "id": 1, "name": "a.jpg", "type": "texture",
                  "file": { "url": "a.jpg" }, "preload": true }]"#,
        )
        .unwrap();
    let asset = &added[0];
    assert!(asset.is_loading(), "preload starts the load on registration");
    {
        let seen = seen.clone();
        asset
            .events()
            .subscribe(DescriptorTopic::Load, move |_| seen.push("asset"));
    }

    registry.loaded(asset).await.unwrap();
    assert_eq!(seen.entries(), ["load", "load:1", "load:url:a.jpg", "asset"]);
}

#[tokio::test]
async fn load_start_fires_before_the_fetch() {
    let loader = FakeLoader::new();
    loader.serve("a.png", json!({}));
    let registry = registry(&loader);
    let seen = Recorder::default();
    for key in [
        EventKey::all(Verb::LoadStart),
        EventKey::id(Verb::LoadStart, AssetId::new(2)),
    ] {
        let seen = seen.clone();
        let loader = loader.clone();
        let label = key.to_string();
        registry.on(key, move |_| {
            seen.push(format!("{label} after {} fetch(es)", loader.fetches("a.png")))
        });
    }

    let asset = texture(2, "a.png");
    registry.add(&asset);
    registry.loaded(&asset).await.unwrap();
    assert_eq!(
        seen.entries(),
        ["load:start after 0 fetch(es)", "load:2:start after 0 fetch(es)"]
    );
}

#[tokio::test]
async fn failures_publish_on_global_and_id_channels_only() {
    let loader = FakeLoader::new();
    loader.fail("a.png", "connection reset");
    let registry = registry(&loader);
    let seen = Recorder::default();
    record(
        &registry,
        &seen,
        [
            EventKey::all(Verb::Error),
            EventKey::id(Verb::Error, AssetId::new(3)),
            EventKey::url(Verb::Error, "a.png"),
            EventKey::all(Verb::Load),
        ],
    );
    let errors = registry.listen(EventKey::all(Verb::Error));

    let asset = texture(3, "a.png");
    registry.add(&asset);
    let error = registry.loaded(&asset).await.unwrap_err();

    assert_eq!(error, LoadError::fetch("a.png", "connection reset"));
    assert_eq!(asset.state(), AssetState::Failed);
    assert_eq!(asset.error(), Some(error.clone()));
    assert_eq!(seen.entries(), ["error", "error:3"]);
    assert_eq!(errors.try_recv().unwrap().error, Some(error));

    // A failure is terminal; awaiting again resolves immediately.
    assert!(registry.loaded(&asset).await.is_err());
    assert!(!registry.load(&asset));
    assert_eq!(loader.fetches("a.png"), 1);
}

#[tokio::test]
async fn inline_descriptors_open_synchronously() {
    let loader = FakeLoader::new();
    let registry = registry(&loader);
    let seen = Recorder::default();
    record(
        &registry,
        &seen,
        [
            EventKey::all(Verb::LoadStart),
            EventKey::all(Verb::Load),
            EventKey::id(Verb::Load, AssetId::new(5)),
        ],
    );

    let material = AssetDescriptor::builder("wood", "material")
        .id(5i64)
        .data(json!({ "diffuse": [1, 0, 0] }))
        .build();
    registry.add(&material);
    assert!(registry.load(&material));

    assert_eq!(material.state(), AssetState::Loaded);
    assert_eq!(document(&material), Some(json!({ "diffuse": [1, 0, 0] })));
    assert!(loader.log().is_empty());
    assert_eq!(seen.entries(), ["load", "load:5"]);
}

#[tokio::test]
async fn fileless_cubemaps_still_go_through_the_loader() {
    let loader = FakeLoader::new();
    let registry = registry(&loader);
    let seen = Recorder::default();
    record(&registry, &seen, [EventKey::all(Verb::LoadStart)]);

    let cubemap = AssetDescriptor::builder("sky", "cubemap")
        .data(json!({ "textures": [1, 2, 3, 4, 5, 6] }))
        .build();
    registry.add(&cubemap);
    registry.loaded(&cubemap).await.unwrap();

    assert_eq!(loader.log(), ["inline"]);
    assert_eq!(seen.entries(), ["load:start"]);
    assert_eq!(
        document(&cubemap),
        Some(json!({ "textures": [1, 2, 3, 4, 5, 6] }))
    );
}

#[tokio::test]
async fn forced_reloads_and_unloads_restart_the_cycle() {
    let loader = FakeLoader::new();
    loader.serve("a.png", json!(1));
    let registry = registry(&loader);
    let asset = texture(4, "a.png");
    registry.add(&asset);
    registry.loaded(&asset).await.unwrap();

    assert!(registry.load_with(&asset, LoadOptions { force: true }));
    registry.loaded(&asset).await.unwrap();
    assert_eq!(loader.fetches("a.png"), 2);

    let unloaded = Recorder::default();
    {
        let unloaded = unloaded.clone();
        asset
            .events()
            .subscribe(DescriptorTopic::Unload, move |_| unloaded.push("unload"));
    }
    assert!(asset.unload());
    assert!(!asset.unload());
    assert_eq!(asset.state(), AssetState::Unloaded);
    assert!(asset.resources().is_none());
    assert_eq!(unloaded.entries(), ["unload"]);

    assert!(registry.load(&asset));
    registry.loaded(&asset).await.unwrap();
    assert_eq!(loader.fetches("a.png"), 3);
}

#[tokio::test]
async fn removal_notifies_the_descriptor() {
    let loader = FakeLoader::new();
    let registry = registry(&loader);
    let asset = texture(6, "a.png");
    let seen = Recorder::default();
    {
        let seen = seen.clone();
        asset
            .events()
            .subscribe(DescriptorTopic::Remove, move |_| seen.push("removed"));
    }
    registry.add(&asset);
    registry.remove(&asset);
    assert_eq!(seen.entries(), ["removed"]);
}

#[tokio::test]
async fn prefix_applies_to_fetches_not_to_the_url_index() {
    let loader = FakeLoader::new();
    loader.serve("https://cdn.example.com/a.png", json!({}));
    let registry = AssetRegistry::builder(loader.clone())
        .settings(RegistrySettings {
            prefix: "https://cdn.example.com/".to_string(),
            ..Default::default()
        })
        .build()
        .unwrap();

    let asset = registry.load_from_url("a.png", "texture").await.unwrap();
    assert!(std::sync::Arc::ptr_eq(
        &registry.get_by_url("a.png").unwrap(),
        &asset
    ));
    assert_eq!(loader.fetches("https://cdn.example.com/a.png"), 1);
}

#[tokio::test]
async fn loads_are_counted_in_metrics() {
    let loader = FakeLoader::new();
    loader.serve("ok.png", json!({}));
    loader.fail("bad.png", "missing");
    let metrics = MetricsRegistry::new();
    let registry = AssetRegistry::builder(loader.clone())
        .metrics(&metrics)
        .build()
        .unwrap();

    let ok = texture(1, "ok.png");
    let bad = texture(2, "bad.png");
    registry.add(&ok);
    registry.add(&bad);
    registry.loaded(&ok).await.unwrap();
    registry.loaded(&bad).await.unwrap_err();
    registry.remove(&bad);

    let counter = |name: &str| {
        metrics
            .get(&MetricId::new("assets", name))
            .unwrap()
            .as_counter()
            .unwrap()
    };
    assert_eq!(counter("load_started_total"), 2);
    assert_eq!(counter("loaded_total"), 1);
    assert_eq!(counter("load_failed_total"), 1);
    assert_eq!(
        metrics
            .get(&MetricId::new("assets", "registered"))
            .unwrap()
            .as_gauge(),
        Some(1.0)
    );
    assert_eq!(
        metrics
            .get(&MetricId::new("assets", "load_time"))
            .unwrap()
            .sample_count(),
        Some(2)
    );
}

#[tokio::test]
async fn building_without_a_runtime_fails() {
    let loader = FakeLoader::new();
    let result = std::thread::spawn(move || AssetRegistry::new(loader).map(|_| ()))
        .join()
        .unwrap();
    assert!(result.is_err());
}
