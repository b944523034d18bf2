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

//! The registry driven from several worker threads at once.

mod common;

use assetry_agents::{AssetRegistry, LoadOptions};
use assetry_core::asset::{AssetDescriptor, AssetRef, AssetState};
use assetry_core::event::{EventKey, Verb};
use assetry_core::telemetry::MetricId;
use assetry_telemetry::MetricsRegistry;
use common::{assert_consistent, registry, FakeLoader, Recorder, NAMES, TAGS};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn material(url: &str) -> AssetRef {
    AssetDescriptor::builder("wood", "material").url(url).build()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn descriptors_report_loaded_only_after_patch() {
    let loader = FakeLoader::new();
    loader.serve(
        "materials/wood.json",
        json!({ "mappingFormat": "path", "diffuseMap": "wood.png" }),
    );
    loader.slow_patch(Duration::from_millis(300));
    let registry = registry(&loader);
    let seen = Recorder::default();
    {
        let seen = seen.clone();
        registry.on(EventKey::all(Verb::Load), move |event| {
            seen.push(event.asset.data()["mappingFormat"].to_string());
        });
    }

    let wood = material("materials/wood.json");
    registry.add(&wood);
    assert!(registry.load(&wood));

    let patching = loader
        .wait_for(|e| e.starts_with("patch:materials/wood.json"))
        .await;
    assert_eq!(patching, "patch:materials/wood.json:Loading");
    assert_eq!(wood.state(), AssetState::Loading);
    assert!(wood.resource().is_some(), "resources are attached before patch");
    assert!(!registry.load_with(&wood, LoadOptions { force: true }));
    assert!(!wood.unload());

    let wood = registry.loaded(&wood).await.unwrap();
    assert_eq!(wood.state(), AssetState::Loaded);
    assert_eq!(wood.data()["mappingFormat"], "path");
    assert_eq!(seen.entries(), ["\"path\""]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn url_loads_joining_a_patching_material_still_load_its_textures() {
    let loader = FakeLoader::new();
    loader.serve(
        "materials/wood.json",
        json!({ "mappingFormat": "path", "diffuseMap": "wood.png" }),
    );
    loader.serve("materials/wood.png", json!({ "width": 2 }));
    loader.slow_patch(Duration::from_millis(200));
    let registry = registry(&loader);

    let wood = material("materials/wood.json");
    registry.add(&wood);
    registry.load(&wood);
    loader
        .wait_for(|e| e.starts_with("patch:materials/wood.json"))
        .await;

    let joined = registry
        .load_from_url("materials/wood.json", "material")
        .await
        .unwrap();
    assert!(Arc::ptr_eq(&joined, &wood));
    assert_eq!(loader.fetches("materials/wood.json"), 1);
    assert_eq!(loader.fetches("materials/wood.png"), 1);
    assert_eq!(
        registry
            .get_by_url("materials/wood.png")
            .map(|texture| texture.state()),
        Some(AssetState::Loaded)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_loads_from_many_tasks_share_one_fetch() {
    let loader = FakeLoader::new();
    loader.serve("textures/a.png", json!({ "width": 4 }));
    loader.serve("blob:7", json!({ "width": 8 }));
    let gate = loader.gate("textures/a.png");
    let blob_gate = loader.gate("blob:7");
    let registry = registry(&loader);

    let asset = AssetDescriptor::builder("a", "texture")
        .id(1i64)
        .url("textures/a.png")
        .build();
    registry.add(&asset);

    let mut waiters = Vec::new();
    for _ in 0..16 {
        let registry = registry.clone();
        let asset = asset.clone();
        waiters.push(tokio::spawn(async move {
            registry.load(&asset);
            registry.loaded(&asset).await
        }));
    }
    let mut url_loads = Vec::new();
    for _ in 0..16 {
        url_loads.push(tokio::spawn(registry.load_from_url("blob:7", "texture")));
    }

    loader.wait_started("textures/a.png").await;
    loader.wait_started("blob:7").await;
    gate.notify_one();
    blob_gate.notify_one();

    for waiter in waiters {
        let loaded = waiter.await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&loaded, &asset));
    }
    let mut blobs = Vec::new();
    for load in url_loads {
        blobs.push(load.await.unwrap().unwrap());
    }
    assert!(blobs.iter().all(|b| Arc::ptr_eq(b, &blobs[0])));
    assert_eq!(loader.fetches("textures/a.png"), 1);
    assert_eq!(loader.fetches("blob:7"), 1);
    assert_eq!(registry.len(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn model_cascades_fan_in_across_worker_threads() {
    const MATERIALS: usize = 50;
    let loader = FakeLoader::new();
    let material_urls: Vec<String> = (0..MATERIALS)
        .map(|i| format!("materials/mat{i}.json"))
        .collect();
    loader.serve("models/big.json", json!({}));
    loader.serve(
        "models/big.mapping.json",
        json!({
            "mapping": material_urls
                .iter()
                .map(|url| json!({ "path": format!("../{url}") }))
                .collect::<Vec<_>>()
        }),
    );
    for (i, url) in material_urls.iter().enumerate() {
        loader.serve(
            url,
            json!({ "mappingFormat": "path", "diffuseMap": format!("../textures/t{i}.png") }),
        );
        loader.serve(&format!("textures/t{i}.png"), json!({ "width": i }));
    }
    let registry = registry(&loader);

    let model = registry
        .load_from_url("models/big.json", "model")
        .await
        .unwrap();
    assert_eq!(model.state(), AssetState::Loaded);
    assert_eq!(model.data()["mapping"].as_array().map(Vec::len), Some(MATERIALS));
    assert_eq!(registry.len(), 1 + 2 * MATERIALS);

    let model_start = loader.position("start:models/big.json").unwrap();
    for (i, url) in material_urls.iter().enumerate() {
        let texture_url = format!("textures/t{i}.png");
        for dependency in [url, &texture_url] {
            assert_eq!(
                registry.get_by_url(dependency).map(|a| a.state()),
                Some(AssetState::Loaded)
            );
            assert_eq!(loader.fetches(dependency), 1);
            assert!(loader.position(&format!("done:{dependency}")).unwrap() < model_start);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn indices_stay_consistent_under_concurrent_mutation() {
    const THREADS: u64 = 8;
    let loader = FakeLoader::new();
    let metrics = MetricsRegistry::new();
    let registry = AssetRegistry::builder(loader.clone())
        .metrics(&metrics)
        .build()
        .unwrap();

    let pool: Vec<AssetRef> = (1..=12i64)
        .map(|id| {
            AssetDescriptor::builder(NAMES[id as usize % NAMES.len()], "texture")
                .id(id)
                .url(format!("textures/{id}.png"))
                .build()
        })
        .collect();
    let barrier = Barrier::new(THREADS as usize);

    thread::scope(|scope| {
        for seed in 0..THREADS {
            let (registry, pool, barrier) = (&registry, &pool, &barrier);
            scope.spawn(move || {
                let mut rng = StdRng::seed_from_u64(seed);
                barrier.wait();
                for _ in 0..500 {
                    let asset = pool.choose(&mut rng).unwrap();
                    match rng.gen_range(0..6) {
                        0 => {
                            registry.add(asset);
                        }
                        1 => {
                            registry.remove(asset);
                        }
                        2 => asset.set_name(*NAMES.choose(&mut rng).unwrap()),
                        3 | 4 => {
                            asset.add_tag(*TAGS.choose(&mut rng).unwrap());
                        }
                        _ => {
                            asset.remove_tag(TAGS.choose(&mut rng).unwrap());
                        }
                    }
                }
            });
        }
    });

    let live: Vec<bool> = pool.iter().map(|a| registry.contains(a)).collect();
    assert_consistent(&registry, &pool, &live);
    let live_count = live.iter().filter(|l| **l).count();
    assert_eq!(
        metrics
            .get(&MetricId::new("assets", "registered"))
            .unwrap()
            .as_gauge(),
        Some(live_count as f64)
    );
}
