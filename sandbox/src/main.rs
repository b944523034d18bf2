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

// Loads one asset (and its dependency cascade) from a directory, then dumps
// the registry and the load metrics.
// Run with: cargo run -p sandbox -- <root> <url> --type model

use anyhow::{Context, Result};
use assetry_agents::config::load_settings;
use assetry_agents::{AssetRegistry, ListFilter};
use assetry_lanes::{CpuTexture, DirectorySource, LaneResourceLoader};
use assetry_telemetry::{logging, MetricsRegistry};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Directory that asset URLs are resolved against.
    root: PathBuf,
    /// URL of the asset to load, relative to the root.
    url: String,
    /// Type of the asset at `url`.
    #[arg(short = 't', long = "type", default_value = "model")]
    asset_type: String,
    /// Registry settings (TOML). Defaults apply when the file is missing.
    #[arg(short, long, default_value = "Assets.toml")]
    settings: PathBuf,
    /// Asset definitions (JSON) registered before the load.
    #[arg(short, long)]
    definitions: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let settings = load_settings(&args.settings)?;
    let metrics = MetricsRegistry::new();
    let loader = LaneResourceLoader::with_default_lanes(DirectorySource::new(&args.root))
        .with_metrics(&metrics)?;
    let registry = AssetRegistry::builder(Arc::new(loader))
        .settings(settings)
        .metrics(&metrics)
        .build()?;

    if let Some(path) = &args.definitions {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read definitions at '{}'", path.display()))?;
        let added = registry.add_from_json(&json)?;
        log::info!("Registered {} definition(s).", added.len());
        for asset in registry.list(ListFilter { preload: Some(true) }) {
            if let Err(e) = registry.loaded(&asset).await {
                log::warn!("Preload of '{}' failed: {e}", asset.name());
            }
        }
    }

    match registry.load_from_url(&args.url, &args.asset_type).await {
        Ok(asset) => log::info!("Loaded '{}' ({}).", asset.name(), asset.asset_type()),
        Err(e) => log::error!("{e}"),
    }

    print_registry(&registry);
    print_metrics(&metrics);
    Ok(())
}

fn print_registry(registry: &AssetRegistry) {
    let mut assets = registry.list(ListFilter::default());
    assets.sort_by_key(|asset| asset.id());

    println!("\n{} asset(s):", assets.len());
    for asset in assets {
        let tags = asset.tags().join(",");
        println!(
            "  {:>6}  {:<9} {:<9} {:<28} {}{}",
            asset.id(),
            asset.asset_type(),
            format!("{:?}", asset.state()),
            asset.name(),
            asset.file_url().unwrap_or("-"),
            if tags.is_empty() {
                String::new()
            } else {
                format!("  [{tags}]")
            }
        );
        if let Some(texture) = asset.resource_as::<CpuTexture>() {
            println!("          {}x{} RGBA8", texture.width, texture.height);
        }
        if let Some(error) = asset.error() {
            println!("          {error}");
        }
    }
}

fn print_metrics(metrics: &MetricsRegistry) {
    println!("\nMetrics:");
    for snapshot in metrics.snapshot() {
        println!("  {:<32} {:?} ({})", snapshot.id.to_string(), snapshot.value, snapshot.unit);
    }
}
