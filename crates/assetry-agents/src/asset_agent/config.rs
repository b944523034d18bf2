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

//! Loading [`RegistrySettings`] from a TOML file.

use anyhow::{Context, Result};
use assetry_core::asset::RegistrySettings;
use std::fs;
use std::path::Path;

/// Reads registry settings from `path`.
///
/// A missing file yields the defaults; a present but malformed file is an
/// error. Keys left out of the file keep their default values.
///
/// ```toml
/// prefix = "https://cdn.example.com/"
/// composite_model_extensions = [".json"]
/// ```
pub fn load_settings(path: impl AsRef<Path>) -> Result<RegistrySettings> {
    let path = path.as_ref();
    if !path.exists() {
        log::info!(
            "No settings file at '{}'; using default registry settings.",
            path.display()
        );
        return Ok(RegistrySettings::default());
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file at '{}'", path.display()))?;
    let settings: RegistrySettings = toml::from_str(&text)
        .with_context(|| format!("Failed to parse settings file at '{}'", path.display()))?;
    log::info!("Loaded registry settings from '{}'.", path.display());
    Ok(settings)
}
