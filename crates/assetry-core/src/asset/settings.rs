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

//! Tunables of the registry and its dependency cascades.

use super::path;
use serde::{Deserialize, Serialize};

/// The texture slots of the standard material that may hold a relative path
/// to a texture file.
pub const STANDARD_TEXTURE_PROPERTIES: &[&str] = &[
    "aoMap",
    "diffuseMap",
    "glossMap",
    "metalnessMap",
    "normalMap",
    "specularMap",
    "emissiveMap",
    "opacityMap",
    "sphereMap",
    "lightMap",
    "heightMap",
    "clearCoatMap",
    "clearCoatGlossMap",
    "clearCoatNormalMap",
    "sheenMap",
    "sheenGlossMap",
    "refractionMap",
    "thicknessMap",
    "iridescenceMap",
    "iridescenceThicknessMap",
    "specularityFactorMap",
];

/// Registry configuration.
///
/// Every field has a default, so a settings file only needs to list the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrySettings {
    /// Prepended to relative file URLs when they are fetched. The URL index
    /// and the `:url:` channels keep the unprefixed URL.
    pub prefix: String,
    /// Model file extensions that ship a companion material mapping file.
    pub composite_model_extensions: Vec<String>,
    /// Replaces the model's extension to form the mapping file URL.
    pub mapping_suffix: String,
    /// Material data fields scanned for texture references.
    pub texture_properties: Vec<String>,
    /// Asset types that go through the fetch path even without a file.
    pub fetchless_types: Vec<String>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            composite_model_extensions: vec![".json".to_string(), ".glb".to_string()],
            mapping_suffix: ".mapping.json".to_string(),
            texture_properties: STANDARD_TEXTURE_PROPERTIES
                .iter()
                .map(|name| name.to_string())
                .collect(),
            fetchless_types: vec![super::kinds::CUBEMAP.to_string()],
        }
    }
}

impl RegistrySettings {
    /// Returns `true` if a model at `url` has a companion mapping file.
    pub fn is_composite_model(&self, url: &str) -> bool {
        path::extension(url).is_some_and(|ext| {
            self.composite_model_extensions
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
    }

    /// The URL of the mapping file that accompanies a composite model.
    pub fn mapping_url(&self, model_url: &str) -> String {
        path::with_suffix(model_url, &self.mapping_suffix)
    }

    /// Returns `true` if `asset_type` is fetched through the loader even
    /// when the descriptor has no file.
    pub fn loads_without_file(&self, asset_type: &str) -> bool {
        self.fetchless_types.iter().any(|t| t == asset_type)
    }

    /// The URL actually handed to the loader for a file URL.
    pub fn fetch_url(&self, url: &str) -> String {
        if self.prefix.is_empty() || path::is_absolute(url) {
            url.to_string()
        } else {
            format!("{}{}", self.prefix, url)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_standard_pipeline() {
        let settings = RegistrySettings::default();
        assert!(settings.is_composite_model("models/crate.json"));
        assert!(settings.is_composite_model("models/crate.JSON"));
        assert!(settings.is_composite_model("models/crate.glb"));
        assert!(!settings.is_composite_model("models/crate.obj"));
        assert_eq!(
            settings.mapping_url("models/crate.json"),
            "models/crate.mapping.json"
        );
        assert!(settings.loads_without_file("cubemap"));
        assert!(!settings.loads_without_file("texture"));
        assert!(settings
            .texture_properties
            .iter()
            .any(|p| p == "diffuseMap"));
    }

    #[test]
    fn prefix_only_applies_to_relative_urls() {
        let settings = RegistrySettings {
            prefix: "https://cdn.example.com/".to_string(),
            ..Default::default()
        };
        assert_eq!(
            settings.fetch_url("textures/a.png"),
            "https://cdn.example.com/textures/a.png"
        );
        assert_eq!(settings.fetch_url("blob:1"), "blob:1");
        assert_eq!(settings.fetch_url("/abs/a.png"), "/abs/a.png");
    }

    #[test]
    fn partial_settings_keep_defaults() {
        let settings: RegistrySettings =
            serde_json::from_str(r#"{ "prefix": "assets/" }"#).unwrap();
        assert_eq!(settings.prefix, "assets/");
        assert_eq!(settings.mapping_suffix, ".mapping.json");
    }
}
