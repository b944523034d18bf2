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

use assetry_core::asset::{AssetRef, LoadError};
use assetry_core::telemetry::MetricsError;
use thiserror::Error;

/// Errors raised while building or populating a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Loads are spawned on a Tokio runtime; none was given or current.
    #[error("the asset registry needs a Tokio runtime")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
    /// The load metrics could not be registered.
    #[error("failed to register asset metrics")]
    Metrics(#[from] MetricsError),
    /// An asset list was not valid JSON or had malformed entries.
    #[error("invalid asset definitions")]
    Definitions(#[from] serde_json::Error),
}

/// The outcome of a failed URL load: the descriptor that was created or
/// reused, and why it failed.
#[derive(Debug, Clone, Error)]
#[error("failed to load '{}': {error}", .asset.name())]
pub struct UrlLoadError {
    /// The descriptor registered for the URL. It stays registered.
    pub asset: AssetRef,
    /// The loader's error.
    #[source]
    pub error: LoadError,
}
