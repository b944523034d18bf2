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

//! The asset registry and its dependency-aware load orchestrator.
//!
//! [`AssetRegistry`] owns the live descriptors and their indices and is the
//! public surface for registering, querying and loading assets. Loading is
//! delegated to a [`ResourceLoader`](assetry_core::asset::ResourceLoader),
//! usually `assetry_lanes::LaneResourceLoader`.
//!
//! Lifecycle notifications go out on two levels: the registry's channels
//! (keyed by [`EventKey`](assetry_core::event::EventKey)) and each
//! descriptor's own bus.

mod cascade;
pub mod config;
mod error;
mod metrics;
mod orchestrator;
mod registry;

pub use cascade::BoxFuture;
pub use error::{RegistryError, UrlLoadError};
pub use orchestrator::LoadOptions;
pub use registry::{AssetRegistry, AssetRegistryBuilder, ListFilter};
