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

//! Provides the foundational types and contracts of the asset registry.
//!
//! This module defines the "common language" shared by the index, the load
//! orchestrator and the external resource loaders. It has no knowledge of how
//! resources are fetched or where descriptors are stored.
//!
//! The key components are:
//! - The [`Asset`] trait: a marker for decoded resource types.
//! - [`AssetDescriptor`]: the registered record (identity, type, tags, inline
//!   data, load state and, once loaded, its resources).
//! - [`ResourceLoader`]: the boundary to the fetch/decode layer.

mod definition;
mod descriptor;
mod error;
mod handle;
mod id;
pub mod kinds;
mod loader;
pub mod path;
mod settings;

pub use definition::*;
pub use descriptor::*;
pub use error::*;
pub use handle::*;
pub use id::*;
pub use loader::*;
pub use settings::*;

/// A marker trait for decoded resource types held by descriptors.
///
/// The supertraits enforce the guarantees the registry relies on:
/// - `Send` + `Sync`: resources are produced on loader tasks and read from
///   any thread.
/// - `'static`: resources are stored behind type-erased handles for the
///   lifetime of the descriptor.
///
/// # Examples
///
/// ```
/// use assetry_core::asset::Asset;
///
/// struct Texture {
///     width: u32,
///     height: u32,
/// }
///
/// impl Asset for Texture {}
/// ```
pub trait Asset: Send + Sync + 'static {}

/// JSON documents (mapping files, material definitions) are resources too.
impl Asset for serde_json::Value {}
