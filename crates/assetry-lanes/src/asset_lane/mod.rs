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

//! Contains lanes related to asset processing: byte sources, per-type
//! decoders, and the loader that combines them.

mod lane_loader;
mod loader;
pub mod loading;
mod source;

pub use lane_loader::*;
pub use loader::*;
pub use loading::{CpuTexture, CubemapFaces, JsonLoaderLane, TextureLoaderLane};
pub use source::*;
