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

//! Per-type decoding lanes and inline openers.

mod cubemap;
mod json_loader_lane;
mod texture_loader_lane;

pub use cubemap::{open_cubemap, CubemapFaces};
pub use json_loader_lane::JsonLoaderLane;
pub use texture_loader_lane::{CpuTexture, TextureLoaderLane};

use super::AssetLoaderLane;
