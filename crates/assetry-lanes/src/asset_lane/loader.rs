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

use assetry_core::asset::Asset;
use std::error::Error;

/// A lane that decodes one kind of resource from raw bytes.
///
/// This is the CPU-bound part of a load: the bytes have already been read by
/// a [`ResourceSource`](super::ResourceSource), and the lane only parses
/// them. Each lane is specialized for a single resource type `A`.
pub trait AssetLoaderLane<A: Asset>: Send + Sync {
    /// Parses `bytes` into an instance of `A`.
    fn load(&self, bytes: &[u8]) -> Result<A, Box<dyn Error + Send + Sync>>;
}
