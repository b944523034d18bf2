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

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

static NEXT_RUNTIME_ID: AtomicI64 = AtomicI64::new(-1);

/// The numeric identity of an asset descriptor.
///
/// Ids authored in asset definitions are positive. Descriptors created at
/// runtime, for instance when loading from a bare URL, take their id from
/// [`AssetId::allocate`], which counts down from `-1` so the two ranges never
/// overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(i64);

impl AssetId {
    /// Wraps an explicit id value.
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Allocates a fresh runtime id.
    pub fn allocate() -> Self {
        Self(NEXT_RUNTIME_ID.fetch_sub(1, Ordering::Relaxed))
    }

    /// Returns the raw integer value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for AssetId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
