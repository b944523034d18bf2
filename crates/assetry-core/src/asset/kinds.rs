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

//! Well-known asset type tags.
//!
//! Types are open-ended strings; these are the ones the registry itself
//! gives special treatment to.

/// A single image resource.
pub const TEXTURE: &str = "texture";

/// A material document that may reference textures by relative path.
pub const MATERIAL: &str = "material";

/// A model that may ship a companion material mapping file.
pub const MODEL: &str = "model";

/// A cube map; its faces are resolved by the loader, not from a file.
pub const CUBEMAP: &str = "cubemap";

/// A raw JSON document.
pub const JSON: &str = "json";
