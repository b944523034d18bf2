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

//! Defines the error reported when a descriptor fails to load.

use super::AssetId;
use thiserror::Error;

/// An error produced while fetching or decoding an asset's resource.
///
/// Load errors never unwind through the registry: they are stored on the
/// descriptor and delivered through the `error` channels and the results of
/// the URL-loading helpers. The type is `Clone` because a single failure is
/// fanned out to every subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The resource bytes could not be retrieved.
    #[error("failed to fetch '{url}': {reason}")]
    Fetch {
        /// The URL that was requested.
        url: String,
        /// A description of the underlying I/O or transport failure.
        reason: String,
    },
    /// The bytes were retrieved but could not be decoded.
    #[error("failed to decode '{asset_type}' resource: {reason}")]
    Decode {
        /// The asset type whose decoder failed.
        asset_type: String,
        /// A description of the decoder failure.
        reason: String,
    },
    /// No decoder is registered for the requested asset type.
    #[error("no loader registered for asset type '{0}'")]
    UnsupportedType(String),
    /// The load task ended without reporting a result.
    #[error("load of asset {0} was aborted before completing")]
    Aborted(AssetId),
}

impl LoadError {
    /// Shorthand for a [`LoadError::Fetch`].
    pub fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// Shorthand for a [`LoadError::Decode`].
    pub fn decode(asset_type: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            asset_type: asset_type.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_input() {
        let err = LoadError::fetch("textures/a.png", "not found");
        assert_eq!(err.to_string(), "failed to fetch 'textures/a.png': not found");

        let err = LoadError::decode("texture", "bad header");
        assert_eq!(
            err.to_string(),
            "failed to decode 'texture' resource: bad header"
        );

        let err = LoadError::UnsupportedType("audio".into());
        assert_eq!(err.to_string(), "no loader registered for asset type 'audio'");
    }
}
