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

//! Byte sources: where a [`LaneResourceLoader`](super::LaneResourceLoader)
//! reads a URL's contents from.

use assetry_core::asset::path;
use base64::Engine;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use thiserror::Error;

/// Errors raised while reading a resource's bytes.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Nothing exists at the URL.
    #[error("'{0}' not found")]
    NotFound(String),
    /// The URL resolves outside the source root.
    #[error("'{0}' escapes the source root")]
    OutsideRoot(String),
    /// The source cannot serve URLs with this scheme.
    #[error("unsupported scheme in '{0}'")]
    UnsupportedScheme(String),
    /// A malformed `data:` URL.
    #[error("malformed data url: {0}")]
    DataUrl(String),
    /// The underlying read failed.
    #[error("failed to read '{path}'")]
    Io {
        /// The file being read.
        path: PathBuf,
        /// The I/O error.
        #[source]
        source: io::Error,
    },
}

/// Reads the raw bytes behind a URL.
///
/// Sources are called from blocking worker threads, never from the async
/// runtime's own threads.
pub trait ResourceSource: Send + Sync {
    /// Returns the full contents at `url`.
    fn read(&self, url: &str) -> Result<Vec<u8>, SourceError>;
}

/// Decodes an inline `data:` URL. Returns `None` for any other URL.
pub fn read_data_url(url: &str) -> Option<Result<Vec<u8>, SourceError>> {
    let rest = url.strip_prefix("data:")?;
    let Some((header, payload)) = rest.split_once(',') else {
        return Some(Err(SourceError::DataUrl("missing ',' separator".into())));
    };
    if header.ends_with(";base64") {
        Some(
            base64::engine::general_purpose::STANDARD
                .decode(payload)
                .map_err(|e| SourceError::DataUrl(e.to_string())),
        )
    } else {
        Some(Ok(payload.as_bytes().to_vec()))
    }
}

/// Serves relative URLs from a directory on disk.
///
/// Query strings are ignored, and `..` segments may not climb above the
/// root.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// A source rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// The directory URLs are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn locate(&self, url: &str) -> Result<PathBuf, SourceError> {
        if path::has_scheme(url) {
            return Err(SourceError::UnsupportedScheme(url.to_string()));
        }
        let relative = path::normalize(path::strip_query(url));
        let relative = relative.trim_start_matches('/');
        if relative == ".." || relative.starts_with("../") {
            return Err(SourceError::OutsideRoot(url.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl ResourceSource for DirectorySource {
    fn read(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let path = self.locate(url)?;
        std::fs::read(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => SourceError::NotFound(url.to_string()),
            _ => SourceError::Io { path, source },
        })
    }
}

/// Serves URLs from an in-memory table, keyed verbatim (so `blob:` URLs
/// work as-is).
#[derive(Debug, Default)]
pub struct MemorySource {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemorySource {
    /// An empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the contents at `url`.
    pub fn insert(&self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files
            .write()
            .expect("memory source poisoned")
            .insert(url.into(), bytes.into());
    }

    /// Adds a builder-style entry.
    pub fn with(self, url: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(url, bytes);
        self
    }

    /// Removes the contents at `url`. Returns `false` if there were none.
    pub fn remove(&self, url: &str) -> bool {
        self.files
            .write()
            .expect("memory source poisoned")
            .remove(url)
            .is_some()
    }
}

impl ResourceSource for MemorySource {
    fn read(&self, url: &str) -> Result<Vec<u8>, SourceError> {
        let files = self.files.read().expect("memory source poisoned");
        files
            .get(url)
            .or_else(|| files.get(path::strip_query(url)))
            .cloned()
            .ok_or_else(|| SourceError::NotFound(url.to_string()))
    }
}
