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

//! Structured channel keys and payloads of the registry's notification bus.

use crate::asset::{AssetId, AssetRef, LoadError};
use std::fmt;

/// The lifecycle transition a registry channel reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// A descriptor became live.
    Add,
    /// A descriptor was removed from the registry.
    Remove,
    /// A fetch is about to be issued for a descriptor.
    LoadStart,
    /// A descriptor finished loading.
    Load,
    /// A descriptor failed to load.
    Error,
}

impl Verb {
    fn as_str(self) -> &'static str {
        match self {
            Verb::Add => "add",
            Verb::Remove => "remove",
            Verb::LoadStart | Verb::Load => "load",
            Verb::Error => "error",
        }
    }
}

/// Which descriptors a registry channel covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// Every descriptor (the global channel).
    All,
    /// The descriptor with this id.
    Id(AssetId),
    /// The descriptor registered under this file URL.
    Url(String),
}

/// Identifies a registry channel: a verb scoped to a target.
///
/// The [`Display`](fmt::Display) form is the conventional string name of the
/// channel (`"load"`, `"load:7"`, `"load:url:a.jpg"`, `"load:7:start"`) and is
/// used for logging only; channels are matched structurally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventKey {
    /// The transition.
    pub verb: Verb,
    /// The scope.
    pub target: Target,
}

impl EventKey {
    /// The global channel for `verb`.
    pub fn all(verb: Verb) -> Self {
        Self {
            verb,
            target: Target::All,
        }
    }

    /// The per-id channel for `verb`.
    pub fn id(verb: Verb, id: AssetId) -> Self {
        Self {
            verb,
            target: Target::Id(id),
        }
    }

    /// The per-URL channel for `verb`.
    pub fn url(verb: Verb, url: impl Into<String>) -> Self {
        Self {
            verb,
            target: Target::Url(url.into()),
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = self.verb.as_str();
        match &self.target {
            Target::All => write!(f, "{verb}")?,
            Target::Id(id) => write!(f, "{verb}:{id}")?,
            Target::Url(url) => write!(f, "{verb}:url:{url}")?,
        }
        if self.verb == Verb::LoadStart {
            write!(f, ":start")?;
        }
        Ok(())
    }
}

/// The payload delivered on registry channels.
#[derive(Debug, Clone)]
pub struct RegistryEvent {
    /// The descriptor the transition happened to.
    pub asset: AssetRef,
    /// Set on `Error` channels only.
    pub error: Option<LoadError>,
}

impl RegistryEvent {
    /// A payload without an error.
    pub fn new(asset: AssetRef) -> Self {
        Self { asset, error: None }
    }

    /// A payload carrying the load failure.
    pub fn failed(asset: AssetRef, error: LoadError) -> Self {
        Self {
            asset,
            error: Some(error),
        }
    }
}
