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

//! `env_logger` setup shared by binaries and tests.

use env_logger::{Builder, Env};

/// Installs the global logger, honouring `RUST_LOG` and defaulting to
/// `default_filter` when it is unset.
///
/// Returns `false` if a logger was already installed, which makes it safe
/// to call from every test.
pub fn init_with_default(default_filter: &str) -> bool {
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}

/// Installs the global logger at `info` unless `RUST_LOG` says otherwise.
pub fn init() -> bool {
    init_with_default("info")
}

/// Installs a logger that writes through the test harness's capture.
pub fn init_for_tests() -> bool {
    Builder::from_env(Env::default().default_filter_or("debug"))
        .is_test(true)
        .try_init()
        .is_ok()
}
