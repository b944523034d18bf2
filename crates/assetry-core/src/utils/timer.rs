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

//! A minimal monotonic stopwatch.

use std::time::{Duration, Instant};

/// Measures the wall-clock time elapsed since it was started.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    /// Creates a stopwatch that starts counting immediately.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Returns the elapsed time since the stopwatch was started.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Returns the elapsed time in seconds.
    ///
    /// Returns `None` if the clock went backwards, which `Instant` guarantees
    /// against on supported platforms but callers still treat as optional.
    pub fn elapsed_secs_f64(&self) -> Option<f64> {
        Instant::now()
            .checked_duration_since(self.start)
            .map(|d| d.as_secs_f64())
    }

    /// Restarts the stopwatch from zero.
    pub fn reset(&mut self) {
        self.start = Instant::now();
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}
