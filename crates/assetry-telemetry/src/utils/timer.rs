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

//! RAII timers that record into a histogram when dropped.

use crate::metrics::registry::HistogramHandle;
use assetry_core::utils::timer::Stopwatch;

/// Times a scope and records the elapsed milliseconds into a histogram when
/// dropped, including on early return.
///
/// Holds its own handle so it can live across `.await` points in a load task.
#[derive(Debug)]
pub struct ScopedMetricTimer {
    stopwatch: Stopwatch,
    histogram: HistogramHandle,
    armed: bool,
}

impl ScopedMetricTimer {
    /// Starts timing immediately.
    pub fn new(histogram: &HistogramHandle) -> Self {
        Self {
            stopwatch: Stopwatch::new(),
            histogram: histogram.clone(),
            armed: true,
        }
    }

    /// Stops the timer without recording anything.
    pub fn discard(mut self) {
        self.armed = false;
    }
}

impl Drop for ScopedMetricTimer {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(elapsed_secs) = self.stopwatch.elapsed_secs_f64() {
            if let Err(e) = self.histogram.observe(elapsed_secs * 1000.0) {
                log::warn!("[ScopedMetricTimer] Failed to record metric: {e}");
            }
        }
    }
}
