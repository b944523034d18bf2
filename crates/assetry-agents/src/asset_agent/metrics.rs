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

use assetry_core::telemetry::MetricsResult;
use assetry_telemetry::metrics::registry::{CounterHandle, GaugeHandle, HistogramHandle};
use assetry_telemetry::MetricsRegistry;

/// Metric handles updated by the load orchestrator.
#[derive(Debug, Clone)]
pub(crate) struct LoadMetrics {
    /// Fetch attempts issued.
    pub(crate) started: CounterHandle,
    /// Descriptors that reached `Loaded`.
    pub(crate) loaded: CounterHandle,
    /// Descriptors that reached `Failed`.
    pub(crate) failed: CounterHandle,
    /// Time from `load:start` to the terminal state.
    pub(crate) load_time: HistogramHandle,
    /// Live descriptors.
    pub(crate) registered: GaugeHandle,
}

impl LoadMetrics {
    pub(crate) fn new(registry: &MetricsRegistry) -> MetricsResult<Self> {
        Ok(Self {
            started: registry.register_counter(
                "assets",
                "load_started_total",
                "Asset fetches issued to the loader",
            )?,
            loaded: registry.register_counter(
                "assets",
                "loaded_total",
                "Assets that finished loading",
            )?,
            failed: registry.register_counter(
                "assets",
                "load_failed_total",
                "Assets whose load failed",
            )?,
            load_time: registry.register_histogram(
                "assets",
                "load_time",
                "Asset load time, fetch to notification",
                "ms",
                vec![1.0, 5.0, 16.0, 33.0, 100.0, 500.0],
            )?,
            registered: registry.register_gauge(
                "assets",
                "registered",
                "Live asset descriptors",
                "count",
            )?,
        })
    }

    pub(crate) fn record(handle: &CounterHandle) {
        if let Err(e) = handle.increment() {
            log::warn!("Failed to record asset metric: {e}");
        }
    }

    pub(crate) fn adjust_registered(&self, delta: f64) {
        if let Err(e) = self.registered.add(delta) {
            log::warn!("Failed to record asset metric: {e}");
        }
    }
}
