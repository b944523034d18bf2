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

//! Registry for managing metrics.

use crate::storage::{MetricSnapshot, MetricStore};
use assetry_core::telemetry::{MetricId, MetricType, MetricValue, MetricsError, MetricsResult};
use std::sync::Arc;

/// Entry point of the metrics system: registers metrics and hands out
/// cheap, clonable handles to update them.
#[derive(Debug, Clone, Default)]
pub struct MetricsRegistry {
    store: Arc<MetricStore>,
}

impl MetricsRegistry {
    /// Creates a registry with an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a counter starting at zero.
    pub fn register_counter(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> MetricsResult<CounterHandle> {
        let id = MetricId::new(namespace, name);
        self.store
            .register(&id, &description.into(), "count", MetricValue::Counter(0))?;
        Ok(CounterHandle {
            id,
            store: self.store.clone(),
        })
    }

    /// Registers a gauge starting at zero.
    pub fn register_gauge(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
    ) -> MetricsResult<GaugeHandle> {
        let id = MetricId::new(namespace, name);
        self.store.register(
            &id,
            &description.into(),
            &unit.into(),
            MetricValue::Gauge(0.0),
        )?;
        Ok(GaugeHandle {
            id,
            store: self.store.clone(),
        })
    }

    /// Registers a histogram with the given bucket upper bounds.
    pub fn register_histogram(
        &self,
        namespace: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
        buckets: Vec<f64>,
    ) -> MetricsResult<HistogramHandle> {
        let id = MetricId::new(namespace, name);
        let bucket_counts = vec![0; buckets.len() + 1];
        self.store.register(
            &id,
            &description.into(),
            &unit.into(),
            MetricValue::Histogram {
                count: 0,
                sum: 0.0,
                bucket_bounds: buckets,
                bucket_counts,
            },
        )?;
        Ok(HistogramHandle {
            id,
            store: self.store.clone(),
        })
    }

    /// The current value of a metric.
    pub fn get(&self, id: &MetricId) -> MetricsResult<MetricValue> {
        self.store.value(id)
    }

    /// Returns `true` if the metric is registered.
    pub fn contains_metric(&self, id: &MetricId) -> bool {
        self.store.contains(id)
    }

    /// Every registered metric, sorted by id.
    pub fn snapshot(&self) -> Vec<MetricSnapshot> {
        self.store.snapshot()
    }

    /// Registered metrics in one namespace, sorted by id.
    pub fn namespace(&self, namespace: &str) -> Vec<MetricSnapshot> {
        self.snapshot()
            .into_iter()
            .filter(|m| m.id.namespace == namespace)
            .collect()
    }

    /// The number of registered metrics.
    pub fn metric_count(&self) -> usize {
        self.store.len()
    }
}

/// Handle for counter updates.
#[derive(Debug, Clone)]
pub struct CounterHandle {
    id: MetricId,
    store: Arc<MetricStore>,
}

impl CounterHandle {
    /// Adds one and returns the new total.
    pub fn increment(&self) -> MetricsResult<u64> {
        self.store.increment_counter(&self.id, 1)
    }

    /// Adds `amount` and returns the new total.
    pub fn increment_by(&self, amount: u64) -> MetricsResult<u64> {
        self.store.increment_counter(&self.id, amount)
    }

    /// The current total.
    pub fn get(&self) -> MetricsResult<u64> {
        let value = self.store.value(&self.id)?;
        value.as_counter().ok_or_else(|| MetricsError::TypeMismatch {
            id: self.id.clone(),
            expected: MetricType::Counter,
            found: value.metric_type(),
        })
    }

    /// The metric id.
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

/// Handle for gauge updates.
#[derive(Debug, Clone)]
pub struct GaugeHandle {
    id: MetricId,
    store: Arc<MetricStore>,
}

impl GaugeHandle {
    /// Sets the gauge.
    pub fn set(&self, value: f64) -> MetricsResult<()> {
        self.store.set_gauge(&self.id, value)
    }

    /// Adds `delta` and returns the new value.
    pub fn add(&self, delta: f64) -> MetricsResult<f64> {
        self.store.add_gauge(&self.id, delta)
    }

    /// Subtracts `delta` and returns the new value.
    pub fn sub(&self, delta: f64) -> MetricsResult<f64> {
        self.add(-delta)
    }

    /// The current value.
    pub fn get(&self) -> MetricsResult<f64> {
        let value = self.store.value(&self.id)?;
        value.as_gauge().ok_or_else(|| MetricsError::TypeMismatch {
            id: self.id.clone(),
            expected: MetricType::Gauge,
            found: value.metric_type(),
        })
    }

    /// The metric id.
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

/// Handle for histogram samples.
#[derive(Debug, Clone)]
pub struct HistogramHandle {
    id: MetricId,
    store: Arc<MetricStore>,
}

impl HistogramHandle {
    /// Records a sample.
    pub fn observe(&self, value: f64) -> MetricsResult<()> {
        self.store.record_sample(&self.id, value)
    }

    /// The histogram summary.
    pub fn get(&self) -> MetricsResult<MetricValue> {
        self.store.value(&self.id)
    }

    /// The metric id.
    pub fn id(&self) -> &MetricId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_registration_and_operations() {
        let registry = MetricsRegistry::new();
        let counter = registry
            .register_counter("assets", "loaded_total", "Assets loaded")
            .unwrap();

        assert_eq!(counter.increment().unwrap(), 1);
        assert_eq!(counter.increment_by(5).unwrap(), 6);
        assert_eq!(counter.get().unwrap(), 6);
        assert!(registry.contains_metric(counter.id()));
        assert_eq!(registry.metric_count(), 1);
    }

    #[test]
    fn test_shared_registration_shares_the_value() {
        let registry = MetricsRegistry::new();
        let a = registry.register_counter("assets", "x", "").unwrap();
        let b = registry.register_counter("assets", "x", "").unwrap();
        a.increment().unwrap();
        assert_eq!(b.get().unwrap(), 1);
    }

    #[test]
    fn test_gauge_operations() {
        let registry = MetricsRegistry::new();
        let gauge = registry
            .register_gauge("assets", "registered", "Live descriptors", "count")
            .unwrap();

        gauge.set(10.0).unwrap();
        assert_eq!(gauge.add(2.0).unwrap(), 12.0);
        assert_eq!(gauge.sub(4.0).unwrap(), 8.0);
        assert_eq!(gauge.get().unwrap(), 8.0);
    }

    #[test]
    fn test_histogram_and_namespace_listing() {
        let registry = MetricsRegistry::new();
        let histogram = registry
            .register_histogram("assets", "load_time", "Load time", "ms", vec![1.0, 10.0])
            .unwrap();
        registry.register_counter("other", "n", "").unwrap();

        histogram.observe(2.5).unwrap();
        histogram.observe(15.0).unwrap();
        assert_eq!(histogram.get().unwrap().sample_count(), Some(2));

        let assets = registry.namespace("assets");
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].unit, "ms");
    }
}
