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

//! In-memory metric storage.

use assetry_core::telemetry::{MetricId, MetricType, MetricValue, MetricsError, MetricsResult};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A registered metric as reported by [`MetricStore::snapshot`].
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSnapshot {
    /// The metric's id.
    pub id: MetricId,
    /// What it measures.
    pub description: String,
    /// Its unit (`"count"` for counters).
    pub unit: String,
    /// The value at snapshot time.
    pub value: MetricValue,
}

#[derive(Debug)]
struct StoredMetric {
    description: String,
    unit: String,
    value: MetricValue,
}

/// Thread-safe metric storage.
///
/// Registration is idempotent: registering an id again with the same kind
/// keeps the existing value, so several owners can share one store.
#[derive(Debug, Default)]
pub struct MetricStore {
    metrics: RwLock<HashMap<MetricId, StoredMetric>>,
}

impl MetricStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `id` with an initial value.
    pub fn register(
        &self,
        id: &MetricId,
        description: &str,
        unit: &str,
        initial: MetricValue,
    ) -> MetricsResult<()> {
        if let MetricValue::Histogram {
            bucket_bounds,
            bucket_counts,
            ..
        } = &initial
        {
            let increasing = bucket_bounds.windows(2).all(|w| w[0] < w[1]);
            let finite = bucket_bounds.iter().all(|b| b.is_finite());
            if !increasing || !finite || bucket_counts.len() != bucket_bounds.len() + 1 {
                return Err(MetricsError::InvalidBuckets(id.clone()));
            }
        }

        let mut metrics = self.write();
        if let Some(existing) = metrics.get(id) {
            let found = existing.value.metric_type();
            let expected = initial.metric_type();
            return if found == expected {
                Ok(())
            } else {
                Err(MetricsError::TypeMismatch {
                    id: id.clone(),
                    expected,
                    found,
                })
            };
        }
        metrics.insert(
            id.clone(),
            StoredMetric {
                description: description.to_string(),
                unit: unit.to_string(),
                value: initial,
            },
        );
        Ok(())
    }

    /// The current value of `id`.
    pub fn value(&self, id: &MetricId) -> MetricsResult<MetricValue> {
        self.read()
            .get(id)
            .map(|m| m.value.clone())
            .ok_or_else(|| MetricsError::MetricNotFound(id.clone()))
    }

    /// Returns `true` if `id` is registered.
    pub fn contains(&self, id: &MetricId) -> bool {
        self.read().contains_key(id)
    }

    /// Adds `delta` to a counter and returns the new total.
    pub fn increment_counter(&self, id: &MetricId, delta: u64) -> MetricsResult<u64> {
        self.update(id, MetricType::Counter, |value| match value {
            MetricValue::Counter(total) => {
                *total = total.saturating_add(delta);
                *total
            }
            _ => 0,
        })
    }

    /// Sets a gauge.
    pub fn set_gauge(&self, id: &MetricId, new_value: f64) -> MetricsResult<()> {
        self.update(id, MetricType::Gauge, |value| {
            if let MetricValue::Gauge(current) = value {
                *current = new_value;
            }
        })
    }

    /// Adds `delta` to a gauge and returns the new value.
    pub fn add_gauge(&self, id: &MetricId, delta: f64) -> MetricsResult<f64> {
        self.update(id, MetricType::Gauge, |value| match value {
            MetricValue::Gauge(current) => {
                *current += delta;
                *current
            }
            _ => 0.0,
        })
    }

    /// Records one histogram sample.
    pub fn record_sample(&self, id: &MetricId, sample: f64) -> MetricsResult<()> {
        self.update(id, MetricType::Histogram, |value| {
            if let MetricValue::Histogram {
                count,
                sum,
                bucket_bounds,
                bucket_counts,
            } = value
            {
                *count += 1;
                *sum += sample;
                let bucket = bucket_bounds
                    .iter()
                    .position(|bound| sample <= *bound)
                    .unwrap_or(bucket_bounds.len());
                bucket_counts[bucket] += 1;
            }
        })
    }

    /// Every registered metric, sorted by id.
    pub fn snapshot(&self) -> Vec<MetricSnapshot> {
        let mut all: Vec<MetricSnapshot> = self
            .read()
            .iter()
            .map(|(id, m)| MetricSnapshot {
                id: id.clone(),
                description: m.description.clone(),
                unit: m.unit.clone(),
                value: m.value.clone(),
            })
            .collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// The number of registered metrics.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn update<R>(
        &self,
        id: &MetricId,
        expected: MetricType,
        apply: impl FnOnce(&mut MetricValue) -> R,
    ) -> MetricsResult<R> {
        let mut metrics = self.write();
        let metric = metrics
            .get_mut(id)
            .ok_or_else(|| MetricsError::MetricNotFound(id.clone()))?;
        let found = metric.value.metric_type();
        if found != expected {
            return Err(MetricsError::TypeMismatch {
                id: id.clone(),
                expected,
                found,
            });
        }
        Ok(apply(&mut metric.value))
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<MetricId, StoredMetric>> {
        self.metrics.read().expect("metric store poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<MetricId, StoredMetric>> {
        self.metrics.write().expect("metric store poisoned")
    }
}
