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

//! Metric identifiers and values shared by everything that reports
//! load statistics.

use std::fmt;
use thiserror::Error;

/// A metric identifier: `namespace:name`, optionally with sorted labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MetricId {
    /// The owning subsystem (e.g. `"assets"`).
    pub namespace: String,
    /// The metric name (e.g. `"loaded_total"`).
    pub name: String,
    /// Dimensional labels, kept sorted by key.
    pub labels: Vec<(String, String)>,
}

impl MetricId {
    /// An unlabelled id.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            labels: Vec::new(),
        }
    }

    /// Adds a label, keeping labels sorted by key.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.push((key.into(), value.into()));
        self.labels.sort_by(|a, b| a.0.cmp(&b.0));
        self
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.name)?;
        if !self.labels.is_empty() {
            let labels = self
                .labels
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(",");
            write!(f, "[{labels}]")?;
        }
        Ok(())
    }
}

/// The kind of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    /// Monotonic count.
    Counter,
    /// A value that moves both ways.
    Gauge,
    /// A distribution of samples.
    Histogram,
}

/// A snapshot of a metric's value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// Value of a counter.
    Counter(u64),
    /// Value of a gauge.
    Gauge(f64),
    /// Summary of a histogram.
    Histogram {
        /// Number of recorded samples.
        count: u64,
        /// Sum of recorded samples.
        sum: f64,
        /// Upper bounds of the buckets.
        bucket_bounds: Vec<f64>,
        /// Samples per bucket; the last entry counts samples above every bound.
        bucket_counts: Vec<u64>,
    },
}

impl MetricValue {
    /// The kind of this value.
    pub fn metric_type(&self) -> MetricType {
        match self {
            MetricValue::Counter(_) => MetricType::Counter,
            MetricValue::Gauge(_) => MetricType::Gauge,
            MetricValue::Histogram { .. } => MetricType::Histogram,
        }
    }

    /// The counter value, if this is a counter.
    pub fn as_counter(&self) -> Option<u64> {
        match self {
            MetricValue::Counter(v) => Some(*v),
            _ => None,
        }
    }

    /// The gauge value, if this is a gauge.
    pub fn as_gauge(&self) -> Option<f64> {
        match self {
            MetricValue::Gauge(v) => Some(*v),
            _ => None,
        }
    }

    /// The sample count, if this is a histogram.
    pub fn sample_count(&self) -> Option<u64> {
        match self {
            MetricValue::Histogram { count, .. } => Some(*count),
            _ => None,
        }
    }
}

/// A specialized `Result` for metric operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// Errors raised by a metrics registry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricsError {
    /// No metric is registered under the id.
    #[error("metric not found: {0}")]
    MetricNotFound(MetricId),
    /// The id is registered with a different kind.
    #[error("type mismatch for {id}: expected {expected:?}, found {found:?}")]
    TypeMismatch {
        /// The id being accessed.
        id: MetricId,
        /// The kind the caller asked for.
        expected: MetricType,
        /// The kind already registered.
        found: MetricType,
    },
    /// Histogram bounds must be finite and strictly increasing.
    #[error("invalid histogram bounds for {0}")]
    InvalidBuckets(MetricId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_sorted_in_display() {
        let id = MetricId::new("assets", "loaded_total")
            .with_label("type", "texture")
            .with_label("source", "disk");
        assert_eq!(
            id.to_string(),
            "assets:loaded_total[source=disk,type=texture]"
        );
        assert_eq!(MetricId::new("assets", "load_time").to_string(), "assets:load_time");
    }

    #[test]
    fn value_accessors_match_kind() {
        assert_eq!(MetricValue::Counter(3).as_counter(), Some(3));
        assert_eq!(MetricValue::Counter(3).as_gauge(), None);
        let hist = MetricValue::Histogram {
            count: 2,
            sum: 5.0,
            bucket_bounds: vec![1.0],
            bucket_counts: vec![0, 2],
        };
        assert_eq!(hist.metric_type(), MetricType::Histogram);
        assert_eq!(hist.sample_count(), Some(2));
    }
}
