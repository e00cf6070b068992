// Performance Metrics for the booking rules
//
// Counts rule evaluations, their execution time and how many were rejected
// by a rule violation.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use utoipa::ToSchema;

/// Performance threshold for slow evaluations (100ms)
const SLOW_OPERATION_THRESHOLD_MS: u128 = 100;

/// Rule evaluations that are measured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOperation {
    Schedule,
    Pricing,
    Loyalty,
}

impl RuleOperation {
    fn label(self) -> &'static str {
        match self {
            RuleOperation::Schedule => "schedule",
            RuleOperation::Pricing => "pricing",
            RuleOperation::Loyalty => "loyalty",
        }
    }
}

#[derive(Debug, Default)]
struct OperationCounters {
    count: AtomicU64,
    total_time_us: AtomicU64,
    slow: AtomicU64,
    rejected: AtomicU64,
}

impl OperationCounters {
    fn snapshot(&self) -> OperationStats {
        let count = self.count.load(Ordering::Relaxed);
        let total_us = self.total_time_us.load(Ordering::Relaxed);

        OperationStats {
            count,
            avg_time_ms: if count == 0 {
                0.0
            } else {
                (total_us as f64 / count as f64) / 1000.0
            },
            slow: self.slow.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

/// Performance metrics for the rules engine
#[derive(Debug, Clone, Default)]
pub struct PerformanceMetrics {
    inner: Arc<MetricsInner>,
}

#[derive(Debug, Default)]
struct MetricsInner {
    schedule: OperationCounters,
    pricing: OperationCounters,
    loyalty: OperationCounters,
}

impl PerformanceMetrics {
    /// Create a new PerformanceMetrics instance
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self, operation: RuleOperation) -> &OperationCounters {
        match operation {
            RuleOperation::Schedule => &self.inner.schedule,
            RuleOperation::Pricing => &self.inner.pricing,
            RuleOperation::Loyalty => &self.inner.loyalty,
        }
    }

    /// Start timing an evaluation; the duration is recorded when the timer drops
    pub fn start(&self, operation: RuleOperation) -> OperationTimer {
        OperationTimer {
            start: Instant::now(),
            operation,
            metrics: self.clone(),
        }
    }

    /// Count an evaluation that ended in a rule violation
    pub fn record_rejection(&self, operation: RuleOperation) {
        self.counters(operation).rejected.fetch_add(1, Ordering::Relaxed);
    }

    fn record(&self, operation: RuleOperation, duration: Duration) {
        let counters = self.counters(operation);
        counters.count.fetch_add(1, Ordering::Relaxed);
        counters
            .total_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        if duration.as_millis() > SLOW_OPERATION_THRESHOLD_MS {
            counters.slow.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                "Slow {} evaluation: {}ms",
                operation.label(),
                duration.as_millis()
            );
        }
    }

    /// Get metrics summary
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            schedule: self.inner.schedule.snapshot(),
            pricing: self.inner.pricing.snapshot(),
            loyalty: self.inner.loyalty.snapshot(),
        }
    }
}

/// Timer for tracking evaluation duration
pub struct OperationTimer {
    start: Instant,
    operation: RuleOperation,
    metrics: PerformanceMetrics,
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        self.metrics.record(self.operation, self.start.elapsed());
    }
}

/// Counters for one kind of evaluation
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OperationStats {
    pub count: u64,
    pub avg_time_ms: f64,
    pub slow: u64,
    pub rejected: u64,
}

/// Summary of performance metrics
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MetricsSummary {
    pub schedule: OperationStats,
    pub pricing: OperationStats,
    pub loyalty: OperationStats,
}
