// file: src/utils/telemetry.rs
// description: health probes and operation timing for the retrieval pipeline
// reference: component health report rendered by the health command

use crate::services::{DocumentStore, Embedder, LlmAdapter, VectorStore};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    fn icon(self) -> &'static str {
        match self {
            Self::Healthy => "✓",
            Self::Degraded => "⚠",
            Self::Unhealthy => "✗",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub component: String,
    pub status: HealthStatus,
    pub message: Option<String>,
    pub response_time_ms: u64,
}

impl HealthCheck {
    fn new(
        component: &str,
        status: HealthStatus,
        message: Option<String>,
        response_time: Duration,
    ) -> Self {
        Self {
            component: component.to_string(),
            status,
            message,
            response_time_ms: response_time.as_millis() as u64,
        }
    }

    pub fn healthy(component: &str, response_time: Duration) -> Self {
        Self::new(component, HealthStatus::Healthy, None, response_time)
    }

    pub fn healthy_with(component: &str, message: String, response_time: Duration) -> Self {
        Self::new(component, HealthStatus::Healthy, Some(message), response_time)
    }

    pub fn degraded(component: &str, message: String, response_time: Duration) -> Self {
        Self::new(component, HealthStatus::Degraded, Some(message), response_time)
    }

    pub fn unhealthy(component: &str, message: String, response_time: Duration) -> Self {
        Self::new(component, HealthStatus::Unhealthy, Some(message), response_time)
    }
}

/// Worst component status wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub overall_status: HealthStatus,
    pub checks: Vec<HealthCheck>,
    pub checked_at: String,
    pub version: String,
}

impl HealthReport {
    pub fn new(checks: Vec<HealthCheck>, version: String) -> Self {
        let overall_status = checks
            .iter()
            .map(|c| c.status)
            .max()
            .unwrap_or(HealthStatus::Healthy);

        Self {
            overall_status,
            checks,
            checked_at: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            version,
        }
    }

    pub fn format(&self) -> String {
        let mut lines = vec![
            format!(
                "{} rfp_rag {} ({:?}) at {}",
                self.overall_status.icon(),
                self.version,
                self.overall_status,
                self.checked_at
            ),
            String::new(),
        ];

        for check in &self.checks {
            let detail = check
                .message
                .as_deref()
                .map(|m| format!(": {}", m))
                .unwrap_or_default();
            lines.push(format!(
                "{} {:<15} {:>6}ms{}",
                check.status.icon(),
                check.component,
                check.response_time_ms,
                detail
            ));
        }

        lines.join("\n")
    }
}

/// Operation timer for performance tracking
pub struct OperationTimer {
    operation: String,
    start: Instant,
}

impl OperationTimer {
    pub fn new(operation: &str) -> Self {
        info!("Starting operation: {}", operation);
        Self {
            operation: operation.to_string(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish_with_count(self, count: usize) -> Duration {
        let elapsed = self.elapsed();
        info!(
            "Completed operation: {} - {} items in {:.2}s ({:.2} items/sec)",
            self.operation,
            count,
            elapsed.as_secs_f64(),
            if elapsed.as_secs_f64() > 0.0 {
                count as f64 / elapsed.as_secs_f64()
            } else {
                0.0
            }
        );
        elapsed
    }

    pub fn warn_if_slow(&self, threshold: Duration, message: &str) {
        let elapsed = self.elapsed();
        if elapsed > threshold {
            warn!(
                "Slow operation [{}]: {} took {:.2}s (threshold: {:.2}s)",
                self.operation,
                message,
                elapsed.as_secs_f64(),
                threshold.as_secs_f64()
            );
        }
    }
}

/// Probe each backing service and collect the results into one report.
pub async fn check_services(
    documents: &dyn DocumentStore,
    vector_store: &dyn VectorStore,
    embedder: &dyn Embedder,
    llm: Option<&dyn LlmAdapter>,
) -> HealthReport {
    let mut checks = Vec::with_capacity(4);

    let start = Instant::now();
    checks.push(match documents.stats().await {
        Ok(stats) => HealthCheck::healthy_with(
            "document store",
            format!("{} documents, {} chunks", stats.documents, stats.chunks),
            start.elapsed(),
        ),
        Err(e) => HealthCheck::unhealthy("document store", e.to_string(), start.elapsed()),
    });

    let start = Instant::now();
    checks.push(match vector_store.count().await {
        Ok(count) => HealthCheck::healthy_with(
            "vector store",
            format!("{} vectors", count),
            start.elapsed(),
        ),
        Err(e) => HealthCheck::unhealthy("vector store", e.to_string(), start.elapsed()),
    });

    let start = Instant::now();
    let probe = vec!["health probe".to_string()];
    checks.push(match embedder.embed(&probe).await {
        Ok(vectors) if vectors.first().map(Vec::len) == Some(embedder.dimension()) => {
            HealthCheck::healthy("embedder", start.elapsed())
        }
        Ok(_) => HealthCheck::unhealthy(
            "embedder",
            "embedding dimension does not match configuration".to_string(),
            start.elapsed(),
        ),
        Err(e) => HealthCheck::unhealthy("embedder", e.to_string(), start.elapsed()),
    });

    // configuration only, no completion call is made
    checks.push(match llm {
        Some(adapter) => HealthCheck::healthy_with(
            "llm",
            format!("model {}", adapter.model()),
            Duration::ZERO,
        ),
        None => HealthCheck::degraded(
            "llm",
            "no API key configured, extraction uses pattern fallback".to_string(),
            Duration::ZERO,
        ),
    });

    HealthReport::new(checks, env!("CARGO_PKG_VERSION").to_string())
}
