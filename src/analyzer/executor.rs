//! Instant query execution.

use super::prometheus_client::MetricsBackend;
use super::query::MetricQuery;
use super::vector_text::sum_samples;
use crate::error::Result;
use chrono::{DateTime, Utc};

/// Runs rendered queries against a metrics backend and sums the result.
pub struct QueryExecutor<B> {
    backend: B,
}

impl<B: MetricsBackend> QueryExecutor<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Evaluate `query` now.
    pub async fn execute(&self, query: &MetricQuery) -> Result<f64> {
        self.execute_at(query, Utc::now()).await
    }

    /// Evaluate `query` at `time` and return the sum of all sample values.
    ///
    /// Backend warnings are logged and otherwise ignored.
    pub async fn execute_at(&self, query: &MetricQuery, time: DateTime<Utc>) -> Result<f64> {
        log::info!("{}", query);

        let result = self.backend.instant_query(query.as_str(), time).await?;
        for warning in &result.warnings {
            log::warn!("Prometheus warning: {}", warning);
        }

        Ok(sum_samples(&result.text)?)
    }
}
