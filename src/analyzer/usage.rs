//! Workload usage measurement.
//!
//! Runs the whole measurement for one workload and one metric, strictly in
//! sequence:
//!
//! ```text
//! WorkloadResolver ──▶ pod names ──▶ compact() ──▶ MetricQuery ──▶ QueryExecutor ──▶ f64
//! ```

use super::executor::QueryExecutor;
use super::pattern::compact;
use super::prometheus_client::MetricsBackend;
use super::query::{MetricKind, MetricQuery};
use super::workload::{ClusterState, WorkloadResolver, WorkloadSelection};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Outcome of one measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub namespace: String,
    /// `statefulset/<name>` or `pods/<selector>`
    pub workload: String,
    pub metric: MetricKind,
    /// Pods the query was built from
    pub pods: Vec<String>,
    /// Pod matcher used in the query
    pub pattern: String,
    pub query: String,
    /// Raw value in the metric's unit (cores or bytes)
    pub value: f64,
}

/// Measures workload usage from cluster state and a metrics backend.
pub struct UsageAnalyzer<P, B> {
    resolver: WorkloadResolver<P>,
    executor: QueryExecutor<B>,
}

impl<P: ClusterState, B: MetricsBackend> UsageAnalyzer<P, B> {
    pub fn new(cluster: P, backend: B) -> Self {
        Self {
            resolver: WorkloadResolver::new(cluster),
            executor: QueryExecutor::new(backend),
        }
    }

    /// Measure `metric` for the pods of `selection` in `namespace`.
    pub async fn measure(
        &self,
        namespace: &str,
        selection: &WorkloadSelection,
        metric: MetricKind,
    ) -> Result<UsageReport> {
        let pods = self.resolver.resolve(namespace, selection).await?;
        if pods.is_empty() {
            log::warn!("{} in namespace {} has no pods", selection, namespace);
        }

        let pattern = compact(&pods);
        let query = MetricQuery::build(namespace, &pattern, metric);
        let value = self.executor.execute(&query).await?;

        Ok(UsageReport {
            namespace: namespace.to_string(),
            workload: selection.to_string(),
            metric,
            pods,
            pattern,
            query: query.to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::prometheus_client::{InstantResult, PrometheusError};
    use crate::analyzer::workload::{ClusterError, PodRecord, Selector, parse_selector};
    use crate::error::PodmeterError;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::{Arc, Mutex};

    struct FakeCluster;

    #[async_trait]
    impl ClusterState for FakeCluster {
        async fn workload_selector(
            &self,
            namespace: &str,
            name: &str,
        ) -> std::result::Result<Selector, ClusterError> {
            if name == "mg-sh-shard0" {
                Ok(parse_selector("app.kubernetes.io/instance=mg-sh").unwrap())
            } else {
                Err(ClusterError::WorkloadNotFound {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                })
            }
        }

        async fn list_pods(
            &self,
            _namespace: &str,
            selector: &Selector,
        ) -> std::result::Result<Vec<PodRecord>, ClusterError> {
            if selector.contains_key("app.kubernetes.io/instance") {
                Ok(vec![
                    PodRecord::new("mg-sh-shard0-0", Some("mg-sh-shard0")),
                    PodRecord::new("mg-sh-shard0-1", Some("mg-sh-shard0")),
                    PodRecord::new("mg-sh-configsvr-0", Some("mg-sh-configsvr")),
                ])
            } else {
                Ok(Vec::new())
            }
        }
    }

    /// Records queries and answers with a fixed vector.
    #[derive(Clone, Default)]
    struct RecordingBackend {
        queries: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl MetricsBackend for RecordingBackend {
        async fn instant_query(
            &self,
            query: &str,
            _time: DateTime<Utc>,
        ) -> std::result::Result<InstantResult, PrometheusError> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(InstantResult {
                text: "{} => 1048576 @[1700000000.000]\n{} => 1048576 @[1700000000.000]"
                    .to_string(),
                warnings: Vec::new(),
            })
        }
    }

    #[tokio::test]
    async fn test_statefulset_cpu() {
        let backend = RecordingBackend::default();
        let analyzer = UsageAnalyzer::new(FakeCluster, backend.clone());

        let report = analyzer
            .measure(
                "demo",
                &WorkloadSelection::StatefulSet("mg-sh-shard0".to_string()),
                MetricKind::Cpu,
            )
            .await
            .unwrap();

        assert_eq!(report.pods, vec!["mg-sh-shard0-0", "mg-sh-shard0-1"]);
        assert_eq!(report.pattern, "mg-sh-shard0-.*");
        assert_eq!(report.workload, "statefulset/mg-sh-shard0");
        assert_eq!(report.value, 2_097_152.0);
        assert_eq!(
            backend.queries.lock().unwrap().as_slice(),
            [r#"sum(node_namespace_pod_container:container_cpu_usage_seconds_total:sum_irate{namespace="demo", pod=~"mg-sh-shard0-.*", container!=""})"#]
        );
    }

    #[tokio::test]
    async fn test_selector_memory() {
        let backend = RecordingBackend::default();
        let analyzer = UsageAnalyzer::new(FakeCluster, backend.clone());
        let selector = parse_selector("app.kubernetes.io/instance=mg-sh").unwrap();

        let report = analyzer
            .measure("demo", &WorkloadSelection::Selector(selector), MetricKind::Memory)
            .await
            .unwrap();

        assert_eq!(report.pods.len(), 3);
        assert_eq!(report.pattern, "mg-sh-.*");
        assert!(report.query.starts_with("sum(container_memory_working_set_bytes{"));
        assert_eq!(report.metric, MetricKind::Memory);
    }

    #[tokio::test]
    async fn test_no_pods_still_queries() {
        let backend = RecordingBackend::default();
        let analyzer = UsageAnalyzer::new(FakeCluster, backend.clone());
        let selector = parse_selector("app=nothing").unwrap();

        let report = analyzer
            .measure("demo", &WorkloadSelection::Selector(selector), MetricKind::Storage)
            .await
            .unwrap();

        assert!(report.pods.is_empty());
        assert_eq!(report.pattern, "");
        assert_eq!(backend.queries.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_workload_stops_before_query() {
        let backend = RecordingBackend::default();
        let analyzer = UsageAnalyzer::new(FakeCluster, backend.clone());

        let err = analyzer
            .measure(
                "demo",
                &WorkloadSelection::StatefulSet("ghost".to_string()),
                MetricKind::Cpu,
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PodmeterError::Cluster(ClusterError::WorkloadNotFound { .. })
        ));
        assert!(backend.queries.lock().unwrap().is_empty());
    }
}
