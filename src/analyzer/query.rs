//! PromQL templates for workload usage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The resource being measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// CPU usage in cores
    Cpu,
    /// Working-set memory in bytes
    Memory,
    /// Block I/O device usage in bytes
    Storage,
}

impl MetricKind {
    pub const ALL: [MetricKind; 3] = [MetricKind::Cpu, MetricKind::Memory, MetricKind::Storage];

    /// Unit of the raw value returned by the backend.
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Cpu => "cores",
            Self::Memory | Self::Storage => "bytes",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Cpu => "CPU usage",
            Self::Memory => "Memory usage",
            Self::Storage => "Storage usage",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cpu => "cpu",
            Self::Memory => "memory",
            Self::Storage => "storage",
        };
        f.write_str(name)
    }
}

/// A rendered instant query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricQuery {
    kind: MetricKind,
    text: String,
}

impl MetricQuery {
    /// Render the aggregation template for `kind`.
    ///
    /// `pattern` is substituted verbatim as the pod regex; an invalid regex is
    /// only reported by the backend when the query runs.
    pub fn build(namespace: &str, pattern: &str, kind: MetricKind) -> Self {
        let text = match kind {
            MetricKind::Cpu => format!(
                r#"sum(node_namespace_pod_container:container_cpu_usage_seconds_total:sum_irate{{namespace="{}", pod=~"{}", container!=""}})"#,
                namespace, pattern
            ),
            MetricKind::Memory => format!(
                r#"sum(container_memory_working_set_bytes{{namespace="{}", pod=~"{}", container!="", image!=""}})"#,
                namespace, pattern
            ),
            MetricKind::Storage => format!(
                r#"avg(container_blkio_device_usage_total{{namespace="{}", pod=~"{}"}})"#,
                namespace, pattern
            ),
        };

        Self { kind, text }
    }

    pub fn kind(&self) -> MetricKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for MetricQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_template() {
        let query = MetricQuery::build("demo", "mg-sh-shard0-.*", MetricKind::Cpu);
        assert_eq!(
            query.as_str(),
            r#"sum(node_namespace_pod_container:container_cpu_usage_seconds_total:sum_irate{namespace="demo", pod=~"mg-sh-shard0-.*", container!=""})"#
        );
        assert_eq!(query.kind(), MetricKind::Cpu);
    }

    #[test]
    fn test_memory_template() {
        let query = MetricQuery::build("demo", "a-0|b-0", MetricKind::Memory);
        assert_eq!(
            query.to_string(),
            r#"sum(container_memory_working_set_bytes{namespace="demo", pod=~"a-0|b-0", container!="", image!=""})"#
        );
    }

    #[test]
    fn test_storage_template() {
        let query = MetricQuery::build("kube-system", "etcd-.*", MetricKind::Storage);
        assert_eq!(
            query.as_str(),
            r#"avg(container_blkio_device_usage_total{namespace="kube-system", pod=~"etcd-.*"})"#
        );
    }

    #[test]
    fn test_pattern_is_not_validated() {
        let query = MetricQuery::build("demo", "app-[", MetricKind::Cpu);
        assert!(query.as_str().contains(r#"pod=~"app-[""#));
    }

    #[test]
    fn test_metric_kind_names() {
        assert_eq!(
            <MetricKind as clap::ValueEnum>::from_str("storage", true),
            Ok(MetricKind::Storage)
        );
        assert_eq!(MetricKind::Memory.unit(), "bytes");
        assert_eq!(MetricKind::Cpu.to_string(), "cpu");
    }
}
