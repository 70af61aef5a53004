//! # Analyzer Module
//!
//! Measures the resource usage of a Kubernetes workload:
//! - Resolves a StatefulSet or label selector into pod names
//! - Compacts the pod names into a short `pod=~` matcher
//! - Renders and runs an instant PromQL aggregate
//! - Sums the returned samples into a single value

pub mod cluster_client;
pub mod executor;
pub mod pattern;
pub mod prometheus_client;
pub mod query;
pub mod usage;
pub mod vector_text;
pub mod workload;

pub use cluster_client::{KubeClusterState, KubeSettings};
pub use executor::QueryExecutor;
pub use pattern::compact;
pub use prometheus_client::{
    InstantResult, MetricsBackend, PrometheusAuth, PrometheusClient, PrometheusError,
};
pub use query::{MetricKind, MetricQuery};
pub use usage::{UsageAnalyzer, UsageReport};
pub use vector_text::{VectorParseError, sum_samples};
pub use workload::{
    ClusterError, ClusterState, PodRecord, Selector, WorkloadResolver, WorkloadSelection,
    parse_selector,
};
