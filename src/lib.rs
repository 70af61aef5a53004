//! # podmeter
//!
//! A one-shot diagnostic tool that reports how much CPU, memory or storage a
//! Kubernetes workload is using right now, according to Prometheus.
//!
//! ## Example
//!
//! ```rust,no_run
//! use podmeter::analyzer::{
//!     KubeClusterState, KubeSettings, MetricKind, PrometheusClient, UsageAnalyzer,
//!     WorkloadSelection,
//! };
//!
//! # async fn run() -> podmeter::Result<()> {
//! let cluster = KubeClusterState::connect(&KubeSettings::default()).await?;
//! let prometheus = PrometheusClient::new("http://127.0.0.1:9090")?;
//! let analyzer = UsageAnalyzer::new(cluster, prometheus);
//!
//! let report = analyzer
//!     .measure(
//!         "demo",
//!         &WorkloadSelection::StatefulSet("mg-sh-shard0".to_string()),
//!         MetricKind::Cpu,
//!     )
//!     .await?;
//! println!("{} cores", report.value);
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;

pub use error::{PodmeterError, Result};
