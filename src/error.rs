use crate::analyzer::prometheus_client::PrometheusError;
use crate::analyzer::vector_text::VectorParseError;
use crate::analyzer::workload::ClusterError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PodmeterError {
    #[error(transparent)]
    Cluster(#[from] ClusterError),

    #[error("Metrics backend error: {0}")]
    Prometheus(#[from] PrometheusError),

    #[error("Invalid metrics response: {0}")]
    VectorParse(#[from] VectorParseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    ParsingFailed { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, PodmeterError>;
