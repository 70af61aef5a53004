use crate::analyzer::cluster_client::KubeSettings;
use crate::analyzer::prometheus_client::{
    DEFAULT_PROMETHEUS_URL, DEFAULT_TIMEOUT_SECS, PrometheusAuth,
};
use crate::cli::OutputFormat;
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub kubernetes: KubeSettings,
    pub prometheus: PrometheusConfig,
    pub output: OutputConfig,
}

/// Prometheus connection configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrometheusConfig {
    pub url: String,
    pub timeout_secs: u64,
    pub auth: PrometheusAuth,
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PROMETHEUS_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            auth: PrometheusAuth::None,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}
