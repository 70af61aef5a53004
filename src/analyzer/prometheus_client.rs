//! Prometheus client for instant workload queries.
//!
//! Evaluates a PromQL expression at a single point in time through the HTTP
//! API and hands back the resulting vector in its line-oriented text form
//! (`<labels> => <value> @[<ts>]`), together with any warnings the server
//! attached to the response.
//!
//! # Authentication
//!
//! Authentication is **optional** and typically not needed when using
//! `kubectl port-forward`, because the connection goes directly to the pod.
//!
//! # Example
//!
//! ```rust,ignore
//! use podmeter::analyzer::prometheus_client::{MetricsBackend, PrometheusClient};
//!
//! let client = PrometheusClient::new("http://127.0.0.1:9090")?;
//! let result = client.instant_query("sum(up)", chrono::Utc::now()).await?;
//! println!("{}", result.text);
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Default Prometheus address (a local port-forward).
pub const DEFAULT_PROMETHEUS_URL: &str = "http://127.0.0.1:9090";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error type for Prometheus client operations.
#[derive(Debug, thiserror::Error)]
pub enum PrometheusError {
    #[error("Failed to connect to Prometheus: {0}")]
    ConnectionFailed(String),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid Prometheus URL: {0}")]
    InvalidUrl(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Unsupported result type '{0}' for an instant aggregate query")]
    UnsupportedResult(String),
}

/// Authentication method for Prometheus (optional).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PrometheusAuth {
    /// No authentication (default - works for port-forward)
    #[default]
    None,
    /// Basic auth
    Basic { username: String, password: String },
    /// Bearer token
    Bearer { token: String },
}

/// Result of an instant query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InstantResult {
    /// Samples rendered one per line
    pub text: String,
    /// Non-fatal warnings returned by the server
    pub warnings: Vec<String>,
}

/// A backend able to evaluate instant queries.
#[async_trait]
pub trait MetricsBackend {
    async fn instant_query(
        &self,
        query: &str,
        time: DateTime<Utc>,
    ) -> Result<InstantResult, PrometheusError>;
}

/// Prometheus HTTP API client.
pub struct PrometheusClient {
    base_url: String,
    http_client: Client,
    auth: PrometheusAuth,
}

impl PrometheusClient {
    /// Create a new Prometheus client without authentication.
    pub fn new(url: &str) -> Result<Self, PrometheusError> {
        Self::with_options(url, PrometheusAuth::None, DEFAULT_TIMEOUT_SECS)
    }

    /// Create a new Prometheus client with authentication and a request timeout.
    pub fn with_options(
        url: &str,
        auth: PrometheusAuth,
        timeout_secs: u64,
    ) -> Result<Self, PrometheusError> {
        let base_url = url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(PrometheusError::InvalidUrl(format!(
                "{} (URL must start with http:// or https://)",
                url
            )));
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            http_client,
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Add authentication headers to a request (if configured).
    fn add_auth(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.auth {
            PrometheusAuth::None => req,
            PrometheusAuth::Basic { username, password } => {
                req.basic_auth(username, Some(password))
            }
            PrometheusAuth::Bearer { token } => req.bearer_auth(token),
        }
    }

    fn query_url(&self, query: &str, time: DateTime<Utc>) -> String {
        format!(
            "{}/api/v1/query?query={}&time={}",
            self.base_url,
            urlencoding::encode(query),
            format_timestamp(time)
        )
    }
}

#[async_trait]
impl MetricsBackend for PrometheusClient {
    async fn instant_query(
        &self,
        query: &str,
        time: DateTime<Utc>,
    ) -> Result<InstantResult, PrometheusError> {
        let url = self.query_url(query, time);
        log::debug!("GET {}", url);

        let req = self.http_client.get(&url);
        let response = self.add_auth(req).send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                PrometheusError::ConnectionFailed(format!("{}: {}", self.base_url, e))
            } else {
                PrometheusError::HttpError(e)
            }
        })?;

        let status = response.status();
        let body = response.text().await?;

        let parsed = serde_json::from_str::<PrometheusResponse>(&body);
        if !status.is_success() {
            let detail = match parsed {
                Ok(resp) => resp.error_message(),
                Err(_) => body,
            };
            return Err(PrometheusError::QueryFailed(format!("HTTP {}: {}", status, detail)));
        }

        let parsed = parsed
            .map_err(|e| PrometheusError::ParseError(format!("Failed to parse response: {}", e)))?;
        into_instant_result(parsed)
    }
}

// ============================================================================
// Prometheus API response types
// ============================================================================

#[derive(Debug, Deserialize)]
struct PrometheusResponse {
    status: String,
    #[serde(rename = "errorType")]
    error_type: Option<String>,
    error: Option<String>,
    data: Option<PrometheusData>,
    #[serde(default)]
    warnings: Vec<String>,
}

impl PrometheusResponse {
    fn error_message(&self) -> String {
        match (&self.error_type, &self.error) {
            (Some(kind), Some(msg)) => format!("{}: {}", kind, msg),
            (None, Some(msg)) => msg.clone(),
            _ => "Unknown error".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PrometheusData {
    #[serde(rename = "resultType")]
    result_type: String,
    result: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct VectorSample {
    #[serde(default)]
    metric: BTreeMap<String, String>,
    value: (f64, String),
}

// ============================================================================
// Helper functions
// ============================================================================

/// Check the envelope and render its samples as text.
fn into_instant_result(response: PrometheusResponse) -> Result<InstantResult, PrometheusError> {
    if response.status != "success" {
        return Err(PrometheusError::QueryFailed(response.error_message()));
    }

    let data = response
        .data
        .ok_or_else(|| PrometheusError::ParseError("Response has no data".to_string()))?;

    let text = match data.result_type.as_str() {
        "vector" => {
            let samples: Vec<VectorSample> = serde_json::from_value(data.result)
                .map_err(|e| PrometheusError::ParseError(format!("Invalid vector: {}", e)))?;
            samples
                .iter()
                .map(|s| render_sample(&s.metric, s.value.0, &s.value.1))
                .collect::<Vec<_>>()
                .join("\n")
        }
        "scalar" => {
            let (ts, value): (f64, String) = serde_json::from_value(data.result)
                .map_err(|e| PrometheusError::ParseError(format!("Invalid scalar: {}", e)))?;
            render_sample(&BTreeMap::new(), ts, &value)
        }
        other => return Err(PrometheusError::UnsupportedResult(other.to_string())),
    };

    Ok(InstantResult {
        text,
        warnings: response.warnings,
    })
}

/// Render one sample as `name{k="v", ...} => value @[ts]`.
fn render_sample(metric: &BTreeMap<String, String>, ts: f64, value: &str) -> String {
    let name = metric.get("__name__").map(String::as_str).unwrap_or("");
    let labels = metric
        .iter()
        .filter(|(k, _)| k.as_str() != "__name__")
        .map(|(k, v)| format!("{}={:?}", k, v))
        .collect::<Vec<_>>()
        .join(", ");

    format!("{}{{{}}} => {} @[{:.3}]", name, labels, value, ts)
}

/// Unix time with millisecond precision, as the query API expects.
fn format_timestamp(time: DateTime<Utc>) -> String {
    format!("{}.{:03}", time.timestamp(), time.timestamp_subsec_millis())
}
