//! Workload resolution.
//!
//! Resolves a StatefulSet name or a plain label selector into the ordered
//! list of pod names backing it. Cluster access goes through the
//! [`ClusterState`] trait so the resolution rules can be exercised without a
//! live API server.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Label key/value pairs used to filter pods.
pub type Selector = BTreeMap<String, String>;

/// Error type for cluster-state lookups.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    #[error("Kubernetes cluster unavailable: {0}")]
    Unavailable(String),

    #[error("Workload not found: {namespace}/{name}")]
    WorkloadNotFound { namespace: String, name: String },
}

/// Error returned when a selector argument cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorParseError {
    #[error("Invalid selector term '{0}': expected key=value")]
    MissingValue(String),

    #[error("Invalid selector term '{0}': empty label key")]
    EmptyKey(String),

    #[error("Selector must contain at least one key=value term")]
    Empty,
}

/// A pod as seen by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodRecord {
    /// Pod name
    pub name: String,
    /// Name of the pod's primary (first) owner reference
    pub owner: Option<String>,
}

impl PodRecord {
    pub fn new(name: impl Into<String>, owner: Option<&str>) -> Self {
        Self {
            name: name.into(),
            owner: owner.map(str::to_string),
        }
    }
}

/// Which pods to measure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkloadSelection {
    /// Pods owned by the named StatefulSet
    StatefulSet(String),
    /// Pods matching a label selector, regardless of owner
    Selector(Selector),
}

impl fmt::Display for WorkloadSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StatefulSet(name) => write!(f, "statefulset/{}", name),
            Self::Selector(selector) => write!(f, "pods/{}", selector_string(selector)),
        }
    }
}

/// Source of pod and workload state.
#[async_trait]
pub trait ClusterState {
    /// The `matchLabels` selector declared by a StatefulSet.
    async fn workload_selector(&self, namespace: &str, name: &str)
    -> Result<Selector, ClusterError>;

    /// Pods in `namespace` matching `selector`, in listing order.
    async fn list_pods(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<PodRecord>, ClusterError>;
}

/// Resolves workloads into pod names.
pub struct WorkloadResolver<P> {
    provider: P,
}

impl<P: ClusterState> WorkloadResolver<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Resolve `selection` in `namespace` into pod names, preserving the
    /// provider's listing order.
    pub async fn resolve(
        &self,
        namespace: &str,
        selection: &WorkloadSelection,
    ) -> Result<Vec<String>, ClusterError> {
        let pods = match selection {
            WorkloadSelection::StatefulSet(name) => {
                let selector = self.provider.workload_selector(namespace, name).await?;
                log::debug!(
                    "StatefulSet {}/{} selects {}",
                    namespace,
                    name,
                    selector_string(&selector)
                );

                let listed = self.provider.list_pods(namespace, &selector).await?;
                let total = listed.len();
                let owned: Vec<String> = listed
                    .into_iter()
                    .filter(|pod| pod.owner.as_deref() == Some(name.as_str()))
                    .map(|pod| pod.name)
                    .collect();

                if owned.len() < total {
                    log::debug!(
                        "Dropped {} pod(s) matching the selector but not owned by {}",
                        total - owned.len(),
                        name
                    );
                }
                owned
            }
            WorkloadSelection::Selector(selector) => self
                .provider
                .list_pods(namespace, selector)
                .await?
                .into_iter()
                .map(|pod| pod.name)
                .collect(),
        };

        log::debug!("Resolved {} to {} pod(s): {:?}", selection, pods.len(), pods);
        Ok(pods)
    }
}

/// Render a selector in Kubernetes label-selector form (`k1=v1,k2=v2`).
pub fn selector_string(selector: &Selector) -> String {
    selector
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

/// Parse a `k1=v1,k2=v2` selector argument.
pub fn parse_selector(input: &str) -> Result<Selector, SelectorParseError> {
    let mut selector = Selector::new();

    for term in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let (key, value) = term
            .split_once('=')
            .ok_or_else(|| SelectorParseError::MissingValue(term.to_string()))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(SelectorParseError::EmptyKey(term.to_string()));
        }
        selector.insert(key.to_string(), value.trim().to_string());
    }

    if selector.is_empty() {
        return Err(SelectorParseError::Empty);
    }
    Ok(selector)
}
