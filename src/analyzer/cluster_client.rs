//! Kubernetes-backed cluster state.
//!
//! Reads StatefulSet selectors and pod listings through the Kubernetes API
//! using an explicitly configured kubeconfig.
//!
//! # Example
//!
//! ```rust,ignore
//! use podmeter::analyzer::cluster_client::{KubeClusterState, KubeSettings};
//!
//! let cluster = KubeClusterState::connect(&KubeSettings::default()).await?;
//! let pods = cluster.list_pods("demo", &selector).await?;
//! ```

use super::workload::{ClusterError, ClusterState, PodRecord, Selector, selector_string};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::StatefulSet;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    Client, Config,
    api::{Api, ListParams},
    config::{KubeConfigOptions, Kubeconfig},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How to reach the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KubeSettings {
    /// Path to the kubeconfig file (None = infer from environment)
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context (None = current context)
    #[serde(default)]
    pub context: Option<String>,
}

/// Cluster state read from a live Kubernetes API server.
pub struct KubeClusterState {
    client: Client,
}

impl KubeClusterState {
    /// Build a client from `settings`.
    ///
    /// An explicit kubeconfig path is read as-is; otherwise the configuration
    /// is inferred (`KUBECONFIG`, `~/.kube/config`, then in-cluster).
    pub async fn connect(settings: &KubeSettings) -> Result<Self, ClusterError> {
        let options = KubeConfigOptions {
            context: settings.context.clone(),
            ..Default::default()
        };

        let config = match &settings.kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                    ClusterError::Unavailable(format!(
                        "Failed to read kubeconfig {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .map_err(|e| {
                        ClusterError::Unavailable(format!("Invalid kubeconfig: {}", e))
                    })?
            }
            None if settings.context.is_some() => Config::from_kubeconfig(&options)
                .await
                .map_err(|e| ClusterError::Unavailable(format!("Invalid kubeconfig: {}", e)))?,
            None => Config::infer().await.map_err(|e| {
                ClusterError::Unavailable(format!("Failed to infer Kubernetes config: {}", e))
            })?,
        };

        log::debug!("Connecting to Kubernetes API at {}", config.cluster_url);

        let client = Client::try_from(config).map_err(|e| {
            ClusterError::Unavailable(format!("Failed to create Kubernetes client: {}", e))
        })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl ClusterState for KubeClusterState {
    async fn workload_selector(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Selector, ClusterError> {
        let statefulsets: Api<StatefulSet> = Api::namespaced(self.client.clone(), namespace);

        let statefulset = statefulsets
            .get_opt(name)
            .await
            .map_err(|e| {
                ClusterError::Unavailable(format!(
                    "Failed to get StatefulSet {}/{}: {}",
                    namespace, name, e
                ))
            })?
            .ok_or_else(|| ClusterError::WorkloadNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })?;

        Ok(statefulset
            .spec
            .and_then(|spec| spec.selector.match_labels)
            .unwrap_or_default())
    }

    async fn list_pods(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Vec<PodRecord>, ClusterError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);

        let mut params = ListParams::default();
        if !selector.is_empty() {
            params = params.labels(&selector_string(selector));
        }

        let pod_list = pods.list(&params).await.map_err(|e| {
            ClusterError::Unavailable(format!("Failed to list pods in {}: {}", namespace, e))
        })?;

        Ok(pod_list.items.into_iter().map(pod_to_record).collect())
    }
}

/// Reduce a pod to its name and primary owner.
fn pod_to_record(pod: Pod) -> PodRecord {
    let metadata = pod.metadata;

    let owner = metadata
        .owner_references
        .and_then(|refs| refs.into_iter().next())
        .map(|owner| owner.name);

    PodRecord {
        name: metadata.name.unwrap_or_default(),
        owner,
    }
}
