use k8s_openapi::api::core::v1::{PersistentVolume, Pod};
use kube::{
    Api, Client, Config,
    api::ListParams,
    config::{KubeConfigOptions, Kubeconfig},
};
use log::{debug, info, warn};
use serde::Serialize;

use crate::lib::metrics::PodMetrics;
use crate::lib::quantity::ResourceQuantity;
use crate::{
    Config as KubememConfig, ConfigError, KubernetesError::ApiError,
    KubernetesError::ConnectionFailed, KubernetesError::InvalidResource, QuantityError, Result,
};

const MEMORY: &str = "memory";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodInfo {
    pub name: String,
    pub namespace: String,
    pub phase: Option<String>,
    pub containers: Vec<ContainerSpec>,
    /// Set when a container's declared memory could not be parsed; the
    /// pod then carries no containers
    pub invalid_spec: Option<String>,
}

impl PodInfo {
    pub fn is_running(&self) -> bool {
        self.phase.as_deref() == Some("Running")
    }
}

/// Declared memory resources of one container; unset values are zero
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub memory_request: ResourceQuantity,
    pub memory_limit: ResourceQuantity,
}

/// Measured memory usage of one pod, ordered as the metrics server lists it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsSample {
    pub containers: Vec<ContainerUsage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerUsage {
    pub name: String,
    pub memory: ResourceQuantity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeInfo {
    pub name: String,
    pub required_affinity: Vec<AffinityTerm>,
    pub claim: Option<ClaimRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffinityTerm {
    pub expressions: Vec<AffinityExpression>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AffinityExpression {
    pub key: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClaimRef {
    pub namespace: String,
    pub name: String,
}

/// Read-only view of the cluster the reporters work against
#[allow(async_fn_in_trait)]
pub trait ClusterSource {
    /// Pods in `namespace`, or in every namespace when `None`
    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<PodInfo>>;

    async fn pod_metrics(&self, namespace: &str, name: &str) -> Result<MetricsSample>;

    async fn list_persistent_volumes(&self) -> Result<Vec<VolumeInfo>>;
}

pub struct KubernetesLoader {
    client: Client,
}

impl KubernetesLoader {
    pub async fn new(config: &KubememConfig) -> Result<Self> {
        let client = match config.kubeconfig_path() {
            Some(path) if config.kubeconfig.is_some() || path.exists() => {
                debug!("Reading Kubeconfig from {}", path.display());
                let kubeconfig = Kubeconfig::read_from(&path).map_err(|e| {
                    ConfigError::FileError(format!("{}: {}", path.display(), e))
                })?;

                if let Some(context) = config.context.as_deref() {
                    if !kubeconfig.contexts.iter().any(|c| c.name == context) {
                        return Err(ConfigError::ContextNotFound(context.to_string()).into());
                    }
                    debug!("Using custom context {context} for Kubeconfig");
                }

                let options = KubeConfigOptions {
                    context: config.context.clone(),
                    ..Default::default()
                };
                let custom_config = Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

                debug!("Creating a Kubernetes client using custom Kubeconfig");
                Client::try_from(custom_config).map_err(|e| ConnectionFailed(e.to_string()))?
            }
            _ => {
                if let Some(context) = config.context.as_deref() {
                    return Err(ConfigError::FileError(format!(
                        "no kubeconfig found to look up context {context}"
                    ))
                    .into());
                }
                debug!("Creating a Kubernetes client using default configuration");
                Client::try_default()
                    .await
                    .map_err(|e| ConnectionFailed(e.to_string()))?
            }
        };

        info!("Successfully created Kubernetes client");
        Ok(Self { client })
    }
}

impl ClusterSource for KubernetesLoader {
    async fn list_pods(&self, namespace: Option<&str>) -> Result<Vec<PodInfo>> {
        let lp = ListParams::default();
        let pods = if let Some(namespace) = namespace {
            debug!("Listing all pods in {namespace} namespace");
            let api: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
            api.list(&lp).await.map_err(|e| ApiError(e.to_string()))?
        } else {
            debug!("Listing all pods in all namespaces");
            let api: Api<Pod> = Api::all(self.client.clone());
            api.list(&lp).await.map_err(|e| ApiError(e.to_string()))?
        };

        info!("Retrieved {} pods", pods.items.len());
        Ok(pods.items.into_iter().map(PodInfo::from).collect())
    }

    async fn pod_metrics(&self, namespace: &str, name: &str) -> Result<MetricsSample> {
        debug!("Fetching metrics for pod {namespace}/{name}");
        let api: Api<PodMetrics> = Api::namespaced(self.client.clone(), namespace);
        let metrics = api.get(name).await.map_err(|e| ApiError(e.to_string()))?;
        Ok(MetricsSample::try_from(metrics)?)
    }

    async fn list_persistent_volumes(&self) -> Result<Vec<VolumeInfo>> {
        debug!("Listing all persistent volumes");
        let api: Api<PersistentVolume> = Api::all(self.client.clone());
        let volumes = api
            .list(&ListParams::default())
            .await
            .map_err(|e| ApiError(e.to_string()))?;

        info!("Retrieved {} persistent volumes", volumes.items.len());
        Ok(volumes.items.into_iter().map(VolumeInfo::from).collect())
    }
}

impl From<Pod> for PodInfo {
    fn from(pod: Pod) -> Self {
        let name = pod.metadata.name.unwrap_or_default();
        let namespace = pod.metadata.namespace.unwrap_or_default();
        let phase = pod.status.and_then(|s| s.phase);

        let containers = pod
            .spec
            .map(|spec| spec.containers)
            .unwrap_or_default()
            .into_iter()
            .map(|container| -> Result<ContainerSpec> {
                let resources = container.resources.as_ref();
                let request = resources
                    .and_then(|r| r.requests.as_ref())
                    .and_then(|req| req.get(MEMORY));
                let limit = resources
                    .and_then(|r| r.limits.as_ref())
                    .and_then(|lim| lim.get(MEMORY));

                let invalid = |e: QuantityError| {
                    InvalidResource(format!("container {}: {e}", container.name))
                };
                Ok(ContainerSpec {
                    memory_request: ResourceQuantity::from_optional(request).map_err(invalid)?,
                    memory_limit: ResourceQuantity::from_optional(limit).map_err(invalid)?,
                    name: container.name,
                })
            })
            .collect::<Result<Vec<_>>>();

        let (containers, invalid_spec) = match containers {
            Ok(containers) => (containers, None),
            Err(e) => {
                warn!("Pod {namespace}/{name} has unreadable resources: {e}");
                (Vec::new(), Some(e.to_string()))
            }
        };

        PodInfo {
            name,
            namespace,
            phase,
            containers,
            invalid_spec,
        }
    }
}

impl TryFrom<PodMetrics> for MetricsSample {
    type Error = QuantityError;

    fn try_from(metrics: PodMetrics) -> std::result::Result<Self, Self::Error> {
        let containers = metrics
            .containers
            .into_iter()
            .map(|c| -> std::result::Result<ContainerUsage, QuantityError> {
                Ok(ContainerUsage {
                    memory: ResourceQuantity::from_optional(c.usage.get(MEMORY))?,
                    name: c.name,
                })
            })
            .collect::<std::result::Result<Vec<_>, QuantityError>>()?;

        Ok(MetricsSample { containers })
    }
}

impl From<PersistentVolume> for VolumeInfo {
    fn from(volume: PersistentVolume) -> Self {
        let name = volume.metadata.name.unwrap_or_default();
        let spec = volume.spec.unwrap_or_default();

        let required_affinity = spec
            .node_affinity
            .and_then(|affinity| affinity.required)
            .map(|selector| {
                selector
                    .node_selector_terms
                    .into_iter()
                    .map(|term| AffinityTerm {
                        expressions: term
                            .match_expressions
                            .unwrap_or_default()
                            .into_iter()
                            .map(|req| AffinityExpression {
                                key: req.key,
                                values: req.values.unwrap_or_default(),
                            })
                            .collect(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let claim = spec.claim_ref.map(|claim| ClaimRef {
            namespace: claim.namespace.unwrap_or_default(),
            name: claim.name.unwrap_or_default(),
        });

        VolumeInfo {
            name,
            required_affinity,
            claim,
        }
    }
}
