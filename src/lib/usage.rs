use log::{debug, info, warn};
use serde::Serialize;

use crate::Result;
use crate::lib::kubernetes::{ClusterSource, PodInfo};
use crate::lib::progress::PodProgress;
use crate::lib::quantity::ResourceQuantity;

/// Pods in this namespace are never reported, whatever filter was requested
pub const EXCLUDED_NAMESPACE: &str = "kube-system";

/// Measured usage relative to the declared request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageClass {
    Over,
    Within,
}

/// `Over` when usage is strictly greater than the request. An unset request
/// compares as zero, so any positive usage against it is `Over`.
pub fn classify_usage(usage: ResourceQuantity, request: ResourceQuantity) -> UsageClass {
    if usage > request {
        UsageClass::Over
    } else {
        UsageClass::Within
    }
}

/// One container's memory usage against its declared resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageRow {
    pub pod: String,
    pub namespace: String,
    pub container: String,
    pub usage: ResourceQuantity,
    pub classification: UsageClass,
    pub request: ResourceQuantity,
    pub limit: ResourceQuantity,
}

/// A pod that contributes no rows, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PodDiagnostic {
    pub pod: String,
    pub namespace: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageEntry {
    Row(UsageRow),
    MetricsUnavailable(PodDiagnostic),
    InvalidSpec(PodDiagnostic),
}

/// Running pods outside `kube-system`
pub fn is_reportable(pod: &PodInfo) -> bool {
    pod.is_running() && pod.namespace != EXCLUDED_NAMESPACE
}

/// Running pods eligible for the usage report, in retrieval order
pub fn reportable_pods(pods: Vec<PodInfo>) -> Vec<PodInfo> {
    pods.into_iter().filter(is_reportable).collect()
}

/// Build the memory usage report for running pods in `namespace` (or all
/// namespaces).
///
/// Containers are paired with metrics entries by position; containers past
/// the end of the metrics list produce no row. A failed metrics fetch or an
/// unreadable resource spec yields a diagnostic entry in place of that pod's
/// rows and the walk carries on. Listing failures are returned as errors.
///
/// The progress bar ticks once for every listed pod, filtered or not.
pub async fn report_usage<S: ClusterSource>(
    source: &S,
    namespace: Option<&str>,
    progress: &PodProgress,
) -> Result<Vec<UsageEntry>> {
    let pods = source.list_pods(namespace).await?;
    info!(
        "Reporting memory usage for {} of {} listed pods",
        pods.iter().filter(|p| is_reportable(p)).count(),
        pods.len()
    );

    progress.start(pods.len() as u64);
    let mut entries = Vec::new();

    for pod in &pods {
        if is_reportable(pod) {
            entries.extend(pod_entries(source, pod, progress).await);
        } else {
            debug!("Skipping pod {}/{}", pod.namespace, pod.name);
        }
        progress.tick(&pod.name);
    }

    Ok(entries)
}

async fn pod_entries<S: ClusterSource>(
    source: &S,
    pod: &PodInfo,
    progress: &PodProgress,
) -> Vec<UsageEntry> {
    let diagnostic = |reason: String| PodDiagnostic {
        pod: pod.name.clone(),
        namespace: pod.namespace.clone(),
        reason,
    };

    if let Some(reason) = &pod.invalid_spec {
        return vec![UsageEntry::InvalidSpec(diagnostic(reason.clone()))];
    }

    let sample = match source.pod_metrics(&pod.namespace, &pod.name).await {
        Ok(sample) => sample,
        Err(e) => {
            progress.suspend(|| {
                warn!("Error getting metrics for pod {}/{}: {}", pod.namespace, pod.name, e)
            });
            return vec![UsageEntry::MetricsUnavailable(diagnostic(e.to_string()))];
        }
    };

    if sample.containers.len() < pod.containers.len() {
        debug!(
            "Pod {}/{} has {} containers but metrics for {}",
            pod.namespace,
            pod.name,
            pod.containers.len(),
            sample.containers.len()
        );
    }

    pod.containers
        .iter()
        .zip(&sample.containers)
        .map(|(container, measured)| {
            UsageEntry::Row(UsageRow {
                pod: pod.name.clone(),
                namespace: pod.namespace.clone(),
                container: container.name.clone(),
                usage: measured.memory,
                classification: classify_usage(measured.memory, container.memory_request),
                request: container.memory_request,
                limit: container.memory_limit,
            })
        })
        .collect()
}
