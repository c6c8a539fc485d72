use std::collections::HashMap;

use log::{debug, info};
use serde::Serialize;

use crate::Result;
use crate::lib::kubernetes::{ClusterSource, VolumeInfo};

/// Rendered for both claim columns of a volume with no claim reference
pub const NOT_BOUND: &str = "Not Bound";

/// Whether a node is required by more than one volume reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodePlacement {
    Shared,
    Unique,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffinityNode {
    pub name: String,
    pub placement: NodePlacement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PvRow {
    pub volume: String,
    pub nodes: Vec<AffinityNode>,
    pub claim_namespace: String,
    pub claim_name: String,
}

impl PvRow {
    /// Node names joined with `", "` in extraction order
    pub fn affinity_display(&self) -> String {
        self.nodes
            .iter()
            .map(|n| n.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Every candidate node name from every required term and expression, in
/// order, duplicates included
pub fn affinity_node_names(volume: &VolumeInfo) -> Vec<&str> {
    volume
        .required_affinity
        .iter()
        .flat_map(|term| &term.expressions)
        .flat_map(|expr| &expr.values)
        .map(String::as_str)
        .collect()
}

/// Count node name occurrences across all volumes
pub fn count_node_references(volumes: &[VolumeInfo]) -> HashMap<&str, usize> {
    let mut counts = HashMap::new();
    for volume in volumes {
        for node in affinity_node_names(volume) {
            *counts.entry(node).or_insert(0) += 1;
        }
    }
    counts
}

/// Classify every volume's affinity nodes. All volumes are counted before
/// any row is built, since a volume's nodes may be shared with a volume
/// listed after it.
pub fn classify_volumes(volumes: &[VolumeInfo]) -> Vec<PvRow> {
    let counts = count_node_references(volumes);
    debug!("Counted {} distinct affinity nodes", counts.len());

    volumes
        .iter()
        .map(|volume| {
            let nodes = affinity_node_names(volume)
                .into_iter()
                .map(|name| AffinityNode {
                    name: name.to_string(),
                    placement: if counts.get(name).copied().unwrap_or(0) > 1 {
                        NodePlacement::Shared
                    } else {
                        NodePlacement::Unique
                    },
                })
                .collect();

            let (claim_namespace, claim_name) = match &volume.claim {
                Some(claim) => (claim.namespace.clone(), claim.name.clone()),
                None => (NOT_BOUND.to_string(), NOT_BOUND.to_string()),
            };

            PvRow {
                volume: volume.name.clone(),
                nodes,
                claim_namespace,
                claim_name,
            }
        })
        .collect()
}

pub async fn report_pv_affinity<S: ClusterSource>(source: &S) -> Result<Vec<PvRow>> {
    let volumes = source.list_persistent_volumes().await?;
    let rows = classify_volumes(&volumes);

    info!(
        "Classified node affinity for {} persistent volumes, {} sharing a node",
        rows.len(),
        rows.iter()
            .filter(|r| r.nodes.iter().any(|n| n.placement == NodePlacement::Shared))
            .count()
    );
    Ok(rows)
}
