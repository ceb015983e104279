//! The patches of a cluster, grouped by scope, target and format.
//!
//! Building the registry is a projection of the configuration. Every
//! sequence keeps the order in which the user declared it; that order is
//! the order of application.

use kindcfg_core::{Cluster, Node, NodeRole, PatchJSON6902};

use crate::selector::Selector;
use crate::target::TargetKind;

/// An RFC 6902 patch body and the resources it may touch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPatchEntry {
    pub selector: Selector,
    /// YAML or JSON text
    pub patch: String,
}

impl From<&PatchJSON6902> for JsonPatchEntry {
    fn from(p: &PatchJSON6902) -> Self {
        JsonPatchEntry {
            selector: Selector::for_json6902(p),
            patch: p.patch.clone(),
        }
    }
}

/// The four patch sequences of one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchSet {
    pub kubeadm_merge: Vec<String>,
    pub kubeadm_json: Vec<JsonPatchEntry>,
    pub runtime_merge: Vec<String>,
    pub runtime_json: Vec<JsonPatchEntry>,
}

impl PatchSet {
    pub fn merge_patches(&self, target: TargetKind) -> &[String] {
        match target {
            TargetKind::Kubeadm => &self.kubeadm_merge,
            TargetKind::Runtime => &self.runtime_merge,
        }
    }

    pub fn json_patches(&self, target: TargetKind) -> &[JsonPatchEntry] {
        match target {
            TargetKind::Kubeadm => &self.kubeadm_json,
            TargetKind::Runtime => &self.runtime_json,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.kubeadm_merge.is_empty()
            && self.kubeadm_json.is_empty()
            && self.runtime_merge.is_empty()
            && self.runtime_json.is_empty()
    }

    fn for_cluster(cluster: &Cluster) -> Self {
        PatchSet {
            kubeadm_merge: cluster.kubeadm_config_patches.clone(),
            kubeadm_json: cluster
                .kubeadm_config_patches_json6902
                .iter()
                .map(JsonPatchEntry::from)
                .collect(),
            runtime_merge: cluster.containerd_config_patches.clone(),
            runtime_json: cluster
                .containerd_config_patches_json6902
                .iter()
                .map(|patch| JsonPatchEntry {
                    selector: Selector::any(),
                    patch: patch.clone(),
                })
                .collect(),
        }
    }

    // The schema has no node-level containerd patches.
    fn for_node(node: &Node) -> Self {
        PatchSet {
            kubeadm_merge: node.kubeadm_config_patches.clone(),
            kubeadm_json: node
                .kubeadm_config_patches_json6902
                .iter()
                .map(JsonPatchEntry::from)
                .collect(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePatches {
    pub role: NodeRole,
    pub patches: PatchSet,
}

/// Cluster-level patches, which apply to every node, and the patches of each
/// node by index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchRegistry {
    cluster: PatchSet,
    nodes: Vec<NodePatches>,
}

impl PatchRegistry {
    /// Nodes are taken from [`Cluster::nodes_or_default`], so a cluster
    /// without nodes has one control-plane node without patches.
    pub fn build(cluster: &Cluster) -> Self {
        PatchRegistry {
            cluster: PatchSet::for_cluster(cluster),
            nodes: cluster
                .nodes_or_default()
                .iter()
                .map(|node| NodePatches {
                    role: node.role_or_default(),
                    patches: PatchSet::for_node(node),
                })
                .collect(),
        }
    }

    pub fn cluster(&self) -> &PatchSet {
        &self.cluster
    }

    pub fn node(&self, index: usize) -> Option<&NodePatches> {
        self.nodes.get(index)
    }

    pub fn nodes(&self) -> &[NodePatches] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl From<&Cluster> for PatchRegistry {
    fn from(cluster: &Cluster) -> Self {
        PatchRegistry::build(cluster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_cluster_has_one_node() {
        let registry = PatchRegistry::build(&Cluster::default());
        assert_eq!(registry.node_count(), 1);
        assert_eq!(registry.node(0).unwrap().role, NodeRole::ControlPlane);
        assert!(registry.node(0).unwrap().patches.is_empty());
        assert!(registry.cluster().is_empty());
        assert!(registry.node(1).is_none());
    }

    #[test]
    fn test_declaration_order_is_kept() {
        let patches: Vec<String> = ["b: 1", "a: 1", "b: 1", "c: 1"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let cluster = Cluster {
            kubeadm_config_patches: patches.clone(),
            containerd_config_patches: vec!["x = 1".to_string()],
            containerd_config_patches_json6902: vec!["[]".to_string()],
            nodes: vec![
                Node::new(NodeRole::ControlPlane),
                Node {
                    role: Some(NodeRole::Worker),
                    kubeadm_config_patches: patches.iter().rev().cloned().collect(),
                    kubeadm_config_patches_json6902: vec![
                        PatchJSON6902 {
                            kind: "JoinConfiguration".to_string(),
                            patch: "[]".to_string(),
                            ..Default::default()
                        },
                        PatchJSON6902 {
                            kind: "InitConfiguration".to_string(),
                            patch: "[]".to_string(),
                            ..Default::default()
                        },
                    ],
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let registry = PatchRegistry::build(&cluster);

        assert_eq!(registry.cluster().merge_patches(TargetKind::Kubeadm), &patches[..]);
        assert_eq!(registry.cluster().merge_patches(TargetKind::Runtime), ["x = 1"]);
        assert_eq!(
            registry.cluster().json_patches(TargetKind::Runtime),
            [JsonPatchEntry {
                selector: Selector::any(),
                patch: "[]".to_string()
            }]
        );

        let worker = registry.node(1).unwrap();
        assert_eq!(worker.role, NodeRole::Worker);
        assert_eq!(worker.patches.kubeadm_merge, ["c: 1", "b: 1", "a: 1", "b: 1"]);
        let kinds: Vec<_> = worker
            .patches
            .json_patches(TargetKind::Kubeadm)
            .iter()
            .map(|e| e.selector.clone())
            .collect();
        assert_eq!(
            kinds,
            vec![
                Selector::kind("JoinConfiguration"),
                Selector::kind("InitConfiguration")
            ]
        );
        assert!(worker.patches.merge_patches(TargetKind::Runtime).is_empty());
        assert!(registry.node(0).unwrap().patches.is_empty());
    }
}
