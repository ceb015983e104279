//! The `kind.x-k8s.io/v1alpha4` cluster configuration.
//!
//! These types are plain data. They deserialize leniently where the closed
//! string enums are concerned: an unknown role, IP family, propagation mode
//! or protocol is kept as `Unrecognized` so that [`crate::validate`] can
//! report it together with every other problem in the document.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

pub const API_VERSION: &str = "kind.x-k8s.io/v1alpha4";
pub const KIND: &str = "Cluster";

/// Declares a closed set of string values.
///
/// Values outside the set deserialize into the `Unrecognized` variant
/// instead of failing, and serialize back verbatim.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// A value outside of the closed set, rejected by validation.
            Unrecognized(String),
        }

        impl $name {
            /// The accepted spellings, in declaration order.
            pub const VALUES: &'static [&'static str] = &[$($value),+];

            pub fn as_str(&self) -> &str {
                match self {
                    $( $name::$variant => $value, )+
                    $name::Unrecognized(s) => s.as_str(),
                }
            }

            pub fn is_recognized(&self) -> bool {
                !matches!(self, $name::Unrecognized(_))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                match s.as_str() {
                    $( $value => $name::$variant, )+
                    _ => $name::Unrecognized(s),
                }
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name::from(s.to_string())
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> String {
                v.as_str().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    /// The role a node plays in the cluster.
    pub enum NodeRole {
        /// Hosts the Kubernetes control plane. In a single node cluster the
        /// control-plane node also runs workloads.
        ControlPlane = "control-plane",
        Worker = "worker",
    }
}

impl Default for NodeRole {
    fn default() -> Self {
        NodeRole::ControlPlane
    }
}

string_enum! {
    /// Network model of the cluster.
    pub enum ClusterIPFamily {
        IPv4 = "ipv4",
        IPv6 = "ipv6",
    }
}

impl Default for ClusterIPFamily {
    fn default() -> Self {
        ClusterIPFamily::IPv4
    }
}

string_enum! {
    /// Mount propagation mode, named after the CRI enum values.
    pub enum MountPropagation {
        /// No propagation ("private").
        None = "None",
        /// Host mounts show up in the container ("rslave").
        HostToContainer = "HostToContainer",
        /// Mounts propagate both ways ("rshared").
        Bidirectional = "Bidirectional",
    }
}

string_enum! {
    pub enum PortMappingProtocol {
        TCP = "TCP",
        UDP = "UDP",
        SCTP = "SCTP",
    }
}

/// Root of a cluster configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Cluster {
    /// Must be `Cluster` when present.
    #[serde(
        default,
        deserialize_with = "kind_is_cluster",
        skip_serializing_if = "Option::is_none"
    )]
    pub kind: Option<String>,

    /// Must be [`API_VERSION`] when present.
    #[serde(
        default,
        deserialize_with = "api_version_is_v1alpha4",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_version: Option<String>,

    /// The nodes, in order. Empty means a single control-plane node; see
    /// [`Cluster::nodes_or_default`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<Node>,

    #[serde(default, skip_serializing_if = "Networking::is_empty")]
    pub networking: Networking,

    /// Merge patches (YAML) for the generated kubeadm config, applied to
    /// every node before the node's own patches.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kubeadm_config_patches: Vec<String>,

    /// RFC 6902 patches for the generated kubeadm config, applied to every
    /// node before the node's own patches.
    #[serde(
        default,
        rename = "kubeadmConfigPatchesJSON6902",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub kubeadm_config_patches_json6902: Vec<PatchJSON6902>,

    /// Merge patches (TOML) for every node's containerd config.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containerd_config_patches: Vec<String>,

    /// RFC 6902 patches (YAML or JSON) for every node's containerd config.
    /// These carry no selector.
    #[serde(
        default,
        rename = "containerdConfigPatchesJSON6902",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub containerd_config_patches_json6902: Vec<String>,
}

impl Cluster {
    /// The nodes to provision. A cluster without nodes gets one
    /// control-plane node with all defaults.
    pub fn nodes_or_default(&self) -> Cow<'_, [Node]> {
        if self.nodes.is_empty() {
            Cow::Owned(vec![Node::default()])
        } else {
            Cow::Borrowed(&self.nodes)
        }
    }

    pub fn control_plane_count(&self) -> usize {
        self.nodes_or_default()
            .iter()
            .filter(|n| n.role_or_default() == NodeRole::ControlPlane)
            .count()
    }

    /// More than one control plane implies an external load balancer in
    /// front of the API servers.
    pub fn needs_external_load_balancer(&self) -> bool {
        self.control_plane_count() > 1
    }
}

fn kind_is_cluster<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == KIND {
        Ok(Some(s))
    } else {
        Err(serde::de::Error::custom(format!(
            "unexpected kind in cluster configuration: expected '{}', got '{}'",
            KIND, s
        )))
    }
}

fn api_version_is_v1alpha4<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == API_VERSION {
        Ok(Some(s))
    } else {
        Err(serde::de::Error::custom(format!(
            "unsupported apiVersion in cluster configuration: expected '{}', got '{}'",
            API_VERSION, s
        )))
    }
}

/// A single node: one container provisioned with everything its role needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Node {
    /// Unset means control-plane.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<NodeRole>,

    /// Node image. Unset means the provisioner picks its default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_mounts: Vec<Mount>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_port_mappings: Vec<PortMapping>,

    /// Passed to the container runtime verbatim.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_docker_options: Vec<String>,

    /// Merge patches applied after the cluster-level ones.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kubeadm_config_patches: Vec<String>,

    /// RFC 6902 patches applied after the cluster-level ones.
    #[serde(
        default,
        rename = "kubeadmConfigPatchesJSON6902",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub kubeadm_config_patches_json6902: Vec<PatchJSON6902>,
}

impl Node {
    pub fn new(role: NodeRole) -> Self {
        Node {
            role: Some(role),
            ..Default::default()
        }
    }

    pub fn role_or_default(&self) -> NodeRole {
        self.role.clone().unwrap_or_default()
    }
}

/// Cluster wide network settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Networking {
    /// Unset means [`ClusterIPFamily::IPv4`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_family: Option<ClusterIPFamily>,

    /// Host port of the API server. Unset or 0 means a random port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_server_port: Option<i64>,

    /// Host address of the API server. Unset means 127.0.0.1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_server_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod_subnet: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_subnet: Option<String>,

    /// Skip the default pod network; the user installs their own CNI.
    #[serde(
        default,
        rename = "disableDefaultCNI",
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub disable_default_cni: bool,
}

impl Networking {
    pub const DEFAULT_API_SERVER_ADDRESS: &'static str = "127.0.0.1";

    pub fn ip_family_or_default(&self) -> ClusterIPFamily {
        self.ip_family.clone().unwrap_or_default()
    }

    pub fn api_server_address_or_default(&self) -> &str {
        self.api_server_address
            .as_deref()
            .unwrap_or(Self::DEFAULT_API_SERVER_ADDRESS)
    }

    fn is_empty(&self) -> bool {
        self == &Networking::default()
    }
}

/// An inline RFC 6902 patch together with the resource it targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchJSON6902 {
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub kind: String,

    /// Ignored. The generated config always has the same name, so matching
    /// on it never made a difference; the field is still accepted so that
    /// older documents parse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Ignored, for the same reason as `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// The patch document, as YAML or JSON text.
    #[serde(default)]
    pub patch: String,
}

/// A host path bind-mounted into the node container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Mount {
    #[serde(default)]
    pub container_path: String,

    /// Must exist when the node is provisioned; that is checked by the
    /// provisioner, not here.
    #[serde(default)]
    pub host_path: String,

    #[serde(default, rename = "readOnly", skip_serializing_if = "std::ops::Not::not")]
    pub readonly: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub selinux_relabel: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub propagation: Option<MountPropagation>,
}

/// A host port forwarded to a port of the node container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PortMapping {
    #[serde(default)]
    pub container_port: i64,

    /// 0 means the provisioner assigns a free port.
    #[serde(default)]
    pub host_port: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<PortMappingProtocol>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_string_enum_roundtrip() {
        assert_eq!(NodeRole::from("worker"), NodeRole::Worker);
        assert_eq!(NodeRole::from("control-plane"), NodeRole::ControlPlane);
        assert_eq!(
            NodeRole::from("Worker"),
            NodeRole::Unrecognized("Worker".to_string())
        );
        assert_eq!(String::from(MountPropagation::HostToContainer), "HostToContainer");
        assert_eq!(PortMappingProtocol::SCTP.to_string(), "SCTP");
    }

    #[test]
    fn test_unrecognized_enum_survives_deserialization() {
        let node: Node = serde_json::from_str(r#"{"role": "etcd"}"#).unwrap();
        assert_eq!(node.role, Some(NodeRole::Unrecognized("etcd".to_string())));
        assert!(!node.role.unwrap().is_recognized());
    }

    #[test]
    fn test_empty_cluster_implies_one_control_plane() {
        let cluster = Cluster::default();
        let nodes = cluster.nodes_or_default();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].role_or_default(), NodeRole::ControlPlane);
        assert!(!cluster.needs_external_load_balancer());
    }

    #[test]
    fn test_multiple_control_planes_need_load_balancer() {
        let cluster = Cluster {
            nodes: vec![
                Node::new(NodeRole::ControlPlane),
                Node::default(),
                Node::new(NodeRole::Worker),
            ],
            ..Default::default()
        };
        assert_eq!(cluster.control_plane_count(), 2);
        assert!(cluster.needs_external_load_balancer());
    }

    #[test]
    fn test_field_names() {
        let json = serde_json::json!({
            "kind": "Cluster",
            "apiVersion": "kind.x-k8s.io/v1alpha4",
            "networking": {
                "ipFamily": "ipv6",
                "apiServerPort": 6443,
                "disableDefaultCNI": true
            },
            "kubeadmConfigPatchesJSON6902": [
                {"group": "kubeadm.k8s.io", "version": "v1beta3", "kind": "ClusterConfiguration", "patch": "[]"}
            ],
            "containerdConfigPatchesJSON6902": ["[]"],
            "nodes": [{
                "role": "worker",
                "extraMounts": [{"containerPath": "/a", "hostPath": "/b", "readOnly": true, "selinuxRelabel": true, "propagation": "Bidirectional"}],
                "extraPortMappings": [{"containerPort": 80, "hostPort": 8080, "listenAddress": "0.0.0.0", "protocol": "UDP"}],
                "extraDockerOptions": ["--cpus=2"]
            }]
        });
        let cluster: Cluster = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(cluster.networking.ip_family, Some(ClusterIPFamily::IPv6));
        assert!(cluster.networking.disable_default_cni);
        assert_eq!(cluster.kubeadm_config_patches_json6902[0].version, "v1beta3");
        let mount = &cluster.nodes[0].extra_mounts[0];
        assert!(mount.readonly && mount.selinux_relabel);
        assert_eq!(mount.propagation, Some(MountPropagation::Bidirectional));
        assert_eq!(serde_json::to_value(&cluster).unwrap(), json);
    }

    #[test]
    fn test_wrong_kind_is_rejected() {
        let r: Result<Cluster, _> = serde_json::from_str(r#"{"kind": "Deployment"}"#);
        let e = r.unwrap_err().to_string();
        assert!(e.contains("expected 'Cluster'"), "{}", e);
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let r: Result<Node, _> = serde_json::from_str(r#"{"rol": "worker"}"#);
        assert!(r.is_err());
    }
}
