//! Validation of a [`Cluster`] before anything is generated from it.
//!
//! Validation never stops at the first problem: every violation in the
//! document is collected into [`ValidationErrors`], each with the path of the
//! offending field.

use std::fmt;
use std::net::IpAddr;

use ipnet::IpNet;

use crate::v1alpha4::{
    Cluster, ClusterIPFamily, Mount, Networking, Node, NodeRole, PatchJSON6902, PortMapping,
};

/// A single violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Path of the field, e.g. `nodes[1].extraPortMappings[0].hostPort`
    pub field: String,
    pub reason: String,
}

/// All violations found in one pass, in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether any error was reported for exactly this field path.
    pub fn contains_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid cluster configuration:")?;
        for e in &self.0 {
            write!(f, "\n  {}", e)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Check every invariant of the configuration.
pub fn validate(cluster: &Cluster) -> Result<(), ValidationErrors> {
    let mut v = Validator::default();

    v.networking(&cluster.networking);
    v.merge_patches("kubeadmConfigPatches", &cluster.kubeadm_config_patches);
    v.merge_patches("containerdConfigPatches", &cluster.containerd_config_patches);
    for (i, node) in cluster.nodes.iter().enumerate() {
        v.node(&format!("nodes[{}]", i), node);
    }
    for (i, patch) in cluster.kubeadm_config_patches_json6902.iter().enumerate() {
        v.patch_json6902(&format!("kubeadmConfigPatchesJSON6902[{}]", i), patch);
    }
    for (i, patch) in cluster.containerd_config_patches_json6902.iter().enumerate() {
        if patch.trim().is_empty() {
            v.report(
                format!("containerdConfigPatchesJSON6902[{}]", i),
                "patch must not be empty",
            );
        }
    }

    v.finish()
}

#[derive(Default)]
struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    fn report(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.errors.push(ValidationError {
            field: field.into(),
            reason: reason.into(),
        });
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }

    fn networking(&mut self, networking: &Networking) {
        let family = match &networking.ip_family {
            Some(f) if !f.is_recognized() => {
                self.report(
                    "networking.ipFamily",
                    unrecognized(f.as_str(), ClusterIPFamily::VALUES),
                );
                None
            }
            f => Some(f.clone().unwrap_or_default()),
        };

        if let Some(port) = networking.api_server_port {
            // 0 is the same as unset: a random host port
            if !(0..=65535).contains(&port) {
                self.report(
                    "networking.apiServerPort",
                    format!("port {} is outside of 0-65535", port),
                );
            }
        }
        if let Some(address) = &networking.api_server_address {
            self.ip_address("networking.apiServerAddress", address);
        }

        for (field, subnet) in [
            ("networking.podSubnet", &networking.pod_subnet),
            ("networking.serviceSubnet", &networking.service_subnet),
        ] {
            if let Some(subnet) = subnet {
                self.subnet(field, subnet, family.as_ref());
            }
        }
    }

    fn subnet(&mut self, field: &str, subnet: &str, family: Option<&ClusterIPFamily>) {
        let net: IpNet = match subnet.parse() {
            Ok(net) => net,
            Err(e) => {
                self.report(field, format!("invalid CIDR {:?}: {}", subnet, e));
                return;
            }
        };
        let mismatch = match (family, net) {
            (Some(ClusterIPFamily::IPv4), IpNet::V6(_)) => Some("ipv4"),
            (Some(ClusterIPFamily::IPv6), IpNet::V4(_)) => Some("ipv6"),
            _ => None,
        };
        if let Some(family) = mismatch {
            self.report(
                field,
                format!("CIDR {} does not belong to ipFamily {}", subnet, family),
            );
        }
    }

    fn ip_address(&mut self, field: &str, address: &str) {
        if address.parse::<IpAddr>().is_err() {
            self.report(field, format!("{:?} is not an IP address", address));
        }
    }

    fn node(&mut self, path: &str, node: &Node) {
        // Unset counts as control-plane here; assigning it is up to defaulting.
        let role = node.role.clone().unwrap_or_default();
        if !role.is_recognized() {
            self.report(
                format!("{}.role", path),
                unrecognized(role.as_str(), NodeRole::VALUES),
            );
        }

        if matches!(&node.image, Some(image) if image.trim().is_empty()) {
            self.report(format!("{}.image", path), "image must not be empty when set");
        }

        for (i, mount) in node.extra_mounts.iter().enumerate() {
            self.mount(&format!("{}.extraMounts[{}]", path, i), mount);
        }
        for (i, mapping) in node.extra_port_mappings.iter().enumerate() {
            self.port_mapping(&format!("{}.extraPortMappings[{}]", path, i), mapping);
        }
        self.merge_patches(&format!("{}.kubeadmConfigPatches", path), &node.kubeadm_config_patches);
        for (i, patch) in node.kubeadm_config_patches_json6902.iter().enumerate() {
            self.patch_json6902(&format!("{}.kubeadmConfigPatchesJSON6902[{}]", path, i), patch);
        }
    }

    fn mount(&mut self, path: &str, mount: &Mount) {
        if mount.container_path.is_empty() {
            self.report(format!("{}.containerPath", path), "must not be empty");
        }
        if mount.host_path.is_empty() {
            self.report(format!("{}.hostPath", path), "must not be empty");
        }
        if let Some(p) = &mount.propagation {
            if !p.is_recognized() {
                self.report(
                    format!("{}.propagation", path),
                    unrecognized(p.as_str(), crate::v1alpha4::MountPropagation::VALUES),
                );
            }
        }
    }

    fn port_mapping(&mut self, path: &str, mapping: &PortMapping) {
        for (name, port) in [
            ("containerPort", mapping.container_port),
            ("hostPort", mapping.host_port),
        ] {
            if port != 0 && !(1..=65535).contains(&port) {
                self.report(
                    format!("{}.{}", path, name),
                    format!("port {} is outside of 1-65535", port),
                );
            }
        }
        if let Some(address) = &mapping.listen_address {
            self.ip_address(&format!("{}.listenAddress", path), address);
        }
        if let Some(p) = &mapping.protocol {
            if !p.is_recognized() {
                self.report(
                    format!("{}.protocol", path),
                    unrecognized(p.as_str(), crate::v1alpha4::PortMappingProtocol::VALUES),
                );
            }
        }
    }

    fn merge_patches(&mut self, path: &str, patches: &[String]) {
        for (i, patch) in patches.iter().enumerate() {
            if patch.trim().is_empty() {
                self.report(format!("{}[{}]", path, i), "patch must not be empty");
            }
        }
    }

    fn patch_json6902(&mut self, path: &str, patch: &PatchJSON6902) {
        if patch.kind.is_empty() {
            self.report(format!("{}.kind", path), "kind is required");
        }
        if patch.patch.trim().is_empty() {
            self.report(format!("{}.patch", path), "patch must not be empty");
        }
    }
}

fn unrecognized(value: &str, allowed: &[&str]) -> String {
    format!(
        "unrecognized value {:?}, expected one of: {}",
        value,
        allowed.join(", ")
    )
}
