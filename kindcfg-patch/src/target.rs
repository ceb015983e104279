use std::fmt::{self, Display};
use std::str::FromStr;

/// The generated documents that patches can be applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TargetKind {
    /// kubeadm bootstrap configuration: a multi-document YAML stream
    Kubeadm,
    /// containerd configuration: a single TOML document
    Runtime,
}

impl TargetKind {
    pub const ALL: [TargetKind; 2] = [TargetKind::Kubeadm, TargetKind::Runtime];

    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::Kubeadm => "kubeadm",
            TargetKind::Runtime => "runtime",
        }
    }
}

impl Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetKind::Kubeadm => write!(f, "kubeadm config"),
            TargetKind::Runtime => write!(f, "runtime config"),
        }
    }
}

impl FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kubeadm" | "kubeadm-config" => Ok(TargetKind::Kubeadm),
            "runtime" | "runtime-config" | "containerd" => Ok(TargetKind::Runtime),
            _ => Err(format!(
                "unknown target {:?}, expected one of: kubeadm, runtime",
                s
            )),
        }
    }
}

/// Where a patch was declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    Cluster,
    /// Index into the cluster's effective node list
    Node(usize),
}

impl Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Cluster => write!(f, "cluster"),
            Scope::Node(i) => write!(f, "node {}", i),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PatchFormat {
    /// RFC 7386
    MergePatch,
    /// RFC 6902
    JsonPatch,
}

impl Display for PatchFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchFormat::MergePatch => write!(f, "merge patch"),
            PatchFormat::JsonPatch => write!(f, "JSON 6902 patch"),
        }
    }
}

/// Identifies one patch document: enough to find it in the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PatchLocation {
    pub target: TargetKind,
    pub scope: Scope,
    pub format: PatchFormat,
    /// Position in its declaration list
    pub index: usize,
}

impl Display for PatchLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} #{} for the {}",
            self.scope, self.format, self.index, self.target
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_from_str() {
        assert_eq!("kubeadm".parse(), Ok(TargetKind::Kubeadm));
        assert_eq!("containerd".parse(), Ok(TargetKind::Runtime));
        assert!("kubelet".parse::<TargetKind>().is_err());
    }

    #[test]
    fn test_location_display() {
        let location = PatchLocation {
            target: TargetKind::Kubeadm,
            scope: Scope::Node(2),
            format: PatchFormat::JsonPatch,
            index: 0,
        };
        assert_eq!(
            location.to_string(),
            "node 2 JSON 6902 patch #0 for the kubeadm config"
        );
    }
}
