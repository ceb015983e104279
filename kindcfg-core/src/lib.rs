//! The cluster configuration schema of `kindcfg`.
//!
//! - [`v1alpha4`]: the data model
//! - [`validate`]: collects every violation of the model's invariants
//! - [`encoding`]: YAML and JSON facades

pub mod encoding;
pub mod v1alpha4;
pub mod validate;

pub use v1alpha4::{
    Cluster, ClusterIPFamily, Mount, MountPropagation, Networking, Node, NodeRole, PatchJSON6902,
    PortMapping, PortMappingProtocol,
};
pub use validate::{validate, ValidationError, ValidationErrors};
