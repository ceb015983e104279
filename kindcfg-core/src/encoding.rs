//! Reading and writing cluster configuration documents.
//!
//! The type meta (`kind`, `apiVersion`) is checked while parsing; semantic
//! checks are left to [`crate::validate`].

use anyhow::{Context, Result};

use crate::v1alpha4::Cluster;

/// Facade for loading a YAML (or JSON, which is valid YAML) configuration.
/// An empty document is an empty cluster.
pub fn cluster_from_yaml(s: &str) -> Result<Cluster> {
    if s.trim().is_empty() {
        return Ok(Cluster::default());
    }
    serde_yaml::from_str(s).context("could not parse cluster configuration")
}

pub fn cluster_from_json(s: &str) -> Result<Cluster> {
    serde_json::from_str(s).context("could not parse cluster configuration")
}

pub fn cluster_to_yaml(cluster: &Cluster) -> Result<String> {
    serde_yaml::to_string(cluster).map_err(|e| e.into())
}
