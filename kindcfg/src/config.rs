use std::path::Path;

use anyhow::{Context, Result};
use kindcfg_core::{encoding, validate, Cluster};
use tracing::{debug, info_span};

/// Read and validate the cluster configuration at `path`.
///
/// `.json` files are read as JSON; anything else as YAML.
pub(crate) fn load_cluster(path: &Path) -> Result<Cluster> {
    let _span = info_span!("loading cluster configuration", path = %path.display()).entered();

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("could not read {}", path.display()))?;
    let cluster = if path.extension().is_some_and(|ext| ext == "json") {
        encoding::cluster_from_json(&text)
    } else {
        encoding::cluster_from_yaml(&text)
    }
    .with_context(|| format!("in {}", path.display()))?;

    validate(&cluster).with_context(|| format!("in {}", path.display()))?;
    debug!(nodes = cluster.nodes_or_default().len(), "configuration is valid");
    Ok(cluster)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kindcfg_core::{NodeRole, ValidationErrors};
    use std::io::Write as _;

    fn write_config(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_yaml() {
        let file = write_config(
            ".yaml",
            "kind: Cluster\napiVersion: kind.x-k8s.io/v1alpha4\nnodes:\n- role: control-plane\n- role: worker\n",
        );
        let cluster = load_cluster(file.path()).unwrap();
        assert_eq!(cluster.nodes.len(), 2);
        assert_eq!(cluster.nodes[1].role_or_default(), NodeRole::Worker);
    }

    #[test]
    fn test_load_json() {
        let file = write_config(".json", r#"{"kind": "Cluster", "nodes": [{"role": "worker"}]}"#);
        let cluster = load_cluster(file.path()).unwrap();
        assert_eq!(cluster.nodes[0].role_or_default(), NodeRole::Worker);
    }

    #[test]
    fn test_load_reports_validation_errors() {
        let file = write_config(
            ".yaml",
            "networking:\n  podSubnet: not-a-cidr\nnodes:\n- extraPortMappings:\n  - containerPort: 80\n    hostPort: -1\n",
        );
        let err = load_cluster(file.path()).unwrap_err();
        let errors = err.downcast_ref::<ValidationErrors>().unwrap();
        assert!(errors.contains_field("networking.podSubnet"));
        assert!(errors.contains_field("nodes[0].extraPortMappings[0].hostPort"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_cluster(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(format!("{:#}", err).contains("could not read"));
    }
}
