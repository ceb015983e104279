use std::fmt::Write as _;

use anyhow::Result;
use kindcfg_core::Cluster;

/// The effective node list, one line per node.
pub(crate) fn describe_nodes(cluster: &Cluster) -> Result<String> {
    let mut out = String::new();
    if cluster.nodes.is_empty() {
        writeln!(out, "# no nodes configured; using a single control-plane node")?;
    }
    for (i, node) in cluster.nodes_or_default().iter().enumerate() {
        write!(out, "{}\t{}", i, node.role_or_default())?;
        if let Some(image) = &node.image {
            write!(out, "\t{}", image)?;
        }
        writeln!(out)?;
    }
    if cluster.needs_external_load_balancer() {
        writeln!(
            out,
            "# {} control-plane nodes: an external load balancer is required",
            cluster.control_plane_count()
        )?;
    }
    Ok(out)
}
