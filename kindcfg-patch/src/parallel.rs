//! Composition of every node of a cluster.
//!
//! Each (node, target) pair only reads the registry and its own base
//! document, so pairs run on their own threads. One failing pair does not
//! affect the others.

use std::thread;

use kindcfg_core::NodeRole;
use tracing::{debug, info_span};

use crate::compose::compose;
use crate::document::Document;
use crate::error::{BoxError, ComposeError};
use crate::registry::PatchRegistry;
use crate::target::TargetKind;

/// Supplies the generated, unpatched documents.
pub trait BaseDocuments: Sync {
    fn base_document(
        &self,
        node: usize,
        role: NodeRole,
        target: TargetKind,
    ) -> Result<Document, BoxError>;
}

impl<F> BaseDocuments for F
where
    F: Fn(usize, NodeRole, TargetKind) -> Result<Document, BoxError> + Sync,
{
    fn base_document(
        &self,
        node: usize,
        role: NodeRole,
        target: TargetKind,
    ) -> Result<Document, BoxError> {
        self(node, role, target)
    }
}

#[derive(Debug)]
pub struct NodeComposition {
    pub node: usize,
    pub role: NodeRole,
    pub target: TargetKind,
    pub result: Result<Document, ComposeError>,
}

/// Compose both targets for every node.
pub fn compose_all(registry: &PatchRegistry, bases: &impl BaseDocuments) -> Vec<NodeComposition> {
    compose_targets(registry, &TargetKind::ALL, bases)
}

/// Compose `targets` for every node. Results are ordered by node, then by
/// the order of `targets`, regardless of which thread finishes first.
pub fn compose_targets(
    registry: &PatchRegistry,
    targets: &[TargetKind],
    bases: &impl BaseDocuments,
) -> Vec<NodeComposition> {
    let _span = info_span!("composing nodes", nodes = registry.node_count()).entered();

    thread::scope(|s| {
        let handles: Vec<_> = registry
            .nodes()
            .iter()
            .enumerate()
            .flat_map(|(node, patches)| {
                targets
                    .iter()
                    .map(move |&target| (node, patches.role.clone(), target))
            })
            .map(|(node, role, target)| {
                let handle = {
                    let role = role.clone();
                    s.spawn(move || compose_one(registry, bases, node, role, target))
                };
                (node, role, target, handle)
            })
            .collect();

        handles
            .into_iter()
            .map(|(node, role, target, handle)| {
                let result = match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                };
                NodeComposition {
                    node,
                    role,
                    target,
                    result,
                }
            })
            .collect()
    })
}

fn compose_one(
    registry: &PatchRegistry,
    bases: &impl BaseDocuments,
    node: usize,
    role: NodeRole,
    target: TargetKind,
) -> Result<Document, ComposeError> {
    let base = bases
        .base_document(node, role, target)
        .map_err(|source| ComposeError::BaseDocument {
            node,
            target,
            source,
        })?;
    let result = compose(base, target, node, registry);
    if let Err(e) = &result {
        debug!(node, target = target.as_str(), "composition failed: {}", e);
    }
    result
}
