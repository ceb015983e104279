//! Applies the registered patches to a generated base document.
//!
//! For one node and one target the stages run in a fixed order:
//!
//! 1. cluster merge patches
//! 2. cluster JSON 6902 patches
//! 3. node merge patches
//! 4. node JSON 6902 patches
//!
//! Within a stage, patches apply in declaration order. Later stages see the
//! output of earlier ones, so node patches win over cluster patches.

use serde_json::Value;
use tracing::{debug, debug_span, trace};

use crate::document::Document;
use crate::error::{ComposeError, PatchParseError};
use crate::registry::{JsonPatchEntry, PatchRegistry, PatchSet};
use crate::selector::Selector;
use crate::target::{PatchFormat, PatchLocation, Scope, TargetKind};

/// Produce the final `target` document for the node at `node_index`.
///
/// The first failing patch aborts this composition. Patches are parsed here,
/// not when the registry is built, so a malformed patch only affects the
/// documents it would have been applied to.
pub fn compose(
    base: Document,
    target: TargetKind,
    node_index: usize,
    registry: &PatchRegistry,
) -> Result<Document, ComposeError> {
    let node = registry
        .node(node_index)
        .ok_or(ComposeError::UnknownNode {
            index: node_index,
            count: registry.node_count(),
        })?;

    let span = debug_span!("compose", node = node_index, target = target.as_str());
    let _enter = span.enter();

    let stages = [
        (Scope::Cluster, registry.cluster()),
        (Scope::Node(node_index), &node.patches),
    ];
    stages
        .into_iter()
        .try_fold(base, |document, (scope, patches)| {
            apply_patch_set(document, target, scope, patches)
        })
}

fn apply_patch_set(
    mut document: Document,
    target: TargetKind,
    scope: Scope,
    patches: &PatchSet,
) -> Result<Document, ComposeError> {
    for (index, patch) in patches.merge_patches(target).iter().enumerate() {
        let location = PatchLocation {
            target,
            scope,
            format: PatchFormat::MergePatch,
            index,
        };
        apply_merge_patch(&mut document, location, patch)?;
    }
    for (index, entry) in patches.json_patches(target).iter().enumerate() {
        let location = PatchLocation {
            target,
            scope,
            format: PatchFormat::JsonPatch,
            index,
        };
        document = apply_json_patch(document, location, entry)?;
    }
    Ok(document)
}

fn apply_merge_patch(
    document: &mut Document,
    location: PatchLocation,
    text: &str,
) -> Result<(), ComposeError> {
    let patch = parse_merge_patch(location.target, text)
        .map_err(|source| ComposeError::PatchParse { location, source })?;
    // The containerd config is one table; a `kind` key in it is just a key.
    let selector = match location.target {
        TargetKind::Kubeadm => Selector::for_merge_patch(&patch),
        TargetKind::Runtime => Selector::any(),
    };

    let mut matched = 0;
    for resource in document.resources_mut() {
        if selector.matches(resource) {
            json_patch::merge(resource, &patch);
            matched += 1;
        }
    }
    log_applied(&location, matched);
    Ok(())
}

fn apply_json_patch(
    document: Document,
    location: PatchLocation,
    entry: &JsonPatchEntry,
) -> Result<Document, ComposeError> {
    let patch = parse_json_patch(&entry.patch)
        .map_err(|source| ComposeError::PatchParse { location, source })?;

    // A patch may match several resources; all of them or none are changed.
    let mut patched = document.clone();
    let mut matched = 0;
    for resource in patched.resources_mut() {
        if !entry.selector.matches(resource) {
            continue;
        }
        let result = json_patch::patch(resource, &patch.0);
        if let Err(source) = result {
            return Err(ComposeError::PatchApply {
                location,
                source,
                partial: Box::new(document),
            });
        }
        matched += 1;
    }
    log_applied(&location, matched);
    Ok(patched)
}

fn log_applied(location: &PatchLocation, matched: usize) {
    if matched == 0 {
        debug!("{} matched no resources, skipping", location);
    } else {
        trace!(resources = matched, "applied {}", location);
    }
}

/// Merge patches are written in the target's own language.
fn parse_merge_patch(target: TargetKind, text: &str) -> Result<Value, PatchParseError> {
    let value: Value = match target {
        TargetKind::Kubeadm => serde_yaml::from_str(text)?,
        TargetKind::Runtime => toml::from_str(text)?,
    };
    match value {
        Value::Object(_) => Ok(value),
        other => Err(PatchParseError::NotAMapping(value_type(&other))),
    }
}

/// JSON 6902 patches are YAML or JSON regardless of the target.
fn parse_json_patch(text: &str) -> Result<json_patch::Patch, PatchParseError> {
    match serde_json::from_str(text) {
        Ok(patch) => Ok(patch),
        Err(_) => Ok(serde_yaml::from_str(text)?),
    }
}

fn value_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
