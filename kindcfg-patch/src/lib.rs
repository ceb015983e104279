//! Patch composition for generated node configuration.
//!
//! A [`PatchRegistry`] is built once from a validated
//! [`Cluster`](kindcfg_core::Cluster). For each node and [`TargetKind`], a
//! generated base [`Document`] is then passed through [`compose`], which
//! applies the cluster's and the node's patches in a fixed order.

pub mod compose;
pub mod document;
pub mod error;
pub mod parallel;
pub mod registry;
pub mod selector;
pub mod target;

pub use compose::compose;
pub use document::Document;
pub use error::{BoxError, ComposeError, DocumentError, PatchParseError};
pub use parallel::{compose_all, compose_targets, BaseDocuments, NodeComposition};
pub use registry::{JsonPatchEntry, NodePatches, PatchRegistry, PatchSet};
pub use selector::Selector;
pub use target::{PatchFormat, PatchLocation, Scope, TargetKind};
