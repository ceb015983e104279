use crate::document::Document;
use crate::target::{PatchLocation, TargetKind};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A generated document could not be read or written.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid YAML document")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid TOML document")]
    Toml(#[from] toml::de::Error),
    #[error("could not write TOML document")]
    TomlWrite(#[from] toml::ser::Error),
    #[error("document is not a TOML table")]
    NotATable(#[from] serde_json::Error),
    #[error("the runtime config must be a single table, got {0} documents")]
    NotSingleTable(usize),
}

/// A patch body is not well-formed.
#[derive(Debug, thiserror::Error)]
pub enum PatchParseError {
    #[error("invalid YAML")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid TOML")]
    Toml(#[from] toml::de::Error),
    #[error("a merge patch must be a mapping, got {0}")]
    NotAMapping(&'static str),
}

/// Composition of one (node, target) pair failed. Other pairs are not
/// affected.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("could not parse {location}")]
    PatchParse {
        location: PatchLocation,
        #[source]
        source: PatchParseError,
    },

    #[error("could not apply {location}")]
    PatchApply {
        location: PatchLocation,
        #[source]
        source: json_patch::PatchError,
        /// The document as it was before the failing patch. Patches applied
        /// before it are not rolled back.
        partial: Box<Document>,
    },

    #[error("no node with index {index}; the cluster has {count} node(s)")]
    UnknownNode { index: usize, count: usize },

    #[error("could not generate the base {target} for node {node}")]
    BaseDocument {
        node: usize,
        target: TargetKind,
        #[source]
        source: BoxError,
    },
}

impl ComposeError {
    /// The offending patch, for parse and apply errors.
    pub fn location(&self) -> Option<&PatchLocation> {
        match self {
            ComposeError::PatchParse { location, .. } | ComposeError::PatchApply { location, .. } => {
                Some(location)
            }
            _ => None,
        }
    }
}
