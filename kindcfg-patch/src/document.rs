//! Generated documents, as values that patches operate on.
//!
//! The kubeadm config is a stream of YAML documents, one per resource
//! (`InitConfiguration`, `ClusterConfiguration`, ...). The containerd config
//! is a single TOML table. Both are held as a list of JSON values.

use serde::Deserialize as _;
use serde_json::Value;

use crate::error::DocumentError;
use crate::target::TargetKind;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    resources: Vec<Value>,
}

impl Document {
    pub fn new(resources: Vec<Value>) -> Self {
        Document { resources }
    }

    pub fn single(resource: Value) -> Self {
        Document {
            resources: vec![resource],
        }
    }

    /// Parse a generated document in the format of `target`.
    pub fn parse(target: TargetKind, text: &str) -> Result<Self, DocumentError> {
        match target {
            TargetKind::Kubeadm => Self::from_yaml_stream(text),
            TargetKind::Runtime => Self::from_toml(text),
        }
    }

    /// Write the document in the format of `target`.
    pub fn render(&self, target: TargetKind) -> Result<String, DocumentError> {
        match target {
            TargetKind::Kubeadm => self.to_yaml_stream(),
            TargetKind::Runtime => self.to_toml(),
        }
    }

    /// Empty documents in the stream (e.g. a trailing `---`) are dropped.
    pub fn from_yaml_stream(text: &str) -> Result<Self, DocumentError> {
        let mut resources = Vec::new();
        for document in serde_yaml::Deserializer::from_str(text) {
            let value = Value::deserialize(document)?;
            if !value.is_null() {
                resources.push(value);
            }
        }
        Ok(Document { resources })
    }

    pub fn to_yaml_stream(&self) -> Result<String, DocumentError> {
        let mut out = String::new();
        for (i, resource) in self.resources.iter().enumerate() {
            if i > 0 {
                out.push_str("---\n");
            }
            out.push_str(&serde_yaml::to_string(resource)?);
        }
        Ok(out)
    }

    pub fn from_toml(text: &str) -> Result<Self, DocumentError> {
        let table: Value = toml::from_str(text)?;
        Ok(Document::single(table))
    }

    /// Datetimes parse into toml's private wrapper map; going through
    /// `toml::Table` turns them back into datetimes.
    pub fn to_toml(&self) -> Result<String, DocumentError> {
        match self.resources.as_slice() {
            [table] => {
                let table = toml::Table::deserialize(table)?;
                Ok(toml::to_string(&table)?)
            }
            other => Err(DocumentError::NotSingleTable(other.len())),
        }
    }

    pub fn resources(&self) -> &[Value] {
        &self.resources
    }

    pub fn resources_mut(&mut self) -> &mut [Value] {
        &mut self.resources
    }

    pub fn into_resources(self) -> Vec<Value> {
        self.resources
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// The `kind` of a resource, if it has one.
pub fn resource_kind(resource: &Value) -> Option<&str> {
    resource.get("kind").and_then(Value::as_str)
}

pub fn resource_api_version(resource: &Value) -> Option<&str> {
    resource.get("apiVersion").and_then(Value::as_str)
}
