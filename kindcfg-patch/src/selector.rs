use kindcfg_core::PatchJSON6902;
use serde_json::Value;

use crate::document::{resource_api_version, resource_kind};

/// Restricts which resources of a document a patch may modify.
///
/// A selector without a kind matches everything. With a kind, the resource
/// must have that kind, and if an apiVersion is also set, that apiVersion.
/// A selector that matches nothing is not an error; the patch is skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    kind: Option<String>,
    api_version: Option<String>,
}

impl Selector {
    pub fn any() -> Self {
        Selector::default()
    }

    pub fn kind(kind: impl Into<String>) -> Self {
        Selector {
            kind: Some(kind.into()),
            api_version: None,
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// The apiVersion is only constrained when both group and version are
    /// given. Configurations exist that set just one of them and rely on
    /// matching by kind alone.
    ///
    /// `name` and `namespace` do not take part in matching.
    pub fn for_json6902(patch: &PatchJSON6902) -> Self {
        let selector = Selector::kind(patch.kind.clone());
        if patch.group.is_empty() || patch.version.is_empty() {
            selector
        } else {
            selector.with_api_version(format!("{}/{}", patch.group, patch.version))
        }
    }

    /// A merge patch selects by its own `kind` and `apiVersion` fields.
    pub fn for_merge_patch(patch: &Value) -> Self {
        match resource_kind(patch) {
            None => Selector::any(),
            Some(kind) => Selector {
                kind: Some(kind.to_string()),
                api_version: resource_api_version(patch).map(str::to_string),
            },
        }
    }

    pub fn matches(&self, resource: &Value) -> bool {
        let Some(kind) = &self.kind else {
            return true;
        };
        resource_kind(resource) == Some(kind.as_str())
            && self
                .api_version
                .as_deref()
                .map_or(true, |v| resource_api_version(resource) == Some(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn json6902(group: &str, version: &str, kind: &str) -> PatchJSON6902 {
        PatchJSON6902 {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
            patch: "[]".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_kind_must_match() {
        let bar = json!({"kind": "Bar"});
        assert!(!Selector::for_json6902(&json6902("", "", "Foo")).matches(&bar));
        assert!(Selector::for_json6902(&json6902("", "", "Bar")).matches(&bar));
    }

    #[test]
    fn test_group_and_version_must_match_together() {
        let resource = json!({"apiVersion": "kubeadm.k8s.io/v1beta3", "kind": "ClusterConfiguration"});
        let matching = json6902("kubeadm.k8s.io", "v1beta3", "ClusterConfiguration");
        let other = json6902("kubeadm.k8s.io", "v1beta2", "ClusterConfiguration");
        assert!(Selector::for_json6902(&matching).matches(&resource));
        assert!(!Selector::for_json6902(&other).matches(&resource));
    }

    #[test]
    fn test_half_a_group_version_matches_on_kind() {
        let resource = json!({"apiVersion": "kubeadm.k8s.io/v1beta3", "kind": "ClusterConfiguration"});
        assert!(Selector::for_json6902(&json6902("", "v1beta1", "ClusterConfiguration"))
            .matches(&resource));
        assert!(Selector::for_json6902(&json6902("example.com", "", "ClusterConfiguration"))
            .matches(&resource));
    }

    #[test]
    fn test_name_and_namespace_are_ignored() {
        let mut patch = json6902("", "", "InitConfiguration");
        patch.name = Some("something-else".to_string());
        patch.namespace = Some("kube-system".to_string());
        assert_eq!(
            Selector::for_json6902(&patch),
            Selector::kind("InitConfiguration")
        );
    }

    #[test]
    fn test_merge_patch_selector() {
        let resource = json!({"apiVersion": "kubelet.config.k8s.io/v1beta1", "kind": "KubeletConfiguration"});
        assert!(Selector::for_merge_patch(&json!({"foo": "bar"})).matches(&resource));
        assert!(Selector::for_merge_patch(&json!({"kind": "KubeletConfiguration"})).matches(&resource));
        assert!(!Selector::for_merge_patch(&json!({
            "kind": "KubeletConfiguration",
            "apiVersion": "kubelet.config.k8s.io/v1"
        }))
        .matches(&resource));
    }
}
