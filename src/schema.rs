//! Schema bundle files and the in-memory schema tree
//!
//! A bundle file is a JSON document describing the YANG modules of one
//! released model package: each module's name, namespace and top-level
//! nodes, with nested children down to the leaves. [`RootSchema`] is the
//! loaded form the codec walks while encoding and decoding.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, YangBindError};
use crate::types::YangType;

/// Raw bundle file structure as written on disk
#[derive(Debug, Deserialize)]
struct RawBundle {
    bundle: String,
    #[serde(default)]
    version: Option<String>,
    modules: Vec<RawModule>,
}

#[derive(Debug, Deserialize)]
struct RawModule {
    name: String,
    namespace: String,
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    revision: Option<String>,
    #[serde(default)]
    nodes: Vec<RawNode>,
}

#[derive(Debug, Deserialize)]
struct RawNode {
    name: String,
    kind: String,
    #[serde(rename = "type")]
    leaf_type: Option<Value>,
    #[serde(default)]
    children: Vec<RawNode>,
}

/// Statement kind of a schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Container,
    List,
    Leaf,
    LeafList,
}

impl NodeKind {
    fn from_name(s: &str) -> Option<Self> {
        match s {
            "container" => Some(NodeKind::Container),
            "list" => Some(NodeKind::List),
            "leaf" => Some(NodeKind::Leaf),
            "leaf-list" => Some(NodeKind::LeafList),
            _ => None,
        }
    }

    /// Whether nodes of this kind carry a leaf value
    pub fn is_leafy(self) -> bool {
        matches!(self, NodeKind::Leaf | NodeKind::LeafList)
    }
}

/// One node of the loaded schema tree
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub name: String,
    pub module: String,
    pub namespace: String,
    pub kind: NodeKind,
    pub leaf_type: Option<YangType>,
    pub children: Vec<SchemaNode>,
}

impl SchemaNode {
    fn from_raw(raw: RawNode, module: &str, namespace: &str) -> Result<Self> {
        let kind = NodeKind::from_name(&raw.kind).ok_or_else(|| {
            YangBindError::InvalidBundle(format!(
                "node '{}' in module '{}' has unknown kind '{}'",
                raw.name, module, raw.kind
            ))
        })?;

        let leaf_type = if kind.is_leafy() {
            let ty = raw.leaf_type.as_ref().ok_or_else(|| {
                YangBindError::InvalidBundle(format!(
                    "leaf '{}' in module '{}' is missing its type",
                    raw.name, module
                ))
            })?;
            Some(YangType::from_schema_type(ty))
        } else {
            None
        };

        let children = raw
            .children
            .into_iter()
            .map(|c| SchemaNode::from_raw(c, module, namespace))
            .collect::<Result<Vec<_>>>()?;

        Ok(SchemaNode {
            name: raw.name,
            module: module.to_string(),
            namespace: namespace.to_string(),
            kind,
            leaf_type,
            children,
        })
    }

    /// Look up a direct child by name
    pub fn child(&self, name: &str) -> Option<&SchemaNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Leaf type, or an error naming the node when it has none
    pub fn require_leaf_type(&self) -> Result<&YangType> {
        self.leaf_type.as_ref().ok_or_else(|| {
            YangBindError::SchemaViolation(format!("node '{}' is not a leaf", self.name))
        })
    }
}

/// One module of a loaded bundle
#[derive(Debug, Clone)]
pub struct ModuleSchema {
    pub name: String,
    pub namespace: String,
    pub prefix: String,
    pub revision: Option<String>,
    pub roots: Vec<Arc<SchemaNode>>,
}

/// A loaded schema bundle, indexed for root lookup by namespace or module
#[derive(Debug)]
pub struct RootSchema {
    bundle: String,
    version: String,
    modules: Vec<ModuleSchema>,
    // Keyed by both (namespace, root) and (module name, root) so XML and
    // JSON identities resolve the same way.
    roots: HashMap<(String, String), Arc<SchemaNode>>,
}

impl RootSchema {
    /// Load a bundle file from disk
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Parse a bundle from its JSON text
    pub fn from_json_str(content: &str) -> Result<Self> {
        let raw: RawBundle = serde_json::from_str(content)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawBundle) -> Result<Self> {
        if raw.modules.is_empty() {
            return Err(YangBindError::InvalidBundle(format!(
                "bundle '{}' declares no modules",
                raw.bundle
            )));
        }

        let mut modules = Vec::with_capacity(raw.modules.len());
        let mut roots = HashMap::new();

        for raw_module in raw.modules {
            let prefix = raw_module
                .prefix
                .clone()
                .unwrap_or_else(|| raw_module.name.clone());

            let mut module_roots = Vec::with_capacity(raw_module.nodes.len());
            for raw_node in raw_module.nodes {
                let node = Arc::new(SchemaNode::from_raw(
                    raw_node,
                    &raw_module.name,
                    &raw_module.namespace,
                )?);

                for key in [raw_module.namespace.clone(), raw_module.name.clone()] {
                    if roots
                        .insert((key.clone(), node.name.clone()), Arc::clone(&node))
                        .is_some()
                    {
                        return Err(YangBindError::InvalidBundle(format!(
                            "duplicate top-level node '{}' under '{}'",
                            node.name, key
                        )));
                    }
                }
                module_roots.push(node);
            }

            modules.push(ModuleSchema {
                name: raw_module.name,
                namespace: raw_module.namespace,
                prefix,
                revision: raw_module.revision,
                roots: module_roots,
            });
        }

        Ok(RootSchema {
            bundle: raw.bundle,
            version: raw.version.unwrap_or_else(|| "0.0.0".to_string()),
            modules,
            roots,
        })
    }

    /// Bundle name declared by the file
    pub fn bundle_name(&self) -> &str {
        &self.bundle
    }

    /// Bundle release version
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Modules carried by this bundle
    pub fn modules(&self) -> &[ModuleSchema] {
        &self.modules
    }

    /// Look up a module by name
    pub fn module(&self, name: &str) -> Option<&ModuleSchema> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Find a top-level node by namespace URI or module name
    pub fn find_root(&self, key: &str, name: &str) -> Option<&Arc<SchemaNode>> {
        self.roots.get(&(key.to_string(), name.to_string()))
    }
}

impl FromStr for RootSchema {
    type Err = YangBindError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_BUNDLE: &str = r#"{
        "bundle": "demo",
        "version": "1.2.0",
        "modules": [
            {
                "name": "demo",
                "namespace": "urn:demo",
                "prefix": "demo",
                "revision": "2024-01-15",
                "nodes": [
                    {
                        "name": "greeting",
                        "kind": "container",
                        "children": [
                            {"name": "author", "kind": "leaf", "type": "string"},
                            {"name": "message", "kind": "leaf", "type": "string"},
                            {"name": "repeat", "kind": "leaf", "type": "uint8"}
                        ]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_sample_bundle() {
        let schema = RootSchema::from_json_str(SAMPLE_BUNDLE).unwrap();
        assert_eq!(schema.bundle_name(), "demo");
        assert_eq!(schema.version(), "1.2.0");
        assert_eq!(schema.modules().len(), 1);

        let module = schema.module("demo").unwrap();
        assert_eq!(module.namespace, "urn:demo");
        assert_eq!(module.revision.as_deref(), Some("2024-01-15"));
        assert_eq!(module.roots.len(), 1);
    }

    #[test]
    fn test_root_lookup_by_namespace_and_module() {
        let schema = RootSchema::from_json_str(SAMPLE_BUNDLE).unwrap();
        let by_ns = schema.find_root("urn:demo", "greeting").unwrap();
        let by_module = schema.find_root("demo", "greeting").unwrap();
        assert!(Arc::ptr_eq(by_ns, by_module));
        assert_eq!(by_ns.kind, NodeKind::Container);
    }

    #[test]
    fn test_child_lookup_and_leaf_type() {
        let schema = RootSchema::from_json_str(SAMPLE_BUNDLE).unwrap();
        let root = schema.find_root("demo", "greeting").unwrap();
        let repeat = root.child("repeat").unwrap();
        assert_eq!(repeat.kind, NodeKind::Leaf);
        assert_eq!(repeat.leaf_type, Some(YangType::Uint8));
        assert!(root.child("absent").is_none());
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let bad = r#"{
            "bundle": "demo",
            "modules": [
                {"name": "demo", "namespace": "urn:demo", "nodes": [
                    {"name": "x", "kind": "choice"}
                ]}
            ]
        }"#;
        let err = RootSchema::from_json_str(bad).unwrap_err();
        assert!(err.to_string().contains("unknown kind"));
    }

    #[test]
    fn test_rejects_leaf_without_type() {
        let bad = r#"{
            "bundle": "demo",
            "modules": [
                {"name": "demo", "namespace": "urn:demo", "nodes": [
                    {"name": "x", "kind": "leaf"}
                ]}
            ]
        }"#;
        let err = RootSchema::from_json_str(bad).unwrap_err();
        assert!(err.to_string().contains("missing its type"));
    }

    #[test]
    fn test_rejects_empty_bundle() {
        let err = RootSchema::from_json_str(r#"{"bundle": "x", "modules": []}"#).unwrap_err();
        assert!(matches!(err, YangBindError::InvalidBundle(_)));
    }
}
