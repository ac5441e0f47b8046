//! Schema-driven encoding between data trees and wire payloads
//!
//! The tree codec turns a [`DataNode`] tree into XML or RFC 7951 JSON text
//! and back, validating every element and member against the schema as it
//! goes. Namespaces follow the usual instance-document conventions: XML
//! binds `xmlns` at the root, JSON qualifies the root key with the module
//! name and leaves same-module children bare.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::Namespace;
use quick_xml::name::ResolveResult;
use quick_xml::{NsReader, Writer};
use serde_json::{Map, Value};

use crate::error::{Result, YangBindError};
use crate::schema::{NodeKind, SchemaNode};
use crate::tree::DataNode;

/// Wire format of a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingFormat {
    Xml,
    Json,
}

impl std::fmt::Display for EncodingFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodingFormat::Xml => write!(f, "XML"),
            EncodingFormat::Json => write!(f, "JSON"),
        }
    }
}

/// Stateless codec between data trees and payload text
#[derive(Debug, Default)]
pub struct TreeCodec;

impl TreeCodec {
    pub fn new() -> Self {
        TreeCodec
    }

    /// Render a tree rooted at a top-level container
    pub fn encode(
        &self,
        tree: &DataNode,
        schema: &SchemaNode,
        format: EncodingFormat,
        pretty: bool,
    ) -> Result<String> {
        if schema.kind != NodeKind::Container {
            return Err(YangBindError::SchemaViolation(format!(
                "top-level node '{}' is not a container",
                schema.name
            )));
        }
        match format {
            EncodingFormat::Xml => self.encode_xml(tree, schema, pretty),
            EncodingFormat::Json => self.encode_json(tree, schema, pretty),
        }
    }

    /// Parse a payload known to hold the given top-level container
    pub fn decode(
        &self,
        payload: &str,
        schema: &SchemaNode,
        format: EncodingFormat,
    ) -> Result<DataNode> {
        match format {
            EncodingFormat::Xml => self.decode_xml(payload, schema),
            EncodingFormat::Json => self.decode_json(payload, schema),
        }
    }

    fn encode_xml(&self, tree: &DataNode, schema: &SchemaNode, pretty: bool) -> Result<String> {
        let mut writer = if pretty {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };
        write_xml_node(&mut writer, tree, schema, None)?;
        String::from_utf8(writer.into_inner())
            .map_err(|e| YangBindError::XmlEncode(e.to_string()))
    }

    fn decode_xml(&self, payload: &str, schema: &SchemaNode) -> Result<DataNode> {
        let mut reader = NsReader::from_str(payload);
        // Text is kept verbatim; leaf values may carry significant leading
        // or trailing whitespace. Indentation under containers is dropped
        // at the End handler instead.
        reader.config_mut().expand_empty_elements = true;

        let mut nodes: Vec<DataNode> = Vec::new();
        let mut schemas: Vec<&SchemaNode> = Vec::new();
        let mut texts: Vec<String> = Vec::new();

        loop {
            let (resolve, event) = reader
                .read_resolved_event()
                .map_err(|e| YangBindError::MalformedPayload(e.to_string()))?;
            match event {
                Event::Start(start) => {
                    let local =
                        String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                    let bound_ns = match resolve {
                        ResolveResult::Bound(Namespace(ns)) => {
                            Some(String::from_utf8_lossy(ns).into_owned())
                        }
                        _ => None,
                    };

                    let child_schema = if let Some(parent) = schemas.last() {
                        parent.child(&local).ok_or_else(|| {
                            YangBindError::SchemaViolation(format!(
                                "unknown element '{}' under '{}'",
                                local, parent.name
                            ))
                        })?
                    } else {
                        if local != schema.name {
                            return Err(YangBindError::SchemaViolation(format!(
                                "payload root '{}' does not match container '{}'",
                                local, schema.name
                            )));
                        }
                        schema
                    };

                    if let Some(ns) = &bound_ns
                        && ns != &child_schema.namespace
                    {
                        return Err(YangBindError::SchemaViolation(format!(
                            "element '{}' bound to namespace '{}', expected '{}'",
                            local, ns, child_schema.namespace
                        )));
                    }

                    nodes.push(DataNode::new(
                        &child_schema.name,
                        &child_schema.module,
                        &child_schema.namespace,
                    ));
                    schemas.push(child_schema);
                    texts.push(String::new());
                }

                Event::Text(t) => {
                    let text = t
                        .unescape()
                        .map_err(|e| YangBindError::MalformedPayload(e.to_string()))?;
                    if let Some(buf) = texts.last_mut() {
                        buf.push_str(&text);
                    } else if !text.trim().is_empty() {
                        return Err(YangBindError::MalformedPayload(format!(
                            "unexpected text outside the document root: '{}'",
                            text.trim()
                        )));
                    }
                }

                Event::CData(cd) => {
                    if let Some(buf) = texts.last_mut() {
                        buf.push_str(&String::from_utf8_lossy(&cd.into_inner()));
                    }
                }

                Event::End(_) => {
                    let mut node = nodes
                        .pop()
                        .ok_or_else(|| YangBindError::MalformedPayload("unbalanced end tag".into()))?;
                    let node_schema = schemas
                        .pop()
                        .ok_or_else(|| YangBindError::MalformedPayload("unbalanced end tag".into()))?;
                    let text = texts
                        .pop()
                        .ok_or_else(|| YangBindError::MalformedPayload("unbalanced end tag".into()))?;

                    if node_schema.kind.is_leafy() {
                        let ty = node_schema.require_leaf_type()?;
                        node.set_value(ty.canonical_from_xml(&text)?);
                    } else if !text.trim().is_empty() {
                        return Err(YangBindError::SchemaViolation(format!(
                            "unexpected text under '{}'",
                            node_schema.name
                        )));
                    }

                    match nodes.last_mut() {
                        Some(parent) => {
                            parent.add_child(node);
                        }
                        // Root element closed; ignore anything after it.
                        None => return Ok(node),
                    }
                }

                Event::Eof => {
                    let msg = if nodes.is_empty() {
                        "no element found in payload"
                    } else {
                        "unexpected end of payload"
                    };
                    return Err(YangBindError::MalformedPayload(msg.into()));
                }

                // Declarations, comments and processing instructions
                _ => {}
            }
        }
    }

    fn encode_json(&self, tree: &DataNode, schema: &SchemaNode, pretty: bool) -> Result<String> {
        let content = json_subtree(tree, schema)?;
        let mut root = Map::new();
        root.insert(format!("{}:{}", tree.module(), tree.name()), content);
        let value = Value::Object(root);
        let text = if pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        };
        Ok(text)
    }

    fn decode_json(&self, payload: &str, schema: &SchemaNode) -> Result<DataNode> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| YangBindError::MalformedPayload(e.to_string()))?;
        let obj = value.as_object().ok_or_else(|| {
            YangBindError::MalformedPayload("payload root is not a JSON object".into())
        })?;

        let (key, content) = obj.iter().next().ok_or_else(|| {
            YangBindError::MalformedPayload("payload holds no top-level member".into())
        })?;
        let local = strip_module_prefix(key, &schema.module)?;
        if local != schema.name {
            return Err(YangBindError::SchemaViolation(format!(
                "payload root '{}' does not match container '{}'",
                key, schema.name
            )));
        }

        let mut root = DataNode::new(&schema.name, &schema.module, &schema.namespace);
        let members = content.as_object().ok_or_else(|| {
            YangBindError::SchemaViolation(format!(
                "container '{}' must be a JSON object",
                schema.name
            ))
        })?;
        fill_from_json(&mut root, schema, members)?;
        Ok(root)
    }
}

fn write_xml_node(
    writer: &mut Writer<Vec<u8>>,
    node: &DataNode,
    schema: &SchemaNode,
    parent_ns: Option<&str>,
) -> Result<()> {
    let mut start = BytesStart::new(node.name());
    // Bind the namespace at the root and wherever the module changes
    if parent_ns != Some(node.namespace()) {
        start.push_attribute(("xmlns", node.namespace()));
    }

    if schema.kind.is_leafy() {
        let value = node.value().unwrap_or_default();
        if value.is_empty() {
            writer
                .write_event(Event::Empty(start))
                .map_err(|e| YangBindError::XmlEncode(e.to_string()))?;
        } else {
            writer
                .write_event(Event::Start(start))
                .map_err(|e| YangBindError::XmlEncode(e.to_string()))?;
            writer
                .write_event(Event::Text(BytesText::new(value)))
                .map_err(|e| YangBindError::XmlEncode(e.to_string()))?;
            writer
                .write_event(Event::End(BytesEnd::new(node.name())))
                .map_err(|e| YangBindError::XmlEncode(e.to_string()))?;
        }
        return Ok(());
    }

    if node.children().is_empty() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| YangBindError::XmlEncode(e.to_string()))?;
        return Ok(());
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| YangBindError::XmlEncode(e.to_string()))?;
    for child in node.children() {
        let child_schema = schema.child(child.name()).ok_or_else(|| {
            YangBindError::SchemaViolation(format!(
                "unknown element '{}' under '{}'",
                child.name(),
                schema.name
            ))
        })?;
        write_xml_node(writer, child, child_schema, Some(node.namespace()))?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(node.name())))
        .map_err(|e| YangBindError::XmlEncode(e.to_string()))?;
    Ok(())
}

/// Render a container's children as a JSON object
fn json_subtree(node: &DataNode, schema: &SchemaNode) -> Result<Value> {
    let mut map = Map::new();
    for child in node.children() {
        let child_schema = schema.child(child.name()).ok_or_else(|| {
            YangBindError::SchemaViolation(format!(
                "unknown element '{}' under '{}'",
                child.name(),
                schema.name
            ))
        })?;
        let key = if child.module() == node.module() {
            child.name().to_string()
        } else {
            format!("{}:{}", child.module(), child.name())
        };

        match child_schema.kind {
            NodeKind::Leaf => {
                let ty = child_schema.require_leaf_type()?;
                let value = ty.json_value(child.value().unwrap_or_default())?;
                map.insert(key, value);
            }
            NodeKind::LeafList => {
                let ty = child_schema.require_leaf_type()?;
                let value = ty.json_value(child.value().unwrap_or_default())?;
                push_array_member(&mut map, key, value);
            }
            NodeKind::Container => {
                map.insert(key, json_subtree(child, child_schema)?);
            }
            NodeKind::List => {
                let entry = json_subtree(child, child_schema)?;
                push_array_member(&mut map, key, entry);
            }
        }
    }
    Ok(Value::Object(map))
}

/// Append to the array under `key`, creating it on first use
fn push_array_member(map: &mut Map<String, Value>, key: String, value: Value) {
    match map.get_mut(&key) {
        Some(Value::Array(items)) => items.push(value),
        _ => {
            map.insert(key, Value::Array(vec![value]));
        }
    }
}

fn fill_from_json(
    node: &mut DataNode,
    schema: &SchemaNode,
    members: &Map<String, Value>,
) -> Result<()> {
    for (key, value) in members {
        // RFC 7952 metadata annotations are not modeled data
        if key.starts_with('@') {
            continue;
        }
        let local = strip_module_prefix(key, &schema.module)?;
        let child_schema = schema.child(local).ok_or_else(|| {
            YangBindError::SchemaViolation(format!(
                "unknown element '{}' under '{}'",
                key, schema.name
            ))
        })?;

        match child_schema.kind {
            NodeKind::Leaf => {
                let ty = child_schema.require_leaf_type()?;
                node.add_child(DataNode::leaf(
                    &child_schema.name,
                    &child_schema.module,
                    &child_schema.namespace,
                    ty.canonical_from_json(value)?,
                ));
            }
            NodeKind::LeafList => {
                let ty = child_schema.require_leaf_type()?;
                let items = value.as_array().ok_or_else(|| {
                    YangBindError::SchemaViolation(format!(
                        "leaf-list '{}' must be a JSON array",
                        key
                    ))
                })?;
                for item in items {
                    node.add_child(DataNode::leaf(
                        &child_schema.name,
                        &child_schema.module,
                        &child_schema.namespace,
                        ty.canonical_from_json(item)?,
                    ));
                }
            }
            NodeKind::Container => {
                let obj = value.as_object().ok_or_else(|| {
                    YangBindError::SchemaViolation(format!(
                        "container '{}' must be a JSON object",
                        key
                    ))
                })?;
                let child = node.add_child(DataNode::new(
                    &child_schema.name,
                    &child_schema.module,
                    &child_schema.namespace,
                ));
                fill_from_json(child, child_schema, obj)?;
            }
            NodeKind::List => {
                let entries = value.as_array().ok_or_else(|| {
                    YangBindError::SchemaViolation(format!("list '{}' must be a JSON array", key))
                })?;
                for entry in entries {
                    let obj = entry.as_object().ok_or_else(|| {
                        YangBindError::SchemaViolation(format!(
                            "list '{}' entries must be JSON objects",
                            key
                        ))
                    })?;
                    let child = node.add_child(DataNode::new(
                        &child_schema.name,
                        &child_schema.module,
                        &child_schema.namespace,
                    ));
                    fill_from_json(child, child_schema, obj)?;
                }
            }
        }
    }
    Ok(())
}

/// Strip an RFC 7951 module prefix, verifying it names the right module
fn strip_module_prefix<'a>(key: &'a str, module: &str) -> Result<&'a str> {
    match key.split_once(':') {
        Some((prefix, local)) => {
            if prefix == module {
                Ok(local)
            } else {
                Err(YangBindError::SchemaViolation(format!(
                    "member '{}' does not belong to module '{}'",
                    key, module
                )))
            }
        }
        None => Ok(key),
    }
}
