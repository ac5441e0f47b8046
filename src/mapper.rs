//! Mapping between model objects and generic data trees
//!
//! Encoding walks [`Entity::fields`] against the schema and materializes a
//! [`DataNode`] tree; decoding walks a schema-validated tree and pours it
//! back into an empty model object through `set_leaf` and `child_mut`.
//! Neither direction stores parent pointers: the walk keeps a path stack,
//! and value errors are annotated with the path where they occurred.

use crate::entity::{Entity, Field};
use crate::error::{Result, YangBindError};
use crate::schema::{NodeKind, SchemaNode};
use crate::tree::DataNode;

/// Build a data tree from a populated model object
pub fn entity_to_tree(entity: &dyn Entity, schema: &SchemaNode) -> Result<DataNode> {
    let id = entity.type_identity();
    if id.local_name != schema.name || id.namespace != schema.namespace {
        return Err(YangBindError::SchemaViolation(format!(
            "entity '{}:{}' does not match schema node '{}:{}'",
            id.namespace, id.local_name, schema.namespace, schema.name
        )));
    }
    let mut path = vec![schema.name.as_str()];
    build_node(entity, schema, &mut path)
}

/// Fill an empty model object from a data tree
pub fn tree_to_entity(tree: &DataNode, schema: &SchemaNode, entity: &mut dyn Entity) -> Result<()> {
    let mut path = vec![schema.name.as_str()];
    fill_entity(tree, schema, entity, &mut path)
}

fn build_node<'s>(
    entity: &dyn Entity,
    schema: &'s SchemaNode,
    path: &mut Vec<&'s str>,
) -> Result<DataNode> {
    let mut node = DataNode::new(&schema.name, &schema.module, &schema.namespace);

    for field in entity.fields() {
        let name = field_name(&field);
        let child_schema = schema.child(name).ok_or_else(|| {
            YangBindError::SchemaViolation(format!(
                "no schema node for field '{}' at {}",
                name,
                render(path)
            ))
        })?;
        path.push(&child_schema.name);

        match field {
            Field::Leaf { value, .. } => {
                expect_kind(child_schema, NodeKind::Leaf, path)?;
                let ty = child_schema.require_leaf_type()?;
                let canonical = ty.canonical(&value).map_err(|e| annotate(e, path))?;
                node.add_child(DataNode::leaf(
                    &child_schema.name,
                    &child_schema.module,
                    &child_schema.namespace,
                    canonical,
                ));
            }
            Field::LeafList { values, .. } => {
                expect_kind(child_schema, NodeKind::LeafList, path)?;
                let ty = child_schema.require_leaf_type()?;
                for value in values {
                    let canonical = ty.canonical(&value).map_err(|e| annotate(e, path))?;
                    node.add_child(DataNode::leaf(
                        &child_schema.name,
                        &child_schema.module,
                        &child_schema.namespace,
                        canonical,
                    ));
                }
            }
            Field::Container { child, .. } => {
                expect_kind(child_schema, NodeKind::Container, path)?;
                node.add_child(build_node(child, child_schema, path)?);
            }
            Field::List { entries, .. } => {
                expect_kind(child_schema, NodeKind::List, path)?;
                for entry in entries {
                    node.add_child(build_node(entry, child_schema, path)?);
                }
            }
        }
        path.pop();
    }
    Ok(node)
}

fn fill_entity<'s>(
    tree: &DataNode,
    schema: &'s SchemaNode,
    entity: &mut dyn Entity,
    path: &mut Vec<&'s str>,
) -> Result<()> {
    for child in tree.children() {
        let child_schema = schema.child(child.name()).ok_or_else(|| {
            YangBindError::SchemaViolation(format!(
                "no schema node for '{}' at {}",
                child.name(),
                render(path)
            ))
        })?;
        path.push(&child_schema.name);

        match child_schema.kind {
            NodeKind::Leaf | NodeKind::LeafList => {
                let ty = child_schema.require_leaf_type()?;
                let value = ty
                    .parse_canonical(child.value().unwrap_or_default())
                    .map_err(|e| annotate(e, path))?;
                entity.set_leaf(&child_schema.name, value)?;
            }
            NodeKind::Container | NodeKind::List => {
                let nested = entity.child_mut(&child_schema.name)?;
                fill_entity(child, child_schema, nested, path)?;
            }
        }
        path.pop();
    }
    Ok(())
}

fn field_name(field: &Field<'_>) -> &'static str {
    match field {
        Field::Leaf { name, .. }
        | Field::LeafList { name, .. }
        | Field::Container { name, .. }
        | Field::List { name, .. } => name,
    }
}

fn expect_kind(schema: &SchemaNode, kind: NodeKind, path: &[&str]) -> Result<()> {
    if schema.kind == kind {
        Ok(())
    } else {
        Err(YangBindError::SchemaViolation(format!(
            "{} is declared as {:?}, entity provides {:?}",
            render(path),
            schema.kind,
            kind
        )))
    }
}

/// Prefix value-space errors with the node path they occurred at
fn annotate(err: YangBindError, path: &[&str]) -> YangBindError {
    match err {
        YangBindError::TypeConversion(msg) => {
            YangBindError::TypeConversion(format!("at {}: {}", render(path), msg))
        }
        other => other,
    }
}

fn render(path: &[&str]) -> String {
    format!("/{}", path.join("/"))
}
