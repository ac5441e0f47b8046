//! Model-object interface implemented by generated YANG bindings
//!
//! Every YANG-modeled type exposes its identity and its populated fields
//! through [`Entity`], which is all the mapper needs to translate between
//! object graphs and generic data trees. Parent context is never stored on
//! the objects themselves; the mapper reconstructs paths while walking.

use std::any::Any;

use crate::error::Result;

/// Static identity of a model type, supplied by generated code.
///
/// `package` names the installed model package and drives bundle
/// resolution. `module` and `namespace` are the two spellings under which
/// the type is registered: JSON payloads identify nodes by module name,
/// XML payloads by namespace URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeIdentity {
    /// Installed model package that owns the type
    pub package: &'static str,
    /// YANG module that defines the type
    pub module: &'static str,
    /// Module namespace URI
    pub namespace: &'static str,
    /// Local name of the data node
    pub local_name: &'static str,
}

/// Host-side scalar for one YANG leaf instance
#[derive(Debug, Clone, PartialEq)]
pub enum LeafValue {
    String(String),
    Int(i64),
    Uint(u64),
    Decimal(f64),
    Bool(bool),
    /// YANG `empty` leaf (presence only)
    Empty,
    Binary(Vec<u8>),
}

impl From<&str> for LeafValue {
    fn from(value: &str) -> Self {
        LeafValue::String(value.to_string())
    }
}

impl From<String> for LeafValue {
    fn from(value: String) -> Self {
        LeafValue::String(value)
    }
}

impl From<bool> for LeafValue {
    fn from(value: bool) -> Self {
        LeafValue::Bool(value)
    }
}

impl From<i32> for LeafValue {
    fn from(value: i32) -> Self {
        LeafValue::Int(value.into())
    }
}

impl From<i64> for LeafValue {
    fn from(value: i64) -> Self {
        LeafValue::Int(value)
    }
}

impl From<u32> for LeafValue {
    fn from(value: u32) -> Self {
        LeafValue::Uint(value.into())
    }
}

impl From<u64> for LeafValue {
    fn from(value: u64) -> Self {
        LeafValue::Uint(value)
    }
}

impl From<f64> for LeafValue {
    fn from(value: f64) -> Self {
        LeafValue::Decimal(value)
    }
}

impl From<Vec<u8>> for LeafValue {
    fn from(value: Vec<u8>) -> Self {
        LeafValue::Binary(value)
    }
}

/// One populated child field of a model object
///
/// Returned by [`Entity::fields`] in declaration order. Unset fields never
/// appear; an absent optional is omitted from the wire, not emitted as
/// null.
pub enum Field<'a> {
    /// Single scalar leaf
    Leaf {
        name: &'static str,
        value: LeafValue,
    },
    /// Ordered leaf-list; one wire node is emitted per value
    LeafList {
        name: &'static str,
        values: Vec<LeafValue>,
    },
    /// Nested container object
    Container {
        name: &'static str,
        child: &'a dyn Entity,
    },
    /// Ordered list of entry objects
    List {
        name: &'static str,
        entries: Vec<&'a dyn Entity>,
    },
}

/// A YANG-modeled data node instance.
///
/// Implementations are plain data structs; all methods are cheap. The codec
/// layer only ever holds `&dyn Entity` / `&mut dyn Entity`, so generated
/// model types stay free of codec concerns. `Debug` is a supertrait so
/// boxed decode results print in assertions and logs.
pub trait Entity: Any + Send + std::fmt::Debug {
    /// Namespace-qualified type identity, independent of field contents
    fn type_identity(&self) -> TypeIdentity;

    /// Populated fields in declaration order
    fn fields(&self) -> Vec<Field<'_>>;

    /// Set a scalar field by name.
    ///
    /// Called once per decoded value; leaf-list fields accumulate values in
    /// arrival order. Unknown names fail with
    /// [`YangBindError::UnknownField`](crate::YangBindError::UnknownField).
    fn set_leaf(&mut self, name: &str, value: LeafValue) -> Result<()>;

    /// Get or create the nested model object stored under `name`.
    ///
    /// For container fields this returns the (lazily created) child; for
    /// list fields a new entry is appended and returned, so repeated calls
    /// build up list contents in arrival order.
    fn child_mut(&mut self, name: &str) -> Result<&mut dyn Entity>;

    /// Concrete-type recovery after decode
    fn as_any(&self) -> &dyn Any;

    /// Mutable concrete-type recovery
    fn as_any_mut(&mut self) -> &mut dyn Any;
}
