//! In-memory data tree shared by the codec and the entity mapper
//!
//! A [`DataNode`] is one named node of an instance document: containers and
//! list entries hold children, leaves hold a canonical string value.
//! Children keep insertion order, which is what both wire formats emit.

/// One node of an instance data tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataNode {
    name: String,
    module: String,
    namespace: String,
    value: Option<String>,
    children: Vec<DataNode>,
}

impl DataNode {
    /// Create an interior node with no value
    pub fn new(name: &str, module: &str, namespace: &str) -> Self {
        DataNode {
            name: name.to_string(),
            module: module.to_string(),
            namespace: namespace.to_string(),
            value: None,
            children: Vec::new(),
        }
    }

    /// Create a leaf node carrying a canonical value
    pub fn leaf(name: &str, module: &str, namespace: &str, value: String) -> Self {
        DataNode {
            name: name.to_string(),
            module: module.to_string(),
            namespace: namespace.to_string(),
            value: Some(value),
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Canonical value, present only on leaf and leaf-list nodes
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: String) {
        self.value = Some(value);
    }

    /// Append a child, returning a handle for nested building
    pub fn add_child(&mut self, child: DataNode) -> &mut DataNode {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Children in insertion order
    pub fn children(&self) -> &[DataNode] {
        &self.children
    }

    /// All children with the given name, in order
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a DataNode> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// First child with the given name
    pub fn child(&self, name: &str) -> Option<&DataNode> {
        self.children.iter().find(|c| c.name == name)
    }
}
