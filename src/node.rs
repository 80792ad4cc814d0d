use crate::error::{Error, Result};
use crate::markup::Element;
use crate::semantics::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug)]
pub struct Node<'a> {
    pub element: &'a Element,
    pub value: Option<Value>,
    // Non-owning; only used for diagnostic paths
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub meta: HashMap<String, String>,
}

#[derive(Debug, Default)]
pub struct NodeTree<'a> {
    nodes: Vec<Node<'a>>,
}

impl<'a> NodeTree<'a> {
    pub fn new() -> Self {
        NodeTree { nodes: Vec::new() }
    }

    pub fn push(&mut self, element: &'a Element, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            element,
            value: None,
            parent,
            children: Vec::new(),
            meta: HashMap::new(),
        });
        if let Some(p) = parent {
            self.nodes[p.0].children.push(id);
        }
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> &Node<'a> {
        &self.nodes[id.0]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node<'a> {
        &mut self.nodes[id.0]
    }

    pub fn element(&self, id: NodeId) -> &'a Element {
        self.nodes[id.0].element
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn set_value(&mut self, id: NodeId, value: Value) {
        self.nodes[id.0].value = Some(value);
    }

    /// `Unresolved` until the builder has evaluated `id`.
    pub fn value(&self, id: NodeId) -> Result<&Value> {
        self.nodes[id.0]
            .value
            .as_ref()
            .ok_or_else(|| Error::Unresolved {
                path: self.path(id),
            })
    }

    // e.g. `dict.item.list`
    pub fn path(&self, id: NodeId) -> String {
        let mut tags = vec![self.nodes[id.0].element.tag.as_str()];
        let mut cursor = self.nodes[id.0].parent;
        while let Some(p) = cursor {
            tags.push(self.nodes[p.0].element.tag.as_str());
            cursor = self.nodes[p.0].parent;
        }
        tags.reverse();
        tags.join(".")
    }
}
