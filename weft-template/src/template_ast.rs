use std::collections::BTreeSet;
use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::directive::{Command, Directive};
use crate::expression::Expression;
use crate::registry::ComponentClass;

/// Index of a node inside its [`Template`] arena.
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Literal(String), // class="app"
    Expression(Expression), // onclick="plus"
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Element { tag: String },
    Text(String),
    Interpolation(Expression), // {{ expr }}
    Slot { name: String },
    Component {
        tag: String,
        class: ComponentClass,
        component_id: String,
    },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub properties: IndexMap<String, PropertyValue>,
    pub directives: Vec<Directive>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            properties: IndexMap::new(),
            directives: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn directive(&self, command: Command) -> Option<&Directive> {
        self.directives.iter().find(|d| d.command == command)
    }

    pub fn has_directive(&self, command: Command) -> bool {
        self.directive(command).is_some()
    }

    pub fn is_component(&self) -> bool {
        matches!(self.kind, NodeKind::Component { .. })
    }

    pub fn literal(&self, name: &str) -> Option<&str> {
        match self.properties.get(name) {
            Some(PropertyValue::Literal(s)) => Some(s),
            _ => None,
        }
    }
}

/// A compiled template: an arena of nodes rooted at `root`.
#[derive(Debug, Clone)]
pub struct Template {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    pub(crate) slots: BTreeSet<String>,
}

impl Template {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Names of the `<slot>` insertion points, `"default"` for unnamed ones.
    pub fn slots(&self) -> &BTreeSet<String> {
        &self.slots
    }

    pub fn has_slot(&self, name: &str) -> bool {
        self.slots.contains(name)
    }

    /// Sibling ids preceding `id` under the same parent, nearest last.
    pub fn preceding_siblings(&self, id: NodeId) -> &[NodeId] {
        let Some(parent) = self.nodes[id].parent else {
            return &[];
        };
        let siblings = &self.nodes[parent].children;
        let pos = siblings.iter().position(|&c| c == id).unwrap_or(0);
        &siblings[..pos]
    }

    /// Indented dump, one node per line.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.outline_node(self.root, 0, &mut out);
        out
    }

    fn outline_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = &self.nodes[id];
        let indent = "  ".repeat(depth);
        let _ = match &node.kind {
            NodeKind::Element { tag } => write!(out, "{indent}<{tag}>"),
            NodeKind::Text(t) => write!(out, "{indent}{t:?}"),
            NodeKind::Interpolation(e) => write!(out, "{indent}{{{{ {} }}}}", e.source()),
            NodeKind::Slot { name } => write!(out, "{indent}<slot name={name:?}>"),
            NodeKind::Component { tag, component_id, .. } => {
                write!(out, "{indent}<{tag}> component {component_id}")
            }
        };
        for (name, value) in &node.properties {
            let _ = match value {
                PropertyValue::Literal(v) => write!(out, " {name}={v:?}"),
                PropertyValue::Expression(e) => write!(out, " {name}=({})", e.source()),
            };
        }
        for d in &node.directives {
            out.push_str(" @");
            out.push_str(d.command.name());
            if let Some(t) = &d.target {
                out.push(':');
                out.push_str(t);
            }
            for p in &d.params {
                out.push('.');
                out.push_str(p);
            }
            if let Some(e) = &d.expression {
                let _ = write!(out, "=({})", e.source());
            }
        }
        out.push('\n');
        for &child in &node.children {
            self.outline_node(child, depth + 1, out);
        }
    }
}
