//! DOM adapter crate.
//!
//! A [`Renderer`] materialises [`VNode`] trees and applies [`Patch`] lists
//! produced by `weft_dom::diff`. The only backend shipped here keeps the
//! document in memory, which is what tests and headless hosts use.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use weft_dom::{Handler, VNode, diff::Patch};

pub mod events;

/// Handle to a live node owned by a renderer.
pub type NodeId = usize;

/// Minimal renderer trait. Backends implement this to expose a consistent API.
pub trait Renderer {
    fn backend_name(&self) -> &'static str;
    /// Materialise a detached subtree and return its root.
    fn create(&mut self, vnode: &VNode) -> NodeId;
    /// Apply `patches` to `node`; returns the node now standing in its place.
    fn apply(&mut self, node: NodeId, patches: &[Patch]) -> NodeId;
    /// First node in document order matching `selector` (`#id`, `.class` or a tag).
    fn query(&self, selector: &str) -> Option<NodeId>;
    fn append_child(&mut self, parent: NodeId, child: NodeId);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DomKind {
    Element(String),
    Text(String),
}

#[derive(Debug, Clone)]
pub struct DomNode {
    pub kind: DomKind,
    pub attrs: BTreeMap<String, String>,
    pub handlers: BTreeMap<String, Handler>,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

impl DomNode {
    fn element(tag: &str) -> Self {
        Self {
            kind: DomKind::Element(tag.to_string()),
            attrs: BTreeMap::new(),
            handlers: BTreeMap::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            DomKind::Element(tag) => Some(tag),
            DomKind::Text(_) => None,
        }
    }
}

/// In-memory document. Node slots are never reused, so a stale [`NodeId`]
/// simply resolves to `None`.
#[derive(Debug)]
pub struct MemoryRenderer {
    nodes: Vec<Option<DomNode>>,
    root: NodeId,
}

impl Default for MemoryRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRenderer {
    /// An empty document with a `<body>` root.
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(DomNode::element("body"))],
            root: 0,
        }
    }

    /// A document whose body holds a single `<div id="{id}">` mount point.
    pub fn with_mount_point(id: &str) -> Self {
        let mut dom = Self::new();
        let div = dom.create(&weft_dom::h("div", vec![("id", id)], vec![]));
        dom.append_child(dom.root, div);
        dom
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut DomNode> {
        self.nodes.get_mut(id).and_then(Option::as_mut)
    }

    /// Number of live nodes, body included.
    pub fn live_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    pub fn handler(&self, id: NodeId, event: &str) -> Option<Handler> {
        self.node(id).and_then(|n| n.handlers.get(event).cloned())
    }

    pub fn text_content(&self, id: NodeId) -> String {
        match self.node(id) {
            Some(DomNode { kind: DomKind::Text(t), .. }) => t.clone(),
            Some(node) => node.children.iter().map(|c| self.text_content(*c)).collect(),
            None => String::new(),
        }
    }

    /// Serialise a subtree as markup, attributes in name order.
    pub fn to_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else { return };
        match &node.kind {
            DomKind::Text(t) => out.push_str(t),
            DomKind::Element(tag) => {
                out.push('<');
                out.push_str(tag);
                for (k, v) in &node.attrs {
                    if k == "innerHTML" {
                        continue;
                    }
                    let _ = write!(out, " {k}=\"{v}\"");
                }
                out.push('>');
                if let Some(raw) = node.attrs.get("innerHTML") {
                    out.push_str(raw);
                } else {
                    for child in &node.children {
                        self.write_html(*child, out);
                    }
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    fn alloc(&mut self, node: DomNode) -> NodeId {
        self.nodes.push(Some(node));
        self.nodes.len() - 1
    }

    fn release(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.get_mut(id).and_then(Option::take) {
            for child in node.children {
                self.release(child);
            }
        }
    }

    fn matches(&self, id: NodeId, selector: &str) -> bool {
        let Some(node) = self.node(id) else { return false };
        if let Some(want) = selector.strip_prefix('#') {
            node.attrs.get("id").is_some_and(|v| v == want)
        } else if let Some(want) = selector.strip_prefix('.') {
            node.attrs
                .get("class")
                .is_some_and(|v| v.split_whitespace().any(|c| c == want))
        } else {
            node.tag() == Some(selector)
        }
    }

    fn find_from(&self, id: NodeId, selector: &str) -> Option<NodeId> {
        if self.matches(id, selector) {
            return Some(id);
        }
        let node = self.node(id)?;
        node.children.iter().find_map(|c| self.find_from(*c, selector))
    }

    fn replace_in_parent(&mut self, old: NodeId, new: NodeId) {
        let parent = self.node(old).and_then(|n| n.parent);
        if let Some(parent) = parent {
            if let Some(p) = self.node_mut(parent) {
                for slot in p.children.iter_mut() {
                    if *slot == old {
                        *slot = new;
                    }
                }
            }
            if let Some(n) = self.node_mut(new) {
                n.parent = Some(parent);
            }
        }
        self.release(old);
    }

    fn apply_one(&mut self, node: NodeId, patch: &Patch) -> NodeId {
        match patch {
            Patch::Replace(vnode) => {
                let fresh = self.create(vnode);
                self.replace_in_parent(node, fresh);
                return fresh;
            }
            Patch::SetAttr(k, v) => {
                if let Some(n) = self.node_mut(node) {
                    n.attrs.insert(k.clone(), v.clone());
                }
            }
            Patch::RemoveAttr(k) => {
                if let Some(n) = self.node_mut(node) {
                    n.attrs.remove(k);
                }
            }
            Patch::SetHandler(name, handler) => {
                if let Some(n) = self.node_mut(node) {
                    n.handlers.insert(name.clone(), handler.clone());
                }
            }
            Patch::RemoveHandler(name) => {
                if let Some(n) = self.node_mut(node) {
                    n.handlers.remove(name);
                }
            }
            Patch::UpdateChild(index, child_patches) => {
                let child = self.node(node).and_then(|n| n.children.get(*index).copied());
                if let Some(child) = child {
                    self.apply(child, child_patches);
                }
            }
            Patch::InsertChild(index, vnode) => {
                let fresh = self.create(vnode);
                if let Some(n) = self.node_mut(node) {
                    let at = (*index).min(n.children.len());
                    n.children.insert(at, fresh);
                }
                if let Some(f) = self.node_mut(fresh) {
                    f.parent = Some(node);
                }
            }
            Patch::RemoveChild(index) => {
                let removed = self.node_mut(node).and_then(|n| {
                    (*index < n.children.len()).then(|| n.children.remove(*index))
                });
                if let Some(child) = removed {
                    self.release(child);
                }
            }
        }
        node
    }
}

impl Renderer for MemoryRenderer {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn create(&mut self, vnode: &VNode) -> NodeId {
        match vnode {
            VNode::Text(t) => self.alloc(DomNode {
                kind: DomKind::Text(t.clone()),
                attrs: BTreeMap::new(),
                handlers: BTreeMap::new(),
                children: Vec::new(),
                parent: None,
            }),
            VNode::Element {
                tag,
                props,
                events,
                children,
                ..
            } => {
                let mut node = DomNode::element(tag);
                node.attrs = props.attrs.clone();
                node.handlers = events.clone();
                let id = self.alloc(node);
                for child in children {
                    let c = self.create(child);
                    self.append_child(id, c);
                }
                id
            }
        }
    }

    fn apply(&mut self, node: NodeId, patches: &[Patch]) -> NodeId {
        patches.iter().fold(node, |current, patch| self.apply_one(current, patch))
    }

    fn query(&self, selector: &str) -> Option<NodeId> {
        self.find_from(self.root, selector)
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(p) = self.node_mut(parent) {
            p.children.push(child);
        }
        if let Some(c) = self.node_mut(child) {
            c.parent = Some(parent);
        }
    }
}
