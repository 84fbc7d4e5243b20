use std::cell::RefCell;

use weft_dom::Event;

use crate::{MemoryRenderer, NodeId, Renderer};

/// Deliver `event` to the handler registered on `target`, if any.
/// Returns whether a handler ran.
///
/// The document borrow is released before the handler runs: handlers usually
/// change state, which synchronously re-renders and patches this document.
pub fn dispatch(dom: &RefCell<MemoryRenderer>, target: NodeId, event: &Event) -> bool {
    let handler = dom.borrow().handler(target, &event.name);
    match handler {
        Some(handler) => {
            handler.call(event);
            true
        }
        None => false,
    }
}

/// Like [`dispatch`], addressing the target by selector.
pub fn dispatch_to(dom: &RefCell<MemoryRenderer>, selector: &str, event: &Event) -> bool {
    let target = dom.borrow().query(selector);
    target.is_some_and(|t| dispatch(dom, t, event))
}

/// Dispatch `event` to every node in the subtree at `root` carrying a handler
/// for it, in document order. Returns the number of callbacks invoked.
pub fn broadcast(dom: &RefCell<MemoryRenderer>, root: NodeId, event: &Event) -> usize {
    fn walk(dom: &MemoryRenderer, node: NodeId, name: &str, out: &mut Vec<NodeId>) {
        let Some(n) = dom.node(node) else { return };
        if n.handlers.contains_key(name) {
            out.push(node);
        }
        for c in &n.children {
            walk(dom, *c, name, out);
        }
    }
    let mut targets = Vec::new();
    walk(&dom.borrow(), root, &event.name, &mut targets);
    targets.into_iter().filter(|t| dispatch(dom, *t, event)).count()
}
