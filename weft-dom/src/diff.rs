use crate::{Events, Handler, Props, VNode};

#[derive(Debug, Clone, PartialEq)]
pub enum Patch {
    Replace(VNode),
    SetAttr(String, String),
    RemoveAttr(String),
    SetHandler(String, Handler),
    RemoveHandler(String),
    UpdateChild(usize, Vec<Patch>),
    InsertChild(usize, VNode),
    RemoveChild(usize),
}

/// Compute the patch turning `old` into `new`. An empty result means the two
/// trees are content-equal.
pub fn diff(old: &VNode, new: &VNode) -> Vec<Patch> {
    match (old, new) {
        (VNode::Text(a), VNode::Text(b)) => {
            if a != b {
                vec![Patch::Replace(new.clone())]
            } else {
                vec![]
            }
        }
        (
            VNode::Element {
                tag: tag_a,
                props: props_a,
                events: events_a,
                children: children_a,
                key: key_a,
            },
            VNode::Element {
                tag: tag_b,
                props: props_b,
                events: events_b,
                children: children_b,
                key: key_b,
            },
        ) => {
            // A different key is a different identity, even with equal tags.
            if tag_a != tag_b || key_a != key_b {
                return vec![Patch::Replace(new.clone())];
            }
            let mut patches = Vec::new();
            patches.extend(diff_props(props_a, props_b));
            patches.extend(diff_events(events_a, events_b));
            patches.extend(diff_children(children_a, children_b));
            patches
        }
        _ => vec![Patch::Replace(new.clone())],
    }
}

fn diff_props(a: &Props, b: &Props) -> Vec<Patch> {
    let mut patches = Vec::new();
    for (k, v_new) in &b.attrs {
        match a.attrs.get(k) {
            Some(v_old) if v_old == v_new => {}
            _ => patches.push(Patch::SetAttr(k.clone(), v_new.clone())),
        }
    }
    for k in a.attrs.keys() {
        if !b.attrs.contains_key(k) {
            patches.push(Patch::RemoveAttr(k.clone()));
        }
    }
    patches
}

fn diff_events(a: &Events, b: &Events) -> Vec<Patch> {
    let mut patches = Vec::new();
    for (name, handler) in b {
        match a.get(name) {
            Some(old) if old == handler => {}
            _ => patches.push(Patch::SetHandler(name.clone(), handler.clone())),
        }
    }
    for name in a.keys() {
        if !b.contains_key(name) {
            patches.push(Patch::RemoveHandler(name.clone()));
        }
    }
    patches
}

fn diff_children(a: &[VNode], b: &[VNode]) -> Vec<Patch> {
    let mut patches = Vec::new();
    let common = a.len().min(b.len());
    for i in 0..common {
        let child_patches = diff(&a[i], &b[i]);
        if !child_patches.is_empty() {
            patches.push(Patch::UpdateChild(i, child_patches));
        }
    }
    if b.len() > a.len() {
        for (i, node) in b.iter().enumerate().skip(a.len()) {
            patches.push(Patch::InsertChild(i, node.clone()));
        }
    }
    // Highest index first so earlier removals don't shift later ones.
    if a.len() > b.len() {
        for i in (b.len()..a.len()).rev() {
            patches.push(Patch::RemoveChild(i));
        }
    }
    patches
}
