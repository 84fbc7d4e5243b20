use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

pub mod diff;

#[derive(Debug, Clone, PartialEq)]
pub enum VNode {
    Element {
        tag: String,
        props: Props,
        events: Events,
        children: Vec<VNode>,
        key: Option<String>,
    },
    Text(String),
}

impl VNode {
    pub fn tag(&self) -> Option<&str> {
        match self {
            VNode::Element { tag, .. } => Some(tag),
            VNode::Text(_) => None,
        }
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            VNode::Element { key, .. } => key.as_deref(),
            VNode::Text(_) => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            VNode::Element { props, .. } => props.get(name),
            VNode::Text(_) => None,
        }
    }

    pub fn children(&self) -> &[VNode] {
        match self {
            VNode::Element { children, .. } => children,
            VNode::Text(_) => &[],
        }
    }

    pub fn handler(&self, event: &str) -> Option<&Handler> {
        match self {
            VNode::Element { events, .. } => events.get(event),
            VNode::Text(_) => None,
        }
    }

    /// Concatenated text of this subtree.
    pub fn text_content(&self) -> String {
        match self {
            VNode::Text(t) => t.clone(),
            VNode::Element { children, .. } => children.iter().map(VNode::text_content).collect(),
        }
    }

    pub fn with_key(mut self, new_key: impl Into<String>) -> Self {
        if let VNode::Element { key, .. } = &mut self {
            *key = Some(new_key.into());
        }
        self
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        if let VNode::Element { props, .. } = self {
            props.attrs.insert(name.into(), value.into());
        }
    }

    pub fn set_handler(&mut self, event: impl Into<String>, handler: Handler) {
        if let VNode::Element { events, .. } = self {
            events.insert(event.into(), handler);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Props {
    pub attrs: BTreeMap<String, String>,
}

impl Props {
    pub fn new() -> Self {
        Self {
            attrs: BTreeMap::new(),
        }
    }
    pub fn set(mut self, k: impl Into<String>, v: impl Into<String>) -> Self {
        self.attrs.insert(k.into(), v.into());
        self
    }
    pub fn get(&self, k: &str) -> Option<&str> {
        self.attrs.get(k).map(String::as_str)
    }
}

// Allow concise props creation
impl From<()> for Props {
    fn from(_: ()) -> Self {
        Props::default()
    }
}
impl From<Vec<(&str, &str)>> for Props {
    fn from(v: Vec<(&str, &str)>) -> Self {
        let mut p = Props::new();
        for (k, v) in v {
            p.attrs.insert(k.to_string(), v.to_string());
        }
        p
    }
}

/// Payload delivered to a [`Handler`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    pub name: String,
    /// Current value of the event target (inputs).
    pub value: Option<String>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), value: None }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// An event callback attached to an element.
///
/// Handlers compare by `label`: the render engine gives each one a label
/// naming the bound component and method (or the native body), so
/// re-rendering unchanged state produces equal trees even though the closures
/// are new.
#[derive(Clone)]
pub struct Handler {
    label: Rc<str>,
    callback: Rc<dyn Fn(&Event)>,
}

impl Handler {
    pub fn new(label: impl Into<Rc<str>>, callback: impl Fn(&Event) + 'static) -> Self {
        Self {
            label: label.into(),
            callback: Rc::new(callback),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn call(&self, event: &Event) {
        (self.callback)(event)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.label == other.label
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({})", self.label)
    }
}

pub type Events = BTreeMap<String, Handler>;

pub fn h(tag: impl Into<String>, props: impl Into<Props>, children: Vec<VNode>) -> VNode {
    VNode::Element {
        tag: tag.into(),
        props: props.into(),
        events: Events::new(),
        children,
        key: None,
    }
}
pub fn text(t: impl Into<String>) -> VNode {
    VNode::Text(t.into())
}
