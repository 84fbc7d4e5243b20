//! Component instances: state, child registry, slot buffers and the emitter.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use weft_core::Signal;
use weft_dom::VNode;
use weft_renderer::NodeId;

use crate::error::{Error, EvalError, UsageError};
use crate::registry::{ComponentClass, next_instance_id};
use crate::render;
use crate::value::{Function, Value};

pub(crate) enum Field {
    Plain(Value),
    Observable(Rc<Signal<Value>>),
}

struct Inner {
    id: String,
    class: ComponentClass,
    parent: Option<Weak<Inner>>,
    root: Weak<Inner>,
    /// Replaced wholesale on every render; never written through `set`.
    props: RefCell<IndexMap<String, Value>>,
    fields: RefCell<IndexMap<String, Field>>,
    children: RefCell<IndexMap<String, Component>>,
    listeners: RefCell<HashMap<String, Vec<Function>>>,
    slots: RefCell<HashMap<String, Vec<VNode>>>,
    vnode: RefCell<Option<Rc<VNode>>>,
    dom: Cell<Option<NodeId>>,
    mounted: Cell<bool>,
}

/// A live component instance. Cloning shares the instance.
#[derive(Clone)]
pub struct Component(Rc<Inner>);

/// Non-owning handle, used by bound methods and DOM handlers.
#[derive(Clone)]
pub struct WeakComponent(Weak<Inner>);

impl WeakComponent {
    pub fn upgrade(&self) -> Option<Component> {
        self.0.upgrade().map(Component)
    }
}

impl Component {
    /// A root instance of `class`, ready to be rendered or mounted.
    pub fn new(class: &ComponentClass) -> Component {
        Self::create(class, next_instance_id(class.name()), None, IndexMap::new())
    }

    /// A root instance receiving `props` as if set by a parent template.
    pub fn with_props<K: Into<String>>(
        class: &ComponentClass,
        props: impl IntoIterator<Item = (K, Value)>,
    ) -> Component {
        let props = props.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::create(class, next_instance_id(class.name()), None, props)
    }

    fn create(
        class: &ComponentClass,
        id: String,
        parent: Option<&Component>,
        props: IndexMap<String, Value>,
    ) -> Component {
        let fields = class
            .fields()
            .iter()
            .map(|f| {
                let field = if f.observable {
                    Field::Observable(Rc::new(Signal::new(f.initial.clone())))
                } else {
                    Field::Plain(f.initial.clone())
                };
                (f.name.clone(), field)
            })
            .collect();
        let inner = Rc::new_cyclic(|me| Inner {
            id,
            class: class.clone(),
            parent: parent.map(|p| Rc::downgrade(&p.0)),
            root: parent.map_or_else(|| me.clone(), |p| p.0.root.clone()),
            props: RefCell::new(props),
            fields: RefCell::new(fields),
            children: RefCell::new(IndexMap::new()),
            listeners: RefCell::new(HashMap::new()),
            slots: RefCell::new(HashMap::new()),
            vnode: RefCell::new(None),
            dom: Cell::new(None),
            mounted: Cell::new(false),
        });
        log::debug!("created component `{}`", inner.id);
        Component(inner)
    }

    pub fn id(&self) -> &str {
        &self.0.id
    }

    pub fn class(&self) -> &ComponentClass {
        &self.0.class
    }

    pub fn downgrade(&self) -> WeakComponent {
        WeakComponent(Rc::downgrade(&self.0))
    }

    pub fn ptr_eq(&self, other: &Component) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn parent(&self) -> Option<Component> {
        self.0.parent.as_ref().and_then(Weak::upgrade).map(Component)
    }

    pub fn is_root(&self) -> bool {
        self.0.parent.is_none()
    }

    pub fn root(&self) -> Option<Component> {
        self.0.root.upgrade().map(Component)
    }

    // ---------------------------------------------------------------------
    // State
    // ---------------------------------------------------------------------

    /// Resolve `name` as a prop, then a field, then a method bound to `self`.
    /// Observable fields are read through their signal, so a running tick
    /// subscribes to them.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.0.props.borrow().get(name) {
            return Some(v.clone());
        }
        let signal = match self.0.fields.borrow().get(name) {
            Some(Field::Plain(v)) => return Some(v.clone()),
            Some(Field::Observable(s)) => Some(s.clone()),
            None => None,
        };
        if let Some(signal) = signal {
            return Some(signal.get());
        }
        self.0
            .class
            .method(name)
            .map(|body| Value::Func(Function::method(name, body).bind(self)))
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<Value> {
        self.get(name)
    }

    pub fn prop(&self, name: &str) -> Option<Value> {
        self.0.props.borrow().get(name).cloned()
    }

    pub fn props(&self) -> IndexMap<String, Value> {
        self.0.props.borrow().clone()
    }

    /// Declared by the class as a prop, whether or not a value was passed.
    pub(crate) fn is_prop(&self, name: &str) -> bool {
        self.0.props.borrow().contains_key(name) || self.0.class.has_prop(name)
    }

    pub fn is_observable(&self, field: &str) -> bool {
        matches!(self.0.fields.borrow().get(field), Some(Field::Observable(_)))
    }

    /// Write a field. Observable fields notify the scheduler once every
    /// borrow on this instance is released; plain fields change silently.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<(), UsageError> {
        let value = value.into();
        if self.0.props.borrow().contains_key(name) {
            return Err(UsageError::ReadOnlyProp { name: name.to_string() });
        }
        let signal = {
            let mut fields = self.0.fields.borrow_mut();
            match fields.get_mut(name) {
                Some(Field::Plain(slot)) => {
                    *slot = value;
                    return Ok(());
                }
                Some(Field::Observable(signal)) => signal.clone(),
                None => {
                    return Err(UsageError::UnknownField {
                        name: name.to_string(),
                        component: self.0.id.clone(),
                    });
                }
            }
        };
        signal.set(value);
        Ok(())
    }

    /// Write through a plain field path (`a` or `a.b.c`) without notifying
    /// anyone. Used by `@model` input handlers.
    pub(crate) fn set_path(&self, path: &[String], value: Value) -> Result<(), UsageError> {
        let unknown = |name: &str| UsageError::UnknownField {
            name: name.to_string(),
            component: self.0.id.clone(),
        };
        let Some((head, rest)) = path.split_first() else {
            return Err(unknown(""));
        };
        if self.0.props.borrow().contains_key(head) {
            return Err(UsageError::ReadOnlyProp { name: head.clone() });
        }
        let mut fields = self.0.fields.borrow_mut();
        match fields.get_mut(head) {
            Some(Field::Plain(slot)) => write_path(slot, rest, value).map_err(|key| unknown(&key)),
            Some(Field::Observable(_)) => Err(UsageError::ModelObservable { path: path.join(".") }),
            None => Err(unknown(head)),
        }
    }

    /// Invoke a declared method bound to this instance.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value, EvalError> {
        let body = self.0.class.method(method).ok_or_else(|| UsageError::UnknownMethod {
            name: method.to_string(),
            component: self.0.class.name().to_string(),
        })?;
        Function::method(method, body).bind(self).call(args)
    }

    // ---------------------------------------------------------------------
    // Events
    // ---------------------------------------------------------------------

    /// Subscribe to a declared event. Undeclared events are ignored with a warning.
    pub fn on(&self, event: &str, listener: Function) {
        if !self.0.class.declares_event(event) {
            log::warn!(
                "component `{}` declares no event `{event}`; listener dropped",
                self.0.class.name()
            );
            return;
        }
        self.0.listeners.borrow_mut().entry(event.to_string()).or_default().push(listener);
    }

    /// Run every listener of `event` in registration order.
    pub fn emit(&self, event: &str, args: &[Value]) -> Result<(), Error> {
        if !self.0.class.declares_event(event) {
            return Err(UsageError::UndeclaredEvent {
                event: event.to_string(),
                component: self.0.class.name().to_string(),
            }
            .into());
        }
        let listeners = self.0.listeners.borrow().get(event).cloned().unwrap_or_default();
        log::debug!("`{}` emits `{event}` to {} listener(s)", self.0.id, listeners.len());
        for listener in listeners {
            listener.call(args)?;
        }
        Ok(())
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.0.listeners.borrow().get(event).map_or(0, Vec::len)
    }

    pub(crate) fn clear_listeners(&self) {
        self.0.listeners.borrow_mut().clear();
    }

    // ---------------------------------------------------------------------
    // Children and slots
    // ---------------------------------------------------------------------

    pub fn child(&self, id: &str) -> Option<Component> {
        self.0.children.borrow().get(id).cloned()
    }

    pub fn children(&self) -> Vec<Component> {
        self.0.children.borrow().values().cloned().collect()
    }

    /// The child owned under `id`, created from `class` on first use.
    pub(crate) fn child_or_create(&self, id: &str, class: &ComponentClass) -> Component {
        if let Some(child) = self.child(id) {
            if child.class().ptr_eq(class) {
                return child;
            }
        }
        let child = Self::create(class, id.to_string(), Some(self), IndexMap::new());
        self.0.children.borrow_mut().insert(id.to_string(), child.clone());
        child
    }

    /// Dispose of children not rendered in the last pass.
    fn prune_children(&self, seen: &HashSet<String>) {
        self.0.children.borrow_mut().retain(|id, child| {
            let keep = seen.contains(id);
            if !keep {
                child.clear_listeners();
                log::debug!("disposed component `{id}`");
            }
            keep
        });
    }

    /// Empty buffers for every slot the template declares.
    pub(crate) fn reset_slots(&self) {
        let mut slots = self.0.slots.borrow_mut();
        slots.clear();
        for name in self.0.class.template().slots() {
            slots.insert(name.clone(), Vec::new());
        }
    }

    /// Queue projected content; `false` when the template has no such slot.
    pub(crate) fn push_slot(&self, name: &str, vnode: VNode) -> bool {
        match self.0.slots.borrow_mut().get_mut(name) {
            Some(buffer) => {
                buffer.push(vnode);
                true
            }
            None => false,
        }
    }

    pub fn slot_content(&self, name: &str) -> Vec<VNode> {
        self.0.slots.borrow().get(name).cloned().unwrap_or_default()
    }

    // ---------------------------------------------------------------------
    // Rendering
    // ---------------------------------------------------------------------

    /// Recompute the virtual tree from current state. Does not schedule.
    pub fn render(&self) -> Result<Rc<VNode>, Error> {
        self.render_with(self.props())
    }

    pub(crate) fn render_with(&self, props: IndexMap<String, Value>) -> Result<Rc<VNode>, Error> {
        let props = self.0.class.resolve_props(&self.0.id, props);
        *self.0.props.borrow_mut() = props;

        let (vnode, seen) = render::render_component(self)?;
        self.prune_children(&seen);

        let vnode = Rc::new(vnode);
        *self.0.vnode.borrow_mut() = Some(vnode.clone());
        Ok(vnode)
    }

    /// The tree from the last render.
    pub fn vnode(&self) -> Option<Rc<VNode>> {
        self.0.vnode.borrow().clone()
    }

    pub fn dom(&self) -> Option<NodeId> {
        self.0.dom.get()
    }

    pub(crate) fn set_dom(&self, node: NodeId) {
        self.0.dom.set(Some(node));
    }

    pub fn is_mounted(&self) -> bool {
        self.0.mounted.get()
    }

    pub(crate) fn set_mounted(&self, mounted: bool) {
        self.0.mounted.set(mounted);
    }
}

fn write_path(slot: &mut Value, path: &[String], value: Value) -> Result<(), String> {
    match path.split_first() {
        None => {
            *slot = value;
            Ok(())
        }
        Some((key, rest)) => match slot {
            Value::Map(m) => write_path(m.entry(key.clone()).or_default(), rest, value),
            _ => Err(key.clone()),
        },
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("id", &self.0.id)
            .field("class", &self.0.class.name())
            .field("children", &self.0.children.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}
