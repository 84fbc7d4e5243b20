//! Component classes, their builder, and the process tag registry.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use indexmap::IndexMap;

use crate::component::Component;
use crate::error::{CompileError, EvalError};
use crate::template_ast::Template;
use crate::template_parse::parse_template;
use crate::value::{MethodFn, Value};

static NEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// `<name>@<n>`, unique for the process.
pub(crate) fn next_instance_id(name: &str) -> String {
    format!("{name}@{}", NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropType {
    #[default]
    Any,
    Str,
    Number,
    Bool,
    List,
    Map,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropSpec {
    pub kind: PropType,
    pub required: bool,
    pub default: Option<Value>,
}

impl PropSpec {
    pub fn new(kind: PropType) -> Self {
        Self { kind, required: false, default: None }
    }

    pub fn any() -> Self {
        Self::new(PropType::Any)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Convert `value` to the declared type where a lossless reading exists.
    /// Literal attributes arrive as strings, so `"3"` becomes `3` for numbers.
    pub fn coerce(&self, name: &str, value: Value) -> Value {
        match (self.kind, value) {
            (PropType::Any, v) => v,
            (PropType::Str, Value::Str(s)) => Value::Str(s),
            (PropType::Str, v @ (Value::Number(_) | Value::Bool(_))) => Value::Str(v.to_string()),
            (PropType::Number, Value::Number(n)) => Value::Number(n),
            (PropType::Number, Value::Str(s)) => match s.trim().parse::<f64>() {
                Ok(n) => Value::Number(n),
                Err(_) => {
                    log::warn!("prop `{name}` expects a number, got {s:?}");
                    Value::Str(s)
                }
            },
            (PropType::Bool, Value::Bool(b)) => Value::Bool(b),
            (PropType::Bool, Value::Str(s)) if s == "true" || s.is_empty() => Value::Bool(true),
            (PropType::Bool, Value::Str(s)) if s == "false" => Value::Bool(false),
            (PropType::List, v @ Value::List(_)) => v,
            (PropType::Map, v @ Value::Map(_)) => v,
            (kind, v) => {
                log::warn!("prop `{name}` expects {kind:?}, got {}", v.type_name());
                v
            }
        }
    }
}

#[derive(Clone)]
pub(crate) struct FieldDef {
    pub name: String,
    pub initial: Value,
    pub observable: bool,
}

/// Immutable description of a component class.
pub struct ComponentMeta {
    pub(crate) name: String,
    pub(crate) props: IndexMap<String, PropSpec>,
    pub(crate) events: BTreeSet<String>,
    pub(crate) components: HashMap<String, ComponentClass>,
    pub(crate) fields: Vec<FieldDef>,
    pub(crate) methods: HashMap<String, Rc<MethodFn>>,
    pub(crate) template: Template,
}

/// Shared handle to a built [`ComponentMeta`].
#[derive(Clone)]
pub struct ComponentClass(Rc<ComponentMeta>);

impl ComponentClass {
    pub fn builder(name: impl Into<String>) -> ComponentBuilder {
        ComponentBuilder {
            name: name.into(),
            template: None,
            props: IndexMap::new(),
            events: BTreeSet::new(),
            components: HashMap::new(),
            fields: Vec::new(),
            methods: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn template(&self) -> &Template {
        &self.0.template
    }

    pub fn props(&self) -> &IndexMap<String, PropSpec> {
        &self.0.props
    }

    pub fn has_prop(&self, name: &str) -> bool {
        self.0.props.contains_key(name)
    }

    pub fn declares_event(&self, event: &str) -> bool {
        self.0.events.contains(event)
    }

    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.0.events.iter().map(String::as_str)
    }

    /// Tags registered locally with [`ComponentBuilder::component`].
    pub fn components(&self) -> impl Iterator<Item = (&str, &ComponentClass)> {
        self.0.components.iter().map(|(tag, class)| (tag.as_str(), class))
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.0.methods.contains_key(name)
    }

    pub(crate) fn method(&self, name: &str) -> Option<Rc<MethodFn>> {
        self.0.methods.get(name).cloned()
    }

    pub(crate) fn fields(&self) -> &[FieldDef] {
        &self.0.fields
    }

    pub fn ptr_eq(&self, other: &ComponentClass) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Coerce incoming props, fill defaults, drop undeclared ones.
    pub(crate) fn resolve_props(
        &self,
        instance: &str,
        incoming: IndexMap<String, Value>,
    ) -> IndexMap<String, Value> {
        let mut incoming = incoming;
        let mut out = IndexMap::with_capacity(self.0.props.len());
        for (name, spec) in &self.0.props {
            match incoming.shift_remove(name) {
                Some(v) => {
                    out.insert(name.clone(), spec.coerce(name, v));
                }
                None => {
                    if spec.required {
                        log::warn!("component `{instance}` is missing required prop `{name}`");
                    }
                    out.insert(name.clone(), spec.default.clone().unwrap_or_default());
                }
            }
        }
        for name in incoming.keys() {
            log::warn!("component `{instance}` ignores undeclared prop `{name}`");
        }
        out
    }
}

impl fmt::Debug for ComponentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentClass")
            .field("name", &self.0.name)
            .field("props", &self.0.props.keys().collect::<Vec<_>>())
            .field("events", &self.0.events)
            .finish()
    }
}

/// Builder for [`ComponentClass`]; the template compiles in [`build`](Self::build).
pub struct ComponentBuilder {
    name: String,
    template: Option<String>,
    props: IndexMap<String, PropSpec>,
    events: BTreeSet<String>,
    components: HashMap<String, ComponentClass>,
    fields: Vec<FieldDef>,
    methods: HashMap<String, Rc<MethodFn>>,
}

impl ComponentBuilder {
    pub fn template(mut self, source: impl Into<String>) -> Self {
        self.template = Some(source.into());
        self
    }

    pub fn prop(mut self, name: impl Into<String>, spec: PropSpec) -> Self {
        self.props.insert(name.into(), spec);
        self
    }

    pub fn event(mut self, name: impl Into<String>) -> Self {
        self.events.insert(name.into());
        self
    }

    /// Register `class` for `tag` inside this component's template only.
    pub fn component(mut self, tag: impl Into<String>, class: &ComponentClass) -> Self {
        self.components.insert(tag.into().to_ascii_lowercase(), class.clone());
        self
    }

    /// Plain field: writes never trigger a re-render.
    pub fn data(mut self, name: impl Into<String>, initial: impl Into<Value>) -> Self {
        self.fields.push(FieldDef { name: name.into(), initial: initial.into(), observable: false });
        self
    }

    /// Observable field: reads during a render subscribe the tick, writes re-run it.
    pub fn observable(mut self, name: impl Into<String>, initial: impl Into<Value>) -> Self {
        self.fields.push(FieldDef { name: name.into(), initial: initial.into(), observable: true });
        self
    }

    pub fn method(
        mut self,
        name: impl Into<String>,
        body: impl Fn(&Component, &[Value]) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        self.methods.insert(name.into(), Rc::new(body));
        self
    }

    pub fn build(self, registry: &Registry) -> Result<ComponentClass, CompileError> {
        let source = self.template.unwrap_or_else(|| "<div></div>".to_string());
        let local = &self.components;
        let resolve = |tag: &str| local.get(tag).cloned().or_else(|| registry.resolve(tag));
        let template = parse_template(&source, &resolve)?;
        log::debug!(
            "compiled component `{}`: {} nodes, slots {:?}",
            self.name,
            template.len(),
            template.slots()
        );
        Ok(ComponentClass(Rc::new(ComponentMeta {
            name: self.name,
            props: self.props,
            events: self.events,
            components: self.components,
            fields: self.fields,
            methods: self.methods,
            template,
        })))
    }
}

/// Process-wide tag → class table consulted after a class's local components.
/// Fill it at start-up, before building the classes that use the tags.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    classes: HashMap<String, ComponentClass>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tag: impl Into<String>, class: &ComponentClass) {
        let tag = tag.into().to_ascii_lowercase();
        if self.classes.insert(tag.clone(), class.clone()).is_some() {
            log::warn!("component tag `{tag}` re-registered");
        }
    }

    pub fn resolve(&self, tag: &str) -> Option<ComponentClass> {
        self.classes.get(&tag.to_ascii_lowercase()).cloned()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }
}
