//! Node render engine: walks a component's template against its state and
//! produces the virtual tree for one tick.

use std::collections::HashSet;

use indexmap::IndexMap;
use weft_dom::{Event, Events, Handler, Props, VNode, text};

use crate::component::Component;
use crate::directive::{Command, Directive, Family, Hook};
use crate::error::{Error, EvalError, UsageError};
use crate::html;
use crate::scope::Scope;
use crate::style;
use crate::template_ast::{NodeId, NodeKind, PropertyValue, Template};
use crate::value::{Function, Value};

/// Result of rendering one template node.
pub(crate) enum Fragment {
    /// Removed by a structural directive.
    Omitted,
    Node(VNode),
    /// `@for` expansions and slot contents, spliced into the parent.
    Nodes(Vec<VNode>),
}

impl Fragment {
    fn push_into(self, out: &mut Vec<VNode>) {
        match self {
            Fragment::Omitted => {}
            Fragment::Node(v) => out.push(v),
            Fragment::Nodes(vs) => out.extend(vs),
        }
    }
}

#[derive(Default, Clone)]
struct Ctx {
    /// `@i` segments of the enclosing `@for` clones, appended to component
    /// ids and clone keys so every clone owns distinct instances.
    suffix: String,
    /// This render is a `@for` clone and must not expand again.
    clone: bool,
    /// An earlier branch of this node's if/elif chain rendered this pass.
    chain_taken: bool,
}

/// Mutable state threaded through the hooks of one node.
struct NodeState {
    props: IndexMap<String, Value>,
    children: Vec<VNode>,
    /// `@on:x.native` handlers bound for the child component's root element.
    native: Vec<(String, Function)>,
    child: Option<Component>,
}

struct RenderPass<'a> {
    component: &'a Component,
    template: &'a Template,
    /// Child component ids rendered this pass; the rest are disposed.
    seen: HashSet<String>,
}

/// Render `component`'s template. Returns the tree and the ids of the child
/// instances it used.
pub(crate) fn render_component(component: &Component) -> Result<(VNode, HashSet<String>), Error> {
    let template = component.class().template();
    let mut pass = RenderPass { component, template, seen: HashSet::new() };
    log::debug!("render `{}`", component.id());

    let (fragment, _) = pass.node(template.root(), &Scope::new(), &Ctx::default())?;
    let vnode = match fragment {
        Fragment::Node(v) => v,
        Fragment::Nodes(mut vs) if vs.len() == 1 => vs.remove(0),
        // an omitted root still needs a placeholder to patch against
        _ => text(""),
    };
    Ok((vnode, pass.seen))
}

/// Wrap a callable as a DOM handler. The event reaches it as
/// `{type, value}`; failures are logged since nobody awaits a DOM event.
pub(crate) fn handler(func: Function) -> Handler {
    Handler::new(func.label(), move |event: &Event| {
        let arg = Value::map([
            ("type", Value::from(event.name.as_str())),
            ("value", Value::from(event.value.clone())),
        ]);
        if let Err(err) = func.call(&[arg]) {
            log::error!("handler `{}` failed on `{}`: {err}", func.label(), event.name);
        }
    })
}

impl<'a> RenderPass<'a> {
    fn eval(&self, directive: &Directive, scope: &Scope) -> Result<Value, EvalError> {
        match &directive.expression {
            Some(expr) => expr.evaluate(self.component, scope),
            None => Ok(Value::Null),
        }
    }

    /// Render one node. The second value is the if/elif/else outcome this
    /// node contributes to its sibling chain.
    fn node(
        &mut self,
        id: NodeId,
        scope: &Scope,
        ctx: &Ctx,
    ) -> Result<(Fragment, Option<bool>), Error> {
        let template = self.template;
        let node = template.node(id);
        match &node.kind {
            NodeKind::Text(t) => return Ok((Fragment::Node(text(t.clone())), None)),
            NodeKind::Interpolation(expr) => {
                let value = expr.evaluate(self.component, scope)?;
                return Ok((Fragment::Node(text(value.to_string())), None));
            }
            _ => {}
        }
        if !ctx.clone {
            if let Some(dir) = node.directive(Command::For) {
                if id == template.root() {
                    log::warn!(
                        "`@for` on the root of `{}` is ignored",
                        self.component.class().name()
                    );
                } else {
                    return self.expand_for(id, dir, scope, ctx);
                }
            }
        }
        self.element(id, scope, ctx)
    }

    fn expand_for(
        &mut self,
        id: NodeId,
        dir: &Directive,
        scope: &Scope,
        ctx: &Ctx,
    ) -> Result<(Fragment, Option<bool>), Error> {
        let node = self.template.node(id);
        let chained = node.directives.iter().any(|d| d.family() == Family::Structural);
        let items = match self.eval(dir, scope)? {
            Value::List(items) => items,
            Value::Str(s) => s.chars().map(|c| Value::Str(c.to_string())).collect(),
            other => {
                log::debug!("`@for` over {} renders nothing", other.type_name());
                return Ok((Fragment::Nodes(Vec::new()), chained.then_some(false)));
            }
        };
        let target = dir.target.as_deref().unwrap_or("item");
        let mut out = Vec::with_capacity(items.len());
        let mut taken = false;
        for (index, item) in items.into_iter().enumerate() {
            let item_scope = scope.child();
            item_scope.set(target, item);
            item_scope.set("$index", Value::from(index));
            let clone_ctx = Ctx {
                suffix: format!("{}@{index}", ctx.suffix),
                clone: true,
                chain_taken: ctx.chain_taken,
            };
            let (fragment, outcome) = self.element(id, &item_scope, &clone_ctx)?;
            taken |= outcome.unwrap_or(false);
            fragment.push_into(&mut out);
        }
        Ok((Fragment::Nodes(out), chained.then_some(taken)))
    }

    fn children(&mut self, ids: &[NodeId], scope: &Scope, suffix: &str) -> Result<Vec<VNode>, Error> {
        let mut out = Vec::with_capacity(ids.len());
        let mut outcomes: Vec<Option<bool>> = Vec::with_capacity(ids.len());
        let template = self.template;
        for (pos, &child) in ids.iter().enumerate() {
            let node = template.node(child);
            let chain_taken = if node.has_directive(Command::Elif) || node.has_directive(Command::Else) {
                let start = ids[..pos]
                    .iter()
                    .rposition(|&s| template.node(s).has_directive(Command::If))
                    .unwrap_or(0);
                outcomes[start..pos].contains(&Some(true))
            } else {
                false
            };
            let ctx = Ctx { suffix: suffix.to_string(), clone: false, chain_taken };
            let (fragment, outcome) = self.node(child, scope, &ctx)?;
            outcomes.push(outcome);
            fragment.push_into(&mut out);
        }
        Ok(out)
    }

    fn element(
        &mut self,
        id: NodeId,
        scope: &Scope,
        ctx: &Ctx,
    ) -> Result<(Fragment, Option<bool>), Error> {
        let template = self.template;
        let node = template.node(id);
        let scope = scope.child();
        let on_component = node.is_component();

        let mut props = IndexMap::with_capacity(node.properties.len());
        for (name, value) in &node.properties {
            let value = match value {
                PropertyValue::Literal(s) => Value::Str(s.clone()),
                PropertyValue::Expression(e) => e.evaluate(self.component, &scope)?,
            };
            props.insert(name.clone(), value);
        }

        // initialised: structural first, then behavioral
        let mut outcome = None;
        for d in node.directives.iter().filter(|d| d.family() == Family::Structural) {
            let render = match d.command {
                Command::Elif | Command::Else if ctx.chain_taken => false,
                Command::Else => true,
                _ => self.eval(d, &scope)?.is_truthy(),
            };
            outcome = Some(render);
            if !render {
                return Ok((Fragment::Omitted, outcome));
            }
        }
        let mut state = NodeState { props, children: Vec::new(), native: Vec::new(), child: None };
        self.run_hook(Hook::Initialised, &node.directives, on_component, &mut state, &scope)?;

        state.children = self.children(&node.children, &scope, &ctx.suffix)?;

        if on_component {
            self.run_hook(Hook::EventsPrepared, &node.directives, true, &mut state, &scope)?;
        }
        self.run_hook(Hook::PropertiesPopulated, &node.directives, on_component, &mut state, &scope)?;
        self.run_hook(Hook::ChildrenRendered, &node.directives, on_component, &mut state, &scope)?;

        let fragment = match &node.kind {
            NodeKind::Slot { name } => {
                let projected = self.component.slot_content(name);
                if projected.is_empty() {
                    Fragment::Nodes(state.children)
                } else {
                    Fragment::Nodes(projected)
                }
            }
            NodeKind::Component { class, component_id, .. } => {
                let cid = format!("{component_id}{}", ctx.suffix);
                self.seen.insert(cid.clone());
                let child = self.component.child_or_create(&cid, class);

                child.reset_slots();
                for vnode in std::mem::take(&mut state.children) {
                    let slot = vnode.attr("slot").unwrap_or("default").to_string();
                    if !child.push_slot(&slot, vnode) {
                        log::warn!(
                            "component `{}` has no slot `{slot}`; projected content dropped",
                            class.name()
                        );
                    }
                }
                child.clear_listeners();
                state.child = Some(child.clone());
                self.run_hook(Hook::ChildComponentCreated, &node.directives, true, &mut state, &scope)?;

                state.props.shift_remove("slot");
                let tree = child.render_with(state.props)?;
                let mut vnode = (*tree).clone();
                vnode.set_attr("id", cid.clone());
                for (event, func) in state.native {
                    vnode.set_handler(event, handler(func));
                }
                if ctx.clone {
                    vnode = vnode.with_key(cid);
                }
                Fragment::Node(vnode)
            }
            NodeKind::Element { tag } => {
                let key = ctx
                    .clone
                    .then(|| format!("{}#{id}{}", self.component.id(), ctx.suffix));
                Fragment::Node(build_element(tag, state.props, state.children, key))
            }
            NodeKind::Text(_) | NodeKind::Interpolation(_) => Fragment::Omitted,
        };
        Ok((fragment, outcome))
    }

    /// Run the behavioral directives registered for `hook`, in declared order.
    fn run_hook(
        &mut self,
        hook: Hook,
        directives: &[Directive],
        on_component: bool,
        state: &mut NodeState,
        scope: &Scope,
    ) -> Result<(), Error> {
        for d in directives {
            if d.family() != Family::Behavioral || d.hook(on_component) != Some(hook) {
                continue;
            }
            let target = d.target.as_deref().unwrap_or_default();
            match d.command {
                Command::If | Command::Elif | Command::Else | Command::For => {}
                Command::Var => scope.set(target, self.eval(d, scope)?),
                Command::Bind => bind(&mut state.props, target, self.eval(d, scope)?),
                Command::On => {
                    let Value::Func(func) = self.eval(d, scope)? else {
                        log::warn!("`@on:{target}` expects a function");
                        continue;
                    };
                    match (&state.child, hook) {
                        (Some(child), Hook::ChildComponentCreated) => child.on(target, func),
                        (_, Hook::EventsPrepared) => {
                            state.native.push((target.to_ascii_lowercase(), func));
                        }
                        _ => {
                            let attr = format!("on{}", target.to_ascii_lowercase());
                            if html::is_event_attribute(&attr) {
                                state.props.insert(attr, Value::Func(func));
                            } else {
                                log::warn!("`@on:{target}` is not a DOM event");
                            }
                        }
                    }
                }
                Command::Show => {
                    let shown = self.eval(d, scope)?.is_truthy();
                    let current = state.props.get("style").map(Value::to_string).unwrap_or_default();
                    let next = if shown { style::unhide(&current) } else { style::hide(&current) };
                    if next.is_empty() {
                        state.props.shift_remove("style");
                    } else {
                        state.props.insert("style".into(), Value::Str(next));
                    }
                }
                Command::Html => {
                    let markup = self.eval(d, scope)?.to_string();
                    state.props.insert("innerHTML".into(), Value::Str(markup));
                    state.children.clear();
                }
                Command::Model => self.model(d, state, scope)?,
            }
        }
        Ok(())
    }

    fn model(&self, d: &Directive, state: &mut NodeState, scope: &Scope) -> Result<(), Error> {
        let Some(path) = d.expression.as_ref().and_then(|e| e.identifier_path()) else {
            return Ok(());
        };
        if self.component.is_observable(&path[0]) {
            return Err(UsageError::ModelObservable { path: path.join(".") }.into());
        }
        if self.component.is_prop(&path[0]) {
            return Err(UsageError::ReadOnlyProp { name: path[0].clone() }.into());
        }
        state.props.insert("value".into(), self.eval(d, scope)?);

        let owner = self.component.downgrade();
        let label = format!("{}.model:{}", self.component.id(), path.join("."));
        let write = Function::native_labelled("model", label, move |args| {
            let input = args.first().and_then(|e| e.member("value").ok()).unwrap_or_default();
            if let Some(component) = owner.upgrade() {
                component.set_path(&path, input)?;
            }
            Ok(Value::Null)
        });
        state.props.insert("oninput".into(), Value::Func(write));
        Ok(())
    }
}

/// `@bind:class` merges into the literal class list; other targets overwrite.
fn bind(props: &mut IndexMap<String, Value>, target: &str, value: Value) {
    if target != "class" {
        props.insert(target.to_string(), value);
        return;
    }
    let mut classes: Vec<String> = props
        .get("class")
        .map(Value::to_string)
        .into_iter()
        .flat_map(|c| c.split_whitespace().map(str::to_string).collect::<Vec<_>>())
        .collect();
    match value {
        Value::Map(map) => {
            classes.extend(map.into_iter().filter(|(_, on)| on.is_truthy()).map(|(name, _)| name));
        }
        Value::List(items) => {
            classes.extend(items.iter().filter(|v| v.is_truthy()).map(Value::to_string));
        }
        Value::Null => {}
        other => classes.push(other.to_string()),
    }
    props.insert("class".into(), Value::Str(classes.join(" ")));
}

fn build_element(
    tag: &str,
    props: IndexMap<String, Value>,
    children: Vec<VNode>,
    key: Option<String>,
) -> VNode {
    let mut attrs = Props::new();
    let mut events = Events::new();
    for (name, value) in props {
        match value {
            Value::Func(func) => {
                let event = name.strip_prefix("on").unwrap_or(&name).to_ascii_lowercase();
                events.insert(event, handler(func));
            }
            Value::Null | Value::Bool(false) => {}
            other => {
                attrs.attrs.insert(name, other.to_string());
            }
        }
    }
    VNode::Element { tag: tag.to_string(), props: attrs, events, children, key }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_binding_appends_truthy_names_in_order() {
        let mut props = IndexMap::new();
        props.insert("class".to_string(), Value::from("item"));
        let flags = Value::map([
            ("a", Value::Bool(true)),
            ("b", Value::Bool(false)),
            ("c", Value::Bool(true)),
        ]);
        bind(&mut props, "class", flags);
        assert_eq!(props["class"], Value::from("item a c"));

        bind(&mut props, "class", Value::list([Value::from("d"), Value::Null]));
        assert_eq!(props["class"], Value::from("item a c d"));

        bind(&mut props, "title", Value::from(3));
        assert_eq!(props["title"], Value::from(3));
    }

    #[test]
    fn function_props_become_handlers() {
        let mut props = IndexMap::new();
        props.insert("onclick".to_string(), Value::Func(Function::native("noop", |_| Ok(Value::Null))));
        props.insert("disabled".to_string(), Value::Bool(false));
        props.insert("title".to_string(), Value::from(10));
        let v = build_element("button", props, vec![], None);
        assert!(v.handler("click").is_some_and(|h| h.label().starts_with("noop#")));
        assert_eq!(v.attr("disabled"), None);
        assert_eq!(v.attr("title"), Some("10"));
    }
}
