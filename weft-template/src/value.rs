//! Runtime values flowing through expressions, props and scopes.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::component::{Component, WeakComponent};
use crate::error::EvalError;

/// Body of a component method: receives the bound instance and call args.
pub type MethodFn = dyn Fn(&Component, &[Value]) -> Result<Value, EvalError>;
/// A free-standing callable.
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value, EvalError>;

#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<Value>),
    /// Insertion ordered, which `@bind:class` relies on.
    Map(IndexMap<String, Value>),
    Func(Function),
}

impl Value {
    pub fn map<K: Into<String>>(entries: impl IntoIterator<Item = (K, Value)>) -> Value {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn list(items: impl IntoIterator<Item = Value>) -> Value {
        Value::List(items.into_iter().collect())
    }

    /// `null`, `false`, `0`, `NaN` and `""` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::List(_) | Value::Map(_) | Value::Func(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Func(_) => "function",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<&Function> {
        match self {
            Value::Func(f) => Some(f),
            _ => None,
        }
    }

    /// `value.name`
    pub fn member(&self, name: &str) -> Result<Value, EvalError> {
        let missing = || EvalError::UndefinedMember {
            member: name.to_string(),
            type_name: self.type_name().to_string(),
        };
        match self {
            Value::Map(m) => m.get(name).cloned().ok_or_else(missing),
            Value::List(items) if name == "length" => Ok(Value::Number(items.len() as f64)),
            Value::Str(s) if name == "length" => Ok(Value::Number(s.chars().count() as f64)),
            _ => Err(missing()),
        }
    }

    /// `value[index]`
    pub fn index(&self, index: &Value) -> Result<Value, EvalError> {
        match (self, index) {
            (Value::List(_) | Value::Str(_), Value::Number(n)) if n.fract() != 0.0 || n.is_nan() => {
                Err(EvalError::InvalidOperands {
                    operator: "[]".into(),
                    lhs: self.type_name().into(),
                    rhs: format!("non-integral number {n}"),
                })
            }
            (Value::List(items), Value::Number(n)) => {
                let i = *n as i64;
                usize::try_from(i)
                    .ok()
                    .and_then(|u| items.get(u))
                    .cloned()
                    .ok_or(EvalError::IndexOutOfBounds { index: i, len: items.len() })
            }
            (Value::Str(s), Value::Number(n)) => {
                let i = *n as i64;
                usize::try_from(i)
                    .ok()
                    .and_then(|u| s.chars().nth(u))
                    .map(|c| Value::Str(c.to_string()))
                    .ok_or(EvalError::IndexOutOfBounds { index: i, len: s.chars().count() })
            }
            (_, Value::Str(name)) => self.member(name),
            _ => Err(EvalError::InvalidOperands {
                operator: "[]".into(),
                lhs: self.type_name().into(),
                rhs: index.type_name().into(),
            }),
        }
    }
}

fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{n}")
    }
}

/// Text form used for interpolation and attributes.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => fmt_number(*n, f),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
            Value::Map(_) => f.write_str("[object Object]"),
            Value::Func(func) => write!(f, "function {}", func.name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => fmt_number(*n, f),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Map(m) => f.debug_map().entries(m.iter()).finish(),
            Value::Func(func) => write!(f, "{func:?}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Func(a), Value::Func(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}
impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}
impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Number(v.into())
    }
}
impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}
impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Number(v as f64)
    }
}
impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}
impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}
impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}
impl From<IndexMap<String, Value>> for Value {
    fn from(v: IndexMap<String, Value>) -> Self {
        Value::Map(v)
    }
}
impl From<Function> for Value {
    fn from(v: Function) -> Self {
        Value::Func(v)
    }
}
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or_default()
    }
}

#[derive(Clone)]
enum Body {
    Method {
        body: Rc<MethodFn>,
        receiver: Option<(WeakComponent, Rc<str>)>,
    },
    Native {
        f: Rc<NativeFn>,
        // Set for handlers the render engine rebuilds on every pass.
        label: Option<Rc<str>>,
    },
}

/// A named callable value.
///
/// Component methods resolved by an expression come back bound to the
/// component the expression was evaluated against, so a handler invoked
/// long after the render still runs on the right instance.
#[derive(Clone)]
pub struct Function {
    name: Rc<str>,
    body: Body,
}

impl Function {
    pub fn native(
        name: impl Into<Rc<str>>,
        f: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            body: Body::Native { f: Rc::new(f), label: None },
        }
    }

    /// A native function whose label is fixed by the caller, so a fresh
    /// closure built for the same slot on the next render compares equal.
    pub(crate) fn native_labelled(
        name: impl Into<Rc<str>>,
        label: impl Into<Rc<str>>,
        f: impl Fn(&[Value]) -> Result<Value, EvalError> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            body: Body::Native { f: Rc::new(f), label: Some(label.into()) },
        }
    }

    pub(crate) fn method(name: impl Into<Rc<str>>, body: Rc<MethodFn>) -> Self {
        Self {
            name: name.into(),
            body: Body::Method { body, receiver: None },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_bound(&self) -> bool {
        matches!(&self.body, Body::Method { receiver: Some(_), .. })
    }

    /// Bind an unbound method to `component`. Bound methods and native
    /// functions are returned unchanged.
    pub fn bind(&self, component: &Component) -> Function {
        match &self.body {
            Body::Method { body, receiver: None } => Function {
                name: self.name.clone(),
                body: Body::Method {
                    body: body.clone(),
                    receiver: Some((component.downgrade(), Rc::from(component.id()))),
                },
            },
            _ => self.clone(),
        }
    }

    /// Stable identity used for DOM handler labels. Native functions carry
    /// their body's address, so two closures sharing a name stay distinct.
    pub fn label(&self) -> String {
        match &self.body {
            Body::Method { receiver: Some((_, id)), .. } => format!("{id}.{}", self.name),
            Body::Method { receiver: None, .. } => self.name.to_string(),
            Body::Native { label: Some(label), .. } => label.to_string(),
            Body::Native { f, label: None } => format!("{}#{:p}", self.name, Rc::as_ptr(f) as *const ()),
        }
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        match &self.body {
            Body::Native { f, .. } => f(args),
            Body::Method { body, receiver } => {
                let component = receiver
                    .as_ref()
                    .and_then(|(weak, _)| weak.upgrade())
                    .ok_or_else(|| EvalError::UnboundMethod { name: self.name.to_string() })?;
                body(&component, args)
            }
        }
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        let same_body = match (&self.body, &other.body) {
            (Body::Native { f: a, .. }, Body::Native { f: b, .. }) => Rc::ptr_eq(a, b),
            (Body::Method { body: a, .. }, Body::Method { body: b, .. }) => Rc::ptr_eq(a, b),
            _ => false,
        };
        same_body && self.label() == other.label()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.label())
    }
}
