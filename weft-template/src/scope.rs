use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::value::Value;

struct Frame {
    vars: RefCell<IndexMap<String, Value>>,
    parent: Option<Rc<Frame>>,
}

/// Lexical bindings introduced by `@var` and `@for`, layered over component
/// state. Cloning a `Scope` shares the frame; [`Scope::child`] opens a new one.
#[derive(Clone)]
pub struct Scope {
    frame: Rc<Frame>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    pub fn new() -> Self {
        Self {
            frame: Rc::new(Frame {
                vars: RefCell::new(IndexMap::new()),
                parent: None,
            }),
        }
    }

    /// A new innermost frame; bindings made on it never reach `self`.
    pub fn child(&self) -> Scope {
        Scope {
            frame: Rc::new(Frame {
                vars: RefCell::new(IndexMap::new()),
                parent: Some(self.frame.clone()),
            }),
        }
    }

    /// Bind `name` in the innermost frame.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.frame.vars.borrow_mut().insert(name.into(), value);
    }

    /// Innermost binding of `name`.
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut frame = Some(&self.frame);
        while let Some(f) = frame {
            if let Some(v) = f.vars.borrow().get(name) {
                return Some(v.clone());
            }
            frame = f.parent.as_ref();
        }
        None
    }

    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut frame = self.frame.parent.as_ref();
        while let Some(f) = frame {
            depth += 1;
            frame = f.parent.as_ref();
        }
        depth
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut frames = Vec::new();
        let mut frame = Some(&self.frame);
        while let Some(fr) = frame {
            frames.push(fr.vars.borrow().clone());
            frame = fr.parent.as_ref();
        }
        f.debug_struct("Scope").field("frames", &frames).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_bindings_shadow_and_stay_local() {
        let outer = Scope::new();
        outer.set("i", Value::from(100));

        let inner = outer.child();
        assert_eq!(inner.get("i"), Some(Value::from(100)));

        inner.set("i", Value::from(1));
        inner.set("$index", Value::from(0));
        assert_eq!(inner.get("i"), Some(Value::from(1)));
        assert_eq!(outer.get("i"), Some(Value::from(100)));
        assert_eq!(outer.get("$index"), None);

        let sibling = outer.child();
        assert_eq!(sibling.get("$index"), None);
        assert_eq!(inner.depth(), 2);
    }
}
