//! Template compilation, directive evaluation and the component render cycle.

pub mod component;
pub mod directive;
pub mod error;
pub mod expression;
pub mod html;
pub mod mount;
pub mod registry;
mod render;
pub mod scope;
pub mod style;
pub mod template_ast;
pub mod template_parse;
pub mod value;

pub use component::{Component, WeakComponent};
pub use directive::{Command, Directive, Family, Hook};
pub use error::{CompileError, Error, EvalError, Result, UsageError};
pub use expression::Expression;
pub use mount::{Mounted, mount};
pub use registry::{ComponentBuilder, ComponentClass, PropSpec, PropType, Registry};
pub use scope::Scope;
pub use template_ast::{Node, NodeId, NodeKind, PropertyValue, Template};
pub use template_parse::parse_template;
pub use value::{Function, Value};
