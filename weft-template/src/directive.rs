//! Directive declarations (`@command:target.param`) and their schema.
//!
//! The render engine owns the hook implementations; this module decides what
//! a directive is, which family it belongs to and at which hook it runs.

use std::fmt;

use crate::error::CompileError;
use crate::expression::Expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    If,
    Elif,
    Else,
    Bind,
    On,
    Var,
    For,
    Show,
    Html,
    Model,
}

/// Structural directives may omit a node; behavioral ones only rewrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Structural,
    Behavioral,
}

/// Points in a node render at which directives run, in invocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Hook {
    Initialised,
    EventsPrepared,
    PropertiesPopulated,
    ChildrenRendered,
    ChildComponentCreated,
}

impl Command {
    pub fn from_name(name: &str) -> Option<Command> {
        Some(match name.to_ascii_lowercase().as_str() {
            "if" => Command::If,
            "elif" | "else-if" => Command::Elif,
            "else" => Command::Else,
            "bind" => Command::Bind,
            "on" => Command::On,
            "var" => Command::Var,
            "for" => Command::For,
            "show" => Command::Show,
            "html" => Command::Html,
            "model" => Command::Model,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::If => "if",
            Command::Elif => "elif",
            Command::Else => "else",
            Command::Bind => "bind",
            Command::On => "on",
            Command::Var => "var",
            Command::For => "for",
            Command::Show => "show",
            Command::Html => "html",
            Command::Model => "model",
        }
    }

    pub fn family(self) -> Family {
        match self {
            Command::If | Command::Elif | Command::Else => Family::Structural,
            Command::Bind
            | Command::On
            | Command::Var
            | Command::For
            | Command::Show
            | Command::Html
            | Command::Model => Family::Behavioral,
        }
    }

    fn needs_target(self) -> bool {
        matches!(self, Command::Bind | Command::On | Command::Var | Command::For)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
    pub command: Command,
    pub target: Option<String>,
    pub params: Vec<String>,
    /// `None` only for `@else`.
    pub expression: Option<Expression>,
}

fn is_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_')
}

fn is_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

impl Directive {
    /// Parse an attribute named `@command[:target[.param]*]` with its value.
    pub fn parse(attr: &str, value: Option<&str>) -> Result<Directive, CompileError> {
        let malformed = || CompileError::MalformedDirective { attr: attr.to_string() };
        let body = attr.strip_prefix('@').ok_or_else(malformed)?;
        let (command, rest) = match body.split_once(':') {
            Some((c, rest)) => (c, Some(rest)),
            None => (body, None),
        };
        if !is_name(command) {
            return Err(malformed());
        }
        let command = Command::from_name(command).ok_or_else(|| CompileError::UnknownDirective {
            command: command.to_string(),
        })?;

        let (target, params) = match rest {
            None => (None, Vec::new()),
            Some(rest) => {
                let mut parts = rest.split('.');
                let target = parts.next().filter(|t| is_name(t)).ok_or_else(malformed)?;
                let params: Vec<String> = parts.map(str::to_string).collect();
                if !params.iter().all(|p| is_word(p)) {
                    return Err(malformed());
                }
                (Some(target.to_string()), params)
            }
        };

        let expression = match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(v) if command != Command::Else => Some(Expression::parse(v)?),
            _ => None,
        };
        Ok(Directive { command, target, params, expression })
    }

    pub fn family(&self) -> Family {
        self.command.family()
    }

    pub fn has_param(&self, param: &str) -> bool {
        self.params.iter().any(|p| p == param)
    }

    /// The hook this directive runs at on an element or component node.
    /// `@for` is expanded before any hook and has none.
    pub fn hook(&self, on_component: bool) -> Option<Hook> {
        Some(match self.command {
            Command::If | Command::Elif | Command::Else | Command::Var => Hook::Initialised,
            Command::For => return None,
            Command::On if on_component && self.has_param("native") => Hook::EventsPrepared,
            Command::On if on_component => Hook::ChildComponentCreated,
            Command::On | Command::Bind | Command::Show | Command::Model => {
                Hook::PropertiesPopulated
            }
            Command::Html => Hook::ChildrenRendered,
        })
    }

    /// Compile-time schema check for a single declaration.
    pub fn validate(&self, on_component: bool) -> Result<(), CompileError> {
        let invalid = |reason: &str| CompileError::InvalidDirective {
            command: self.command.name().to_string(),
            reason: reason.to_string(),
        };
        if self.command.needs_target() && self.target.is_none() {
            return Err(invalid("a target is required"));
        }
        if self.command != Command::Else && self.expression.is_none() {
            return Err(invalid("an expression is required"));
        }
        if on_component && matches!(self.command, Command::Show | Command::Html | Command::Model) {
            return Err(invalid("not supported on component nodes"));
        }
        if self.command == Command::Model {
            let expression = self.expression.as_ref().map(Expression::source).unwrap_or_default();
            if self.expression.as_ref().and_then(Expression::identifier_path).is_none() {
                return Err(CompileError::InvalidDirective {
                    command: "model".into(),
                    reason: format!("`{expression}` is not an identifier path"),
                });
            }
        }
        Ok(())
    }
}

/// Reject nodes that combine more than one of `@if`, `@elif` and `@else`.
pub fn validate_set(directives: &[Directive], on_component: bool) -> Result<(), CompileError> {
    for d in directives {
        d.validate(on_component)?;
    }
    let structural: Vec<_> = directives
        .iter()
        .filter(|d| d.family() == Family::Structural)
        .collect();
    if structural.len() > 1 {
        return Err(CompileError::InvalidDirective {
            command: structural[1].command.name().to_string(),
            reason: "a node carries at most one of @if, @elif and @else".into(),
        });
    }
    Ok(())
}
