use thiserror::Error;

/// Template and expression compilation failures. Always fatal.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    #[error("syntax error in expression `{source_text}`: {message}")]
    Syntax { source_text: String, message: String },
    #[error("malformed markup at byte {offset}: {message}")]
    Markup { offset: usize, message: String },
    #[error("malformed directive attribute `{attr}`")]
    MalformedDirective { attr: String },
    #[error("unknown directive `@{command}`")]
    UnknownDirective { command: String },
    #[error("`@{command}` must follow a sibling carrying `@if`")]
    OrphanBranch { command: String },
    #[error("invalid template root: {reason}")]
    InvalidRoot { reason: String },
    #[error("invalid use of `@{command}`: {reason}")]
    InvalidDirective { command: String, reason: String },
}

/// API misuse detected at the call site.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UsageError {
    #[error("cannot mount child component `{id}`")]
    MountChild { id: String },
    #[error("component `{id}` is already mounted")]
    AlreadyMounted { id: String },
    #[error("no element matches mount point `{selector}`")]
    MountPointNotFound { selector: String },
    #[error("no event `{event}` declared in component `{component}`")]
    UndeclaredEvent { event: String, component: String },
    #[error("`@model` cannot bind observable field `{path}`")]
    ModelObservable { path: String },
    #[error("prop `{name}` is read-only")]
    ReadOnlyProp { name: String },
    #[error("component `{component}` has no field `{name}`")]
    UnknownField { name: String, component: String },
    #[error("component `{component}` has no method `{name}`")]
    UnknownMethod { name: String, component: String },
}

/// Runtime faults raised while evaluating expressions or calling methods.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvalError {
    #[error("undefined identifier `{name}`")]
    UndefinedIdentifier { name: String },
    #[error("{type_name} has no member `{member}`")]
    UndefinedMember { member: String, type_name: String },
    #[error("`{callee}` is not callable")]
    NotCallable { callee: String },
    #[error("operator `{operator}` not supported for {lhs} and {rhs}")]
    InvalidOperands {
        operator: String,
        lhs: String,
        rhs: String,
    },
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },
    #[error("method `{name}` has no live receiver")]
    UnboundMethod { name: String },
    #[error("{0}")]
    Custom(String),
    #[error(transparent)]
    Usage(#[from] UsageError),
}

impl EvalError {
    pub fn custom(message: impl Into<String>) -> Self {
        EvalError::Custom(message.into())
    }
}

/// Any failure surfaced by compiling, rendering or mounting.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
