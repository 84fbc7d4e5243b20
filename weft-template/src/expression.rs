//! Expression parsing (pest + Pratt) and evaluation.

use std::fmt;
use std::rc::Rc;
use std::sync::LazyLock;

use pest::Parser;
use pest::iterators::{Pair, Pairs};
use pest::pratt_parser::{Assoc, Op, PrattParser};

use crate::component::Component;
use crate::error::{CompileError, EvalError};
use crate::scope::Scope;
use crate::value::Value;

#[derive(pest_derive::Parser)]
#[grammar = "expression.pest"]
struct ExpressionParser;

static PRATT: LazyLock<PrattParser<Rule>> = LazyLock::new(|| {
    use Assoc::Left;
    PrattParser::new()
        .op(Op::infix(Rule::or, Left))
        .op(Op::infix(Rule::and, Left))
        .op(Op::infix(Rule::eq, Left) | Op::infix(Rule::ne, Left))
        .op(Op::infix(Rule::lt, Left)
            | Op::infix(Rule::le, Left)
            | Op::infix(Rule::gt, Left)
            | Op::infix(Rule::ge, Left))
        .op(Op::infix(Rule::add, Left) | Op::infix(Rule::sub, Left))
        .op(Op::infix(Rule::mul, Left) | Op::infix(Rule::div, Left) | Op::infix(Rule::rem, Left))
        .op(Op::prefix(Rule::neg) | Op::prefix(Rule::not))
        .op(Op::postfix(Rule::member) | Op::postfix(Rule::index) | Op::postfix(Rule::call))
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Ident(String),
    Array(Vec<Ast>),
    Object(Vec<(String, Ast)>),
    Member { object: Box<Ast>, name: String },
    Index { object: Box<Ast>, index: Box<Ast> },
    Call { callee: Box<Ast>, args: Vec<Ast> },
    Unary { op: UnaryOp, operand: Box<Ast> },
    Binary { op: BinaryOp, lhs: Box<Ast>, rhs: Box<Ast> },
    Conditional { test: Box<Ast>, consequent: Box<Ast>, alternate: Box<Ast> },
}

impl Ast {
    /// `a` → `["a"]`, `a.b.c` → `["a", "b", "c"]`, anything else → `None`.
    pub fn identifier_path(&self) -> Option<Vec<String>> {
        match self {
            Ast::Ident(name) => Some(vec![name.clone()]),
            Ast::Member { object, name } => {
                let mut path = object.identifier_path()?;
                path.push(name.clone());
                Some(path)
            }
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self.identifier_path() {
            Some(path) => path.join("."),
            None => "expression".to_string(),
        }
    }
}

struct Inner {
    source: String,
    ast: Ast,
}

/// A compiled expression: parsed once, evaluated on every render.
#[derive(Clone)]
pub struct Expression {
    inner: Rc<Inner>,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Expression, CompileError> {
        let syntax = |message: String| CompileError::Syntax {
            source_text: source.to_string(),
            message,
        };
        let mut pairs = ExpressionParser::parse(Rule::expression, source)
            .map_err(|e| syntax(e.variant.message().into_owned()))?;
        let top = pairs.next().ok_or_else(|| syntax("empty expression".into()))?;
        let ternary = top
            .into_inner()
            .find(|p| p.as_rule() == Rule::ternary)
            .ok_or_else(|| syntax("empty expression".into()))?;
        let ast = build_ternary(ternary).map_err(syntax)?;
        Ok(Expression {
            inner: Rc::new(Inner {
                source: source.trim().to_string(),
                ast,
            }),
        })
    }

    pub fn source(&self) -> &str {
        &self.inner.source
    }

    pub fn ast(&self) -> &Ast {
        &self.inner.ast
    }

    pub fn identifier_path(&self) -> Option<Vec<String>> {
        self.inner.ast.identifier_path()
    }

    /// Evaluate against `component` state layered under `scope`. A callable
    /// result comes back bound to `component`.
    pub fn evaluate(&self, component: &Component, scope: &Scope) -> Result<Value, EvalError> {
        let value = eval(&self.inner.ast, component, scope)?;
        log::trace!("evaluate `{}` -> {:?}", self.inner.source, value);
        Ok(match value {
            Value::Func(f) => Value::Func(f.bind(component)),
            other => other,
        })
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Expression({})", self.inner.source)
    }
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.inner.ast == other.inner.ast
    }
}

// ---------------------------------------------------------------------------
// Building the AST
// ---------------------------------------------------------------------------

type Built = Result<Ast, String>;

fn first_inner(pair: Pair<Rule>) -> Result<Pair<Rule>, String> {
    let rule = pair.as_rule();
    pair.into_inner()
        .next()
        .ok_or_else(|| format!("empty {rule:?}"))
}

fn build_ternary(pair: Pair<Rule>) -> Built {
    let mut inner = pair.into_inner();
    let test = match inner.next() {
        Some(expr) => build_expr(expr.into_inner())?,
        None => return Err("empty ternary".into()),
    };
    match (inner.next(), inner.next()) {
        (Some(consequent), Some(alternate)) => Ok(Ast::Conditional {
            test: Box::new(test),
            consequent: Box::new(build_ternary(consequent)?),
            alternate: Box::new(build_ternary(alternate)?),
        }),
        _ => Ok(test),
    }
}

fn build_expr(pairs: Pairs<Rule>) -> Built {
    PRATT
        .map_primary(build_primary)
        .map_prefix(|op, rhs| {
            let op = match op.as_rule() {
                Rule::neg => UnaryOp::Neg,
                _ => UnaryOp::Not,
            };
            Ok(Ast::Unary { op, operand: Box::new(rhs?) })
        })
        .map_postfix(|lhs, op| {
            let object = Box::new(lhs?);
            match op.as_rule() {
                Rule::member => Ok(Ast::Member {
                    object,
                    name: first_inner(op)?.as_str().to_string(),
                }),
                Rule::index => Ok(Ast::Index {
                    object,
                    index: Box::new(build_ternary(first_inner(op)?)?),
                }),
                _ => Ok(Ast::Call {
                    callee: object,
                    args: op.into_inner().map(build_ternary).collect::<Result<_, _>>()?,
                }),
            }
        })
        .map_infix(|lhs, op, rhs| {
            let op = match op.as_rule() {
                Rule::or => BinaryOp::Or,
                Rule::and => BinaryOp::And,
                Rule::eq => BinaryOp::Eq,
                Rule::ne => BinaryOp::Ne,
                Rule::lt => BinaryOp::Lt,
                Rule::le => BinaryOp::Le,
                Rule::gt => BinaryOp::Gt,
                Rule::ge => BinaryOp::Ge,
                Rule::add => BinaryOp::Add,
                Rule::sub => BinaryOp::Sub,
                Rule::mul => BinaryOp::Mul,
                Rule::div => BinaryOp::Div,
                Rule::rem => BinaryOp::Rem,
                rule => return Err(format!("unexpected operator {rule:?}")),
            };
            Ok(Ast::Binary { op, lhs: Box::new(lhs?), rhs: Box::new(rhs?) })
        })
        .parse(pairs)
}

fn build_primary(pair: Pair<Rule>) -> Built {
    match pair.as_rule() {
        Rule::number => pair
            .as_str()
            .parse::<f64>()
            .map(Ast::Number)
            .map_err(|e| e.to_string()),
        Rule::string => Ok(Ast::Str(first_inner(pair)?.as_str().to_string())),
        Rule::bool_lit => Ok(Ast::Bool(pair.as_str() == "true")),
        Rule::null_lit => Ok(Ast::Null),
        Rule::ident => Ok(Ast::Ident(pair.as_str().to_string())),
        Rule::array => pair
            .into_inner()
            .map(build_ternary)
            .collect::<Result<_, _>>()
            .map(Ast::Array),
        Rule::object => {
            let mut entries = Vec::new();
            for entry in pair.into_inner() {
                let mut parts = entry.into_inner();
                let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
                    return Err("malformed object entry".into());
                };
                let key = match key.as_rule() {
                    Rule::string => first_inner(key)?.as_str().to_string(),
                    _ => key.as_str().to_string(),
                };
                entries.push((key, build_ternary(value)?));
            }
            Ok(Ast::Object(entries))
        }
        Rule::ternary => build_ternary(pair),
        rule => Err(format!("unexpected {rule:?}")),
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

fn eval(ast: &Ast, component: &Component, scope: &Scope) -> Result<Value, EvalError> {
    match ast {
        Ast::Null => Ok(Value::Null),
        Ast::Bool(b) => Ok(Value::Bool(*b)),
        Ast::Number(n) => Ok(Value::Number(*n)),
        Ast::Str(s) => Ok(Value::Str(s.clone())),
        Ast::Ident(name) => scope
            .get(name)
            .or_else(|| component.lookup(name))
            .ok_or_else(|| EvalError::UndefinedIdentifier { name: name.clone() }),
        Ast::Array(items) => items
            .iter()
            .map(|item| eval(item, component, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Ast::Object(entries) => {
            let mut map = indexmap::IndexMap::with_capacity(entries.len());
            for (key, value) in entries {
                map.insert(key.clone(), eval(value, component, scope)?);
            }
            Ok(Value::Map(map))
        }
        Ast::Member { object, name } => eval(object, component, scope)?.member(name),
        Ast::Index { object, index } => {
            let object = eval(object, component, scope)?;
            object.index(&eval(index, component, scope)?)
        }
        Ast::Call { callee, args } => {
            let Value::Func(func) = eval(callee, component, scope)? else {
                return Err(EvalError::NotCallable { callee: callee.describe() });
            };
            let args = args
                .iter()
                .map(|arg| eval(arg, component, scope))
                .collect::<Result<Vec<_>, _>>()?;
            func.bind(component).call(&args)
        }
        Ast::Unary { op, operand } => {
            let value = eval(operand, component, scope)?;
            match op {
                UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
                UnaryOp::Neg => match value {
                    Value::Number(n) => Ok(Value::Number(-n)),
                    other => Err(EvalError::InvalidOperands {
                        operator: "-".into(),
                        lhs: "nothing".into(),
                        rhs: other.type_name().into(),
                    }),
                },
            }
        }
        Ast::Binary { op: BinaryOp::And, lhs, rhs } => {
            let left = eval(lhs, component, scope)?;
            if left.is_truthy() { eval(rhs, component, scope) } else { Ok(left) }
        }
        Ast::Binary { op: BinaryOp::Or, lhs, rhs } => {
            let left = eval(lhs, component, scope)?;
            if left.is_truthy() { Ok(left) } else { eval(rhs, component, scope) }
        }
        Ast::Binary { op, lhs, rhs } => {
            let left = eval(lhs, component, scope)?;
            let right = eval(rhs, component, scope)?;
            binary(*op, left, right)
        }
        Ast::Conditional { test, consequent, alternate } => {
            if eval(test, component, scope)?.is_truthy() {
                eval(consequent, component, scope)
            } else {
                eval(alternate, component, scope)
            }
        }
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    use Value::{Number, Str};
    let invalid = |l: &Value, r: &Value| EvalError::InvalidOperands {
        operator: op.symbol().into(),
        lhs: l.type_name().into(),
        rhs: r.type_name().into(),
    };
    Ok(match (op, &left, &right) {
        (BinaryOp::Eq, _, _) => Value::Bool(left == right),
        (BinaryOp::Ne, _, _) => Value::Bool(left != right),
        (BinaryOp::Add, Number(a), Number(b)) => Number(a + b),
        (BinaryOp::Add, Str(_), _) | (BinaryOp::Add, _, Str(_)) => Str(format!("{left}{right}")),
        (BinaryOp::Sub, Number(a), Number(b)) => Number(a - b),
        (BinaryOp::Mul, Number(a), Number(b)) => Number(a * b),
        (BinaryOp::Div, Number(a), Number(b)) => Number(a / b),
        (BinaryOp::Rem, Number(a), Number(b)) => Number(a % b),
        (BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge, Number(a), Number(b)) => {
            Value::Bool(compare(op, a.partial_cmp(b)))
        }
        (BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge, Str(a), Str(b)) => {
            Value::Bool(compare(op, Some(a.cmp(b))))
        }
        _ => return Err(invalid(&left, &right)),
    })
}

fn compare(op: BinaryOp, ordering: Option<std::cmp::Ordering>) -> bool {
    use std::cmp::Ordering::{Equal, Greater, Less};
    matches!(
        (op, ordering),
        (BinaryOp::Lt, Some(Less))
            | (BinaryOp::Le, Some(Less | Equal))
            | (BinaryOp::Gt, Some(Greater))
            | (BinaryOp::Ge, Some(Greater | Equal))
    )
}
