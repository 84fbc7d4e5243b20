use std::collections::BTreeSet;

use crate::directive::{self, Command, Directive};
use crate::error::CompileError;
use crate::expression::Expression;
use crate::html;
use crate::registry::{ComponentClass, next_instance_id};
use crate::template_ast::{Node, NodeId, NodeKind, PropertyValue, Template};

struct RawAttr {
    name: String,
    value: Option<String>,
}

struct Parser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    i: usize,
    nodes: Vec<Node>,
    /// Open elements: (node, tag, offset of `<`).
    stack: Vec<(NodeId, String, usize)>,
    roots: Vec<NodeId>,
    slots: BTreeSet<String>,
    resolve: &'a dyn Fn(&str) -> Option<ComponentClass>,
}

/// Hand-rolled HTML-ish parser producing an arena [`Template`]:
/// - nested elements, self-closing tags (`<input/>`) and void elements
/// - attributes: literal (`class="x"`), event (`onclick="plus"`), directive (`@if="ok"`)
/// - text and `{{ interpolation }}` splits, `<!-- comments -->`
/// - `<slot>` insertion points and custom tags resolved through `resolve`
pub fn parse_template(
    input: &str,
    resolve: &dyn Fn(&str) -> Option<ComponentClass>,
) -> Result<Template, CompileError> {
    let mut parser = Parser {
        input,
        bytes: input.as_bytes(),
        i: 0,
        nodes: Vec::new(),
        stack: Vec::new(),
        roots: Vec::new(),
        slots: BTreeSet::new(),
        resolve,
    };
    parser.run()?;
    parser.finish()
}

impl<'a> Parser<'a> {
    fn markup(&self, offset: usize, message: impl Into<String>) -> CompileError {
        CompileError::Markup { offset, message: message.into() }
    }

    fn starts_with(&self, pat: &str) -> bool {
        self.bytes[self.i..].starts_with(pat.as_bytes())
    }

    fn attach(&mut self, mut node: Node) -> NodeId {
        let id = self.nodes.len();
        node.parent = self.stack.last().map(|(p, _, _)| *p);
        match node.parent {
            Some(p) => self.nodes[p].children.push(id),
            None => self.roots.push(id),
        }
        self.nodes.push(node);
        id
    }

    fn run(&mut self) -> Result<(), CompileError> {
        while self.i < self.bytes.len() {
            if self.starts_with("<!--") {
                let start = self.i;
                match self.input[self.i + 4..].find("-->") {
                    Some(end) => self.i += 4 + end + 3,
                    None => return Err(self.markup(start, "unterminated comment")),
                }
            } else if self.starts_with("</") {
                self.close_tag()?;
            } else if self.bytes[self.i] == b'<'
                && self.bytes.get(self.i + 1).is_some_and(u8::is_ascii_alphabetic)
            {
                self.open_tag()?;
            } else if self.starts_with("{{") {
                let start = self.i;
                let Some(end) = self.input[self.i + 2..].find("}}") else {
                    return Err(self.markup(start, "unterminated interpolation"));
                };
                let source = &self.input[self.i + 2..self.i + 2 + end];
                let expr = Expression::parse(source)?;
                self.attach(Node::new(NodeKind::Interpolation(expr)));
                self.i += 2 + end + 2;
            } else {
                self.text();
            }
        }
        if let Some((_, tag, offset)) = self.stack.last() {
            return Err(self.markup(*offset, format!("unclosed <{tag}>")));
        }
        Ok(())
    }

    fn text(&mut self) {
        let start = self.i;
        // always consume at least one byte so a stray `<` becomes text
        self.i += 1;
        while self.i < self.bytes.len() && self.bytes[self.i] != b'<' && !self.starts_with("{{") {
            self.i += 1;
        }
        let input = self.input;
        let text = &input[start..self.i];
        // indentation between tags
        if is_all_ws(text) && text.contains('\n') {
            return;
        }
        self.attach(Node::new(NodeKind::Text(text.to_string())));
    }

    fn close_tag(&mut self) -> Result<(), CompileError> {
        let start = self.i;
        self.i += 2;
        let tag = read_ident(self.bytes, &mut self.i).to_ascii_lowercase();
        skip_ws(self.bytes, &mut self.i);
        if self.bytes.get(self.i) != Some(&b'>') {
            return Err(self.markup(start, format!("malformed closing tag </{tag}")));
        }
        self.i += 1;
        match self.stack.pop() {
            Some((_, open, _)) if open == tag => Ok(()),
            Some((_, open, _)) => Err(self.markup(
                start,
                format!("mismatched closing tag </{tag}>, expected </{open}>"),
            )),
            None => Err(self.markup(start, format!("stray closing tag </{tag}>"))),
        }
    }

    fn open_tag(&mut self) -> Result<(), CompileError> {
        let start = self.i;
        self.i += 1;
        let tag = read_ident(self.bytes, &mut self.i).to_ascii_lowercase();
        let mut attrs: Vec<RawAttr> = Vec::new();
        let mut self_closing = false;

        loop {
            skip_ws(self.bytes, &mut self.i);
            match self.bytes.get(self.i) {
                None => return Err(self.markup(start, format!("unterminated tag <{tag}"))),
                Some(b'/') => {
                    self.i += 1;
                    if self.bytes.get(self.i) != Some(&b'>') {
                        return Err(self.markup(self.i, "expected `>` after `/`"));
                    }
                    self.i += 1;
                    self_closing = true;
                    break;
                }
                Some(b'>') => {
                    self.i += 1;
                    break;
                }
                Some(_) => attrs.push(self.attribute()?),
            }
        }

        let node = self.build_node(&tag, attrs)?;
        let id = self.attach(node);
        if !self_closing && !html::is_void_element(&tag) {
            self.stack.push((id, tag, start));
        }
        Ok(())
    }

    fn attribute(&mut self) -> Result<RawAttr, CompileError> {
        let start = self.i;
        while self.i < self.bytes.len() {
            let c = self.bytes[self.i];
            if c.is_ascii_whitespace() || matches!(c, b'=' | b'>' | b'/' | b'"' | b'\'') {
                break;
            }
            self.i += 1;
        }
        if self.i == start {
            return Err(self.markup(start, "expected an attribute name"));
        }
        let name = self.input[start..self.i].to_string();

        skip_ws(self.bytes, &mut self.i);
        if self.bytes.get(self.i) != Some(&b'=') {
            return Ok(RawAttr { name, value: None });
        }
        self.i += 1;
        skip_ws(self.bytes, &mut self.i);
        let value = match self.bytes.get(self.i) {
            Some(&quote @ (b'"' | b'\'')) => {
                let open = self.i;
                self.i += 1;
                let from = self.i;
                while self.i < self.bytes.len() && self.bytes[self.i] != quote {
                    self.i += 1;
                }
                if self.i >= self.bytes.len() {
                    return Err(self.markup(open, format!("unterminated value for `{name}`")));
                }
                let v = self.input[from..self.i].to_string();
                self.i += 1;
                v
            }
            _ => {
                let from = self.i;
                while self.i < self.bytes.len()
                    && !self.bytes[self.i].is_ascii_whitespace()
                    && self.bytes[self.i] != b'>'
                {
                    self.i += 1;
                }
                self.input[from..self.i].to_string()
            }
        };
        Ok(RawAttr { name, value: Some(value) })
    }

    fn build_node(&mut self, tag: &str, attrs: Vec<RawAttr>) -> Result<Node, CompileError> {
        let kind = if tag == "slot" {
            let name = attrs
                .iter()
                .find(|a| a.name == "name")
                .and_then(|a| a.value.clone())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| "default".to_string());
            self.slots.insert(name.clone());
            NodeKind::Slot { name }
        } else if let Some(class) = (self.resolve)(tag) {
            let component_id = next_instance_id(class.name());
            NodeKind::Component { tag: tag.to_string(), class, component_id }
        } else {
            NodeKind::Element { tag: tag.to_string() }
        };

        let mut node = Node::new(kind);
        for attr in attrs {
            if attr.name.starts_with('@') {
                node.directives.push(Directive::parse(&attr.name, attr.value.as_deref())?);
                continue;
            }
            let value = attr.value.unwrap_or_default();
            match &node.kind {
                NodeKind::Component { class, .. } => {
                    if attr.name == "slot" || class.has_prop(&attr.name) {
                        node.properties.insert(attr.name, PropertyValue::Literal(value));
                    } else {
                        log::warn!(
                            "dropping undeclared prop `{}` on component `{}`",
                            attr.name,
                            class.name()
                        );
                    }
                }
                _ if html::is_event_attribute(&attr.name) => {
                    let expr = Expression::parse(&value)?;
                    node.properties.insert(attr.name, PropertyValue::Expression(expr));
                }
                NodeKind::Slot { .. } if attr.name == "name" => {}
                _ => {
                    node.properties.insert(attr.name, PropertyValue::Literal(value));
                }
            }
        }
        Ok(node)
    }

    fn finish(self) -> Result<Template, CompileError> {
        let nodes = self.nodes;
        let roots: Vec<NodeId> = self
            .roots
            .into_iter()
            .filter(|&id| !matches!(&nodes[id].kind, NodeKind::Text(t) if is_all_ws(t)))
            .collect();
        let root = match roots.as_slice() {
            [] => {
                return Err(CompileError::InvalidRoot { reason: "template is empty".into() });
            }
            [root] => *root,
            many => {
                return Err(CompileError::InvalidRoot {
                    reason: format!("expected a single root node, found {}", many.len()),
                });
            }
        };
        if !matches!(nodes[root].kind, NodeKind::Element { .. } | NodeKind::Component { .. }) {
            return Err(CompileError::InvalidRoot {
                reason: "the root must be an element or a component".into(),
            });
        }

        let template = Template { nodes, root, slots: self.slots };
        validate(&template)?;
        Ok(template)
    }
}

fn validate(template: &Template) -> Result<(), CompileError> {
    for (id, node) in template.nodes().iter().enumerate() {
        directive::validate_set(&node.directives, node.is_component())?;
        for d in &node.directives {
            if !matches!(d.command, Command::Elif | Command::Else) {
                continue;
            }
            let chained = id != template.root()
                && template
                    .preceding_siblings(id)
                    .iter()
                    .any(|&s| template.node(s).has_directive(Command::If));
            if !chained {
                return Err(CompileError::OrphanBranch { command: d.command.name().to_string() });
            }
        }
    }
    Ok(())
}

fn is_all_ws(s: &str) -> bool {
    s.chars().all(char::is_whitespace)
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn read_ident<'b>(bytes: &'b [u8], i: &mut usize) -> &'b str {
    let start = *i;
    while *i < bytes.len() {
        let c = bytes[*i];
        if c.is_ascii_alphanumeric() || c == b'_' || c == b'-' {
            *i += 1;
        } else {
            break;
        }
    }
    std::str::from_utf8(&bytes[start..*i]).unwrap_or_default()
}
