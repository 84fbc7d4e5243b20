use weft_template::{
    Command, CompileError, ComponentClass, NodeKind, PropSpec, PropType, PropertyValue, Registry,
    Template, parse_template,
};

fn parse(src: &str) -> Result<Template, CompileError> {
    parse_template(src, &|_| None)
}

fn todo_class() -> ComponentClass {
    ComponentClass::builder("todo")
        .template(r#"<ul><slot></slot><slot name="item">none</slot></ul>"#)
        .prop("a", PropSpec::new(PropType::Number).required())
        .event("save")
        .build(&Registry::new())
        .unwrap()
}

#[test]
fn parse_element_with_text_and_interpolation() {
    let t = parse("<p>Hello {{ name }}!</p>").unwrap();
    let root = t.node(t.root());
    assert!(matches!(&root.kind, NodeKind::Element { tag } if tag == "p"));
    assert_eq!(root.children.len(), 3);
    assert!(matches!(&t.node(root.children[0]).kind, NodeKind::Text(s) if s == "Hello "));
    match &t.node(root.children[1]).kind {
        NodeKind::Interpolation(e) => assert_eq!(e.source(), "name"),
        other => panic!("expected interpolation, got {other:?}"),
    }
    assert_eq!(t.node(root.children[1]).parent, Some(t.root()));
}

#[test]
fn indentation_is_dropped_but_inline_spaces_stay() {
    let t = parse("<div>\n  <b>{{a}} {{b}}</b>\n</div>").unwrap();
    let root = t.node(t.root());
    assert_eq!(root.children.len(), 1);
    let b = t.node(root.children[0]);
    assert_eq!(b.children.len(), 3);
    assert!(matches!(&t.node(b.children[1]).kind, NodeKind::Text(s) if s == " "));
}

#[test]
fn classify_literal_event_and_directive_attributes() {
    let t = parse(
        r#"<button class="x" onclick="plus" disabled @bind:title="counter" @on:click.native="go">+</button>"#,
    )
    .unwrap();
    let root = t.node(t.root());
    assert_eq!(root.properties.get("class"), Some(&PropertyValue::Literal("x".into())));
    assert_eq!(root.properties.get("disabled"), Some(&PropertyValue::Literal(String::new())));
    assert!(matches!(root.properties.get("onclick"), Some(PropertyValue::Expression(e)) if e.source() == "plus"));
    assert_eq!(root.directives.len(), 2);
    assert_eq!(root.directives[0].command, Command::Bind);
    assert_eq!(root.directives[0].target.as_deref(), Some("title"));
    assert_eq!(root.directives[1].params, vec!["native".to_string()]);
}

#[test]
fn void_self_closing_and_comments() {
    let t = parse(
        r#"<p><!-- note --><input type="text"><br/><img src=a.png></p>"#,
    )
    .unwrap();
    let root = t.node(t.root());
    let tags: Vec<_> = root
        .children
        .iter()
        .map(|&c| match &t.node(c).kind {
            NodeKind::Element { tag } => tag.clone(),
            other => panic!("unexpected {other:?}"),
        })
        .collect();
    assert_eq!(tags, ["input", "br", "img"]);
    assert_eq!(t.node(root.children[2]).literal("src"), Some("a.png"));
}

#[test]
fn tag_names_are_lowercased() {
    let t = parse("<DIV><Span>x</SPAN></div>").unwrap();
    assert!(matches!(&t.node(t.root()).kind, NodeKind::Element { tag } if tag == "div"));
}

#[test]
fn markup_errors() {
    for bad in [
        "<div>",
        "<div></span>",
        "<div></div></div>",
        "<div>{{ a </div>",
        "<div class=\"a></div>",
        "<div><!-- x</div>",
        "<div <",
    ] {
        assert!(
            matches!(parse(bad), Err(CompileError::Markup { .. })),
            "{bad:?} should fail"
        );
    }
}

#[test]
fn root_must_be_a_single_element() {
    assert!(matches!(parse(""), Err(CompileError::InvalidRoot { .. })));
    assert!(matches!(parse("  \n  "), Err(CompileError::InvalidRoot { .. })));
    assert!(matches!(parse("<a></a><b></b>"), Err(CompileError::InvalidRoot { .. })));
    assert!(matches!(parse("just text"), Err(CompileError::InvalidRoot { .. })));
    assert!(matches!(parse("<slot></slot>"), Err(CompileError::InvalidRoot { .. })));
    assert!(parse("\n  <div></div>\n").is_ok());
}

#[test]
fn directive_errors_are_compile_errors() {
    assert!(matches!(
        parse(r#"<div @frobnicate="a"></div>"#),
        Err(CompileError::UnknownDirective { .. })
    ));
    assert!(matches!(
        parse(r#"<div @bind:a..b="a"></div>"#),
        Err(CompileError::MalformedDirective { .. })
    ));
    assert!(matches!(
        parse(r#"<div @if="a +"></div>"#),
        Err(CompileError::Syntax { .. })
    ));
    assert!(matches!(
        parse(r#"<div><input @model="a.b()"></div>"#),
        Err(CompileError::InvalidDirective { .. })
    ));
    assert!(matches!(
        parse(r#"<div><p @if="a" @else></p></div>"#),
        Err(CompileError::InvalidDirective { .. })
    ));
}

#[test]
fn orphan_branches_are_rejected() {
    assert!(matches!(
        parse(r#"<div @else></div>"#),
        Err(CompileError::OrphanBranch { .. })
    ));
    assert!(matches!(
        parse(r#"<div><p>x</p><p @elif="b">y</p></div>"#),
        Err(CompileError::OrphanBranch { .. })
    ));
    assert!(parse(r#"<div><p @if="a">x</p><p>gap</p><p @else-if="b">y</p><p @else>z</p></div>"#).is_ok());
}

#[test]
fn slots_get_names_and_are_recorded() {
    let t = parse(r#"<div><slot></slot><slot name="item">fallback</slot></div>"#).unwrap();
    let names: Vec<_> = t.slots().iter().cloned().collect();
    assert_eq!(names, ["default", "item"]);
    let root = t.node(t.root());
    match &t.node(root.children[1]).kind {
        NodeKind::Slot { name } => assert_eq!(name, "item"),
        other => panic!("expected slot, got {other:?}"),
    }
    assert_eq!(t.node(root.children[1]).children.len(), 1);
}

#[test]
fn custom_tags_resolve_to_components_and_drop_undeclared_props() {
    let todo = todo_class();
    let mut registry = Registry::new();
    registry.register("todo", &todo);

    let t = parse_template(
        r#"<div><todo a="1" bogus="2" @bind:a="n"><li slot="item">x</li></todo><todo></todo></div>"#,
        &|tag| registry.resolve(tag),
    )
    .unwrap();
    let root = t.node(t.root());
    let first = t.node(root.children[0]);
    let second = t.node(root.children[1]);
    let (NodeKind::Component { class, component_id: a, .. }, NodeKind::Component { component_id: b, .. }) =
        (&first.kind, &second.kind)
    else {
        panic!("expected component nodes");
    };
    assert!(class.ptr_eq(&todo));
    assert!(a.starts_with("todo@"));
    assert_ne!(a, b);
    assert!(first.properties.contains_key("a"));
    assert!(!first.properties.contains_key("bogus"));
    assert_eq!(first.directives.len(), 1);
    assert!(matches!(
        &t.node(first.children[0]).kind,
        NodeKind::Element { tag } if tag == "li"
    ));
}

#[test]
fn show_html_model_are_rejected_on_components() {
    let todo = todo_class();
    let err = parse_template(r#"<div><todo @show="a"></todo></div>"#, &|tag| {
        (tag == "todo").then(|| todo.clone())
    })
    .unwrap_err();
    assert!(matches!(err, CompileError::InvalidDirective { .. }));
}

#[test]
fn outline_lists_every_node() {
    let t = parse(r#"<ul @var:n="3"><li @for:i="[1,2]" class="x">{{ i }}</li></ul>"#).unwrap();
    let outline = t.outline();
    let lines: Vec<_> = outline.lines().collect();
    assert_eq!(lines[0], "<ul> @var:n=(3)");
    assert_eq!(lines[1], "  <li> class=\"x\" @for:i=([1,2])");
    assert_eq!(lines[2], "    {{ i }}");
}
