use std::cell::RefCell;
use std::rc::Rc;

use weft_dom::{Event, VNode};
use weft_template::{
    Component, ComponentClass, Error, EvalError, Function, PropSpec, PropType, Registry,
    UsageError, Value,
};

fn counter_class() -> ComponentClass {
    ComponentClass::builder("counter")
        .template(r#"<span class="counter">{{ label }}: {{ count }}</span>"#)
        .prop("label", PropSpec::new(PropType::Str).default_value("n"))
        .data("count", 0)
        .event("changed")
        .method("bump", |me, _| {
            let n = me.get("count").and_then(|v| v.as_number()).unwrap_or(0.0) + 1.0;
            me.set("count", n)?;
            me.emit("changed", &[Value::from(n)]).map_err(|e| EvalError::custom(e.to_string()))?;
            Ok(Value::Null)
        })
        .build(&Registry::new())
        .unwrap()
}

fn card_class() -> ComponentClass {
    ComponentClass::builder("card")
        .template(
            r#"<section>
                <header><slot name="title">untitled</slot></header>
                <slot>empty</slot>
            </section>"#,
        )
        .build(&Registry::new())
        .unwrap()
}

#[test]
fn slots_project_content_or_fall_back() {
    let card = card_class();
    let page = ComponentClass::builder("page")
        .template(
            r#"<main>
                <card><h1 slot="title">Hi</h1><p>one</p><p>two</p></card>
                <card></card>
                <card><b slot="nowhere">lost</b></card>
            </main>"#,
        )
        .component("card", &card)
        .build(&Registry::new())
        .unwrap();
    let tree = Component::new(&page).render().unwrap();
    let cards = tree.children();
    assert_eq!(cards.len(), 3);

    let header = &cards[0].children()[0];
    assert_eq!(header.text_content(), "Hi");
    assert_eq!(cards[0].children()[1..].iter().map(VNode::text_content).collect::<Vec<_>>(), ["one", "two"]);

    assert_eq!(cards[1].text_content(), "untitledempty");
    // unknown slot dropped, so both fall back
    assert_eq!(cards[2].text_content(), "untitledempty");
}

#[test]
fn component_roots_are_stamped_with_their_id() {
    let counter = counter_class();
    let app = ComponentClass::builder("app")
        .template(r#"<div><counter label="clicks"></counter></div>"#)
        .component("counter", &counter)
        .build(&Registry::new())
        .unwrap();
    let root = Component::new(&app);
    let tree = root.render().unwrap();
    let span = &tree.children()[0];
    let child = root.children().pop().expect("child instance");
    assert_eq!(span.attr("id"), Some(child.id()));
    assert!(child.id().starts_with("counter@"));
    assert_eq!(span.text_content(), "clicks: 0");
    assert!(child.parent().unwrap().ptr_eq(&root));
    assert!(child.root().unwrap().ptr_eq(&root));
    assert!(!child.is_root());
}

#[test]
fn child_instances_are_reused_across_renders() {
    let counter = counter_class();
    let app = ComponentClass::builder("app")
        .template(r#"<div><counter></counter></div>"#)
        .component("counter", &counter)
        .build(&Registry::new())
        .unwrap();
    let root = Component::new(&app);
    root.render().unwrap();
    let child = root.children().pop().unwrap();
    child.call("bump", &[]).unwrap();

    let tree = root.render().unwrap();
    assert_eq!(tree.children()[0].text_content(), "n: 1");
    assert!(root.children()[0].ptr_eq(&child));
}

#[test]
fn children_not_rendered_are_disposed() {
    let counter = counter_class();
    let app = ComponentClass::builder("app")
        .template(r#"<div><counter @if="show" @on:changed="noop"></counter></div>"#)
        .component("counter", &counter)
        .data("show", true)
        .method("noop", |_, _| Ok(Value::Null))
        .build(&Registry::new())
        .unwrap();
    let root = Component::new(&app);
    root.render().unwrap();
    let child = root.children().pop().unwrap();
    assert_eq!(child.listener_count("changed"), 1);

    root.set("show", false).unwrap();
    root.render().unwrap();
    assert!(root.children().is_empty());
    assert_eq!(child.listener_count("changed"), 0);

    root.set("show", true).unwrap();
    root.render().unwrap();
    let fresh = root.children().pop().unwrap();
    assert!(!fresh.ptr_eq(&child));
    assert_eq!(fresh.get("count"), Some(Value::from(0)));
}

#[test]
fn for_clones_own_separate_instances() {
    let counter = counter_class();
    let app = ComponentClass::builder("app")
        .template(
            r#"<div><counter @for:name="names" @bind:label="name"></counter><p @for:x="[1,2]"><counter></counter></p></div>"#,
        )
        .component("counter", &counter)
        .data("names", Value::list(["a".into(), "b".into(), "c".into()]))
        .build(&Registry::new())
        .unwrap();
    let root = Component::new(&app);
    let tree = root.render().unwrap();
    assert_eq!(root.children().len(), 5);

    let clones = &tree.children()[..3];
    for (i, clone) in clones.iter().enumerate() {
        let key = clone.key().unwrap();
        assert!(key.ends_with(&format!("@{i}")));
        assert_eq!(clone.attr("id"), Some(key));
    }
    assert_eq!(clones[1].text_content(), "b: 0");
}

#[test]
fn listeners_follow_on_directives_and_do_not_accumulate() {
    let counter = counter_class();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    let app = ComponentClass::builder("app")
        .template(r#"<div><counter @on:changed="record" @on:missing="record"></counter></div>"#)
        .component("counter", &counter)
        .method("record", move |_, args| {
            log.borrow_mut().push(args[0].clone());
            Ok(Value::Null)
        })
        .build(&Registry::new())
        .unwrap();
    let root = Component::new(&app);
    root.render().unwrap();
    root.render().unwrap();
    let child = root.children().pop().unwrap();
    assert_eq!(child.listener_count("changed"), 1);
    assert_eq!(child.listener_count("missing"), 0);

    child.call("bump", &[]).unwrap();
    assert_eq!(*seen.borrow(), vec![Value::from(1)]);
}

#[test]
fn emit_rejects_undeclared_events() {
    let c = Component::new(&counter_class());
    assert!(matches!(
        c.emit("exploded", &[]),
        Err(Error::Usage(UsageError::UndeclaredEvent { event, .. })) if event == "exploded"
    ));
    assert!(c.emit("changed", &[]).is_ok());
}

#[test]
fn listeners_run_in_order_and_errors_propagate() {
    let c = Component::new(&counter_class());
    let order = Rc::new(RefCell::new(Vec::new()));
    for n in 0..2 {
        let order = order.clone();
        c.on("changed", Function::native(format!("l{n}"), move |_| {
            order.borrow_mut().push(n);
            Ok(Value::Null)
        }));
    }
    c.on("changed", Function::native("boom", |_| Err(EvalError::custom("boom"))));
    assert!(c.emit("changed", &[]).is_err());
    assert_eq!(*order.borrow(), vec![0, 1]);
}

#[test]
fn native_on_reaches_the_child_root_element() {
    let counter = counter_class();
    let app = ComponentClass::builder("app")
        .template(r#"<div><counter @on:click.native="hit"></counter></div>"#)
        .component("counter", &counter)
        .data("hits", 0)
        .method("hit", |me, _| {
            let n = me.get("hits").and_then(|v| v.as_number()).unwrap_or(0.0);
            me.set("hits", n + 1.0)?;
            Ok(Value::Null)
        })
        .build(&Registry::new())
        .unwrap();
    let root = Component::new(&app);
    let tree = root.render().unwrap();
    let span = &tree.children()[0];
    span.handler("click").expect("native handler").call(&Event::new("click"));
    assert_eq!(root.get("hits"), Some(Value::from(1)));
    assert_eq!(root.children()[0].listener_count("click"), 0);
}

#[test]
fn props_are_coerced_defaulted_and_read_only() {
    let counter = counter_class();
    let labelled = Component::with_props(&counter, [("label", Value::from(7))]);
    labelled.render().unwrap();
    assert_eq!(labelled.prop("label"), Some(Value::from("7")));
    assert!(matches!(
        labelled.set("label", "x"),
        Err(UsageError::ReadOnlyProp { .. })
    ));

    let plain = Component::new(&counter);
    plain.render().unwrap();
    assert_eq!(plain.prop("label"), Some(Value::from("n")));
    assert!(matches!(plain.set("nope", 1), Err(UsageError::UnknownField { .. })));
    assert!(matches!(plain.call("nope", &[]), Err(EvalError::Usage(UsageError::UnknownMethod { .. }))));
}

#[test]
fn omitted_root_renders_a_placeholder() {
    let class = ComponentClass::builder("hidden")
        .template(r#"<div @if="false"></div>"#)
        .build(&Registry::new())
        .unwrap();
    let tree = Component::new(&class).render().unwrap();
    assert_eq!(*tree, VNode::Text(String::new()));
}

#[test]
fn default_template_is_an_empty_div() {
    let class = ComponentClass::builder("blank").build(&Registry::new()).unwrap();
    assert_eq!(Component::new(&class).render().unwrap().tag(), Some("div"));
}

#[test]
fn registry_tags_are_available_to_later_classes() {
    let mut registry = Registry::new();
    registry.register("counter", &counter_class());
    let app = ComponentClass::builder("app")
        .template("<div><Counter></Counter></div>")
        .build(&registry)
        .unwrap();
    let tree = Component::new(&app).render().unwrap();
    assert_eq!(tree.children()[0].attr("class"), Some("counter"));
}
