use std::cell::RefCell;
use std::rc::Rc;

use weft_dom::{Event, Handler, Props, diff::diff, h, text};
use weft_renderer::{MemoryRenderer, Renderer, events};

#[test]
fn create_and_serialise() {
    let mut dom = MemoryRenderer::with_mount_point("app");
    let vnode = h(
        "div",
        Props::new().set("class", "app"),
        vec![text("hi"), h("span", Props::new(), vec![text("there")])],
    );
    let node = dom.create(&vnode);
    let mount = dom.query("#app").unwrap();
    dom.append_child(mount, node);

    assert_eq!(dom.to_html(node), r#"<div class="app">hi<span>there</span></div>"#);
    assert_eq!(dom.text_content(mount), "hithere");
    assert_eq!(dom.query(".app"), Some(node));
    assert_eq!(dom.query("span").map(|s| dom.text_content(s)), Some("there".into()));
    assert_eq!(dom.query("#missing"), None);
    assert_eq!(dom.backend_name(), "memory");
}

#[test]
fn applying_a_diff_matches_the_new_tree() {
    let old = h(
        "ul",
        Props::new(),
        vec![h("li", vec![("class", "a")], vec![text("A")]), h("li", (), vec![text("B")])],
    );
    let new = h(
        "ul",
        Props::new().set("id", "list"),
        vec![h("li", vec![("class", "z")], vec![text("A2")])],
    );

    let mut dom = MemoryRenderer::new();
    let node = dom.create(&old);
    let body = dom.root();
    dom.append_child(body, node);
    let before = dom.live_count();

    let node = dom.apply(node, &diff(&old, &new));
    assert_eq!(dom.to_html(node), r#"<ul id="list"><li class="z">A2</li></ul>"#);
    // second <li> and its text were released
    assert_eq!(dom.live_count(), before - 2);
}

#[test]
fn root_replacement_returns_the_new_node() {
    let mut dom = MemoryRenderer::with_mount_point("app");
    let mount = dom.query("#app").unwrap();
    let old = h("p", (), vec![text("x")]);
    let node = dom.create(&old);
    dom.append_child(mount, node);

    let new = h("section", (), vec![]);
    let replaced = dom.apply(node, &diff(&old, &new));
    assert_ne!(replaced, node);
    assert!(dom.node(node).is_none());
    assert_eq!(dom.to_html(mount), r#"<div id="app"><section></section></div>"#);
}

#[test]
fn dispatch_invokes_the_target_handler() {
    let hits = Rc::new(RefCell::new(Vec::new()));
    let mut button = h("button", Props::new().set("id", "inc"), vec![text("+1")]);
    {
        let hits = hits.clone();
        button.set_handler(
            "input",
            Handler::new("App.onInput", move |e: &Event| hits.borrow_mut().push(e.value.clone())),
        );
    }

    let dom = RefCell::new(MemoryRenderer::new());
    {
        let mut d = dom.borrow_mut();
        let node = d.create(&button);
        let body = d.root();
        d.append_child(body, node);
    }

    assert!(events::dispatch_to(&dom, "#inc", &Event::new("input").with_value("hello")));
    assert!(!events::dispatch_to(&dom, "#inc", &Event::new("click")));
    assert_eq!(*hits.borrow(), vec![Some("hello".to_string())]);
}

#[test]
fn broadcast_reaches_every_listener() {
    let count = Rc::new(RefCell::new(0));
    let make = |label: &str| {
        let count = count.clone();
        let mut b = h("button", (), vec![]);
        b.set_handler("click", Handler::new(label, move |_| *count.borrow_mut() += 1));
        b
    };
    let tree = h("div", (), vec![make("a"), make("b"), h("span", (), vec![])]);

    let dom = RefCell::new(MemoryRenderer::new());
    let root = dom.borrow_mut().create(&tree);
    assert_eq!(events::broadcast(&dom, root, &Event::new("click")), 2);
    assert_eq!(*count.borrow(), 2);
}
