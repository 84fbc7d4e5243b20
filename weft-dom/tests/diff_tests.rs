use weft_dom::{
    Handler, Props,
    diff::{Patch, diff},
    h, text,
};

#[test]
fn props_set_and_remove() {
    let a = h("div", vec![("class", "a"), ("id", "x")], vec![]);
    let b = h("div", vec![("class", "b")], vec![]);

    let patches = diff(&a, &b);

    assert!(patches.contains(&Patch::SetAttr("class".into(), "b".into())));
    assert!(patches.contains(&Patch::RemoveAttr("id".into())));
}

#[test]
fn insert_child() {
    let a = h("ul", Props::new(), vec![]);
    let b = h("ul", Props::new(), vec![text("item")]);

    let patches = diff(&a, &b);

    assert_eq!(patches, vec![Patch::InsertChild(0, text("item"))]);
}

#[test]
fn remove_children_from_the_end() {
    let a = h("ul", Props::new(), vec![text("a"), text("b"), text("c")]);
    let b = h("ul", Props::new(), vec![text("a")]);

    let patches = diff(&a, &b);

    assert_eq!(patches, vec![Patch::RemoveChild(2), Patch::RemoveChild(1)]);
}

#[test]
fn replace_on_tag_change() {
    let a = h("div", Props::new(), vec![]);
    let b = h("span", Props::new(), vec![]);

    let patches = diff(&a, &b);
    assert_eq!(patches, vec![Patch::Replace(b.clone())]);
}

#[test]
fn replace_on_key_change() {
    let a = h("li", Props::new(), vec![text("A")]).with_key("list@0");
    let b = h("li", Props::new(), vec![text("A")]).with_key("other@0");
    assert_eq!(diff(&a, &b), vec![Patch::Replace(b.clone())]);
}

#[test]
fn text_change_replaces() {
    let a = text("hello");
    let b = text("world");
    let patches = diff(&a, &b);
    assert_eq!(patches, vec![Patch::Replace(b.clone())]);
}

#[test]
fn handlers_diff_by_label() {
    let mut a = h("button", Props::new(), vec![]);
    a.set_handler("click", Handler::new("App@1.plus", |_| {}));
    a.set_handler("focus", Handler::new("App@1.focus", |_| {}));

    let mut same = h("button", Props::new(), vec![]);
    same.set_handler("click", Handler::new("App@1.plus", |_| {}));
    same.set_handler("focus", Handler::new("App@1.focus", |_| {}));
    assert!(diff(&a, &same).is_empty());

    let mut b = h("button", Props::new(), vec![]);
    b.set_handler("click", Handler::new("App@1.minus", |_| {}));
    let patches = diff(&a, &b);
    assert_eq!(patches.len(), 2);
    assert!(matches!(&patches[0], Patch::SetHandler(name, h) if name == "click" && h.label() == "App@1.minus"));
    assert_eq!(patches[1], Patch::RemoveHandler("focus".into()));
}

#[test]
fn nested_changes_are_scoped_to_the_child() {
    let a = h("div", Props::new(), vec![h("p", Props::new(), vec![text("1")]), text("x")]);
    let b = h("div", Props::new(), vec![h("p", Props::new(), vec![text("2")]), text("x")]);

    let patches = diff(&a, &b);
    assert_eq!(
        patches,
        vec![Patch::UpdateChild(0, vec![Patch::UpdateChild(0, vec![Patch::Replace(text("2"))])])]
    );
}
