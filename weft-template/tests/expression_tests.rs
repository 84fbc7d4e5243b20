use weft_template::{
    Component, ComponentClass, EvalError, Expression, Function, PropSpec, Registry, Scope, Value,
};

fn person() -> Component {
    let class = ComponentClass::builder("person")
        .template("<div></div>")
        .prop("title", PropSpec::any())
        .data("first_name", "Chao")
        .data(
            "location",
            Value::map([("city", Value::from("Auckland")), ("country", Value::from("New Zealand"))]),
        )
        .data("tags", Value::list(["a".into(), "b".into()]))
        .observable("counter", 10)
        .method("greet", |me, args| {
            let name = me.get("first_name").unwrap_or_default();
            let suffix = args.first().cloned().unwrap_or_default();
            Ok(Value::from(format!("hi {name}{suffix}")))
        })
        .method("whoami", |me, _| Ok(Value::from(me.id())))
        .build(&Registry::new())
        .unwrap();
    Component::with_props(&class, [("title", Value::from("Dr"))])
}

fn eval(src: &str, component: &Component, scope: &Scope) -> Result<Value, EvalError> {
    Expression::parse(src).unwrap().evaluate(component, scope)
}

#[test]
fn arithmetic_comparison_and_ternary() {
    let c = person();
    let s = Scope::new();
    assert_eq!(eval("1 + 2 * 3", &c, &s).unwrap(), Value::from(7));
    assert_eq!(eval("(1 + 2) * 3", &c, &s).unwrap(), Value::from(9));
    assert_eq!(eval("counter < 5", &c, &s).unwrap(), Value::Bool(false));
    assert_eq!(eval("counter % 4 == 2", &c, &s).unwrap(), Value::Bool(true));
    assert_eq!(eval("-counter + 1", &c, &s).unwrap(), Value::from(-9));
    assert_eq!(eval("counter > 5 ? 'big' : 'small'", &c, &s).unwrap(), Value::from("big"));
    assert_eq!(eval("'n=' + counter", &c, &s).unwrap(), Value::from("n=10"));
}

#[test]
fn logical_operators_short_circuit_and_yield_operands() {
    let c = person();
    let s = Scope::new();
    assert_eq!(eval("null || 'fallback'", &c, &s).unwrap(), Value::from("fallback"));
    assert_eq!(eval("0 && missing", &c, &s).unwrap(), Value::from(0));
    assert_eq!(eval("first_name || missing", &c, &s).unwrap(), Value::from("Chao"));
    assert_eq!(eval("!tags", &c, &s).unwrap(), Value::Bool(false));
}

#[test]
fn members_indexes_and_literals() {
    let c = person();
    let s = Scope::new();
    assert_eq!(eval("location.city", &c, &s).unwrap(), Value::from("Auckland"));
    assert_eq!(eval("location['country']", &c, &s).unwrap(), Value::from("New Zealand"));
    assert_eq!(eval("tags[1]", &c, &s).unwrap(), Value::from("b"));
    assert_eq!(eval("tags.length", &c, &s).unwrap(), Value::from(2));
    assert_eq!(eval("[1, 2, 3][2]", &c, &s).unwrap(), Value::from(3));
    assert_eq!(
        eval("{a: 1, 'b': first_name}", &c, &s).unwrap(),
        Value::map([("a", Value::from(1)), ("b", Value::from("Chao"))])
    );
}

#[test]
fn scope_shadows_component_state() {
    let c = person();
    let outer = Scope::new();
    outer.set("first_name", Value::from("Yang"));
    let inner = outer.child();
    inner.set("$index", Value::from(2));
    assert_eq!(eval("first_name", &c, &inner).unwrap(), Value::from("Yang"));
    assert_eq!(eval("$index + 1", &c, &inner).unwrap(), Value::from(3));
    assert_eq!(eval("first_name", &c, &Scope::new()).unwrap(), Value::from("Chao"));
}

#[test]
fn props_resolve_before_fields() {
    let c = person();
    assert_eq!(eval("title", &c, &Scope::new()).unwrap(), Value::from("Dr"));
}

#[test]
fn method_results_are_bound_to_the_context_component() {
    let c = person();
    let s = Scope::new();
    assert_eq!(eval("greet('!')", &c, &s).unwrap(), Value::from("hi Chao!"));

    let Value::Func(f) = eval("whoami", &c, &s).unwrap() else {
        panic!("expected a function");
    };
    assert!(f.is_bound());
    assert_eq!(f.label(), format!("{}.whoami", c.id()));
    // invoked later, outside any evaluation
    assert_eq!(f.call(&[]).unwrap(), Value::from(c.id()));
}

#[test]
fn scope_functions_are_callable() {
    let c = person();
    let s = Scope::new();
    s.set("double", Value::Func(Function::native("double", |args| {
        Ok(Value::from(args[0].as_number().unwrap_or(0.0) * 2.0))
    })));
    assert_eq!(eval("double(counter)", &c, &s).unwrap(), Value::from(20));
}

#[test]
fn evaluation_errors() {
    let c = person();
    let s = Scope::new();
    assert!(matches!(
        eval("nobody", &c, &s),
        Err(EvalError::UndefinedIdentifier { name }) if name == "nobody"
    ));
    assert!(matches!(eval("location.zip", &c, &s), Err(EvalError::UndefinedMember { .. })));
    assert!(matches!(eval("first_name()", &c, &s), Err(EvalError::NotCallable { callee }) if callee == "first_name"));
    assert!(matches!(eval("tags - 1", &c, &s), Err(EvalError::InvalidOperands { .. })));
    assert!(matches!(eval("tags[9]", &c, &s), Err(EvalError::IndexOutOfBounds { index: 9, len: 2 })));
}

#[test]
fn evaluation_does_not_mutate_state() {
    let c = person();
    let s = Scope::new();
    let before = c.get("counter");
    let _ = eval("counter + 1", &c, &s).unwrap();
    let _ = eval("greet", &c, &s).unwrap();
    assert_eq!(c.get("counter"), before);
}

#[test]
fn identifier_paths() {
    let path = |s: &str| Expression::parse(s).unwrap().identifier_path();
    assert_eq!(path("input"), Some(vec!["input".to_string()]));
    assert_eq!(path("form.name"), Some(vec!["form".to_string(), "name".to_string()]));
    assert_eq!(path("a[0]"), None);
    assert_eq!(path("a + b"), None);
}
