//! Inline `style` attribute editing used by `@show`.

use indexmap::IndexMap;

/// Parse `a: b; c: d` into ordered declarations. Malformed pieces are ignored.
pub fn parse_inline(style: &str) -> IndexMap<String, String> {
    let mut decls = IndexMap::new();
    for decl in style.split(';') {
        let decl = decl.trim();
        if decl.is_empty() {
            continue;
        }
        if let Some((k, v)) = decl.split_once(':') {
            decls.insert(k.trim().to_ascii_lowercase(), v.trim().to_string());
        }
    }
    decls
}

pub fn serialize(decls: &IndexMap<String, String>) -> String {
    let mut out = String::new();
    for (k, v) in decls {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(k);
        out.push_str(": ");
        out.push_str(v);
        out.push(';');
    }
    out
}

/// Force `display: none`, keeping every other declaration.
pub fn hide(style: &str) -> String {
    let mut decls = parse_inline(style);
    decls.insert("display".into(), "none".into());
    serialize(&decls)
}

/// Drop a forced `display: none`. Any other `display` value stays.
pub fn unhide(style: &str) -> String {
    let mut decls = parse_inline(style);
    if decls.get("display").is_some_and(|v| v == "none") {
        decls.shift_remove("display");
    }
    serialize(&decls)
}
