//! HTML vocabulary the parser needs to know about.

/// Attributes whose value is an expression evaluated to an event handler.
pub const EVENT_ATTRIBUTES: &[&str] = &[
    // window
    "onafterprint", "onbeforeprint", "onbeforeunload", "onerror", "onhashchange", "onload",
    "onmessage", "onoffline", "ononline", "onpagehide", "onpageshow", "onpopstate", "onresize",
    "onstorage", "onunload",
    // form
    "onblur", "onchange", "oncontextmenu", "onfocus", "oninput", "oninvalid", "onreset",
    "onsearch", "onselect", "onsubmit",
    // keyboard
    "onkeydown", "onkeypress", "onkeyup",
    // mouse
    "onclick", "ondblclick", "onmousedown", "onmousemove", "onmouseout", "onmouseover",
    "onmouseup", "onmousewheel", "onwheel",
    // drag
    "ondrag", "ondragend", "ondragenter", "ondragleave", "ondragover", "ondragstart", "ondrop",
    "onscroll",
    // clipboard
    "oncopy", "oncut", "onpaste",
    // media
    "onabort", "oncanplay", "oncanplaythrough", "oncuechange", "ondurationchange", "onemptied",
    "onended", "onloadeddata", "onloadedmetadata", "onloadstart", "onpause", "onplay",
    "onplaying", "onprogress", "onratechange", "onseeked", "onseeking", "onstalled",
    "onsuspend", "ontimeupdate", "onvolumechange", "onwaiting",
    // misc
    "onshow", "ontoggle",
];

/// Elements that never take a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

pub fn is_event_attribute(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    EVENT_ATTRIBUTES.contains(&name.as_str())
}

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}
