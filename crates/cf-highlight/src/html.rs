//! HTML serialization of code-block trees.

use crate::node::{Element, Node, PropertyValue, Root};

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

impl Root {
    /// Serialize the tree to an HTML fragment.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            write_node(&mut out, child);
        }
        out
    }
}

impl Element {
    /// Serialize this element and its descendants to HTML.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_element(&mut out, self);
        out
    }
}

fn write_node(out: &mut String, node: &Node) {
    match node {
        Node::Element(element) => write_element(out, element),
        Node::Text(text) => out.push_str(&escape_html(&text.value)),
    }
}

fn write_element(out: &mut String, element: &Element) {
    out.push('<');
    out.push_str(&element.tag_name);
    let mut class_written = false;
    for (name, value) in &element.properties {
        let name = attribute_name(name);
        // `class` and `className` share one attribute.
        if name == "class" {
            if !class_written {
                class_written = true;
                push_attribute(out, "class", &element.classes().join(" "));
            }
            continue;
        }
        match value {
            PropertyValue::Bool(false) => continue,
            PropertyValue::Bool(true) => {
                out.push(' ');
                out.push_str(name);
                continue;
            }
            PropertyValue::Text(text) => push_attribute(out, name, text),
            PropertyValue::Number(n) => push_attribute(out, name, &n.to_string()),
            PropertyValue::List(items) => push_attribute(out, name, &items.join(" ")),
        }
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&element.tag_name.as_str()) {
        return;
    }
    for child in &element.children {
        write_node(out, child);
    }
    out.push_str("</");
    out.push_str(&element.tag_name);
    out.push('>');
}

fn push_attribute(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&escape_html(value));
    out.push('"');
}

/// HTML attribute name for a hast property name.
fn attribute_name(property: &str) -> &str {
    match property {
        "className" => "class",
        "htmlFor" => "for",
        "tabIndex" => "tabindex",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html(r#""quoted""#), "&quot;quoted&quot;");
        assert_eq!(escape_html("it's"), "it&#x27;s");
    }

    #[test]
    fn test_root_to_html() {
        let root = Root::new(vec![
            Element::new("pre")
                .with_property("class", "shiki")
                .with_property("tabindex", "0")
                .with_child(Element::new("code").with_child(Node::text("if a < b:")))
                .into(),
        ]);

        assert_eq!(
            root.to_html(),
            r#"<pre class="shiki" tabindex="0"><code>if a &lt; b:</code></pre>"#
        );
    }

    #[test]
    fn test_property_shapes_to_html() {
        let element = Element::new("input")
            .with_property("className", PropertyValue::List(vec!["a".to_owned(), "b".to_owned()]))
            .with_property("disabled", true)
            .with_property("hidden", false);

        assert_eq!(element.to_html(), r#"<input class="a b" disabled>"#);
    }

    #[test]
    fn test_class_and_class_name_merged() {
        let element = Element::new("pre")
            .with_property("class", "shiki")
            .with_property("className", PropertyValue::List(vec!["relative".to_owned()]))
            .with_property("tabindex", "0");

        assert_eq!(element.to_html(), r#"<pre class="shiki relative" tabindex="0"></pre>"#);
    }

    #[test]
    fn test_empty_root() {
        assert_eq!(Root::default().to_html(), "");
    }
}
