// SPDX-License-Identifier: AGPL-3.0-or-later
//! Typed HTML document builder
//!
//! Text nodes and attribute values are escaped when the tree is written out.
//! The only way to emit unescaped markup is a [`Markup`] value, which can only
//! be produced by the markup flattener.

use crate::markup::Markup;

/// Elements that never take a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.iter().any(|v| v.eq_ignore_ascii_case(tag))
}

/// Escape text for an element body
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape text for a double-quoted attribute value
pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(ch),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribute {
    Value(String, String),
    /// Boolean attribute such as `checked`
    Flag(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    Markup(Markup),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: &'static str,
    attributes: Vec<Attribute>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &'static str) -> Self {
        Self {
            tag,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn class(self, class: &str) -> Self {
        self.attr("class", class)
    }

    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes
            .push(Attribute::Value(name.to_string(), value.into()));
        self
    }

    pub fn flag(mut self, name: &str) -> Self {
        self.attributes.push(Attribute::Flag(name.to_string()));
        self
    }

    /// Add a boolean attribute only when `on` is set
    pub fn flag_if(self, name: &str, on: bool) -> Self {
        if on {
            self.flag(name)
        } else {
            self
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I, N>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn markup(mut self, markup: Markup) -> Self {
        self.children.push(Node::Markup(markup));
        self
    }

    pub fn write_to(&self, out: &mut String, depth: usize) {
        indent(out, depth);
        self.write_open_tag(out);
        if is_void(self.tag) {
            out.push('\n');
            return;
        }

        // Elements holding only text stay on one line
        let inline = self
            .children
            .iter()
            .all(|c| !matches!(c, Node::Element(_)));
        if inline {
            for child in &self.children {
                write_inline(out, child);
            }
        } else {
            out.push('\n');
            for child in &self.children {
                match child {
                    Node::Element(element) => element.write_to(out, depth + 1),
                    other => {
                        indent(out, depth + 1);
                        write_inline(out, other);
                        out.push('\n');
                    }
                }
            }
            indent(out, depth);
        }
        out.push_str("</");
        out.push_str(self.tag);
        out.push_str(">\n");
    }

    fn write_open_tag(&self, out: &mut String) {
        out.push('<');
        out.push_str(self.tag);
        for attribute in &self.attributes {
            match attribute {
                Attribute::Value(name, value) => {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(&escape_attribute(value));
                    out.push('"');
                }
                Attribute::Flag(name) => {
                    out.push(' ');
                    out.push_str(name);
                }
            }
        }
        out.push('>');
    }
}

fn write_inline(out: &mut String, node: &Node) {
    match node {
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Markup(markup) => out.push_str(markup.as_str()),
        Node::Element(element) => {
            let mut nested = String::new();
            element.write_to(&mut nested, 0);
            out.push_str(nested.trim_end());
        }
    }
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

/// A complete, self-contained HTML page
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    pub lang: String,
    pub title: String,
    /// Inline stylesheet contents
    pub styles: Vec<String>,
    pub body: Element,
}

/// Break every `</style` (any case) so a stylesheet cannot end its element
fn escape_style_end(css: &str) -> String {
    let lower = css.to_ascii_lowercase();
    let mut out = String::with_capacity(css.len());
    let mut last = 0;
    for (start, _) in lower.match_indices("</style") {
        out.push_str(&css[last..start]);
        out.push_str("<\\/");
        last = start + 2;
    }
    out.push_str(&css[last..]);
    out
}

impl HtmlDocument {
    pub fn new(title: impl Into<String>, body: Element) -> Self {
        Self {
            lang: "en".to_string(),
            title: title.into(),
            styles: Vec::new(),
            body,
        }
    }

    pub fn with_style(mut self, css: impl Into<String>) -> Self {
        self.styles.push(css.into());
        self
    }

    pub fn to_html(&self) -> String {
        let mut out = String::from("<!DOCTYPE html>\n");
        out.push_str(&format!("<html lang=\"{}\">\n", escape_attribute(&self.lang)));
        out.push_str("<head>\n");
        out.push_str("  <meta charset=\"UTF-8\">\n");
        out.push_str(
            "  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
        );
        out.push_str(&format!("  <title>{}</title>\n", escape_text(&self.title)));
        for css in &self.styles {
            // Stylesheets come from the crate or the operator's config, never the export
            out.push_str("  <style>\n");
            out.push_str(&escape_style_end(css));
            if !css.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("  </style>\n");
        }
        out.push_str("</head>\n");
        self.body.write_to(&mut out, 0);
        out.push_str("</html>\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn render(element: &Element) -> String {
        let mut out = String::new();
        element.write_to(&mut out, 0);
        out
    }

    #[test]
    fn test_text_is_escaped() {
        let el = Element::new("p").text("<script>alert('x')</script> & more");
        assert_eq!(
            render(&el),
            "<p>&lt;script&gt;alert('x')&lt;/script&gt; &amp; more</p>\n"
        );
    }

    #[test]
    fn test_attribute_is_escaped() {
        let el = Element::new("input").attr("value", "\"><b>x</b>'");
        assert_eq!(
            render(&el),
            "<input value=\"&quot;&gt;&lt;b&gt;x&lt;/b&gt;&#x27;\">\n"
        );
    }

    #[test]
    fn test_nested_elements_indent() {
        let el = Element::new("ul")
            .class("list")
            .child(Element::new("li").text("one"))
            .child(Element::new("li").text("two"));
        assert_eq!(
            render(&el),
            "<ul class=\"list\">\n  <li>one</li>\n  <li>two</li>\n</ul>\n"
        );
    }

    #[test]
    fn test_flags() {
        let el = Element::new("input")
            .attr("type", "checkbox")
            .flag_if("checked", true)
            .flag_if("disabled", false);
        assert_eq!(render(&el), "<input type=\"checkbox\" checked>\n");
    }

    #[test]
    fn test_document_shell() {
        let doc = HtmlDocument::new("Sheet - <Vex>", Element::new("body"))
            .with_style("body { color: red; }");
        let html = doc.to_html();
        assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"en\">"));
        assert!(html.contains("<title>Sheet - &lt;Vex&gt;</title>"));
        assert!(html.contains("body { color: red; }"));
        assert!(html.ends_with("</html>\n"));
    }

    #[test]
    fn test_style_end_in_any_case_is_broken() {
        let doc = HtmlDocument::new("t", Element::new("body"))
            .with_style("a{}</style><script>x</script>")
            .with_style("b{}</STYLE ><p>")
            .with_style("c{}</StYlE>");
        let html = doc.to_html();
        assert_eq!(html.matches("</style>").count(), 3);
        assert!(html.contains("a{}<\\/style><script>"));
        assert!(html.contains("b{}<\\/STYLE ><p>"));
        assert!(html.contains("c{}<\\/StYlE>"));
        assert!(!html.to_ascii_lowercase().contains("}</style"));
    }
}
