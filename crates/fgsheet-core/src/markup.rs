// SPDX-License-Identifier: AGPL-3.0-or-later
//! Flattening of formatted-text fields into embeddable HTML
//!
//! Fantasy Grounds stores rich text (spell descriptions, notes) as a small
//! HTML-like element tree. Flattening re-serialises that tree with every text
//! node escaped, then drops lines that repeat an earlier line of the same
//! block. Exports often carry each paragraph twice.
//!
//! Only the formatted-text vocabulary survives. Other elements are unwrapped
//! to their text, so nothing in an export can add links, scripts or external
//! resources to the page.

use crate::dom::{escape_text, is_void};
use roxmltree::{Node, NodeType};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Elements dropped together with their content
const DROPPED_ELEMENTS: &[&str] = &["script", "style", "iframe", "object"];

/// Formatted-text tags that are kept, and the HTML tag each one becomes
const ALLOWED_ELEMENTS: &[(&str, &str)] = &[
    ("p", "p"),
    ("b", "b"),
    ("i", "i"),
    ("u", "u"),
    ("em", "em"),
    ("strong", "strong"),
    ("sub", "sub"),
    ("sup", "sup"),
    ("h", "h4"),
    ("list", "ul"),
    ("linklist", "ul"),
    ("li", "li"),
    ("link", "span"),
    ("frame", "blockquote"),
    ("table", "table"),
    ("tr", "tr"),
    ("td", "td"),
    ("th", "th"),
    ("br", "br"),
    ("hr", "hr"),
];

/// Attributes kept on allowed elements, only with small numeric values
const ALLOWED_ATTRIBUTES: &[&str] = &["colspan", "rowspan"];

/// HTML fragment that is safe to embed without further escaping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Markup(String);

impl Markup {
    /// Plain text, escaped
    pub fn escaped(text: &str) -> Self {
        Self(escape_text(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Strings from outside the flattener are treated as plain text
impl From<String> for Markup {
    fn from(text: String) -> Self {
        Self::escaped(&text)
    }
}

impl From<Markup> for String {
    fn from(markup: Markup) -> Self {
        markup.0
    }
}

/// Flatten a formatted-text element into deduplicated HTML
///
/// The element's own leading text comes first, followed by every child
/// element (with the text trailing it) in document order.
pub fn flatten(element: Option<Node<'_, '_>>) -> Markup {
    let Some(element) = element else {
        return Markup::default();
    };

    let mut leading = String::new();
    let mut body = String::new();
    let mut seen_element = false;
    for child in element.children() {
        match child.node_type() {
            NodeType::Element => {
                seen_element = true;
                write_element(&mut body, child);
            }
            NodeType::Text if !seen_element => leading.push_str(child.text().unwrap_or_default()),
            NodeType::Text => body.push_str(&escape_text(child.text().unwrap_or_default())),
            _ => {}
        }
    }

    let mut html = escape_text(leading.trim());
    html.push_str(&body);
    Markup(dedupe_lines(html.trim()))
}

fn html_tag(tag: &str) -> Option<&'static str> {
    ALLOWED_ELEMENTS
        .iter()
        .find(|(source, _)| source.eq_ignore_ascii_case(tag))
        .map(|(_, html)| *html)
}

fn is_small_number(value: &str) -> bool {
    (1..=3).contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit())
}

fn write_element(out: &mut String, node: Node<'_, '_>) {
    let tag = node.tag_name().name();
    if DROPPED_ELEMENTS.iter().any(|d| d.eq_ignore_ascii_case(tag)) {
        return;
    }
    let Some(html) = html_tag(tag) else {
        write_children(out, node);
        return;
    };

    out.push('<');
    out.push_str(html);
    for attribute in node.attributes() {
        let name = attribute.name().to_ascii_lowercase();
        if ALLOWED_ATTRIBUTES.contains(&name.as_str()) && is_small_number(attribute.value()) {
            out.push_str(&format!(" {name}=\"{}\"", attribute.value()));
        }
    }
    out.push('>');

    if is_void(html) {
        return;
    }
    write_children(out, node);
    out.push_str("</");
    out.push_str(html);
    out.push('>');
}

fn write_children(out: &mut String, node: Node<'_, '_>) {
    for child in node.children() {
        match child.node_type() {
            NodeType::Element => write_element(out, child),
            NodeType::Text => out.push_str(&escape_text(child.text().unwrap_or_default())),
            _ => {}
        }
    }
}

/// Drop every line whose trimmed content already appeared in the block
///
/// The first occurrence wins and order is kept. Blank lines are kept and never
/// count as seen. The result is trimmed.
pub fn dedupe_lines(text: &str) -> String {
    let mut seen = HashSet::new();
    let kept: Vec<&str> = text
        .split('\n')
        .filter(|line| {
            let trimmed = line.trim();
            trimmed.is_empty() || seen.insert(trimmed)
        })
        .collect();
    kept.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeExt;
    use pretty_assertions::assert_eq;

    fn flatten_str(xml: &str) -> String {
        let doc = roxmltree::Document::parse(xml).unwrap();
        let description = doc.root_element().child("description");
        flatten(description).as_str().to_string()
    }

    #[test]
    fn test_flatten_paragraphs() {
        let out = flatten_str(
            "<power><description type=\"formattedtext\">\n<p>A bright streak.</p>\n<p>Each creature <b>must</b> save.</p>\n</description></power>",
        );
        assert_eq!(out, "<p>A bright streak.</p>\n<p>Each creature <b>must</b> save.</p>");
    }

    #[test]
    fn test_flatten_removes_duplicate_paragraphs() {
        let out = flatten_str(
            "<power><description>\n<p>Same.</p>\n<p>Other.</p>\n<p>Same.</p>\n</description></power>",
        );
        assert_eq!(out, "<p>Same.</p>\n<p>Other.</p>");
    }

    #[test]
    fn test_flatten_leading_text_and_escaping() {
        let out = flatten_str("<r><description>  1 &lt; 2 <i>x &amp; y</i></description></r>");
        assert_eq!(out, "1 &lt; 2<i>x &amp; y</i>");
    }

    #[test]
    fn test_flatten_drops_scripts_and_attributes() {
        let out = flatten_str(
            "<r><description><p onclick=\"evil()\" class=\"a\">ok</p><script>evil()</script></description></r>",
        );
        assert_eq!(out, "<p>ok</p>");
    }

    #[test]
    fn test_flatten_unwraps_links() {
        let out = flatten_str(
            "<r><description><p><a href=\"javascript:alert(1)\">click</a></p></description></r>",
        );
        assert_eq!(out, "<p>click</p>");
    }

    #[test]
    fn test_flatten_drops_external_resources() {
        let out = flatten_str(
            "<r><description><p>a<img src=\"http://evil.example/x.png\"/>b</p></description></r>",
        );
        assert_eq!(out, "<p>ab</p>");
        assert_eq!(
            flatten_str("<r><description><base href=\"http://evil.example/\"/>x</description></r>"),
            "x"
        );
    }

    #[test]
    fn test_flatten_drops_meta_refresh() {
        let out = flatten_str(
            "<r><description><meta http-equiv=\"refresh\" content=\"0;url=http://evil.example\"/><p>x</p></description></r>",
        );
        assert_eq!(out, "<p>x</p>");
    }

    #[test]
    fn test_flatten_unwraps_raw_text_elements() {
        let out = flatten_str(
            "<r><description><plaintext>raw <b>bold</b></plaintext><p>after</p></description></r>",
        );
        assert_eq!(out, "raw <b>bold</b><p>after</p>");
    }

    #[test]
    fn test_flatten_maps_formatted_text_tags() {
        let out = flatten_str(
            "<r><description><h>Effects</h><list><li>one</li></list><frame>quoted</frame></description></r>",
        );
        assert_eq!(out, "<h4>Effects</h4><ul><li>one</li></ul><blockquote>quoted</blockquote>");
    }

    #[test]
    fn test_flatten_table_spans() {
        let out = flatten_str(
            "<r><description><table><tr><td colspan=\"2\" style=\"x\">a</td><td rowspan=\"2x\">b</td></tr></table></description></r>",
        );
        assert_eq!(
            out,
            "<table><tr><td colspan=\"2\">a</td><td>b</td></tr></table>"
        );
    }

    #[test]
    fn test_flatten_void_elements() {
        let out = flatten_str("<r><description><p>one<br/>two</p></description></r>");
        assert_eq!(out, "<p>one<br>two</p>");
    }

    #[test]
    fn test_flatten_missing_element() {
        assert!(flatten(None).is_empty());
        assert_eq!(flatten_str("<r/>"), "");
    }

    #[test]
    fn test_dedupe_keeps_blank_lines() {
        assert_eq!(dedupe_lines("a\n\nb\n\na\n  b  \nc"), "a\n\nb\n\nc");
    }

    #[test]
    fn test_markup_from_string_escapes() {
        let markup = Markup::from("<b>hi</b>".to_string());
        assert_eq!(markup.as_str(), "&lt;b&gt;hi&lt;/b&gt;");
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn block_strategy() -> impl Strategy<Value = String> {
        prop::collection::vec(
            prop_oneof![
                Just(String::new()),
                Just("   ".to_string()),
                "[a-c]{1,3}",
                " [a-c]{1,2} ",
            ],
            0..12,
        )
        .prop_map(|lines| lines.join("\n"))
    }

    proptest! {
        // Property: a second pass over deduplicated output changes nothing
        #[test]
        fn prop_dedupe_idempotent(text in block_strategy()) {
            let once = dedupe_lines(&text);
            prop_assert_eq!(dedupe_lines(&once), once.clone());
        }

        // Property: no non-blank trimmed line appears twice in the output
        #[test]
        fn prop_dedupe_unique_lines(text in block_strategy()) {
            let out = dedupe_lines(&text);
            let mut seen = HashSet::new();
            for line in out.split('\n').map(str::trim).filter(|l| !l.is_empty()) {
                prop_assert!(seen.insert(line.to_string()));
            }
        }
    }
}
