// SPDX-License-Identifier: AGPL-3.0-or-later
//! Total lookups over the parsed export tree
//!
//! Exports are routinely partial. Every accessor here returns an `Option` or a
//! caller-supplied default instead of failing, so a missing element never stops
//! extraction.

use roxmltree::Node;

/// Navigation helpers for `roxmltree` element nodes
pub trait NodeExt<'a, 'input> {
    /// First element child with the given tag name
    fn first_child_named(&self, name: &str) -> Option<Node<'a, 'input>>;

    /// Element at a `/`-separated path of tag names below this node
    fn child(&self, path: &str) -> Option<Node<'a, 'input>>;

    /// Text at `path`, or `default` when the node is missing or its text is empty
    fn text_or(&self, path: &str, default: &str) -> String;

    /// Text at `path`, empty when missing
    fn text_at(&self, path: &str) -> String {
        self.text_or(path, "")
    }

    /// `true` only when the text at `path` is exactly "1"
    fn flag(&self, path: &str) -> bool {
        self.text_or(path, "0") == "1"
    }

    /// Element children in document order
    fn elements(&self) -> Box<dyn Iterator<Item = Node<'a, 'input>> + 'a>;
}

impl<'a, 'input: 'a> NodeExt<'a, 'input> for Node<'a, 'input> {
    fn first_child_named(&self, name: &str) -> Option<Node<'a, 'input>> {
        self.children()
            .find(|n| n.is_element() && n.tag_name().name() == name)
    }

    fn child(&self, path: &str) -> Option<Node<'a, 'input>> {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .try_fold(*self, |node, segment| node.first_child_named(segment))
    }

    fn text_or(&self, path: &str, default: &str) -> String {
        self.child(path)
            .and_then(|node| node.text())
            .filter(|text| !text.is_empty())
            .map_or_else(|| default.to_string(), str::to_string)
    }

    fn elements(&self) -> Box<dyn Iterator<Item = Node<'a, 'input>> + 'a> {
        Box::new(self.children().filter(|n| n.is_element()))
    }
}

/// Lookup on an optional parent; a missing parent yields `default`
pub fn lookup(node: Option<Node<'_, '_>>, path: &str, default: &str) -> String {
    node.map_or_else(|| default.to_string(), |n| n.text_or(path, default))
}

/// Whether element nesting in `text` goes deeper than `limit`
///
/// A single pass over the raw bytes, run before handing the text to the
/// recursive parser. Comments, CDATA, processing instructions and
/// declarations are skipped; quoted attribute values may contain `>`.
pub fn exceeds_depth(text: &str, limit: usize) -> bool {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while let Some(offset) = bytes[i..].iter().position(|&b| b == b'<') {
        let start = i + offset;
        let rest = &bytes[start..];
        let skip_to = |marker: &[u8]| {
            rest.windows(marker.len())
                .position(|w| w == marker)
                .map_or(bytes.len(), |p| start + p + marker.len())
        };

        if rest.starts_with(b"<!--") {
            i = skip_to(b"-->");
        } else if rest.starts_with(b"<![CDATA[") {
            i = skip_to(b"]]>");
        } else if rest.starts_with(b"<?") {
            i = skip_to(b"?>");
        } else if rest.starts_with(b"<!") {
            i = skip_to(b">");
        } else if rest.starts_with(b"</") {
            depth = depth.saturating_sub(1);
            i = skip_to(b">");
        } else {
            let mut quote = None;
            let mut end = start + 1;
            let mut self_closing = false;
            while end < bytes.len() {
                let b = bytes[end];
                match quote {
                    Some(q) if b == q => quote = None,
                    Some(_) => {}
                    None if b == b'"' || b == b'\'' => quote = Some(b),
                    None if b == b'>' => {
                        self_closing = bytes[end - 1] == b'/';
                        break;
                    }
                    None => {}
                }
                end += 1;
            }
            if !self_closing {
                depth += 1;
                if depth > limit {
                    return true;
                }
            }
            i = (end + 1).min(bytes.len());
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<root>
        <character>
            <name type="string">Vex</name>
            <empty type="string"></empty>
            <hp><total type="number">31</total></hp>
            <list><a/><b/>text<c/></list>
        </character>
    </root>"#;

    fn with_character<F: FnOnce(Node<'_, '_>)>(f: F) {
        let doc = roxmltree::Document::parse(SAMPLE).unwrap();
        let character = doc.root_element().child("character").unwrap();
        f(character);
    }

    #[test]
    fn test_text_lookup() {
        with_character(|c| {
            assert_eq!(c.text_at("name"), "Vex");
            assert_eq!(c.text_at("hp/total"), "31");
        });
    }

    #[test]
    fn test_missing_and_empty_use_default() {
        with_character(|c| {
            assert_eq!(c.text_or("missing", "fallback"), "fallback");
            assert_eq!(c.text_or("empty", "fallback"), "fallback");
            assert_eq!(c.text_or("hp/missing/deeper", "10"), "10");
        });
    }

    #[test]
    fn test_lookup_on_absent_parent() {
        assert_eq!(lookup(None, "total", "30"), "30");
        with_character(|c| {
            assert_eq!(lookup(c.child("hp"), "total", "0"), "31");
        });
    }

    #[test]
    fn test_elements_skip_text() {
        with_character(|c| {
            let list = c.child("list").unwrap();
            let names: Vec<&str> = list.elements().map(|n| n.tag_name().name()).collect();
            assert_eq!(names, vec!["a", "b", "c"]);
        });
    }

    #[test]
    fn test_flag() {
        let doc =
            roxmltree::Document::parse("<r><on>1</on><off>0</off><odd>yes</odd></r>").unwrap();
        let root = doc.root_element();
        assert!(root.flag("on"));
        assert!(!root.flag("off"));
        assert!(!root.flag("odd"));
        assert!(!root.flag("absent"));
    }

    #[test]
    fn test_exceeds_depth() {
        assert!(!exceeds_depth("<a><b><c/></b></a>", 2));
        assert!(exceeds_depth("<a><b><c></c></b></a>", 2));
        assert!(!exceeds_depth("<a><b/><b/><b/></a>", 2));
        assert!(!exceeds_depth(
            "<a x=\"1 > 0\"><!-- <b><c><d> --><![CDATA[<e><f>]]></a>",
            1
        ));
        assert!(!exceeds_depth("<?xml version=\"1.0\"?><a>unterminated", 1));
        assert!(exceeds_depth(&"<p>".repeat(1000), 256));
    }
}
