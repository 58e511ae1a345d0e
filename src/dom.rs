//! Element capability layer used by the extraction heuristics.
//!
//! The heuristics only ever need to read attributes, read text, read inner
//! markup, list children and select descendants. Keeping them generic over
//! [`Node`] lets them run against any parsed tree, including small synthetic
//! fragments in tests.

use scraper::{ElementRef, Html, Selector};

/// Read-only view of a DOM element
pub trait Node: Sized + Clone {
    /// Attribute value, if present
    fn attribute(&self, name: &str) -> Option<&str>;

    /// Concatenated text of all descendant text nodes
    fn text_content(&self) -> String;

    /// Text nodes that are direct children of the element
    fn own_text(&self) -> Vec<String>;

    /// Inner markup of the element
    fn markup(&self) -> String;

    /// Direct element children, in document order
    fn child_nodes(&self) -> Vec<Self>;

    /// Descendants matching a CSS selector, in document order.
    /// An unparseable selector matches nothing.
    fn find_all(&self, css: &str) -> Vec<Self>;

    /// First descendant matching a CSS selector
    fn find(&self, css: &str) -> Option<Self> {
        self.find_all(css).into_iter().next()
    }

    /// Whether the element carries the given class
    fn has_class(&self, class: &str) -> bool {
        self.attribute("class")
            .map(|classes| classes.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

impl<'a> Node for ElementRef<'a> {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.value().attr(name)
    }

    fn text_content(&self) -> String {
        self.text().collect()
    }

    fn own_text(&self) -> Vec<String> {
        self.children()
            .filter_map(|child| child.value().as_text().map(|t| String::from(&**t)))
            .collect()
    }

    fn markup(&self) -> String {
        self.inner_html()
    }

    fn child_nodes(&self) -> Vec<Self> {
        self.child_elements().collect()
    }

    fn find_all(&self, css: &str) -> Vec<Self> {
        match Selector::parse(css) {
            Ok(selector) => self.select(&selector).collect(),
            Err(e) => {
                ::log::warn!("Ignoring invalid selector {:?}: {:?}", css, e);
                Vec::new()
            }
        }
    }
}

/// Parses page source into a document tree.
///
/// Scripting is on, so `<noscript>` content is kept as text.
pub fn parse_document(source: &str) -> Html {
    Html::parse_document(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_attributes_text_and_children() {
        let doc = parse_document(
            r#"<div id="root" class="grid wide"><p title="t">one <b>two</b></p><span>three</span></div>"#,
        );
        let root = doc.root_element().find("#root").unwrap();

        assert!(root.has_class("grid"));
        assert!(!root.has_class("gri"));
        assert_eq!(root.child_nodes().len(), 2);

        let p = root.find("p").unwrap();
        assert_eq!(p.attribute("title"), Some("t"));
        assert_eq!(p.text_content(), "one two");
        assert_eq!(p.own_text(), vec!["one ".to_string()]);
        assert_eq!(p.markup(), "one <b>two</b>");
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let doc = parse_document("<div><p>x</p></div>");
        assert!(doc.root_element().find_all("p[[").is_empty());
        assert!(doc.root_element().find("p[[").is_none());
    }
}
