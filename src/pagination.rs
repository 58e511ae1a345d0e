use crate::dom::Node;
use serde::{Deserialize, Serialize};

/// Buttons of the themed pagination bar
pub const PAGINATION_BUTTON: &str = ".web_ui__Pagination__button";

/// Class marking the active pagination button
const ACTIVE_CLASS: &str = "web_ui__Pagination__button--active";

/// Direct "next" controls, most specific first
const NEXT_CONTROLS: [(NextStrategy, &str); 3] = [
    (NextStrategy::RelNext, r#"a[rel="next"]"#),
    (NextStrategy::AriaLabel, r#"button[aria-label="Next page"]"#),
    (NextStrategy::ThemedButton, ".web_ui__Pagination__button--next"),
];

/// Which heuristic produced an activator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextStrategy {
    RelNext,
    AriaLabel,
    ThemedButton,
    AfterCurrent,
    TextScan,
}

/// Handle to a "next page" control: the `index`-th element matching `selector`.
///
/// Positions agree with the live page because [`parse_document`] treats
/// `<noscript>` content as text, as a scripting browser does.
///
/// [`parse_document`]: crate::dom::parse_document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activator {
    pub strategy: NextStrategy,
    pub selector: String,
    pub index: usize,
}

impl Activator {
    fn new(strategy: NextStrategy, selector: &str, index: usize) -> Self {
        Self {
            strategy,
            selector: selector.to_string(),
            index,
        }
    }

    /// Resolves the activator against a parsed page
    pub fn resolve<N: Node>(&self, root: &N) -> Option<N> {
        root.find_all(&self.selector).into_iter().nth(self.index)
    }
}

/// Finds the control that leads to the next results page.
///
/// `None` means there are no further pages.
pub fn find_next<N: Node>(root: &N) -> Option<Activator> {
    for (strategy, css) in NEXT_CONTROLS {
        if root.find(css).is_some() {
            ::log::debug!("Next page control found via {:?}", strategy);
            return Some(Activator::new(strategy, css, 0));
        }
    }

    if let Some(activator) = after_current(root) {
        return Some(activator);
    }

    let scanned = root
        .find_all("button")
        .iter()
        .position(|button| {
            let markup = button.markup();
            button.text_content().contains("Next")
                || markup.contains('→')
                || markup.contains("&rarr;")
        })
        .map(|index| Activator::new(NextStrategy::TextScan, "button", index));

    if scanned.is_none() {
        ::log::debug!("No next page control found");
    }
    scanned
}

/// The pagination button right after the one marked current
fn after_current<N: Node>(root: &N) -> Option<Activator> {
    let buttons = root.find_all(PAGINATION_BUTTON);
    let current = buttons.iter().position(|button| {
        button.attribute("aria-current") == Some("true") || button.has_class(ACTIVE_CLASS)
    })?;

    if current + 1 < buttons.len() {
        ::log::debug!("Next page control follows current button {}", current);
        Some(Activator::new(
            NextStrategy::AfterCurrent,
            PAGINATION_BUTTON,
            current + 1,
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;

    fn next_in(body: &str) -> Option<Activator> {
        let doc = parse_document(&format!("<html><body>{body}</body></html>"));
        find_next(&doc.root_element())
    }

    #[test]
    fn test_rel_next_wins() {
        let activator = next_in(
            r#"<a rel="next" href="?page=2">2</a><button aria-label="Next page">›</button>"#,
        )
        .unwrap();
        assert_eq!(activator.strategy, NextStrategy::RelNext);
        assert_eq!(activator.index, 0);
    }

    #[test]
    fn test_labeled_and_themed_buttons() {
        let labeled = next_in(r#"<button aria-label="Next page">›</button>"#).unwrap();
        assert_eq!(labeled.strategy, NextStrategy::AriaLabel);

        let themed = next_in(
            r#"<nav><button class="web_ui__Pagination__button web_ui__Pagination__button--next">›</button></nav>"#,
        )
        .unwrap();
        assert_eq!(themed.strategy, NextStrategy::ThemedButton);
    }

    #[test]
    fn test_button_after_current() {
        let body = r#"<nav>
            <a class="web_ui__Pagination__button">1</a>
            <a class="web_ui__Pagination__button" aria-current="true">2</a>
            <a class="web_ui__Pagination__button">3</a>
        </nav>"#;
        let doc = parse_document(&format!("<html><body>{body}</body></html>"));
        let root = doc.root_element();
        let activator = find_next(&root).unwrap();

        assert_eq!(activator.strategy, NextStrategy::AfterCurrent);
        assert_eq!(activator.index, 2);
        assert_eq!(activator.resolve(&root).unwrap().text_content(), "3");
    }

    #[test]
    fn test_active_class_on_last_button_has_no_next() {
        let body = r#"<nav>
            <a class="web_ui__Pagination__button">1</a>
            <a class="web_ui__Pagination__button web_ui__Pagination__button--active">2</a>
        </nav>"#;
        assert!(next_in(body).is_none());
    }

    #[test]
    fn test_no_current_marker_returns_none() {
        let body = r#"<nav>
            <a class="web_ui__Pagination__button">1</a>
            <a class="web_ui__Pagination__button">2</a>
            <a class="web_ui__Pagination__button">3</a>
        </nav>"#;
        assert!(next_in(body).is_none());
    }

    #[test]
    fn test_text_scan() {
        let by_text = next_in(r#"<button>Filter</button><button>Next results</button>"#).unwrap();
        assert_eq!(by_text.strategy, NextStrategy::TextScan);
        assert_eq!(by_text.selector, "button");
        assert_eq!(by_text.index, 1);

        let by_arrow = next_in(r#"<button>Back</button><button><span>→</span></button>"#).unwrap();
        assert_eq!(by_arrow.index, 1);
    }

    #[test]
    fn test_noscript_buttons_do_not_shift_positions() {
        let activator = next_in(
            r#"<noscript><button>Next</button></noscript><button>Filter</button><button>Next results</button>"#,
        )
        .unwrap();
        assert_eq!(activator.strategy, NextStrategy::TextScan);
        assert_eq!(activator.index, 1);

        let body = r#"<nav>
            <noscript><a class="web_ui__Pagination__button">0</a></noscript>
            <a class="web_ui__Pagination__button" aria-current="true">1</a>
            <a class="web_ui__Pagination__button">2</a>
        </nav>"#;
        let after = next_in(body).unwrap();
        assert_eq!(after.strategy, NextStrategy::AfterCurrent);
        assert_eq!(after.index, 1);
    }
}
