use super::{card, page};
use crate::dom::{Node, parse_document};
use crate::extract::{self, ContainerStrategy};

#[cfg(test)]
mod container_tests {
    use super::*;

    fn cards(n: u32) -> String {
        (1..=n)
            .map(|i| card(i, &format!("Item {i}"), &i.to_string(), "10,00 €"))
            .collect()
    }

    #[test]
    fn test_known_selector_is_preferred() {
        let html = page(&format!(
            r#"<div class="feed-grid">{}</div><div class="web_ui__ItemsGrid__container">{}</div>"#,
            cards(2),
            cards(5)
        ));
        let doc = parse_document(&html);
        let (container, strategy) = extract::locate_container(&doc.root_element()).unwrap();

        assert_eq!(strategy, ContainerStrategy::Selector(".feed-grid"));
        assert_eq!(container.child_nodes().len(), 2);
    }

    #[test]
    fn test_alternate_selector_variant() {
        let html = page(&format!(
            r#"<div data-testid="item-catalog-items">{}</div>"#,
            cards(3)
        ));
        let doc = parse_document(&html);
        let nodes = extract::locate_item_containers(&doc.root_element());
        assert_eq!(nodes.len(), 3);
    }

    #[test]
    fn test_structural_fallback_picks_largest() {
        let html = page(&format!(
            r#"<section><div id="small">{}</div><div id="large">{}</div><div id="plain">{}</div></section>"#,
            cards(11),
            cards(14),
            "<p>x</p>".repeat(30)
        ));
        let doc = parse_document(&html);
        let (container, strategy) = extract::locate_container(&doc.root_element()).unwrap();

        assert_eq!(strategy, ContainerStrategy::Structural);
        assert_eq!(container.attribute("id"), Some("large"));
    }

    #[test]
    fn test_structural_fallback_requires_more_than_ten_children() {
        let html = page(&format!(r#"<div id="grid">{}</div>"#, cards(10)));
        let doc = parse_document(&html);
        assert!(extract::locate_container(&doc.root_element()).is_none());
    }

    #[test]
    fn test_empty_known_container_is_not_found() {
        let html = page(r#"<div class="feed-grid"></div>"#);
        let doc = parse_document(&html);
        let root = doc.root_element();

        assert!(extract::locate_item_containers(&root).is_empty());
        assert!(extract::extract_page(&root).is_none());
    }

    #[test]
    fn test_extract_page_keeps_order_and_drops_linkless() {
        let html = page(&format!(
            r#"<div class="feed-grid">{}<div class="ad-slot"><span>Sponsored 9,99 €</span></div>{}</div>"#,
            card(1, "First", "4", "5,00 €"),
            card(2, "Second", "9", "7,50 €")
        ));
        let doc = parse_document(&html);
        let items = extract::extract_page(&doc.root_element()).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "First");
        assert_eq!(items[1].title, "Second");
        assert!(items.iter().all(|item| !item.href.is_empty()));
    }
}
