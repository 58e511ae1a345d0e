pub mod fields;

#[cfg(test)]
pub(crate) mod tests;

use crate::dom::Node;
use crate::results::{ItemRecord, UNTITLED};

/// Known item container selectors, in the order they are tried
pub const CONTAINER_SELECTORS: [&str; 3] = [
    ".feed-grid",
    r#"[data-testid="item-catalog-items"]"#,
    ".web_ui__ItemsGrid__container",
];

/// A structural container must have more children than this
const MIN_STRUCTURAL_CHILDREN: usize = 10;

/// Marker that a child node is a catalog item
const FAVORITE_MARKER: &str = r#"button[data-testid*="favourite"]"#;

/// How the item container was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStrategy {
    /// One of the known container selectors matched
    Selector(&'static str),
    /// A large element whose children carry favorite controls
    Structural,
}

/// Finds the item container and returns it with the strategy that matched.
///
/// Selector strategies only count when the container has children.
pub fn locate_container<N: Node>(root: &N) -> Option<(N, ContainerStrategy)> {
    for css in CONTAINER_SELECTORS {
        if let Some(container) = root.find(css) {
            if !container.child_nodes().is_empty() {
                ::log::debug!("Item container matched selector {}", css);
                return Some((container, ContainerStrategy::Selector(css)));
            }
            ::log::debug!("Container {} matched but has no children", css);
        }
    }

    // Iterator::max_by_key keeps the last of equal maxima
    let structural = root
        .find_all("div")
        .into_iter()
        .filter_map(|div| {
            let children = div.child_nodes();
            let qualifies = children.len() > MIN_STRUCTURAL_CHILDREN
                && children
                    .iter()
                    .any(|child| child.find(FAVORITE_MARKER).is_some());
            qualifies.then_some((children.len(), div))
        })
        .max_by_key(|(count, _)| *count)
        .map(|(_, div)| div);

    match structural {
        Some(div) => {
            ::log::debug!("Item container found structurally");
            Some((div, ContainerStrategy::Structural))
        }
        None => {
            ::log::debug!("No item container found");
            None
        }
    }
}

/// Returns the candidate item nodes of the page, empty when no container
/// could be located.
pub fn locate_item_containers<N: Node>(root: &N) -> Vec<N> {
    locate_container(root)
        .map(|(container, _)| container.child_nodes())
        .unwrap_or_default()
}

/// Recovers one item record from a candidate node.
///
/// Returns `None` when the node has no item link; every other field falls
/// back to its default.
pub fn extract_item<N: Node>(node: &N) -> Option<ItemRecord> {
    let Some(href) = fields::href(node) else {
        ::log::trace!("Dropping candidate without an item link");
        return None;
    };

    let title = fields::title(node).unwrap_or_else(|| UNTITLED.to_string());
    let image_source = fields::image_source(node).unwrap_or_default();
    let price = fields::price(node).unwrap_or_default();
    let favorite_count = fields::favorite_count(node);

    Some(ItemRecord::new(
        title,
        href,
        image_source,
        price,
        favorite_count,
    ))
}

/// Extracts item records from candidate nodes, preserving order
pub fn extract<N: Node>(nodes: &[N]) -> Vec<ItemRecord> {
    let items: Vec<ItemRecord> = nodes.iter().filter_map(extract_item).collect();
    ::log::debug!(
        "Extracted {} items from {} candidates",
        items.len(),
        nodes.len()
    );
    items
}

/// Locates the item container of a page and extracts its items.
///
/// `None` means no container was found.
pub fn extract_page<N: Node>(root: &N) -> Option<Vec<ItemRecord>> {
    let nodes = locate_item_containers(root);
    if nodes.is_empty() {
        return None;
    }
    Some(extract(&nodes))
}
