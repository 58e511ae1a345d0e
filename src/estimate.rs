use crate::dom::Node;
use crate::pagination::PAGINATION_BUTTON;
use regex::Regex;
use std::sync::LazyLock;

/// Pagination summary such as "1 - 96 de 1.250 resultados"
const PAGINATION_INFO: &str = ".web_ui__Pagination__info";

static TOTAL_ITEMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:de|of)\s+(\d[\d.,]*)").expect("valid pagination summary regex")
});

/// Total item count from a localized "X of N" summary
pub fn total_from_summary(text: &str) -> Option<u32> {
    let caps = TOTAL_ITEMS.captures(text)?;
    let digits: String = caps[1].chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Number of pages needed for `total` items, rounding up
pub fn pages_for(total: u32, page_size: u32) -> u32 {
    total.div_ceil(page_size.max(1))
}

/// Estimates how many result pages the listing has.
///
/// Advisory only: it feeds the progress display and never bounds traversal.
/// Returns 1 when the page has no pagination UI at all.
pub fn estimate<N: Node>(root: &N, page_size: u32, default_guess: u32) -> u32 {
    if let Some(total) = root
        .find(PAGINATION_INFO)
        .and_then(|info| total_from_summary(&info.text_content()))
    {
        let pages = pages_for(total, page_size);
        ::log::info!("Estimated {} pages from {} items", pages, total);
        return pages;
    }

    let buttons = root.find_all(PAGINATION_BUTTON);
    if buttons.is_empty() {
        ::log::debug!("No pagination found, assuming a single page");
        return 1;
    }

    match buttons
        .iter()
        .filter_map(|button| button.text_content().trim().parse::<u32>().ok())
        .max()
    {
        Some(highest) => {
            ::log::info!("Estimated {} pages from pagination buttons", highest);
            highest
        }
        None => {
            ::log::debug!("Pagination has no page numbers, guessing {}", default_guess);
            default_guess
        }
    }
}
