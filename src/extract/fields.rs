use crate::dom::Node;
use regex::Regex;
use std::sync::LazyLock;

/// Anchors pointing at an item detail page
const ITEM_LINK: &str = r#"a[href*="/items/"]"#;

/// Favorite button selectors, most specific first
const FAVORITE_BUTTONS: [&str; 3] = [
    r#"button[data-testid*="product-item-id"][data-testid*="favourite"]"#,
    r#"button[data-testid*="favourite"]"#,
    r#"button[aria-label*="favorit"]"#,
];

/// Text-bearing children of the favorite button, skipping icons
const FAVORITE_LABELS: [&str; 2] = ["span.web_ui__Text__text", r#"span:not([class*="Icon"])"#];

/// Price elements, most specific first
const PRICE_ELEMENTS: [&str; 2] = [".web_ui__Text__subtitle", r#"[data-testid*="price"]"#];

static BACKGROUND_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"url\(['"]?(.*?)['"]?\)"#).expect("valid background regex"));

static DECIMAL_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+,\d+").expect("valid price regex"));

/// Returns the first trimmed, non-empty value
fn non_empty(value: Option<impl AsRef<str>>) -> Option<String> {
    value
        .map(|v| v.as_ref().trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Finds the item-detail anchor and returns its trimmed href
pub fn href<N: Node>(item: &N) -> Option<String> {
    let link = item.find(ITEM_LINK)?;
    non_empty(link.attribute("href"))
}

/// Recovers a display title from the anchor, then image alt text
pub fn title<N: Node>(item: &N) -> Option<String> {
    if let Some(link) = item.find(ITEM_LINK) {
        let from_link =
            non_empty(link.attribute("title")).or_else(|| non_empty(Some(link.text_content())));
        if from_link.is_some() {
            return from_link;
        }
    }

    item.find("img[alt]")
        .and_then(|img| non_empty(img.attribute("alt")))
}

/// Parses the leading integer of a favorite label, 0 when there is none
pub fn parse_count(text: &str) -> u32 {
    let digits: String = text
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

/// Reads the favorite count from the item's favorite control
pub fn favorite_count<N: Node>(item: &N) -> u32 {
    let Some(button) = FAVORITE_BUTTONS.iter().find_map(|css| item.find(css)) else {
        ::log::trace!("No favorite control found, defaulting to 0");
        return 0;
    };

    FAVORITE_LABELS
        .iter()
        .find_map(|css| button.find(css))
        .map(|label| label.text_content())
        .filter(|text| !text.trim().is_empty())
        .map(|text| parse_count(&text))
        .unwrap_or(0)
}

/// Extracts the URL from a CSS `background-image: url(...)` declaration
pub fn background_url(style: &str) -> Option<String> {
    BACKGROUND_URL
        .captures(style)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|url| !url.is_empty())
}

/// Recovers the item image, preferring lazy-load attributes
pub fn image_source<N: Node>(item: &N) -> Option<String> {
    let from_img = item.find("img").and_then(|img| {
        non_empty(img.attribute("data-src")).or_else(|| non_empty(img.attribute("src")))
    });
    if from_img.is_some() {
        return from_img;
    }

    item.find(r#"div[style*="background-image"]"#)
        .and_then(|div| div.attribute("style").and_then(background_url))
}

/// Whether a piece of text looks like a price
pub fn looks_like_price(text: &str) -> bool {
    text.contains('€') || DECIMAL_COMMA.is_match(text)
}

/// Recovers the displayed price text
pub fn price<N: Node>(item: &N) -> Option<String> {
    if let Some(found) = PRICE_ELEMENTS
        .iter()
        .find_map(|css| item.find(css))
        .and_then(|el| non_empty(Some(el.text_content())))
    {
        return Some(found);
    }

    // Text nodes, so an outer wrapper never swallows the whole card
    item.find_all("div, span")
        .iter()
        .flat_map(|el| el.own_text())
        .find(|text| looks_like_price(text))
        .and_then(|text| non_empty(Some(text)))
}
