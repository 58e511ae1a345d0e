use serde::{Deserialize, Serialize};

/// Placeholder title for items whose name could not be recovered
pub const UNTITLED: &str = "Untitled Item";

/// One catalog entry recovered from a listing page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    /// Display title (never empty)
    pub title: String,

    /// Link to the item detail page, possibly relative to the site origin
    pub href: String,

    /// Image URL, empty when the item has no image
    #[serde(rename = "imgSrc", default)]
    pub image_source: String,

    /// Raw price text as displayed
    #[serde(default)]
    pub price: String,

    /// Number of favorites, 0 when unknown
    #[serde(default)]
    pub favorite_count: u32,
}

impl ItemRecord {
    /// Create a new item record
    pub fn new(
        title: String,
        href: String,
        image_source: String,
        price: String,
        favorite_count: u32,
    ) -> Self {
        Self {
            title,
            href,
            image_source,
            price,
            favorite_count,
        }
    }
}

/// The resumable state of one multi-page collection run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionState {
    /// Items in page-visitation order
    pub items: Vec<ItemRecord>,

    /// Index of the next page to collect (1-based)
    pub current_page: u32,

    /// Whether a run is in progress
    pub is_collecting: bool,

    /// Advisory page count, 0 when unknown
    pub total_pages_estimate: u32,

    /// URL of the page to collect next, once known
    pub resume_url: Option<String>,

    /// URL of the page collected last; its next page is `current_page`
    pub last_url: Option<String>,
}

impl Default for CollectionState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current_page: 1,
            is_collecting: false,
            total_pages_estimate: 0,
            resume_url: None,
            last_url: None,
        }
    }
}

impl CollectionState {
    /// A freshly started run
    pub fn started(total_pages_estimate: u32) -> Self {
        Self {
            is_collecting: true,
            total_pages_estimate,
            ..Self::default()
        }
    }
}
