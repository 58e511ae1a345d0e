//! Sort & present: the synthetic results view and its reversible swap.

use crate::results::ItemRecord;
use crate::utils::{absolute_url, escape_html};

/// Id of the control that brings the original page back
pub const RESTORE_ID: &str = "fave-rank-restore";

/// Sorts items by favorites, most first. Stable, so ties keep page order.
pub fn sort_by_favorites(items: &mut [ItemRecord]) {
    items.sort_by(|a, b| b.favorite_count.cmp(&a.favorite_count));
}

/// The results view and the markup it replaced
#[derive(Debug, Default)]
pub struct ResultView {
    snapshot: Option<String>,
}

impl ResultView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the results view is currently shown
    pub fn is_presenting(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Saves `current_markup` as the snapshot and returns the results markup.
    ///
    /// Presenting again without restoring first replaces the snapshot with
    /// whatever markup is passed, including a previous results view.
    pub fn present(&mut self, items: &[ItemRecord], current_markup: String, origin: &str) -> String {
        self.snapshot = Some(current_markup);

        let mut sorted = items.to_vec();
        sort_by_favorites(&mut sorted);
        render(&sorted, origin)
    }

    /// Hands back the saved snapshot, once
    pub fn restore(&mut self) -> Option<String> {
        self.snapshot.take()
    }
}

/// Renders the results header and one card per item, in the given order
pub fn render(items: &[ItemRecord], origin: &str) -> String {
    let mut out = String::new();
    out.push_str(
        r#"<div class="fave-rank-header" style="padding: 20px; display: flex; justify-content: space-between; align-items: center;">"#,
    );
    out.push_str(&format!(
        r#"<h1 style="margin: 0; font-size: 24px;">{} items sorted by favorites</h1>"#,
        items.len()
    ));
    out.push_str(&format!(
        r#"<button id="{RESTORE_ID}" type="button" style="padding: 8px 16px; margin: 20px;">Return to original view</button>"#
    ));
    out.push_str("</div>");

    out.push_str(
        r#"<div class="fave-rank-grid" style="display: grid; grid-template-columns: repeat(auto-fill, minmax(200px, 1fr)); gap: 16px; padding: 20px;">"#,
    );
    for item in items {
        out.push_str(&render_card(item, origin));
    }
    out.push_str("</div>");
    out
}

fn render_card(item: &ItemRecord, origin: &str) -> String {
    let href = absolute_url(origin, &item.href);
    let image = if item.image_source.is_empty() {
        r#"<div class="fave-rank-no-image" style="width: 100%; height: 250px; background-color: #f0f0f0; display: flex; align-items: center; justify-content: center; color: #ccc;">No Image Available</div>"#
            .to_string()
    } else {
        format!(
            r#"<img src="{}" alt="{}" style="width: 100%; height: 250px; object-fit: cover;">"#,
            escape_html(&item.image_source),
            escape_html(&item.title)
        )
    };

    format!(
        r#"<div class="fave-rank-card" style="border: 1px solid #eee; border-radius: 8px; overflow: hidden;"><a href="{href}" target="_blank" style="text-decoration: none; color: inherit;"><div style="position: relative;">{image}<span class="fave-rank-count" style="position: absolute; top: 10px; right: 10px;">❤️ {count}</span></div><div style="padding: 10px;"><div class="fave-rank-title" style="font-weight: bold;">{title}</div><div class="fave-rank-price" style="margin-top: 8px;">{price}</div></div></a></div>"#,
        href = escape_html(&href),
        image = image,
        count = item.favorite_count,
        title = escape_html(&item.title),
        price = escape_html(&item.price),
    )
}
