use url::Url;

/// Escapes text for use in HTML content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Qualifies a possibly relative item link against the site origin.
///
/// Links that cannot be joined are returned unchanged.
pub fn absolute_url(origin: &str, href: &str) -> String {
    if let Ok(url) = Url::parse(href) {
        return url.to_string();
    }
    match Url::parse(origin).and_then(|base| base.join(href)) {
        Ok(url) => url.to_string(),
        Err(e) => {
            ::log::debug!("Keeping unresolvable link {:?}: {}", href, e);
            href.to_string()
        }
    }
}
