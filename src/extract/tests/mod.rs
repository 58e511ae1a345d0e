mod container_tests;

/// A catalog card in the shape the live site renders
pub fn card(id: u32, title: &str, favorites: &str, price: &str) -> String {
    format!(
        r#"<div class="feed-grid__item">
  <div class="new-item-box__container">
    <a href="/items/{id}-{slug}" title="{title}" class="new-item-box__overlay"></a>
    <div class="new-item-box__image"><img data-src="https://images.example/{id}.jpg" src="data:placeholder" alt="{title} photo"></div>
    <div class="new-item-box__summary">
      <p class="web_ui__Text__subtitle">{price}</p>
      <button data-testid="product-item-id-{id}--favourite" aria-label="Adicionar aos favoritos">
        <span class="web_ui__Icon__icon"></span>
        <span class="web_ui__Text__text">{favorites}</span>
      </button>
    </div>
  </div>
</div>"#,
        id = id,
        slug = title.to_lowercase().replace(' ', "-"),
        title = title,
        favorites = favorites,
        price = price,
    )
}

/// Wraps markup in a full document
pub fn page(body: &str) -> String {
    format!("<html><head><title>Catalog</title></head><body><main>{body}</main></body></html>")
}
