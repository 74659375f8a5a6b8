//! Unit tests for listing page parsing

#[cfg(test)]
mod tests {
    use super::super::*;

    const PAGE: &str = r#"
    <html><body>
      <div data-marker="item">
        <h3 itemprop="name">iPhone 13 128GB</h3>
        <meta itemprop="price" content="38000">
        <a itemprop="url" href="/moskva/telefony/iphone_13_128gb_2718281828"></a>
        <div data-marker="item-address">Москва, Арбат</div>
        <p>Состояние отличное, 128 гб</p>
      </div>
      <div data-marker="item">
        <h3 itemprop="name">iPhone без цены</h3>
        <a itemprop="url" href="/moskva/telefony/iphone_000"></a>
      </div>
      <div data-marker="item">
        <meta itemprop="price" content="1000">
        <a itemprop="url" href="/moskva/telefony/bez_nazvaniya_111"></a>
      </div>
    </body></html>
    "#;

    #[test]
    fn test_parse_listing_page_extracts_fields() {
        let listings = parse_listing_page(PAGE);
        assert_eq!(listings.len(), 1);

        let listing = &listings[0];
        assert_eq!(listing.id, "2718281828");
        assert_eq!(listing.title, "iPhone 13 128GB");
        assert_eq!(listing.price, 38_000);
        assert_eq!(
            listing.url,
            "https://www.avito.ru/moskva/telefony/iphone_13_128gb_2718281828"
        );
        assert_eq!(listing.location, "Москва, Арбат");
        // Whole card text serves as the description used for matching
        assert!(listing.description.contains("128 гб"));
    }

    #[test]
    fn test_parse_listing_page_skips_incomplete_cards() {
        // Cards without a price or title never make it out
        let listings = parse_listing_page(PAGE);
        assert!(listings.iter().all(|l| l.price > 0 && !l.title.is_empty()));
    }

    #[test]
    fn test_parse_listing_page_empty_document() {
        assert!(parse_listing_page("<html><body></body></html>").is_empty());
        assert!(parse_listing_page("").is_empty());
    }

    #[test]
    fn test_parse_card_absolute_url_kept() {
        let page = r#"
        <div data-marker="item">
          <h3 itemprop="name">iPhone 12 64GB</h3>
          <meta itemprop="price" content="25000">
          <a itemprop="url" href="https://www.avito.ru/spb/telefony/iphone_12_42"></a>
        </div>
        "#;
        let listings = parse_listing_page(page);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].url, "https://www.avito.ru/spb/telefony/iphone_12_42");
        assert_eq!(listings[0].id, "42");
        assert_eq!(listings[0].location, "");
    }
}
