//! Tests for core domain types

#[cfg(test)]
mod tests {
    use super::super::types::*;

    fn listing(price: i64) -> Listing {
        Listing {
            id: "a1".to_string(),
            title: "iPhone 13 128GB".to_string(),
            description: String::new(),
            price,
            url: "https://www.avito.ru/item_a1".to_string(),
            location: String::new(),
        }
    }

    #[test]
    fn test_listing_valid_within_bounds() {
        assert!(listing(38_000).is_valid(1_000, 500_000));
    }

    #[test]
    fn test_listing_invalid_outside_bounds() {
        assert!(!listing(999).is_valid(1_000, 500_000));
        assert!(!listing(500_001).is_valid(1_000, 500_000));
    }

    #[test]
    fn test_listing_invalid_without_id_or_title() {
        let mut l = listing(38_000);
        l.id = String::new();
        assert!(!l.is_valid(1_000, 500_000));

        let mut l = listing(38_000);
        l.title = String::new();
        assert!(!l.is_valid(1_000, 500_000));
    }

    #[test]
    fn test_deviation_sign() {
        let m = PriceMatch {
            mean: Some(40_000.0),
            model: Some("iphone 13".into()),
            memory: Some("128gb".into()),
        };
        // Priced above market: positive deviation
        assert_eq!(m.deviation_pct(44_000), Some(10.0));
        // Priced below market: negative deviation, positive discount
        assert_eq!(m.deviation_pct(38_000), Some(-5.0));
        assert_eq!(m.discount_pct(38_000), Some(5.0));
    }

    #[test]
    fn test_deviation_absent_without_mean() {
        let m = PriceMatch::default();
        assert_eq!(m.deviation_pct(38_000), None);
        assert_eq!(m.discount_pct(38_000), None);
    }

    #[test]
    fn test_deviation_absent_with_zero_mean() {
        let m = PriceMatch {
            mean: Some(0.0),
            model: None,
            memory: None,
        };
        assert_eq!(m.deviation_pct(38_000), None);
    }

    #[test]
    fn test_deal_tag_thresholds() {
        assert_eq!(DealTag::from_discount(Some(25.0)), DealTag::Hot);
        assert_eq!(DealTag::from_discount(Some(20.0)), DealTag::Hot);
        assert_eq!(DealTag::from_discount(Some(19.9)), DealTag::Good);
        assert_eq!(DealTag::from_discount(Some(5.0)), DealTag::Good);
        assert_eq!(DealTag::from_discount(Some(4.9)), DealTag::Plain);
        assert_eq!(DealTag::from_discount(Some(-10.0)), DealTag::Plain);
        assert_eq!(DealTag::from_discount(None), DealTag::Plain);
    }
}
