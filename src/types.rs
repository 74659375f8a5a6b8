//! Core domain types

use serde::{Deserialize, Serialize};

/// One scraped marketplace listing. Immutable once produced by the source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    /// Stable external identifier; primary dedup key
    pub id: String,
    pub title: String,
    pub description: String,
    /// Whole rubles
    pub price: i64,
    pub url: String,
    pub location: String,
}

impl Listing {
    /// Sanity check done at the source boundary: listings failing this
    /// never enter the pipeline (placeholder/malformed cards).
    pub fn is_valid(&self, min_price: i64, max_price: i64) -> bool {
        !self.id.is_empty()
            && !self.title.is_empty()
            && self.price >= min_price
            && self.price <= max_price
    }
}

/// Result of matching a listing against the reference price table.
///
/// `mean` is absent when no reference row matched; `memory` may still be
/// present in that case (capacity was extracted but no model matched).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceMatch {
    pub mean: Option<f64>,
    pub model: Option<String>,
    pub memory: Option<String>,
}

impl PriceMatch {
    /// Signed deviation from the reference mean, in percent.
    /// Positive means the listing is priced above market.
    pub fn deviation_pct(&self, price: i64) -> Option<f64> {
        match self.mean {
            Some(mean) if mean > 0.0 => Some((price as f64 - mean) / mean * 100.0),
            _ => None,
        }
    }

    /// Discount against the reference mean, in percent (positive = cheaper).
    pub fn discount_pct(&self, price: i64) -> Option<f64> {
        self.deviation_pct(price).map(|d| -d)
    }
}

/// Cosmetic severity tag shown in the alert header. Never gates inclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DealTag {
    /// >= 20% below reference mean
    Hot,
    /// >= 5% below reference mean
    Good,
    /// Anything else, including no reference price at all
    Plain,
}

impl DealTag {
    pub fn from_discount(discount_pct: Option<f64>) -> Self {
        match discount_pct {
            Some(d) if d >= 20.0 => DealTag::Hot,
            Some(d) if d >= 5.0 => DealTag::Good,
            _ => DealTag::Plain,
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            DealTag::Hot => "🔥",
            DealTag::Good => "✅",
            DealTag::Plain => "📦",
        }
    }
}
