//! Listing source boundary and the Avito HTML implementation
//!
//! The monitor loop only sees the `ListingSource` trait. The real
//! implementation fetches search result pages and pulls listing cards
//! out of the markup; cards missing mandatory fields are skipped one by
//! one, a broken card never aborts the page.

use crate::config::ScraperConfig;
use crate::error::{BotError, Result};
use crate::types::Listing;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::time::Duration;

#[cfg(test)]
mod tests;

/// Ordered listing fetch, possibly slow, possibly empty.
///
/// Implementations must only return listings with a non-empty id, a
/// non-empty title and a price within the configured bounds.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch(&self, pages: u32) -> Result<Vec<Listing>>;
}

pub struct AvitoScraper {
    http: Client,
    config: ScraperConfig,
}

impl AvitoScraper {
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { http, config })
    }
}

#[async_trait]
impl ListingSource for AvitoScraper {
    async fn fetch(&self, pages: u32) -> Result<Vec<Listing>> {
        let mut listings = Vec::new();

        for page in 1..=pages {
            let url = format!("{}&p={}", self.config.search_url, page);
            tracing::info!("Scanning page {}/{}...", page, pages);

            let response = self.http.get(&url).send().await?;
            if !response.status().is_success() {
                return Err(BotError::Scrape(format!(
                    "page {} returned HTTP {}",
                    page,
                    response.status()
                )));
            }
            let html = response.text().await?;

            let parsed = parse_listing_page(&html);
            let before = parsed.len();
            let valid: Vec<Listing> = parsed
                .into_iter()
                .filter(|l| l.is_valid(self.config.min_price, self.config.max_price))
                .collect();
            if valid.len() < before {
                tracing::debug!(
                    "Discarded {} malformed/out-of-bounds cards on page {}",
                    before - valid.len(),
                    page
                );
            }
            listings.extend(valid);

            // Anti-ban throttle between pages
            if page < pages {
                tokio::time::sleep(Duration::from_secs(self.config.page_delay_secs)).await;
            }
        }

        tracing::info!("Fetched {} listings", listings.len());
        Ok(listings)
    }
}

struct CardSelectors {
    card: Selector,
    title: Selector,
    title_fallback: Selector,
    price: Selector,
    link: Selector,
    address: Selector,
}

impl CardSelectors {
    fn new() -> Self {
        // Static selectors, parse cannot fail
        Self {
            card: Selector::parse(r#"[data-marker="item"]"#).expect("static selector"),
            title: Selector::parse(r#"[itemprop="name"]"#).expect("static selector"),
            title_fallback: Selector::parse("h3").expect("static selector"),
            price: Selector::parse(r#"[itemprop="price"]"#).expect("static selector"),
            link: Selector::parse(r#"a[itemprop="url"]"#).expect("static selector"),
            address: Selector::parse(r#"[data-marker="item-address"]"#)
                .expect("static selector"),
        }
    }
}

/// Extract listing cards from one search results page.
///
/// Returns whatever could be parsed; callers apply the price/id sanity
/// bounds. Cards with a missing title, price or link are dropped.
pub fn parse_listing_page(html: &str) -> Vec<Listing> {
    let document = Html::parse_document(html);
    let selectors = CardSelectors::new();

    let mut listings = Vec::new();
    for card in document.select(&selectors.card) {
        let Some(listing) = parse_card(&card, &selectors) else {
            continue;
        };
        listings.push(listing);
    }
    listings
}

fn parse_card(card: &scraper::ElementRef<'_>, selectors: &CardSelectors) -> Option<Listing> {
    let title = card
        .select(&selectors.title)
        .next()
        .or_else(|| card.select(&selectors.title_fallback).next())
        .map(|el| collect_text(&el))?;

    let price: i64 = card
        .select(&selectors.price)
        .next()?
        .value()
        .attr("content")?
        .trim()
        .parse()
        .ok()?;

    let href = card.select(&selectors.link).next()?.value().attr("href")?;
    let url = if href.starts_with("http") {
        href.to_string()
    } else {
        format!("https://www.avito.ru{}", href)
    };

    // The path tail after the last underscore is the stable listing id
    let id = href
        .rsplit('_')
        .next()
        .map(|tail| tail.trim_end_matches('/').to_string())
        .filter(|id| !id.is_empty())?;

    let location = card
        .select(&selectors.address)
        .next()
        .map(|el| collect_text(&el))
        .unwrap_or_default();

    // Whole card text doubles as the description for matching purposes
    let description = collect_text(card);

    Some(Listing {
        id,
        title,
        description,
        price,
        url,
        location,
    })
}

fn collect_text(el: &scraper::ElementRef<'_>) -> String {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
