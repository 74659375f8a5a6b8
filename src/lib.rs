//! Avito Listing Monitor
//!
//! A Telegram-controlled bot that watches Avito search results for
//! favorably priced listings.
//!
//! ## Architecture
//!
//! ```text
//! Scraper → Dedup Store → Price Matcher → Profitability Filter → Enrichment → Notifier
//!                ↑                                                               ↑
//!        Monitor Loop (timer / manual trigger)  ←  Control State  ←  Telegram commands
//! ```

pub mod config;
pub mod enrich;
pub mod error;
pub mod filter;
pub mod monitor;
pub mod notify;
pub mod prices;
pub mod scraper;
pub mod storage;
pub mod telegram;
pub mod types;

#[cfg(test)]
mod types_tests;
#[cfg(test)]
mod config_tests;
