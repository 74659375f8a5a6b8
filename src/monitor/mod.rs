//! Monitor loop
//!
//! One cycle: wait for a trigger (timer or manual), fetch listings,
//! then per listing: dedup check, price match, profitability filter,
//! optional AI enrichment, dispatch, dedup write-back. Cycles never
//! overlap and a started cycle always runs to completion or failure;
//! pause takes effect only between cycles.

pub mod control;


pub use control::{ControlState, ScanTrigger, Trigger};

use crate::config::MonitorConfig;
use crate::enrich::Enricher;
use crate::error::{BotError, Result};
use crate::filter::{DealFilter, Verdict};
use crate::notify::{escape_html, AlertSink};
use crate::prices::PriceBook;
use crate::scraper::ListingSource;
use crate::storage::DedupStore;
use crate::types::{DealTag, Listing, PriceMatch};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Per-cycle counters, emitted with the summary and then discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub scanned: usize,
    pub unseen: usize,
    pub dispatched: usize,
    pub skipped_no_reference: usize,
    pub skipped_too_expensive: usize,
    /// Per-listing failures (parse, dispatch); counted, never fatal
    pub errors: usize,
}

pub struct MonitorBot {
    source: Arc<dyn ListingSource>,
    prices: PriceBook,
    db: Arc<dyn DedupStore>,
    sink: Arc<dyn AlertSink>,
    enricher: Option<Enricher>,
    filter: DealFilter,
    control: Arc<RwLock<ControlState>>,
    trigger: Arc<ScanTrigger>,
    config: MonitorConfig,
    notify_errors: bool,
    dry_run: bool,
}

impl MonitorBot {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<dyn ListingSource>,
        prices: PriceBook,
        db: Arc<dyn DedupStore>,
        sink: Arc<dyn AlertSink>,
        enricher: Option<Enricher>,
        control: Arc<RwLock<ControlState>>,
        trigger: Arc<ScanTrigger>,
        config: MonitorConfig,
        notify_errors: bool,
        dry_run: bool,
    ) -> Self {
        let filter = DealFilter::new(config.max_over_ref_ratio);
        Self {
            source,
            prices,
            db,
            sink,
            enricher,
            filter,
            control,
            trigger,
            config,
            notify_errors,
            dry_run,
        }
    }

    /// Run forever. Every failure is recoverable: log, back off, next cycle.
    pub async fn run(self) {
        tracing::info!(
            "Monitor loop started, interval {}s",
            self.config.check_interval_secs
        );

        loop {
            if self.control.read().await.paused {
                tokio::time::sleep(Duration::from_secs(self.config.pause_poll_secs)).await;
                continue;
            }

            let trigger = self
                .trigger
                .wait(Duration::from_secs(self.config.check_interval_secs))
                .await;

            match trigger {
                Trigger::Manual => tracing::info!("Scan triggered manually"),
                Trigger::Timer => tracing::info!("Automatic scan"),
            }

            match self.run_cycle(trigger).await {
                Ok(stats) => {
                    tracing::info!(
                        "Cycle done: {} scanned, {} unseen, {} dispatched, {} errors",
                        stats.scanned,
                        stats.unseen,
                        stats.dispatched,
                        stats.errors
                    );
                    if let Err(e) = self.report(trigger, &stats).await {
                        tracing::warn!("Failed to send summary: {}", e);
                    }
                }
                Err(e) => {
                    tracing::error!("Cycle failed: {}", e);
                    if self.notify_errors {
                        let _ = self.sink.error("Сбой проверки", &e.to_string()).await;
                    }
                    tokio::time::sleep(Duration::from_secs(self.config.error_backoff_secs)).await;
                }
            }
        }
    }

    /// One full scan-match-filter-notify pass.
    pub async fn run_cycle(&self, trigger: Trigger) -> Result<CycleStats> {
        let (pages, broad_mode) = {
            let control = self.control.read().await;
            let pages = match trigger {
                Trigger::Manual => control.manual_pages,
                Trigger::Timer => control.scan_pages,
            };
            (pages, control.broad_mode)
        };

        let mut stats = CycleStats::default();
        let listings = self.source.fetch(pages).await?;
        stats.scanned = listings.len();

        for listing in &listings {
            match self.process_listing(listing, broad_mode, &mut stats).await {
                Ok(true) => {
                    stats.dispatched += 1;
                    // Pacing toward the notification channel
                    tokio::time::sleep(Duration::from_millis(self.config.dispatch_delay_ms)).await;
                }
                Ok(false) => {}
                // Dedup store unusable: abort the cycle, next one retries
                Err(e @ BotError::Database(_)) => return Err(e),
                Err(e) => {
                    stats.errors += 1;
                    tracing::warn!("Listing {} failed: {}", listing.id, e);
                }
            }
        }

        Ok(stats)
    }

    /// Returns whether the listing was dispatched (and marked sent).
    async fn process_listing(
        &self,
        listing: &Listing,
        broad_mode: bool,
        stats: &mut CycleStats,
    ) -> Result<bool> {
        if self.db.is_sent(&listing.id).await? {
            return Ok(false);
        }
        stats.unseen += 1;

        let matched = self.prices.find_price(&listing.title, &listing.description);

        match self.filter.evaluate(listing.price, matched.mean, broad_mode) {
            Verdict::Include => {}
            Verdict::SkipNoReference => {
                stats.skipped_no_reference += 1;
                return Ok(false);
            }
            Verdict::SkipTooExpensive => {
                stats.skipped_too_expensive += 1;
                return Ok(false);
            }
        }

        // Before enrichment: a simulated run must not spend LLM calls
        if self.dry_run {
            tracing::info!(
                "📝 SIMULATED alert: {} | {} ₽ (deviation {:?})",
                listing.title,
                listing.price,
                matched.deviation_pct(listing.price)
            );
            return Ok(true);
        }

        let analysis = match &self.enricher {
            Some(enricher) => Some(enricher.analyze(listing, matched.mean).await),
            None => None,
        };
        let text = render_alert(listing, &matched, analysis.as_deref());

        if let Err(e) = self.sink.send_with_link(&text, &listing.url).await {
            // Not marked sent: stays eligible for retry next cycle
            tracing::error!("Dispatch failed for {}: {}", listing.id, e);
            stats.errors += 1;
            return Ok(false);
        }

        if let Err(e) = self.db.mark_sent(&listing.id).await {
            tracing::warn!("mark_sent failed for {}, retrying: {}", listing.id, e);
            self.db.mark_sent(&listing.id).await?;
        }

        Ok(true)
    }

    async fn report(&self, trigger: Trigger, stats: &CycleStats) -> Result<()> {
        match trigger {
            Trigger::Manual => self.sink.send(&render_summary(stats)).await,
            Trigger::Timer if stats.dispatched > 0 => {
                self.sink
                    .send(&format!("🔎 Найдено новых: <b>{}</b>", stats.dispatched))
                    .await
            }
            Trigger::Timer => Ok(()),
        }
    }
}

fn render_alert(listing: &Listing, matched: &PriceMatch, analysis: Option<&str>) -> String {
    let tag = DealTag::from_discount(matched.discount_pct(listing.price));

    let mut text = format!("{} <b>{}</b>\n", tag.emoji(), escape_html(&listing.title));
    text.push_str(&format!(
        "🤖 Модель: {}, {}\n",
        escape_html(matched.model.as_deref().unwrap_or("?")),
        matched.memory.as_deref().unwrap_or("?")
    ));

    let market = matched
        .mean
        .map(|m| format!("{:.0}", m))
        .unwrap_or_else(|| "н/д".to_string());
    text.push_str(&format!("💰 {} ₽ | Рынок: {}\n", listing.price, market));

    if let Some(discount) = matched.discount_pct(listing.price) {
        text.push_str(&format!("📉 Выгода: {:.1}%\n", discount));
    }
    if !listing.location.is_empty() {
        text.push_str(&format!("📍 {}\n", escape_html(&listing.location)));
    }
    if let Some(analysis) = analysis {
        text.push_str(&format!("\n{}", escape_html(analysis)));
    }

    text
}

fn render_summary(stats: &CycleStats) -> String {
    let mut text = format!(
        "🏁 <b>Проверка завершена</b>\n\n\
         Просмотрено: {}\n\
         Новых: {}\n\
         Отправлено: {}\n",
        stats.scanned, stats.unseen, stats.dispatched
    );
    if stats.skipped_no_reference > 0 {
        text.push_str(&format!(
            "Без цены в базе: {}\n",
            stats.skipped_no_reference
        ));
    }
    if stats.skipped_too_expensive > 0 {
        text.push_str(&format!("Дороже рынка: {}\n", stats.skipped_too_expensive));
    }
    if stats.errors > 0 {
        text.push_str(&format!("Ошибок: {}\n", stats.errors));
    }
    text
}
