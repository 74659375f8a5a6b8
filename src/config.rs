//! Configuration loading
//!
//! TOML file with environment variable overrides (prefix `AVITO`).

use crate::error::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Telegram bot credentials; notifications disabled when absent
    pub telegram: Option<TelegramConfig>,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub prices: PricesConfig,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Optional AI enrichment of outgoing alerts
    pub llm: Option<LlmConfig>,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("AVITO").separator("__"))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Admin chat that receives alerts and may issue commands
    pub chat_id: String,
    #[serde(default = "default_true")]
    pub notify_errors: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Search results URL; page number is appended as `&p=N`
    #[serde(default = "default_search_url")]
    pub search_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Pages per automatic scan
    #[serde(default = "default_pages")]
    pub pages: u32,
    /// Pages per manually triggered scan (deeper sweep)
    #[serde(default = "default_manual_pages")]
    pub manual_pages: u32,
    /// Delay between page fetches, anti-ban throttle
    #[serde(default = "default_page_delay_secs")]
    pub page_delay_secs: u64,
    /// Listings priced outside [min_price, max_price] are discarded
    #[serde(default = "default_min_price")]
    pub min_price: i64,
    #[serde(default = "default_max_price")]
    pub max_price: i64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            user_agent: default_user_agent(),
            pages: default_pages(),
            manual_pages: default_manual_pages(),
            page_delay_secs: default_page_delay_secs(),
            min_price: default_min_price(),
            max_price: default_max_price(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PricesConfig {
    /// CSV export of the market price report (model, memory, mean)
    #[serde(default = "default_prices_path")]
    pub path: String,
}

impl Default for PricesConfig {
    fn default() -> Self {
        Self {
            path: default_prices_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Automatic scan interval
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    /// Pause re-check cadence while paused
    #[serde(default = "default_pause_poll_secs")]
    pub pause_poll_secs: u64,
    /// Pacing delay between dispatched alerts (Telegram rate limits)
    #[serde(default = "default_dispatch_delay_ms")]
    pub dispatch_delay_ms: u64,
    /// Backoff after a failed cycle
    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,
    /// Narrow mode includes a listing iff price <= mean * this ratio
    #[serde(default = "default_max_over_ref_ratio")]
    pub max_over_ref_ratio: f64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: default_check_interval_secs(),
            pause_poll_secs: default_pause_poll_secs(),
            dispatch_delay_ms: default_dispatch_delay_ms(),
            error_backoff_secs: default_error_backoff_secs(),
            max_over_ref_ratio: default_max_over_ref_ratio(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub provider: String,
    #[serde(default)]
    pub api_key: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_search_url() -> String {
    "https://www.avito.ru/moskva_i_mo?q=iphone&s=104".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36"
        .to_string()
}

fn default_pages() -> u32 {
    2
}

fn default_manual_pages() -> u32 {
    4
}

fn default_page_delay_secs() -> u64 {
    2
}

fn default_min_price() -> i64 {
    1_000
}

fn default_max_price() -> i64 {
    500_000
}

fn default_prices_path() -> String {
    "prices.csv".to_string()
}

fn default_check_interval_secs() -> u64 {
    60
}

fn default_pause_poll_secs() -> u64 {
    1
}

fn default_dispatch_delay_ms() -> u64 {
    1_200
}

fn default_error_backoff_secs() -> u64 {
    10
}

fn default_max_over_ref_ratio() -> f64 {
    1.2
}

fn default_db_path() -> String {
    "sent.db".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    20
}
