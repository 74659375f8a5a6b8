//! Tests for configuration

#[cfg(test)]
mod tests {
    use super::super::config::*;

    #[test]
    fn test_scraper_config_default() {
        let config = ScraperConfig::default();
        assert!(config.search_url.contains("avito.ru"));
        assert_eq!(config.pages, 2);
        assert_eq!(config.manual_pages, 4);
        assert_eq!(config.page_delay_secs, 2);
        assert_eq!(config.min_price, 1_000);
        assert_eq!(config.max_price, 500_000);
    }

    #[test]
    fn test_monitor_config_default() {
        let config = MonitorConfig::default();
        assert_eq!(config.check_interval_secs, 60);
        assert_eq!(config.pause_poll_secs, 1);
        assert_eq!(config.dispatch_delay_ms, 1_200);
        assert_eq!(config.error_backoff_secs, 10);
        assert_eq!(config.max_over_ref_ratio, 1.2);
    }

    #[test]
    fn test_monitor_config_deserialize() {
        let toml_str = r#"
check_interval_secs = 120
dispatch_delay_ms = 500
max_over_ref_ratio = 1.1
"#;
        let config: MonitorConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.check_interval_secs, 120);
        assert_eq!(config.dispatch_delay_ms, 500);
        assert_eq!(config.max_over_ref_ratio, 1.1);
        // Unspecified fields fall back to defaults
        assert_eq!(config.pause_poll_secs, 1);
        assert_eq!(config.error_backoff_secs, 10);
    }

    #[test]
    fn test_telegram_config_defaults() {
        let toml_str = r#"
bot_token = "123:abc"
chat_id = "12345"
"#;
        let config: TelegramConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.chat_id, "12345");
        assert!(config.notify_errors);
    }

    #[test]
    fn test_telegram_config_disabled_error_notifications() {
        let toml_str = r#"
bot_token = "123:abc"
chat_id = "12345"
notify_errors = false
"#;
        let config: TelegramConfig = toml::from_str(toml_str).unwrap();
        assert!(!config.notify_errors);
    }

    #[test]
    fn test_scraper_config_deserialize() {
        let toml_str = r#"
search_url = "https://www.avito.ru/sankt-peterburg?q=iphone&s=104"
pages = 3
min_price = 5000
max_price = 200000
"#;
        let config: ScraperConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.search_url,
            "https://www.avito.ru/sankt-peterburg?q=iphone&s=104"
        );
        assert_eq!(config.pages, 3);
        assert_eq!(config.min_price, 5_000);
        assert_eq!(config.max_price, 200_000);
        // Defaults kept for unspecified fields
        assert_eq!(config.manual_pages, 4);
        assert!(!config.user_agent.is_empty());
    }

    #[test]
    fn test_prices_config_default_path() {
        let config: PricesConfig = toml::from_str("").unwrap();
        assert_eq!(config.path, "prices.csv");
    }

    #[test]
    fn test_database_config_default_path() {
        let config: DatabaseConfig = toml::from_str("").unwrap();
        assert_eq!(config.path, "sent.db");
    }

    #[test]
    fn test_llm_config_minimal() {
        let toml_str = r#"
provider = "deepseek"
api_key = "sk-xxx"
"#;
        let config: LlmConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider, "deepseek");
        assert_eq!(config.api_key, "sk-xxx");
        assert!(config.model.is_none());
        assert!(config.base_url.is_none());
        assert_eq!(config.timeout_secs, 20);
    }

    #[test]
    fn test_llm_config_ollama_without_key() {
        let toml_str = r#"
provider = "ollama"
model = "qwen2.5:14b"
timeout_secs = 5
"#;
        let config: LlmConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.provider, "ollama");
        assert_eq!(config.api_key, ""); // defaults to empty
        assert_eq!(config.model, Some("qwen2.5:14b".to_string()));
        assert_eq!(config.timeout_secs, 5);
    }

    #[test]
    fn test_full_config_without_optional_sections() {
        let toml_str = r#"
[scraper]
pages = 1

[monitor]
check_interval_secs = 30
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.telegram.is_none());
        assert!(config.llm.is_none());
        assert_eq!(config.scraper.pages, 1);
        assert_eq!(config.monitor.check_interval_secs, 30);
        assert_eq!(config.database.path, "sent.db");
    }
}
