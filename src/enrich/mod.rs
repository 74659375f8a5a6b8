//! AI enrichment of outgoing alerts
//!
//! Best-effort call to an OpenAI-compatible chat endpoint that produces a
//! one-line verdict appended to the alert. Bounded by a timeout; any
//! failure yields a fixed fallback line and never blocks dispatch.

use crate::config::LlmConfig;
use crate::error::{BotError, Result};
use crate::types::Listing;
use reqwest::Client;
use std::time::Duration;

/// Shown when the LLM call fails or times out.
pub const FALLBACK_ANALYSIS: &str = "🤖 Анализ недоступен";

pub struct Enricher {
    http: Client,
    config: LlmConfig,
}

impl Enricher {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    /// Produce a short assessment of the listing. Infallible by contract:
    /// errors and timeouts degrade to `FALLBACK_ANALYSIS`.
    pub async fn analyze(&self, listing: &Listing, reference_mean: Option<f64>) -> String {
        let market = reference_mean
            .map(|m| format!("{:.0} руб.", m))
            .unwrap_or_else(|| "неизвестна".to_string());

        let prompt = format!(
            "Объявление о продаже телефона:\n\
             Заголовок: {}\n\
             Описание: {}\n\
             Цена: {} руб. Средняя рыночная цена: {}\n\n\
             Одним коротким предложением оцени, насколько предложение \
             выгодно и есть ли в тексте тревожные признаки (ремонт, \
             блокировка, копия). Без форматирования.",
            listing.title,
            listing.description.chars().take(500).collect::<String>(),
            listing.price,
            market
        );

        let deadline = Duration::from_secs(self.config.timeout_secs);
        match tokio::time::timeout(deadline, self.call_llm(&prompt)).await {
            Ok(Ok(text)) => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    FALLBACK_ANALYSIS.to_string()
                } else {
                    text
                }
            }
            Ok(Err(e)) => {
                tracing::warn!("LLM enrichment failed: {}", e);
                FALLBACK_ANALYSIS.to_string()
            }
            Err(_) => {
                tracing::warn!("LLM enrichment timed out after {:?}", deadline);
                FALLBACK_ANALYSIS.to_string()
            }
        }
    }

    async fn call_llm(&self, prompt: &str) -> Result<String> {
        let (base_url, model) = match self.config.provider.to_lowercase().as_str() {
            "deepseek" => (
                "https://api.deepseek.com".to_string(),
                self.config
                    .model
                    .clone()
                    .unwrap_or_else(|| "deepseek-chat".to_string()),
            ),
            "openai" | "gpt" => (
                self.config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| "https://api.openai.com".to_string()),
                self.config
                    .model
                    .clone()
                    .unwrap_or_else(|| "gpt-4o-mini".to_string()),
            ),
            "ollama" => (
                self.config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| "http://localhost:11434".to_string()),
                self.config
                    .model
                    .clone()
                    .unwrap_or_else(|| "qwen2.5:14b".to_string()),
            ),
            _ => (
                self.config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| "https://api.deepseek.com".to_string()),
                self.config
                    .model
                    .clone()
                    .unwrap_or_else(|| "deepseek-chat".to_string()),
            ),
        };

        let request = serde_json::json!({
            "model": model,
            "messages": [{"role": "user", "content": prompt}],
        });

        let mut req = self
            .http
            .post(format!("{}/v1/chat/completions", base_url))
            .header("content-type", "application/json");

        if !self.config.api_key.is_empty() {
            req = req.header("Authorization", format!("Bearer {}", self.config.api_key));
        }

        let resp: serde_json::Value = req.json(&request).send().await?.json().await?;

        resp["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| BotError::Api("Empty LLM response".into()))
    }
}
