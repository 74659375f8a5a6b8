//! Outbound Telegram notifications

use crate::error::{BotError, Result};
use async_trait::async_trait;
use reqwest::Client;

/// Notification transport consumed by the monitor loop.
///
/// A failed send must surface as an error so the loop can leave the
/// listing unmarked and retry it on a later cycle.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;

    /// Send with an inline "open listing" url button.
    async fn send_with_link(&self, text: &str, url: &str) -> Result<()>;

    /// Operational failure notice: bold context plus preformatted detail.
    async fn error(&self, context: &str, detail: &str) -> Result<()> {
        self.send(&format!(
            "⚠️ <b>{}</b>\n<code>{}</code>",
            escape_html(context),
            escape_html(detail)
        ))
        .await
    }
}

/// Telegram sender (HTML parse mode).
#[derive(Clone)]
pub struct Notifier {
    http: Client,
    bot_token: String,
    chat_id: String,
    enabled: bool,
}

impl Notifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            http: Client::new(),
            bot_token,
            chat_id,
            enabled: true,
        }
    }

    /// No-op notifier for when Telegram is not configured.
    pub fn disabled() -> Self {
        Self {
            http: Client::new(),
            bot_token: String::new(),
            chat_id: String::new(),
            enabled: false,
        }
    }

    pub async fn startup(&self) -> Result<()> {
        self.send("📱 <b>Мониторинг запущен</b>").await
    }

    async fn post(&self, body: serde_json::Value) -> Result<()> {
        if !self.enabled {
            tracing::debug!("Notifier disabled, dropping message");
            return Ok(());
        }

        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let response = self.http.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(BotError::Telegram(format!("{}: {}", status, detail)));
        }
        Ok(())
    }
}

#[async_trait]
impl AlertSink for Notifier {
    async fn send(&self, text: &str) -> Result<()> {
        self.post(serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
        }))
        .await
    }

    async fn send_with_link(&self, text: &str, url: &str) -> Result<()> {
        self.post(serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "reply_markup": {
                "inline_keyboard": [[{"text": "🔗 Открыть", "url": url}]],
            },
        }))
        .await
    }
}

/// Escape text interpolated into HTML-mode Telegram messages.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct CapturingSink(Mutex<Vec<String>>);

    #[async_trait]
    impl AlertSink for CapturingSink {
        async fn send(&self, text: &str) -> Result<()> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn send_with_link(&self, text: &str, _url: &str) -> Result<()> {
            self.send(text).await
        }
    }

    #[tokio::test]
    async fn test_error_notice_formatting() {
        let sink = CapturingSink(Mutex::new(Vec::new()));
        sink.error("Сбой проверки", "timeout <60s>").await.unwrap();

        let messages = sink.0.into_inner().unwrap();
        assert_eq!(
            messages,
            vec!["⚠️ <b>Сбой проверки</b>\n<code>timeout &lt;60s&gt;</code>".to_string()]
        );
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html("iPhone <13> & чехол"),
            "iPhone &lt;13&gt; &amp; чехол"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[tokio::test]
    async fn test_disabled_notifier_is_noop() {
        let notifier = Notifier::disabled();
        notifier.send("dropped").await.unwrap();
        notifier
            .send_with_link("dropped", "https://example.com")
            .await
            .unwrap();
    }
}
