//! Telegram control channel
//!
//! Long-polls getUpdates for operator commands (/pause, /resume, /mode,
//! /scan, /pages, /status) and funnels them through an mpsc channel into
//! `CommandHandler`, the only place that mutates `ControlState`. Only the
//! configured admin chat is honored.

use crate::error::Result;
use crate::monitor::{ControlState, ScanTrigger};
use crate::notify::{AlertSink, Notifier};
use crate::storage::Database;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// Inbound control commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Pause,
    Resume,
    /// Toggle broad/narrow notification mode
    ToggleMode,
    /// Manual scan trigger
    Scan,
    /// Set pages per automatic scan
    SetPages(u32),
    Status,
    Help,
}

#[derive(Debug, Deserialize)]
struct TelegramUpdate {
    update_id: i64,
    message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
struct TelegramMessage {
    chat: TelegramChat,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TelegramChat {
    id: i64,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct GetUpdatesResponse {
    ok: bool,
    result: Vec<TelegramUpdate>,
}

/// Command listener polling the Telegram API.
pub struct TelegramBot {
    http: Client,
    bot_token: String,
    chat_id: String,
    last_update_id: RwLock<i64>,
    command_tx: mpsc::Sender<BotCommand>,
}

impl TelegramBot {
    pub fn new(bot_token: String, chat_id: String, command_tx: mpsc::Sender<BotCommand>) -> Self {
        Self {
            http: Client::new(),
            bot_token,
            chat_id,
            last_update_id: RwLock::new(0),
            command_tx,
        }
    }

    /// Start polling for updates
    pub async fn start_polling(self: Arc<Self>) {
        tracing::info!("Starting Telegram command listener...");

        loop {
            match self.poll_updates().await {
                Ok(updates) => {
                    for update in updates {
                        if let Some(msg) = update.message {
                            // Only the authorized admin chat
                            if msg.chat.id.to_string() == self.chat_id {
                                if let Some(text) = msg.text {
                                    self.handle_message(&text).await;
                                }
                            }
                        }

                        let mut last_id = self.last_update_id.write().await;
                        *last_id = update.update_id + 1;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to poll Telegram updates: {}", e);
                    tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
                }
            }

            tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
        }
    }

    async fn poll_updates(&self) -> Result<Vec<TelegramUpdate>> {
        let last_id = *self.last_update_id.read().await;

        let url = format!(
            "https://api.telegram.org/bot{}/getUpdates?offset={}&timeout=30",
            self.bot_token, last_id
        );

        let response: GetUpdatesResponse = self.http.get(&url).send().await?.json().await?;

        Ok(response.result)
    }

    async fn handle_message(&self, text: &str) {
        let Some((cmd, args)) = parse_command(text) else {
            return; // Ignore non-commands
        };

        tracing::info!("Received command: /{} {}", cmd, args);

        let command = match cmd.as_str() {
            "start" | "help" => Some(BotCommand::Help),
            "pause" => Some(BotCommand::Pause),
            "resume" => Some(BotCommand::Resume),
            "mode" => Some(BotCommand::ToggleMode),
            "scan" | "find" => Some(BotCommand::Scan),
            "status" | "settings" => Some(BotCommand::Status),
            "pages" => match args.parse::<u32>() {
                Ok(n) if (1..=10).contains(&n) => Some(BotCommand::SetPages(n)),
                _ => {
                    self.reply("❌ Использование: /pages &lt;1-10&gt;").await;
                    None
                }
            },
            _ => {
                self.reply(&format!(
                    "❓ Неизвестная команда: /{}\nСписок команд: /help",
                    cmd
                ))
                .await;
                None
            }
        };

        if let Some(command) = command {
            if self.command_tx.send(command).await.is_err() {
                tracing::error!("Command channel closed");
            }
        }
    }

    async fn reply(&self, text: &str) {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
        });

        if let Err(e) = self.http.post(&url).json(&body).send().await {
            tracing::error!("Failed to send Telegram reply: {}", e);
        }
    }
}

/// Split "/cmd args" into (cmd, args), stripping an @botname suffix.
fn parse_command(text: &str) -> Option<(String, String)> {
    let text = text.trim();
    let stripped = text.strip_prefix('/')?;

    let (cmd, args) = match stripped.split_once(' ') {
        Some((cmd, args)) => (cmd, args.trim()),
        None => (stripped, ""),
    };
    let cmd = cmd.split('@').next().unwrap_or(cmd);

    Some((cmd.to_lowercase(), args.to_string()))
}

/// Applies control commands. The single writer of `ControlState`.
pub struct CommandHandler {
    control: Arc<RwLock<ControlState>>,
    trigger: Arc<ScanTrigger>,
    notifier: Notifier,
    db: Arc<Database>,
    reference_rows: usize,
    check_interval_secs: u64,
}

impl CommandHandler {
    pub fn new(
        control: Arc<RwLock<ControlState>>,
        trigger: Arc<ScanTrigger>,
        notifier: Notifier,
        db: Arc<Database>,
        reference_rows: usize,
        check_interval_secs: u64,
    ) -> Self {
        Self {
            control,
            trigger,
            notifier,
            db,
            reference_rows,
            check_interval_secs,
        }
    }

    /// Drain the command channel until the bot shuts down.
    pub async fn run(self, mut command_rx: mpsc::Receiver<BotCommand>) {
        while let Some(cmd) = command_rx.recv().await {
            self.handle(cmd).await;
        }
        tracing::info!("Command channel closed, handler exiting");
    }

    pub async fn handle(&self, cmd: BotCommand) {
        match cmd {
            BotCommand::Pause => {
                self.control.write().await.paused = true;
                let _ = self.notifier.send("💤 Мониторинг на паузе").await;
            }
            BotCommand::Resume => {
                self.control.write().await.paused = false;
                let _ = self.notifier.send("▶ Мониторинг возобновлен").await;
            }
            BotCommand::ToggleMode => {
                let broad = {
                    let mut control = self.control.write().await;
                    control.broad_mode = !control.broad_mode;
                    control.broad_mode
                };
                let mode = if broad {
                    "📦 ВСЕ НОВЫЕ"
                } else {
                    "🔥 ВЫГОДНЫЕ"
                };
                let _ = self
                    .notifier
                    .send(&format!("Режим изменен на: {}", mode))
                    .await;
            }
            BotCommand::Scan => {
                self.trigger.raise();
                let _ = self.notifier.send("⏳ Запускаю проверку...").await;
            }
            BotCommand::SetPages(n) => {
                self.control.write().await.scan_pages = n;
                let _ = self
                    .notifier
                    .send(&format!("Страниц за проверку: {}", n))
                    .await;
            }
            BotCommand::Status => {
                self.send_status().await;
            }
            BotCommand::Help => {
                self.send_help().await;
            }
        }
    }

    async fn send_status(&self) {
        let control = self.control.read().await.clone();
        let sent_count = self.db.sent_count().await.unwrap_or(-1);

        let status = if control.paused {
            "Пауза 💤"
        } else {
            "Работает ▶"
        };
        let mode = if control.broad_mode {
            "Все новые объявления"
        } else {
            "Только выгодные"
        };

        let text = format!(
            "⚙️ <b>Текущие настройки</b>\n\n\
             Статус: <code>{}</code>\n\
             Режим: <code>{}</code>\n\
             Страниц за проверку: <code>{}</code>\n\
             Интервал проверки: <code>{} сек.</code>\n\
             Позиций в базе цен: <code>{}</code>\n\
             Отправлено всего: <code>{}</code>",
            status, mode, control.scan_pages, self.check_interval_secs, self.reference_rows,
            sent_count
        );

        let _ = self.notifier.send(&text).await;
    }

    async fn send_help(&self) {
        let help_text = "📱 <b>Команды мониторинга</b>\n\n\
            /scan - проверить сейчас\n\
            /pause - приостановить\n\
            /resume - возобновить\n\
            /mode - переключить режим (выгодные/все)\n\
            /pages &lt;n&gt; - страниц за проверку\n\
            /status - текущие настройки\n\
            /help - это сообщение";

        let _ = self.notifier.send(help_text).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_plain() {
        assert_eq!(
            parse_command("/pause"),
            Some(("pause".to_string(), String::new()))
        );
    }

    #[test]
    fn test_parse_command_with_args() {
        assert_eq!(
            parse_command("/pages 3"),
            Some(("pages".to_string(), "3".to_string()))
        );
    }

    #[test]
    fn test_parse_command_strips_bot_mention() {
        assert_eq!(
            parse_command("/scan@avito_monitor_bot"),
            Some(("scan".to_string(), String::new()))
        );
    }

    #[test]
    fn test_parse_command_ignores_plain_text() {
        assert_eq!(parse_command("привет"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn test_parse_command_lowercases() {
        assert_eq!(
            parse_command("/STATUS"),
            Some(("status".to_string(), String::new()))
        );
    }
}
