//! Avito Listing Monitor
//!
//! Watches Avito search results and pushes favorable listings to Telegram.

use avito_monitor::{
    config::Config,
    enrich::Enricher,
    monitor::{ControlState, MonitorBot, ScanTrigger, Trigger},
    notify::{AlertSink, Notifier},
    prices::PriceBook,
    scraper::AvitoScraper,
    storage::Database,
    telegram::{BotCommand, CommandHandler, TelegramBot},
};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "avito-monitor")]
#[command(about = "Avito listing monitor with price analysis and Telegram alerts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitor
    Run {
        /// Dry run mode (log alerts instead of sending, never mark sent)
        #[arg(long)]
        dry_run: bool,
    },
    /// Run a single manual scan cycle and exit
    ScanOnce,
    /// Show the loaded reference price table
    Prices,
    /// Test Telegram notification
    TestNotify,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;

    match cli.command {
        Commands::Run { dry_run } => run_bot(config, dry_run).await,
        Commands::ScanOnce => scan_once(config).await,
        Commands::Prices => show_prices(config).await,
        Commands::TestNotify => test_notify(config).await,
    }
}

async fn run_bot(config: Config, dry_run: bool) -> anyhow::Result<()> {
    tracing::info!("Starting Avito monitor");

    if dry_run {
        tracing::warn!("Running in DRY RUN mode - alerts are logged, not sent");
    }

    let notifier = if let Some(tg) = &config.telegram {
        Notifier::new(tg.bot_token.clone(), tg.chat_id.clone())
    } else {
        tracing::warn!("Telegram not configured, notifications disabled");
        Notifier::disabled()
    };

    if let Err(e) = notifier.startup().await {
        tracing::warn!("Failed to send startup notification: {}", e);
    }

    let db = Arc::new(Database::connect(&config.database.path).await?);
    let prices = PriceBook::load(&config.prices.path);
    let reference_rows = prices.len();
    let source = Arc::new(AvitoScraper::new(config.scraper.clone())?);

    let control = Arc::new(RwLock::new(ControlState::new(
        config.scraper.pages,
        config.scraper.manual_pages,
    )));
    let trigger = Arc::new(ScanTrigger::new());

    // Control channel: Telegram poller -> command handler, the single
    // writer of ControlState
    if let Some(tg) = &config.telegram {
        let (cmd_tx, cmd_rx) = mpsc::channel::<BotCommand>(100);

        let telegram_bot = Arc::new(TelegramBot::new(
            tg.bot_token.clone(),
            tg.chat_id.clone(),
            cmd_tx,
        ));
        tokio::spawn(telegram_bot.start_polling());

        let handler = CommandHandler::new(
            control.clone(),
            trigger.clone(),
            notifier.clone(),
            db.clone(),
            reference_rows,
            config.monitor.check_interval_secs,
        );
        tokio::spawn(handler.run(cmd_rx));

        tracing::info!("Telegram command listener started");
    }

    let notify_errors = config
        .telegram
        .as_ref()
        .map(|tg| tg.notify_errors)
        .unwrap_or(false);
    let enricher = config.llm.clone().map(Enricher::new);

    let bot = MonitorBot::new(
        source,
        prices,
        db,
        Arc::new(notifier),
        enricher,
        control,
        trigger,
        config.monitor.clone(),
        notify_errors,
        dry_run,
    );

    bot.run().await;
    Ok(())
}

async fn scan_once(config: Config) -> anyhow::Result<()> {
    let notifier = if let Some(tg) = &config.telegram {
        Notifier::new(tg.bot_token.clone(), tg.chat_id.clone())
    } else {
        Notifier::disabled()
    };

    let db = Arc::new(Database::connect(&config.database.path).await?);
    let prices = PriceBook::load(&config.prices.path);
    let source = Arc::new(AvitoScraper::new(config.scraper.clone())?);

    let bot = MonitorBot::new(
        source,
        prices,
        db,
        Arc::new(notifier),
        config.llm.clone().map(Enricher::new),
        Arc::new(RwLock::new(ControlState::new(
            config.scraper.pages,
            config.scraper.manual_pages,
        ))),
        Arc::new(ScanTrigger::new()),
        config.monitor.clone(),
        false,
        false,
    );

    let stats = bot.run_cycle(Trigger::Manual).await?;

    println!("\n🏁 Scan complete\n");
    println!("Scanned:           {}", stats.scanned);
    println!("Unseen:            {}", stats.unseen);
    println!("Dispatched:        {}", stats.dispatched);
    println!("No reference:      {}", stats.skipped_no_reference);
    println!("Over market price: {}", stats.skipped_too_expensive);
    println!("Errors:            {}", stats.errors);

    Ok(())
}

async fn show_prices(config: Config) -> anyhow::Result<()> {
    let prices = PriceBook::load(&config.prices.path);

    println!("\n📊 Reference price table ({} entries):\n", prices.len());
    println!("{:<30} {:>8} {:>12}", "Model", "Memory", "Mean");
    println!("{}", "-".repeat(52));

    for entry in prices.entries() {
        println!(
            "{:<30} {:>8} {:>12.0}",
            entry.model, entry.memory, entry.mean
        );
    }

    Ok(())
}

async fn test_notify(config: Config) -> anyhow::Result<()> {
    let tg = config
        .telegram
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("Telegram not configured in config.toml"))?;

    let notifier = Notifier::new(tg.bot_token.clone(), tg.chat_id.clone());
    notifier
        .send("🧪 <b>Тестовое уведомление</b>\n\nTelegram настроен корректно!")
        .await?;

    println!("✅ Test notification sent!");
    Ok(())
}
