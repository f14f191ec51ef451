use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use dotenvy::dotenv;
use teloxide::dispatching::Dispatcher;
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks;

use mailcloak::cli::{Cli, Commands};
use mailcloak::core::{config, init_logger};
use mailcloak::mail::{mail_routes, DeliveryRouter, Outbound, WebState};
use mailcloak::registry::Registry;
use mailcloak::storage::backend_from_config;
use mailcloak::telegram::notifications::notify_admin_startup;
use mailcloak::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, InteractionState, TelegramOutbound};

/// Main entry point for the Telegram bot
///
/// # Errors
/// Returns an error if initialization fails (logging, storage, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env before any config static is read
    let _ = dotenv();

    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run { webhook }) => {
            log::info!("Running bot (webhook: {})", webhook);
            run_bot(webhook).await
        }
        None => {
            log::info!("No command specified, running bot in polling mode");
            run_bot(false).await
        }
    }
}

async fn run_bot(use_webhook: bool) -> Result<()> {
    log::info!("Starting bot...");

    let backend = backend_from_config()?;
    log::info!("Storage backend: {}", backend.describe());
    let registry = Arc::new(Registry::load(backend, config::DOMAIN.as_str()).await?);
    log::info!("Minting addresses under @{}", registry.domain());

    let bot = create_bot()?;
    setup_bot_commands(&bot).await?;

    let interaction = Arc::new(InteractionState::new());
    let deps = HandlerDeps::new(Arc::clone(&registry), Arc::clone(&interaction));
    let handler = schema(deps);

    // Mail webhook pipeline: provider POST -> router -> Telegram sends
    let outbound: Arc<dyn Outbound> = Arc::new(TelegramOutbound::new(bot.clone()));
    let delivery = Arc::new(DeliveryRouter::new(Arc::clone(&registry), outbound));
    let mail_router = mail_routes(WebState { router: delivery });

    let addr = SocketAddr::from(([0, 0, 0, 0], *config::WEB_PORT));

    notify_admin_startup(&bot).await;

    let public_url = if use_webhook { config::PUBLIC_URL.clone() } else { None };

    if let Some(public) = public_url {
        // Webhook mode: Telegram updates and inbound mail share one server.
        let webhook_url = url::Url::parse(&format!("{}{}", public, config::TG_WEBHOOK_PATH.as_str()))?;
        log::info!("Starting in webhook mode at {}", webhook_url);

        let mut options = webhooks::Options::new(addr, webhook_url);
        if !config::TG_SECRET_TOKEN.is_empty() {
            options = options.secret_token(config::TG_SECRET_TOKEN.clone());
        }

        let (listener, stop_flag, telegram_router) = webhooks::axum_to_router(bot.clone(), options).await?;
        let app = telegram_router.merge(mail_router);

        let tcp = tokio::net::TcpListener::bind(&addr).await?;
        log::info!("HTTP server listening on {}", addr);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(tcp, app).with_graceful_shutdown(stop_flag).await {
                log::error!("HTTP server error: {}", e);
            }
        });

        log::info!("📡 Ready to receive updates!");
        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch_with_listener(
                listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;
    } else {
        // Polling mode: clear any stale webhook, serve the mail routes alone.
        if use_webhook {
            log::warn!("--webhook requested but PUBLIC_URL is not set; falling back to polling");
        }
        let _ = bot.delete_webhook().await;

        let tcp = tokio::net::TcpListener::bind(&addr).await?;
        log::info!("HTTP server (mail webhook + health) listening on {}", addr);
        tokio::spawn(async move {
            if let Err(e) = axum::serve(tcp, mail_router).await {
                log::error!("HTTP server error: {}", e);
            }
        });

        log::info!("Starting in long polling mode");
        log::info!("📡 Ready to receive updates!");
        Dispatcher::builder(bot, handler)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }

    Ok(())
}
