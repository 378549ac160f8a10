use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use teloxide::dispatching::dialogue;
use teloxide::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use hotel_claim_bot::bot::{callback_handler, message_handler};
use hotel_claim_bot::config::BotConfig;
use hotel_claim_bot::dialogue::ClaimDialogueState;
use hotel_claim_bot::hotel_catalog::HotelCatalog;
use hotel_claim_bot::hotel_matcher::HotelMatcher;
use hotel_claim_bot::localization::init_localization;
use hotel_claim_bot::session_store::ExpiringStorage;
use hotel_claim_bot::sheets::SheetsClient;

type SessionStorage = ExpiringStorage<ClaimDialogueState>;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = BotConfig::from_env().context("Failed to load configuration")?;
    init_tracing(config.json_logs);

    info!("Starting Hotel Claim Telegram Bot");

    init_localization().context("Failed to load localization resources")?;

    let client = SheetsClient::new(config.sheets.clone()).context("Failed to create Google Sheets client")?;
    let catalog = Arc::new(HotelCatalog::new(client, config.hotels_cache_ttl));
    match catalog.refresh().await {
        Ok(hotels) => info!(hotels = hotels.len(), "Hotel catalog loaded"),
        Err(e) => warn!(error = %e, "Initial hotel catalog load failed, will retry on first lookup"),
    }

    let matcher = Arc::new(HotelMatcher::new(config.match_policy.clone()));
    let storage = SessionStorage::new(config.session_ttl);

    // Expired sessions read as absent already; this only reclaims memory
    let purge_storage = Arc::clone(&storage);
    let purge_every = storage.ttl().max(Duration::from_secs(60));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(purge_every);
        loop {
            interval.tick().await;
            purge_storage.purge_expired().await;
        }
    });

    let bot = Bot::new(config.telegram_token.clone());

    info!(
        cache_ttl_secs = config.hotels_cache_ttl.as_secs(),
        session_ttl_secs = config.session_ttl.as_secs(),
        "Bot initialized, starting dispatcher"
    );

    let handler = dialogue::enter::<Update, SessionStorage, ClaimDialogueState, _>()
        .branch(Update::filter_message().endpoint(message_handler))
        .branch(Update::filter_callback_query().endpoint(callback_handler));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![storage, catalog, matcher])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
