use actix_web::{App, HttpServer, web};
use clap::Parser;
use miette::{IntoDiagnostic, Result};
use std::sync::Arc;
use std::time::Duration;
use url::Url;
use zapcycle::application::dispatcher;
use zapcycle::application::engine::{EngineConfig, RecurrenceEngine};
use zapcycle::config::Config;
use zapcycle::domain::ports::{
    NotifierRef, PaymentClientRef, SubscriptionStoreRef, TriggerBusRef,
};
use zapcycle::infrastructure::email::HttpMailer;
use zapcycle::infrastructure::in_memory::InMemorySubscriptionStore;
use zapcycle::infrastructure::nwc::NwcBridgeClient;
#[cfg(feature = "storage-rocksdb")]
use zapcycle::infrastructure::rocksdb::RocksDbSubscriptionStore;
use zapcycle::infrastructure::trigger::TokioTriggerBus;
use zapcycle::interfaces::http::{self, AppState};
use zapcycle::logging;

/// Recurring Lightning payment scheduler.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Bind address, overrides HOST
    #[arg(long)]
    host: Option<String>,

    /// Bind port, overrides PORT
    #[arg(long)]
    port: Option<u16>,

    /// Path to persistent database. If provided, uses RocksDB.
    #[cfg(feature = "storage-rocksdb")]
    #[arg(long)]
    db_path: Option<std::path::PathBuf>,
}

#[actix_web::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = Config::from_env();

    if config.console_logging_enabled {
        logging::setup().into_diagnostic()?;
    }

    #[cfg(feature = "storage-rocksdb")]
    let store: SubscriptionStoreRef = match &cli.db_path {
        Some(db_path) => Arc::new(RocksDbSubscriptionStore::open(db_path).into_diagnostic()?),
        None => Arc::new(InMemorySubscriptionStore::new()),
    };
    #[cfg(not(feature = "storage-rocksdb"))]
    let store: SubscriptionStoreRef = Arc::new(InMemorySubscriptionStore::new());

    let bridge_url = Url::parse(&config.nwc_bridge_url).into_diagnostic()?;
    let payments: PaymentClientRef = Arc::new(
        NwcBridgeClient::new(bridge_url, Duration::from_secs(config.payment_timeout_secs))
            .into_diagnostic()?,
    );

    let mailer_url = Url::parse(&config.mailer_url).into_diagnostic()?;
    let notifier: NotifierRef = Arc::new(
        HttpMailer::new(
            mailer_url,
            config.mailer_token.clone(),
            config.mailer_sender.clone(),
            Duration::from_secs(10),
        )
        .into_diagnostic()?,
    );

    let (bus, deliveries) = TokioTriggerBus::new();
    let bus: TriggerBusRef = Arc::new(bus);

    let engine = Arc::new(RecurrenceEngine::new(
        store.clone(),
        payments.clone(),
        notifier,
        bus.clone(),
        EngineConfig {
            max_retries: config.max_retries,
        },
    ));
    tokio::spawn(dispatcher::run(engine.clone(), deliveries));

    let state = web::Data::new(AppState {
        store,
        payments,
        bus,
        engine,
    });

    let host = cli.host.unwrap_or(config.server_host);
    let port = cli.port.unwrap_or(config.server_port);
    log::info!("listening on {}:{}", host, port);

    HttpServer::new(move || App::new().app_data(state.clone()).service(http::mount()))
        .bind((host.as_str(), port))
        .into_diagnostic()?
        .run()
        .await
        .into_diagnostic()
}
