use clap::Parser;
use rating_worker::{
    api::{
        rate_limit::RateLimiter,
        transport::{AuthorizedClient, Credentials},
        OsuApi, OSU_CLIENT_KEY
    },
    args::Args,
    database::db::DbClient,
    ingestion::worker::IngestionWorker,
    messaging::{RabbitMqConfig, RabbitMqPublisher},
    model::{rating_engine::RatingEngine, rating_tracker::RatingTracker}
};
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&args.log_level))
        .init();

    let db = DbClient::connect(&args.connection_string).await?;

    let limiter = RateLimiter::per_minute(args.requests_per_minute);
    let client = AuthorizedClient::new(reqwest::Client::new(), limiter).with_credentials(
        OSU_CLIENT_KEY,
        Credentials {
            client_id: args.osu_client_id.clone(),
            client_secret: args.osu_client_secret.clone(),
            token_url: args.token_url.clone()
        }
    );
    let api = Arc::new(OsuApi::new(client, &args.api_base_url));

    let publisher = match RabbitMqConfig::from_env() {
        Ok(config) => match RabbitMqPublisher::connect_from_config(&config).await {
            Ok(publisher) => Some(Arc::new(publisher)),
            Err(e) => {
                warn!("RabbitMQ unavailable, events will not be published: {e}");
                None
            }
        },
        Err(_) => {
            info!("RabbitMQ credentials not configured, events will not be published");
            None
        }
    };

    let tracker = RatingTracker::new();
    tracker.seed(db.get_ratings().await?);
    info!(ratings = tracker.len(), "rating tracker seeded");

    let engine = Arc::new(RatingEngine::new(tracker));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown requested");
        let _ = shutdown_tx.send(true);
    });

    let worker = IngestionWorker::new(
        api,
        db,
        engine,
        publisher,
        shutdown_rx.clone(),
        args.poll_concurrency
    );

    info!(
        interval = args.poll_interval,
        concurrency = args.poll_concurrency,
        "worker started"
    );

    let mut shutdown = shutdown_rx;
    loop {
        if *shutdown.borrow() {
            break;
        }

        if let Err(e) = worker.run_batch().await {
            error!("polling batch failed: {e}");
        }

        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(args.poll_interval)) => {}
            _ = shutdown.changed() => break
        }
    }

    Ok(())
}
