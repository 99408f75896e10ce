mod config;
mod db;
mod handlers;
mod models;
mod services;
mod utils;

use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use config::{Config, StoreBackend};
use db::{HookStore, MemoryHookStore, RedisHookStore};
use services::{GithubApi, GithubClient, RegistrationService, WebhookIntake};
use std::sync::Arc;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logger
    env_logger::init();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    let server_address = config.server_address();

    log::info!("Starting hookline server...");
    log::info!("Configuration loaded successfully");

    let store: Arc<dyn HookStore> = match config.store_backend {
        StoreBackend::Redis => {
            let pool = db::create_pool(
                &config.redis_url,
                config.redis_pool_size,
                config.store_timeout,
            )
            .await
            .context("Failed to connect to Redis")?;

            log::info!("Redis connection established");
            Arc::new(RedisHookStore::new(pool, config.store_timeout))
        }
        StoreBackend::Memory => {
            log::warn!("Using in-memory hook store, registrations will not survive a restart");
            Arc::new(MemoryHookStore::new())
        }
    };
    let github: Arc<dyn GithubApi> = Arc::new(
        GithubClient::new(&config.github_api_url).context("Failed to build GitHub client")?,
    );

    let (events, queue) = services::event_channel(config.event_queue_capacity);
    services::spawn_event_consumer(queue);

    let registration = web::Data::new(RegistrationService::new(
        store.clone(),
        github.clone(),
        &config.public_url,
    ));
    let intake = web::Data::new(WebhookIntake::new(store.clone(), events));
    let store_data = web::Data::from(store);
    let github_data = web::Data::from(github);
    let max_payload_bytes = config.max_payload_bytes;

    log::info!("Server starting on http://{server_address}");
    log::info!("Callback URLs are issued under {}/hooks/", config.public_url);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            // Add logger middleware
            .wrap(middleware::Logger::default())
            // Add shared state
            .app_data(web::PayloadConfig::new(max_payload_bytes))
            .app_data(registration.clone())
            .app_data(intake.clone())
            .app_data(store_data.clone())
            .app_data(github_data.clone())
            // Webhook intake
            .route("/hooks/{token}", web::post().to(handlers::receive_hook))
            // Registration API
            .route("/api/repos", web::get().to(handlers::list_repositories))
            .route(
                "/api/repos/{owner}/{name}/hook",
                web::post().to(handlers::install_hook),
            )
            .route(
                "/api/repos/{owner}/{name}/hook",
                web::get().to(handlers::hook_status),
            )
            // Web interface routes
            .route(
                "/repo/{owner}/{name}",
                web::get().to(handlers::repository_detail),
            )
    })
    .bind(&server_address)?
    .run()
    .await?;

    Ok(())
}
