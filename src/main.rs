//! Talent Registry - Main Entry Point
//!
//! Starts the web API server for the company directory and resume store.

use talent_registry::api::run_server;
use talent_registry::config::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logging
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    run_server(config).await
}
