use std::io;

use actix_web::{App, HttpServer, web};
use log::info;

use pow_ledger::api::{self, AppState};
use pow_ledger::{Config, open_storage};

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    env_logger::init();

    let store = open_storage(&config.database_path).map_err(io::Error::other)?;
    let state = AppState::new(store, &config);

    // Runs once, before any request can append.
    let tip = state.blockchain.initialize().map_err(io::Error::other)?;
    info!("Chain ready at block #{} ({})", tip.index, tip.hash);

    println!(
        "⛓️ Starting ledger API at http://{}:{}",
        config.host, config.port
    );

    let state = web::Data::new(state);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
