use crate::book::ProspectBook;
use crate::config::AppConfig;
use crate::notifier::AppointmentNotifier;
use crate::refresh::Refresher;
use crate::router::{handle, AppState};
use astra::Server;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod book;
mod config;
mod db;
mod domain;
mod errors;
mod notifier;
mod refresh;
mod responses;
mod router;
mod store;

#[cfg(test)]
mod tests;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn main() {
    init_tracing();

    // 1️⃣ Configuration decides the backend for the whole session
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let gateway = match store::open_gateway(&config) {
        Ok(gateway) => gateway,
        Err(e) => {
            error!(error = %e, "could not open prospect store");
            std::process::exit(1);
        }
    };

    // 2️⃣ Initial load; a failure lands on the banner and the server still starts
    let book = ProspectBook::new(gateway, AppointmentNotifier::new(config.webhook_url.clone()));
    if let Err(e) = book.load() {
        warn!(error = %e, "initial load failed");
    }

    let refresher = Refresher::spawn(book.clone(), config.refresh_interval);
    let state = AppState {
        book: book.clone(),
        refresher,
    };

    // 3️⃣ Start the server
    info!(addr = %config.bind_addr, backend = ?book.backend(), "starting server");
    let server = Server::bind(&config.bind_addr).max_workers(8);

    let result = server.serve(move |req, _info| match handle(req, &state) {
        Ok(resp) => resp,
        Err(err) => {
            debug!(error = %err, "request failed");
            responses::error_to_response(err)
        }
    });

    book.shutdown();
    if let Err(e) = result {
        error!(error = %e, "server ended with error");
    }

    info!("server shut down cleanly");
}
