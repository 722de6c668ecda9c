use std::sync::Arc;

use rental_server::auth::verifier::HttpVerifier;
use rental_server::config::Config;
use rental_server::store::postgres::PgStore;
use rental_server::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	env_logger::init();
	let config = Config::from_env();

	let store = Arc::new(PgStore::connect(&config).await?);
	let state = AppState {
		listings: store.clone(),
		bookings: store,
		verifier: Arc::new(HttpVerifier::new(config.verifier_url.clone())),
		jwt_secret: config.jwt_secret.clone(),
		environment: config.environment,
	};

	let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
	log::info!("listening on {}", config.bind_addr);
	axum::serve(listener, app(state)).await?;
	Ok(())
}
