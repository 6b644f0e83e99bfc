//! `event-viewer` server binary.

// crates.io
use clap::Parser;
use tokio::net::TcpListener;
// self
use event_viewer::{
	config::{AppConfig, Cli},
	obs, web,
};

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let cli = Cli::parse();
	let config = AppConfig::load(&cli)?;

	obs::init_subscriber(&config.log);

	tracing::info!(
		client_id = %config.client.client_id,
		token_endpoint = %config.client.token_endpoint,
		cache = config.cache.enabled,
		"Starting event viewer."
	);

	let state = web::AppState::from_config(&config)?;
	let listener = TcpListener::bind(config.listen).await?;

	web::serve(listener, state).await?;

	Ok(())
}
