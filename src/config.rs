//! Startup configuration: defaults, an optional TOML file, then command-line/environment
//! overrides.
//!
//! Everything is validated once in [`AppConfig::load`]; the rest of the application only ever
//! sees a consistent [`AppConfig`].

// std
use std::{
	net::{Ipv4Addr, SocketAddr},
	path::{Path, PathBuf},
	time::Duration as StdDuration,
};
// crates.io
use clap::Parser;
// self
use crate::{
	_prelude::*,
	auth::{ClientId, ClientSecret, ProductName, ScopeSet},
	error::ConfigError,
	oauth::ClientAuthMethod,
	web::IndexDefaults,
};

/// Token endpoint used when none is configured.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "https://account.viagogo.com/oauth2/token";
/// Product name sent as the `User-Agent` when none is configured.
pub const DEFAULT_PRODUCT_NAME: &str = "EventViewer";
/// Address the server binds when none is configured.
pub const DEFAULT_LISTEN: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(Ipv4Addr::LOCALHOST), 8080);

/// Command-line flags; every flag can also come from the environment.
#[derive(Clone, Debug, Default, Parser)]
#[command(name = "event-viewer", version, about)]
pub struct Cli {
	/// Path to a TOML config file.
	#[arg(long, env = "EVENT_VIEWER_CONFIG")]
	pub config: Option<PathBuf>,
	/// Address to listen on.
	#[arg(long, env = "EVENT_VIEWER_LISTEN")]
	pub listen: Option<SocketAddr>,
	/// OAuth client identifier.
	#[arg(long, env = "VIAGOGO_CLIENT_ID")]
	pub client_id: Option<String>,
	/// OAuth client secret.
	#[arg(long, env = "VIAGOGO_CLIENT_SECRET", hide_env_values = true)]
	pub client_secret: Option<String>,
	/// Product name sent to the API.
	#[arg(long, env = "VIAGOGO_PRODUCT_NAME")]
	pub product_name: Option<String>,
	/// OAuth token endpoint.
	#[arg(long, env = "VIAGOGO_TOKEN_ENDPOINT")]
	pub token_endpoint: Option<Url>,
	/// Emit JSON log lines.
	#[arg(long, env = "EVENT_VIEWER_LOG_JSON")]
	pub log_json: bool,
}

/// Identity and endpoint used for the client-credentials exchange.
#[derive(Clone, Debug)]
pub struct ClientConfig {
	/// OAuth client identifier.
	pub client_id: ClientId,
	/// OAuth client secret.
	pub client_secret: ClientSecret,
	/// Product name sent as the `User-Agent` header.
	pub product_name: ProductName,
	/// Token endpoint URL.
	pub token_endpoint: Url,
	/// How the client authenticates against the token endpoint.
	pub client_auth: ClientAuthMethod,
	/// Scopes requested with every token; empty by default.
	pub scopes: ScopeSet,
	/// Optional per-request timeout; the HTTP client default applies when unset.
	pub request_timeout: Option<StdDuration>,
	/// Accept a plain `http` token endpoint (local development and tests only).
	pub allow_insecure_endpoint: bool,
}
impl ClientConfig {
	/// Creates a configuration for `token_endpoint` with basic client auth and no scopes.
	pub fn new(
		client_id: ClientId,
		client_secret: ClientSecret,
		product_name: ProductName,
		token_endpoint: Url,
	) -> Self {
		Self {
			client_id,
			client_secret,
			product_name,
			token_endpoint,
			client_auth: ClientAuthMethod::default(),
			scopes: ScopeSet::default(),
			request_timeout: None,
			allow_insecure_endpoint: false,
		}
	}

	/// Overrides the client authentication method.
	pub fn with_client_auth(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth = method;

		self
	}

	/// Overrides the requested scopes.
	pub fn with_scopes(mut self, scopes: ScopeSet) -> Self {
		self.scopes = scopes;

		self
	}

	/// Sets a per-request timeout.
	pub fn with_request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout = Some(timeout);

		self
	}

	/// Allows a plain `http` token endpoint.
	pub fn allow_insecure_endpoint(mut self, allow: bool) -> Self {
		self.allow_insecure_endpoint = allow;

		self
	}

	/// Checks invariants that cannot be expressed in the field types.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.client_secret.is_empty() {
			return Err(ConfigError::MissingCredential { field: "client_secret" });
		}

		match self.token_endpoint.scheme() {
			"https" => Ok(()),
			"http" if self.allow_insecure_endpoint => Ok(()),
			_ => Err(ConfigError::InsecureEndpoint { url: self.token_endpoint.to_string() }),
		}
	}
}

/// Token cache settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheConfig {
	/// Reuse tokens across requests until they approach expiry.
	pub enabled: bool,
	/// Remaining lifetime under which a cached token is refreshed before use.
	pub preemptive_window: Duration,
}
impl Default for CacheConfig {
	fn default() -> Self {
		Self { enabled: true, preemptive_window: Duration::seconds(60) }
	}
}

/// Log output settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LogConfig {
	/// Emit JSON lines instead of compact text.
	pub json: bool,
}

/// Fully resolved application configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
	/// Address the HTTP server binds.
	pub listen: SocketAddr,
	/// Client-credentials identity.
	pub client: ClientConfig,
	/// Token cache settings.
	pub cache: CacheConfig,
	/// Values placed on the landing page.
	pub index: IndexDefaults,
	/// Log output settings.
	pub log: LogConfig,
}
impl AppConfig {
	/// Resolves the configuration from the optional file named by `cli` plus `cli` overrides.
	pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
		let file = match &cli.config {
			Some(path) => FileConfig::read(path)?,
			None => FileConfig::default(),
		};

		Self::resolve(file, cli)
	}

	/// Merges a parsed file with command-line overrides and validates the result.
	pub fn resolve(file: FileConfig, cli: &Cli) -> Result<Self, ConfigError> {
		let FileConfig { listen, client, cache, index, log } = file;
		let client_id = cli
			.client_id
			.clone()
			.or(client.client_id)
			.ok_or(ConfigError::MissingCredential { field: "client_id" })?;
		let client_secret = cli
			.client_secret
			.clone()
			.or(client.client_secret)
			.ok_or(ConfigError::MissingCredential { field: "client_secret" })?;
		let product_name = cli
			.product_name
			.clone()
			.or(client.product_name)
			.unwrap_or_else(|| DEFAULT_PRODUCT_NAME.into());
		let token_endpoint = match cli.token_endpoint.clone().or(client.token_endpoint) {
			Some(url) => url,
			None => Url::parse(DEFAULT_TOKEN_ENDPOINT)
				.map_err(|source| ConfigError::InvalidEndpoint { source })?,
		};
		let mut client_config = ClientConfig::new(
			ClientId::new(client_id)?,
			ClientSecret::new(client_secret),
			ProductName::new(product_name)?,
			token_endpoint,
		)
		.with_client_auth(client.client_auth.unwrap_or_default())
		.with_scopes(client.scopes.unwrap_or_default())
		.allow_insecure_endpoint(client.allow_insecure_endpoint);

		if let Some(secs) = client.request_timeout_secs {
			client_config = client_config.with_request_timeout(StdDuration::from_secs(secs));
		}

		client_config.validate()?;

		let cache_defaults = CacheConfig::default();
		let cache = CacheConfig {
			enabled: cache.enabled.unwrap_or(cache_defaults.enabled),
			preemptive_window: cache
				.preemptive_window_secs
				.map(|secs| Duration::seconds(i64::from(secs)))
				.unwrap_or(cache_defaults.preemptive_window),
		};
		let index = index.unwrap_or_default();

		index.validate()?;

		Ok(Self {
			listen: cli.listen.or(listen).unwrap_or(DEFAULT_LISTEN),
			client: client_config,
			cache,
			index,
			log: LogConfig { json: cli.log_json || log.json.unwrap_or(false) },
		})
	}
}

/// On-disk TOML layout. Every field is optional; missing values fall back to defaults.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
	/// Address the HTTP server binds.
	pub listen: Option<SocketAddr>,
	/// `[client]` table.
	pub client: FileClientConfig,
	/// `[cache]` table.
	pub cache: FileCacheConfig,
	/// `[index]` table.
	pub index: Option<IndexDefaults>,
	/// `[log]` table.
	pub log: FileLogConfig,
}
impl FileConfig {
	/// Reads and parses a TOML config file.
	pub fn read(path: &Path) -> Result<Self, ConfigError> {
		let raw = std::fs::read_to_string(path)
			.map_err(|source| ConfigError::ReadFile { path: path.to_owned(), source })?;

		Self::parse(&raw).map_err(|source| ConfigError::ParseFile { path: path.to_owned(), source })
	}

	/// Parses TOML text.
	pub fn parse(raw: &str) -> Result<Self, toml::de::Error> {
		toml::from_str(raw)
	}
}

/// `[client]` table of the config file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileClientConfig {
	/// OAuth client identifier.
	pub client_id: Option<String>,
	/// OAuth client secret.
	pub client_secret: Option<String>,
	/// Product name sent to the API.
	pub product_name: Option<String>,
	/// Token endpoint URL.
	pub token_endpoint: Option<Url>,
	/// Client authentication method.
	pub client_auth: Option<ClientAuthMethod>,
	/// Requested scopes.
	pub scopes: Option<ScopeSet>,
	/// Per-request timeout in seconds.
	pub request_timeout_secs: Option<u64>,
	/// Accept a plain `http` token endpoint.
	pub allow_insecure_endpoint: bool,
}

/// `[cache]` table of the config file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileCacheConfig {
	/// Reuse tokens across requests.
	pub enabled: Option<bool>,
	/// Refresh window in seconds.
	pub preemptive_window_secs: Option<u32>,
}

/// `[log]` table of the config file.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileLogConfig {
	/// Emit JSON lines.
	pub json: Option<bool>,
}
