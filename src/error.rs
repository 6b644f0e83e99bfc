//! Application-level error types shared by the token providers, configuration, and routes.

// std
use std::path::PathBuf;
// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, ScopeValidationError, TokenRecordBuilderError},
	oauth::RejectionKind,
};

/// Application-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// The OAuth exchange failed; no token is available for this request.
	#[error(transparent)]
	Authentication(#[from] AuthenticationError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// View data could not be rendered.
	#[error("View could not be rendered.")]
	Render {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// Placeholder for a feature that has not been built yet.
	#[error("{feature} is not implemented yet.")]
	NotImplemented {
		/// Human-readable feature label.
		feature: &'static str,
	},
}
impl Error {
	/// Returns `true` when the error originates from the OAuth exchange.
	pub fn is_authentication(&self) -> bool {
		matches!(self, Self::Authentication(_))
	}

	/// Returns `true` for the not-implemented placeholder.
	pub fn is_not_implemented(&self) -> bool {
		matches!(self, Self::NotImplemented { .. })
	}
}

/// Failures of the client-credentials exchange.
///
/// Every variant means the same thing to callers (no token), the split only exists so logs can
/// tell a rejected secret apart from an unreachable endpoint.
#[derive(Debug, ThisError)]
pub enum AuthenticationError {
	/// The token endpoint answered with an OAuth error response.
	#[error("Token endpoint rejected the client credentials: {reason}.")]
	Rejected {
		/// Classification of the OAuth `error` code.
		kind: RejectionKind,
		/// Provider-supplied reason string.
		reason: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The token endpoint could not be reached.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// The token endpoint responded with a body that could not be parsed.
	#[error("Token endpoint returned a malformed response.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// The token endpoint responded with something that is not a usable token.
	#[error("Token endpoint returned an invalid response: {reason}.")]
	InvalidResponse {
		/// Description of what was wrong with the response.
		reason: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
}
impl AuthenticationError {
	/// HTTP status reported by the token endpoint, when one was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. }
			| Self::MalformedResponse { status, .. }
			| Self::InvalidResponse { status, .. } => *status,
			Self::Transport(_) => None,
		}
	}
}

/// Transport-level failures (network, IO, timeouts).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request did not complete within the configured timeout.
	#[error("Request timed out while calling the token endpoint.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

/// Configuration and validation failures raised at startup.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A required credential was not supplied by any configuration source.
	#[error("Missing `{field}`; set it in the config file, on the command line, or in the environment.")]
	MissingCredential {
		/// Name of the missing option.
		field: &'static str,
	},
	/// Client identifier or product name failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] IdentifierError),
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] ScopeValidationError),
	/// Token endpoint cannot be parsed.
	#[error("Token endpoint is not a valid URL.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Token endpoint does not use HTTPS.
	#[error("The token endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Landing page coordinates are out of range.
	#[error("Coordinates ({latitude}, {longitude}) are out of range.")]
	InvalidCoordinates {
		/// Configured latitude.
		latitude: f64,
		/// Configured longitude.
		longitude: f64,
	},
	/// Product name cannot be used as an HTTP header value.
	#[error("Product name `{product}` is not a valid header value.")]
	InvalidProductHeader {
		/// Offending product name.
		product: String,
	},
	/// Token record builder validation failed.
	#[error("Unable to build token record.")]
	TokenBuild(#[from] TokenRecordBuilderError),
	/// Config file could not be read.
	#[error("Config file `{}` could not be read.", path.display())]
	ReadFile {
		/// Path that was read.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Config file is not valid TOML for this application.
	#[error("Config file `{}` could not be parsed.", path.display())]
	ParseFile {
		/// Path that was parsed.
		path: PathBuf,
		/// Underlying TOML failure.
		#[source]
		source: toml::de::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<reqwest::Error> for ConfigError {
	fn from(e: reqwest::Error) -> Self {
		Self::http_client_build(e)
	}
}
