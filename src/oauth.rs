//! OAuth 2.0 client-credentials facade over the `oauth2` crate, plus error classification.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, ClientId as OAuthClientId, ClientSecret as OAuthClientSecret, EndpointNotSet,
	EndpointSet, HttpClientError, RequestTokenError, Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet, TokenRecord, TokenRecordBuilderError},
	config::ClientConfig,
	error::{AuthenticationError, ConfigError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeTokenResponse = oauth2::basic::BasicTokenResponse;

/// Client authentication modes for the token endpoint call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Classification of an OAuth error response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RejectionKind {
	/// Client authentication failed (bad id/secret, client not allowed).
	InvalidClient,
	/// The grant itself was refused.
	InvalidGrant,
	/// Requested scopes were refused.
	InvalidScope,
	/// The endpoint reported a temporary failure.
	Unavailable,
}
impl RejectionKind {
	/// Returns a stable label suitable for log fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RejectionKind::InvalidClient => "invalid_client",
			RejectionKind::InvalidGrant => "invalid_grant",
			RejectionKind::InvalidScope => "invalid_scope",
			RejectionKind::Unavailable => "unavailable",
		}
	}

	/// Classifies an OAuth `error` code, falling back to the HTTP status for unknown codes.
	pub fn classify(oauth_error: &str, status: Option<u16>) -> Self {
		match_exact_value(oauth_error).unwrap_or_else(|| classify_status(status))
	}
}
impl Display for RejectionKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Maps HTTP transport failures into application [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into an application error.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(*inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => AuthenticationError::from(TransportError::Io(inner)).into(),
			HttpClientError::Other(message) => map_generic_transport_error(meta, message),
			_ => map_generic_transport_error(meta, "unknown transport failure"),
		}
	}
}

/// Client-credentials exchange bound to one client identity and token endpoint.
pub(crate) struct TokenFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> TokenFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_config(
		config: &ClientConfig,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		config.validate()?;

		let token_url = TokenUrl::new(config.token_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { source })?;
		let mut oauth_client = BasicClient::new(OAuthClientId::new(config.client_id.to_string()))
			.set_client_secret(OAuthClientSecret::new(config.client_secret.expose().to_owned()))
			.set_token_uri(token_url);

		if matches!(config.client_auth, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self {
			oauth_client,
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
		})
	}

	/// Performs one `grant_type=client_credentials` round trip.
	pub(crate) async fn exchange_client_credentials(
		&self,
		client_id: &ClientId,
		scope: &ScopeSet,
	) -> Result<TokenRecord> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let mut request = self.oauth_client.exchange_client_credentials();

		for value in scope.iter() {
			request = request.add_scope(Scope::new(value.to_owned()));
		}

		let response = request
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err, self.error_mapper.as_ref()))?;

		map_token_response(client_id.clone(), scope.clone(), response, meta.take())
	}
}

fn map_token_response(
	client_id: ClientId,
	scope: ScopeSet,
	response: FacadeTokenResponse,
	meta: Option<ResponseMetadata>,
) -> Result<TokenRecord> {
	let meta = meta.as_ref();
	let issued_at = OffsetDateTime::now_utc();
	let builder = TokenRecord::builder(client_id, scope)
		.access_token(response.access_token().secret().to_owned())
		.issued_at(issued_at);
	let builder = match response.expires_in() {
		Some(expires_in) => {
			let secs = i64::try_from(expires_in.as_secs())
				.map_err(|_| invalid_response("expires_in exceeds the supported range", meta))?;

			if secs <= 0 {
				return Err(invalid_response("expires_in must be positive", meta).into());
			}

			builder.expires_in(Duration::seconds(secs))
		},
		// Without a lifetime the record is due for refresh as soon as it is issued.
		None => builder.expires_at(issued_at),
	};

	builder.build().map_err(|err| match err {
		TokenRecordBuilderError::MissingAccessToken =>
			Error::from(invalid_response("access_token is empty", meta)),
		TokenRecordBuilderError::ExpiryOutOfRange { .. } =>
			Error::from(invalid_response("expires_in exceeds the supported range", meta)),
		other => Error::from(ConfigError::from(other)),
	})
}

fn invalid_response(reason: &str, meta: Option<&ResponseMetadata>) -> AuthenticationError {
	AuthenticationError::InvalidResponse {
		reason: reason.into(),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
}

fn map_request_error<E, M>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(response, meta_ref),
		RequestTokenError::Request(error) => mapper.map_transport_error(meta_ref, error),
		RequestTokenError::Parse(error, _body) =>
			AuthenticationError::MalformedResponse { source: error, status: meta_status(meta_ref) }
				.into(),
		RequestTokenError::Other(message) => AuthenticationError::InvalidResponse {
			reason: message,
			status: meta_status(meta_ref),
			retry_after: meta_retry_after(meta_ref),
		}
		.into(),
	}
}

fn map_server_response_error(response: BasicErrorResponse, meta: Option<&ResponseMetadata>) -> Error {
	let code: &str = response.error().as_ref();
	let status = meta_status(meta);
	let reason = match response.error_description() {
		Some(description) => format!("{code} ({description})"),
		None => code.to_owned(),
	};

	AuthenticationError::Rejected { kind: RejectionKind::classify(code, status), reason, status }
		.into()
}

fn map_reqwest_error(err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}

	AuthenticationError::from(TransportError::from(err)).into()
}

fn map_generic_transport_error(meta: Option<&ResponseMetadata>, message: impl Display) -> Error {
	AuthenticationError::InvalidResponse {
		reason: format!("HTTP client error occurred while calling the token endpoint: {message}"),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

fn match_exact_value(value: &str) -> Option<RejectionKind> {
	if value.eq_ignore_ascii_case("invalid_client")
		|| value.eq_ignore_ascii_case("unauthorized_client")
	{
		Some(RejectionKind::InvalidClient)
	} else if value.eq_ignore_ascii_case("invalid_grant")
		|| value.eq_ignore_ascii_case("unsupported_grant_type")
		|| value.eq_ignore_ascii_case("access_denied")
	{
		Some(RejectionKind::InvalidGrant)
	} else if value.eq_ignore_ascii_case("invalid_scope") {
		Some(RejectionKind::InvalidScope)
	} else if value.eq_ignore_ascii_case("temporarily_unavailable")
		|| value.eq_ignore_ascii_case("server_error")
	{
		Some(RejectionKind::Unavailable)
	} else {
		None
	}
}

fn classify_status(status: Option<u16>) -> RejectionKind {
	match status {
		Some(401) => RejectionKind::InvalidClient,
		Some(403) => RejectionKind::InvalidScope,
		Some(400 | 404 | 410) => RejectionKind::InvalidGrant,
		_ => RejectionKind::Unavailable,
	}
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}
