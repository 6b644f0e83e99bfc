//! Uncached client-credentials provider: one token endpoint round trip per call.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ClientId, ScopeSet, TokenRecord},
	config::ClientConfig,
	http::{ReqwestHttpClient, TokenHttpClient},
	oauth::{ReqwestTransportErrorMapper, TokenFacade, TransportErrorMapper},
	obs::{self, TokenOutcome, TokenSpan, TokenStage},
	provider::{AccessTokenProvider, TokenExchange, TokenFuture},
};

/// Provider specialized for the crate's default reqwest transport stack.
pub type ReqwestClientCredentialsProvider =
	ClientCredentialsProvider<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Performs the `client_credentials` grant for one client identity on every call.
pub struct ClientCredentialsProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	facade: TokenFacade<C, M>,
	client_id: ClientId,
	scope: ScopeSet,
}
impl ClientCredentialsProvider<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Builds a provider backed by a reqwest client configured from `config`.
	pub fn from_config(config: &ClientConfig) -> Result<Self> {
		let http_client = ReqwestHttpClient::from_config(config)?;

		Self::with_http_client(config, http_client, ReqwestTransportErrorMapper)
	}
}
impl<C, M> ClientCredentialsProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a provider that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: &ClientConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let facade = TokenFacade::from_config(config, http_client, mapper)?;

		Ok(Self { facade, client_id: config.client_id.clone(), scope: config.scopes.clone() })
	}

	/// Exchanges the client credentials for a fresh token record.
	pub async fn fetch(&self) -> Result<TokenRecord> {
		const STAGE: TokenStage = TokenStage::Exchange;

		let span = TokenSpan::new(STAGE, &self.client_id);

		obs::record_token_outcome(STAGE, TokenOutcome::Attempt);

		let result = span
			.instrument(async {
				let result =
					self.facade.exchange_client_credentials(&self.client_id, &self.scope).await;

				match &result {
					Ok(record) => tracing::info!(expires_at = %record.expires_at, "Issued access token."),
					Err(err) => tracing::warn!(error = %err, "Token exchange failed."),
				}

				result
			})
			.await;

		match &result {
			Ok(_) => obs::record_token_outcome(STAGE, TokenOutcome::Success),
			Err(_) => obs::record_token_outcome(STAGE, TokenOutcome::Failure),
		}

		result
	}
}
impl<C, M> TokenExchange for ClientCredentialsProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn client_id(&self) -> &ClientId {
		&self.client_id
	}

	fn scope(&self) -> &ScopeSet {
		&self.scope
	}

	fn exchange(&self) -> TokenFuture<'_, TokenRecord> {
		Box::pin(self.fetch())
	}
}
impl<C, M> AccessTokenProvider for ClientCredentialsProvider<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn access_token(&self) -> TokenFuture<'_, AccessToken> {
		Box::pin(async move { Ok(self.fetch().await?.access_token) })
	}
}
