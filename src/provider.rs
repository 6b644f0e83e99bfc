//! Access-token providers.
//!
//! [`AccessTokenProvider`] is the capability the web layer depends on: one call, one bearer
//! token. [`ClientCredentialsProvider`] performs the OAuth exchange on every call, while
//! [`CachedTokenProvider`] wraps any [`TokenExchange`] with a process-wide, single-flight cache.

pub mod cached;
pub mod client_credentials;

pub use cached::*;
pub use client_credentials::*;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ClientId, ScopeSet, TokenRecord},
};

/// Boxed future returned by provider operations.
pub type TokenFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Supplies bearer tokens for calls to the ticketing API.
///
/// Object safe so request handlers can hold an `Arc<dyn AccessTokenProvider>` and tests can swap
/// in doubles.
pub trait AccessTokenProvider
where
	Self: Send + Sync,
{
	/// Returns a bearer token for the configured client identity.
	fn access_token(&self) -> TokenFuture<'_, AccessToken>;
}

/// A token source that reports expiry, used underneath [`CachedTokenProvider`].
pub trait TokenExchange
where
	Self: Send + Sync,
{
	/// Client identity the exchange authenticates as.
	fn client_id(&self) -> &ClientId;

	/// Scopes requested with every exchange.
	fn scope(&self) -> &ScopeSet;

	/// Performs one exchange against the token endpoint.
	fn exchange(&self) -> TokenFuture<'_, TokenRecord>;
}
