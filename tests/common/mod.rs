//! Helpers shared by the integration tests.

#![allow(dead_code)]

pub use std::{
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	future::Future,
	pin::Pin,
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration as StdDuration,
};

pub use event_viewer::url::Url;
pub use time::Duration;

// crates.io
use httpmock::prelude::*;
// self
use event_viewer::{
	auth::{AccessToken, ClientId, ClientSecret, ProductName},
	config::ClientConfig,
	error::{AuthenticationError, Error, Result, TransportError},
	provider::{AccessTokenProvider, TokenFuture},
};

pub const CLIENT_ID: &str = "event-viewer-client";
pub const CLIENT_SECRET: &str = "event-viewer-secret";
pub const PRODUCT_NAME: &str = "EventViewer";

/// Client configuration pointing at the mock server's `/oauth2/token`.
pub fn client_config(server: &MockServer) -> ClientConfig {
	ClientConfig::new(
		ClientId::new(CLIENT_ID).expect("Client fixture should be valid."),
		ClientSecret::new(CLIENT_SECRET),
		ProductName::new(PRODUCT_NAME).expect("Product fixture should be valid."),
		Url::parse(&server.url("/oauth2/token")).expect("Mock token endpoint should parse."),
	)
	.allow_insecure_endpoint(true)
}

/// JSON body of a successful token response.
pub fn token_body(token: &str, expires_in: u64) -> String {
	format!("{{\"access_token\":\"{token}\",\"token_type\":\"bearer\",\"expires_in\":{expires_in}}}")
}

/// Provider double that hands out a fixed token and counts calls.
#[derive(Default)]
pub struct StaticProvider {
	pub token: String,
	pub calls: AtomicUsize,
}
impl StaticProvider {
	pub fn new(token: &str) -> Self {
		Self { token: token.into(), calls: AtomicUsize::new(0) }
	}
}
impl AccessTokenProvider for StaticProvider {
	fn access_token(&self) -> TokenFuture<'_, AccessToken> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			Ok(AccessToken::new(self.token.clone()))
		})
	}
}

/// Provider double whose token endpoint is always unreachable.
#[derive(Default)]
pub struct FailingProvider {
	pub calls: AtomicUsize,
}
impl AccessTokenProvider for FailingProvider {
	fn access_token(&self) -> TokenFuture<'_, AccessToken> {
		Box::pin(async move {
			self.calls.fetch_add(1, Ordering::SeqCst);

			Err(unreachable_endpoint())
		})
	}
}

/// Authentication error for an endpoint that refused the connection.
pub fn unreachable_endpoint() -> Error {
	AuthenticationError::from(TransportError::Io(std::io::Error::new(
		std::io::ErrorKind::ConnectionRefused,
		"connection refused",
	)))
	.into()
}

/// Unwraps the authentication error or fails the test.
pub fn expect_authentication<T>(result: Result<T>) -> AuthenticationError
where
	T: std::fmt::Debug,
{
	match result {
		Err(Error::Authentication(err)) => err,
		other => panic!("Expected an authentication error, got {other:?}."),
	}
}
