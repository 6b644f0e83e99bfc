//! Issued token records and their builder.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet, token::secret::AccessToken},
};

/// Errors produced by [`TokenRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenRecordBuilderError {
	/// No access token value was provided, or it was empty.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// No expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// The relative expiry does not fit in a calendar date.
	#[error("Expiry of {expires_in} is out of range.")]
	ExpiryOutOfRange {
		/// Lifetime that overflowed.
		expires_in: Duration,
	},
}

/// Access token issued for a client identity, with the expiry the cache needs.
#[derive(Clone, Debug)]
pub struct TokenRecord {
	/// Client identity the token was issued to.
	pub client_id: ClientId,
	/// Scopes requested for this token.
	pub scope: ScopeSet,
	/// Bearer token; callers must avoid logging it.
	pub access_token: AccessToken,
	/// Instant the token endpoint answered.
	pub issued_at: OffsetDateTime,
	/// Instant after which the token must not be sent.
	pub expires_at: OffsetDateTime,
}
impl TokenRecord {
	/// Returns a builder for the provided client identity and scope.
	pub fn builder(client_id: ClientId, scope: ScopeSet) -> TokenRecordBuilder {
		TokenRecordBuilder {
			client_id,
			scope,
			access_token: None,
			issued_at: None,
			expiry: None,
		}
	}

	/// Returns `true` once `instant` reaches the expiry.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Remaining lifetime at the provided instant, clamped at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}
}

#[derive(Clone, Copy, Debug)]
enum Expiry {
	At(OffsetDateTime),
	In(Duration),
}

/// Builder for [`TokenRecord`].
#[derive(Clone, Debug)]
pub struct TokenRecordBuilder {
	client_id: ClientId,
	scope: ScopeSet,
	access_token: Option<AccessToken>,
	issued_at: Option<OffsetDateTime>,
	expiry: Option<Expiry>,
}
impl TokenRecordBuilder {
	/// Sets the issued-at instant; defaults to now.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expiry = Some(Expiry::At(instant));

		self
	}

	/// Sets the lifetime relative to the issued-at instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expiry = Some(Expiry::In(duration));

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(AccessToken::new(token));

		self
	}

	/// Consumes the builder and produces a [`TokenRecord`].
	pub fn build(self) -> Result<TokenRecord, TokenRecordBuilderError> {
		let access_token = self
			.access_token
			.filter(|token| !token.is_empty())
			.ok_or(TokenRecordBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match self.expiry.ok_or(TokenRecordBuilderError::MissingExpiry)? {
			Expiry::At(instant) => instant,
			Expiry::In(expires_in) => issued_at
				.checked_add(expires_in)
				.ok_or(TokenRecordBuilderError::ExpiryOutOfRange { expires_in })?,
		};

		Ok(TokenRecord { client_id: self.client_id, scope: self.scope, access_token, issued_at, expires_at })
	}
}
