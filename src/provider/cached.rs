//! Process-wide token cache with single-flight refresh.
//!
//! Each [`CacheKey`] owns one async mutex. A caller takes the key's lock, re-checks the cache,
//! and only then contacts the token endpoint, so concurrent requests that arrive while a token
//! is being refreshed piggy-back on that refresh instead of stampeding the endpoint. Cached
//! records are refreshed once their remaining lifetime drops under a jittered preemptive window.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, ClientId, ScopeSet, TokenRecord},
	config::CacheConfig,
	obs::{self, TokenOutcome, TokenSpan, TokenStage},
	provider::{AccessTokenProvider, TokenExchange, TokenFuture},
};

type RecordMap = Arc<RwLock<HashMap<CacheKey, TokenRecord>>>;
type GuardMap = Arc<Mutex<HashMap<CacheKey, Arc<AsyncMutex<()>>>>>;

/// Identity a cached token belongs to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
	/// Client identity the token was issued to.
	pub client_id: ClientId,
	/// Scopes the token was requested with.
	pub scope: ScopeSet,
}
impl CacheKey {
	/// Creates a key for the provided client identity and scope set.
	pub fn new(client_id: &ClientId, scope: &ScopeSet) -> Self {
		Self { client_id: client_id.to_owned(), scope: scope.to_owned() }
	}
}

/// Shared token storage plus the per-key single-flight guards.
///
/// Clones share the same maps.
#[derive(Clone, Debug, Default)]
pub struct TokenCache {
	records: RecordMap,
	guards: GuardMap,
}
impl TokenCache {
	/// Returns the cached record for `key`, if any.
	pub fn get(&self, key: &CacheKey) -> Option<TokenRecord> {
		self.records.read().get(key).cloned()
	}

	/// Stores `record` under `key`, replacing any previous record.
	pub fn insert(&self, key: CacheKey, record: TokenRecord) {
		self.records.write().insert(key, record);
	}

	/// Drops the record for `key`, returning it.
	pub fn remove(&self, key: &CacheKey) -> Option<TokenRecord> {
		self.records.write().remove(key)
	}

	/// Number of cached records.
	pub fn len(&self) -> usize {
		self.records.read().len()
	}

	/// Returns `true` when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.records.read().is_empty()
	}

	fn guard(&self, key: &CacheKey) -> Arc<AsyncMutex<()>> {
		let mut guards = self.guards.lock();

		guards.entry(key.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}
}

/// Serves tokens from a [`TokenCache`], exchanging only when the cached one is due.
pub struct CachedTokenProvider<E>
where
	E: ?Sized + TokenExchange,
{
	exchange: Arc<E>,
	cache: TokenCache,
	key: CacheKey,
	preemptive_window: Duration,
}
impl<E> CachedTokenProvider<E>
where
	E: ?Sized + TokenExchange,
{
	/// Remaining lifetime under which tokens are refreshed unless overridden.
	pub const DEFAULT_PREEMPTIVE_WINDOW: Duration = Duration::seconds(60);

	/// Wraps `exchange` with a fresh cache and the default preemptive window.
	pub fn new(exchange: impl Into<Arc<E>>) -> Self {
		let exchange = exchange.into();
		let key = CacheKey::new(exchange.client_id(), exchange.scope());

		Self {
			exchange,
			cache: TokenCache::default(),
			key,
			preemptive_window: Self::DEFAULT_PREEMPTIVE_WINDOW,
		}
	}

	/// Wraps `exchange` using the configured preemptive window.
	pub fn from_config(exchange: impl Into<Arc<E>>, config: &CacheConfig) -> Self {
		Self::new(exchange).with_preemptive_window(config.preemptive_window)
	}

	/// Shares an existing cache instead of the private one.
	pub fn with_cache(mut self, cache: TokenCache) -> Self {
		self.cache = cache;

		self
	}

	/// Overrides the preemptive window; negative values are treated as zero.
	pub fn with_preemptive_window(mut self, window: Duration) -> Self {
		self.preemptive_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Key this provider reads and writes.
	pub fn key(&self) -> &CacheKey {
		&self.key
	}

	/// Cache backing this provider.
	pub fn cache(&self) -> &TokenCache {
		&self.cache
	}

	/// Drops the cached token so the next call exchanges again.
	pub fn invalidate(&self) {
		if self.cache.remove(&self.key).is_some() {
			tracing::debug!(client_id = %self.key.client_id, "Invalidated cached token.");
		}
	}

	/// Returns a usable token record, exchanging at most once per expiry across all callers.
	pub async fn record(&self) -> Result<TokenRecord> {
		const STAGE: TokenStage = TokenStage::Cache;

		let span = TokenSpan::new(STAGE, &self.key.client_id);

		obs::record_token_outcome(STAGE, TokenOutcome::Attempt);

		let result = span
			.instrument(async {
				let guard = self.cache.guard(&self.key);
				let _singleflight = guard.lock().await;
				let now = OffsetDateTime::now_utc();

				if let Some(current) =
					self.cache.get(&self.key).filter(|record| !self.should_refresh(record, now))
				{
					tracing::debug!(expires_at = %current.expires_at, "Serving cached token.");
					obs::record_token_outcome(STAGE, TokenOutcome::Hit);

					return Ok(current);
				}

				let record = self.exchange.exchange().await?;

				self.cache.insert(self.key.clone(), record.clone());

				Ok(record)
			})
			.await;

		match &result {
			Ok(_) => obs::record_token_outcome(STAGE, TokenOutcome::Success),
			Err(_) => obs::record_token_outcome(STAGE, TokenOutcome::Failure),
		}

		result
	}

	/// Determines whether the cached record must be replaced before use.
	pub fn should_refresh(&self, record: &TokenRecord, now: OffsetDateTime) -> bool {
		if record.is_expired_at(now) {
			return true;
		}

		let effective_window = self.effective_preemptive_window();

		if effective_window.is_zero() {
			return false;
		}

		record.remaining_at(now) <= effective_window
	}

	fn effective_preemptive_window(&self) -> Duration {
		self.preemptive_window.checked_sub(self.preemptive_jitter()).unwrap_or(Duration::ZERO)
	}

	fn preemptive_jitter(&self) -> Duration {
		let window_secs = self.preemptive_window.whole_seconds();

		if window_secs <= 1 {
			return Duration::ZERO;
		}

		let modulus = u64::try_from(window_secs).unwrap_or(u64::MAX);
		let jitter_secs = self.jitter_seed() % modulus;

		Duration::seconds(i64::try_from(jitter_secs).unwrap_or(i64::MAX))
	}

	fn jitter_seed(&self) -> u64 {
		let mut hasher = DefaultHasher::new();

		self.key.hash(&mut hasher);

		hasher.finish()
	}
}
impl<E> Clone for CachedTokenProvider<E>
where
	E: ?Sized + TokenExchange,
{
	fn clone(&self) -> Self {
		Self {
			exchange: Arc::clone(&self.exchange),
			cache: self.cache.clone(),
			key: self.key.clone(),
			preemptive_window: self.preemptive_window,
		}
	}
}
impl<E> AccessTokenProvider for CachedTokenProvider<E>
where
	E: ?Sized + TokenExchange,
{
	fn access_token(&self) -> TokenFuture<'_, AccessToken> {
		Box::pin(async move { Ok(self.record().await?.access_token) })
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// self
	use super::*;
	use crate::error::{AuthenticationError, ConfigError, TransportError};

	struct CountingExchange {
		client_id: ClientId,
		scope: ScopeSet,
		lifetime: Duration,
		calls: AtomicUsize,
	}
	impl CountingExchange {
		fn new(lifetime: Duration) -> Self {
			Self {
				client_id: ClientId::new("client").expect("Client fixture should be valid."),
				scope: ScopeSet::default(),
				lifetime,
				calls: AtomicUsize::new(0),
			}
		}
	}
	impl TokenExchange for CountingExchange {
		fn client_id(&self) -> &ClientId {
			&self.client_id
		}

		fn scope(&self) -> &ScopeSet {
			&self.scope
		}

		fn exchange(&self) -> TokenFuture<'_, TokenRecord> {
			Box::pin(async move {
				let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

				Ok(TokenRecord::builder(self.client_id.clone(), self.scope.clone())
					.access_token(format!("token-{call}"))
					.expires_in(self.lifetime)
					.build()
					.map_err(ConfigError::from)?)
			})
		}
	}

	struct FailingExchange {
		client_id: ClientId,
		scope: ScopeSet,
		calls: AtomicUsize,
	}
	impl TokenExchange for FailingExchange {
		fn client_id(&self) -> &ClientId {
			&self.client_id
		}

		fn scope(&self) -> &ScopeSet {
			&self.scope
		}

		fn exchange(&self) -> TokenFuture<'_, TokenRecord> {
			Box::pin(async move {
				self.calls.fetch_add(1, Ordering::SeqCst);

				Err(AuthenticationError::from(TransportError::Io(std::io::Error::other("down")))
					.into())
			})
		}
	}

	fn record_expiring_in(lifetime: Duration, now: OffsetDateTime) -> TokenRecord {
		TokenRecord::builder(
			ClientId::new("client").expect("Client fixture should be valid."),
			ScopeSet::default(),
		)
		.access_token("token")
		.issued_at(now - Duration::minutes(5))
		.expires_at(now + lifetime)
		.build()
		.expect("Record fixture should build.")
	}

	#[test]
	fn refresh_decision_honours_window_and_expiry() {
		let now = OffsetDateTime::now_utc();
		let provider =
			CachedTokenProvider::new(CountingExchange::new(Duration::hours(1)))
				.with_preemptive_window(Duration::seconds(1));

		assert!(provider.should_refresh(&record_expiring_in(Duration::ZERO, now), now));
		assert!(provider.should_refresh(&record_expiring_in(Duration::seconds(1), now), now));
		assert!(!provider.should_refresh(&record_expiring_in(Duration::seconds(5), now), now));

		let no_window = provider.clone().with_preemptive_window(Duration::ZERO);

		assert!(!no_window.should_refresh(&record_expiring_in(Duration::seconds(1), now), now));
		assert!(no_window.should_refresh(&record_expiring_in(Duration::seconds(-1), now), now));
	}

	#[test]
	fn jitter_stays_inside_the_window() {
		let provider = CachedTokenProvider::new(CountingExchange::new(Duration::hours(1)));
		let effective = provider.effective_preemptive_window();

		assert!(effective > Duration::ZERO);
		assert!(effective <= CachedTokenProvider::<CountingExchange>::DEFAULT_PREEMPTIVE_WINDOW);
		assert_eq!(effective, provider.clone().effective_preemptive_window());
	}

	#[tokio::test]
	async fn cached_tokens_are_reused_until_invalidated() {
		let provider = CachedTokenProvider::new(CountingExchange::new(Duration::hours(1)));
		let first = provider.access_token().await.expect("First call should exchange.");
		let second = provider.access_token().await.expect("Second call should hit the cache.");

		assert_eq!(first.expose(), "token-1");
		assert_eq!(second.expose(), "token-1");
		assert_eq!(provider.cache().len(), 1);

		provider.invalidate();

		assert!(provider.cache().is_empty());

		let third = provider.access_token().await.expect("Invalidated cache should exchange.");

		assert_eq!(third.expose(), "token-2");
	}

	#[tokio::test]
	async fn clones_share_one_cache() {
		let provider = CachedTokenProvider::new(CountingExchange::new(Duration::hours(1)));
		let clone = provider.clone();

		provider.access_token().await.expect("Original should exchange.");

		let token = clone.access_token().await.expect("Clone should hit the shared cache.");

		assert_eq!(token.expose(), "token-1");
	}

	#[tokio::test]
	async fn failures_are_not_cached() {
		let exchange = Arc::new(FailingExchange {
			client_id: ClientId::new("client").expect("Client fixture should be valid."),
			scope: ScopeSet::default(),
			calls: AtomicUsize::new(0),
		});
		let provider = CachedTokenProvider::<FailingExchange>::new(Arc::clone(&exchange));

		assert!(provider.access_token().await.is_err());
		assert!(provider.access_token().await.is_err());
		assert_eq!(exchange.calls.load(Ordering::SeqCst), 2);
		assert!(provider.cache().is_empty());
	}
}
