//! Token cache orchestrating client-credential exchanges with singleflight guards.
//!
//! The cache exposes [`TokenCache::access_token`] so callers can reuse cached
//! access credentials per scope. Each request checks the store under a
//! per-scope guard and only calls the token endpoint when the cached credential
//! is missing or stale. The guard ensures concurrent callers piggy-back on the
//! same in-flight exchange instead of stampeding the token endpoint, and a
//! failed exchange leaves the previously stored credential untouched.

pub mod store;

pub use store::{CredentialStore, MemoryStore, StoreError, StoreFuture};

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::Deserializer;
// self
use crate::{
	_prelude::*,
	auth::{ClientId, Credential, Scope, TokenSecret},
	clock::{Clock, SystemClock},
	error::{self, ConfigError, ExchangeError},
	http::{AUTHORIZATION_HEADER, HttpTransport, TransportRequest, TransportResponse},
	marketplace::MarketplaceDescriptor,
	obs::{self, CacheLookup, OpKind, OpOutcome, OpSpan},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

const GRANT_TYPE: &str = "client_credentials";

#[cfg(feature = "reqwest")]
/// Token cache specialized for the crate's default reqwest transport.
pub type ReqwestTokenCache = TokenCache<ReqwestTransport>;

/// Per-scope cache of client-credential access tokens.
///
/// The cache owns the transport, credential store, clock, and marketplace
/// descriptor so callers only deal in scopes and credentials. Client
/// credentials are optional at construction; an exchange without them fails
/// with [`ConfigError::MissingClientCredentials`].
#[derive(Clone)]
pub struct TokenCache<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound token request.
	pub transport: Arc<T>,
	/// Store implementation that persists issued credentials.
	pub store: Arc<dyn CredentialStore>,
	/// Clock consulted for validity decisions and issuance stamps.
	pub clock: Arc<dyn Clock>,
	/// Marketplace descriptor providing the token endpoint and default scope.
	pub descriptor: MarketplaceDescriptor,
	/// OAuth client identifier presented on exchanges.
	pub client_id: Option<ClientId>,
	/// Client secret paired with the identifier.
	pub client_secret: Option<TokenSecret>,
	exchange_guards: Arc<Mutex<HashMap<Scope, Arc<AsyncMutex<()>>>>>,
}
impl<T> TokenCache<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a cache that reuses the caller-provided transport.
	pub fn with_transport(
		store: Arc<dyn CredentialStore>,
		descriptor: MarketplaceDescriptor,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			clock: Arc::new(SystemClock),
			descriptor,
			client_id: None,
			client_secret: None,
			exchange_guards: Default::default(),
		}
	}

	/// Sets or replaces the client credentials used for exchanges.
	pub fn with_client_credentials(
		mut self,
		client_id: ClientId,
		client_secret: TokenSecret,
	) -> Self {
		self.client_id = Some(client_id);
		self.client_secret = Some(client_secret);

		self
	}

	/// Overrides the clock (defaults to [`SystemClock`]).
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Returns a valid credential for the descriptor's default scope.
	pub async fn access_token(&self) -> Result<Credential> {
		let scope = self.descriptor.default_scope.clone();

		self.access_token_for(&scope).await
	}

	/// Returns a valid credential for `scope`, exchanging only when needed.
	///
	/// Expiry is lazy: nothing refreshes in the background, the staleness check
	/// happens here. Concurrent callers for the same scope serialize on a
	/// per-scope guard, so at most one exchange is in flight per scope and the
	/// waiters reuse its result straight from the store.
	pub async fn access_token_for(&self, scope: &Scope) -> Result<Credential> {
		const KIND: OpKind = OpKind::Token;

		let span = OpSpan::new(KIND, "access_token");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let guard = self.exchange_guard(scope);
				let _singleflight = guard.lock().await;
				let now = self.clock.now();

				if let Some(current) = self
					.store
					.fetch(scope)
					.await
					.map_err(Error::from)?
					.filter(|credential| credential.is_valid_at(now))
				{
					obs::record_cache_lookup(CacheLookup::Hit);

					return Ok(current);
				}

				obs::record_cache_lookup(CacheLookup::Miss);

				let credential = self.exchange(scope).await?;

				self.store.save(credential.clone()).await.map_err(Error::from)?;

				Ok(credential)
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Performs one client-credentials exchange for `scope`.
	async fn exchange(&self, scope: &Scope) -> Result<Credential> {
		let (client_id, client_secret) = self
			.client_id
			.as_ref()
			.zip(self.client_secret.as_ref())
			.ok_or(ConfigError::MissingClientCredentials)?;
		let request = TransportRequest::post(self.descriptor.endpoints.token.clone())
			.with_header(AUTHORIZATION_HEADER, basic_authorization(client_id, client_secret))
			.with_form([("grant_type", GRANT_TYPE), ("scope", scope.as_ref())]);
		let response = self.transport.execute(request).await?;

		if !response.is_success() {
			return Err(ExchangeError::Status {
				status: response.status,
				body: error::body_preview(&response.body),
			}
			.into());
		}

		let payload = parse_token_payload(&response)?;
		let access_token = payload.access_token.ok_or(ExchangeError::MissingAccessToken)?;

		Ok(Credential::issued(
			scope.clone(),
			TokenSecret::new(access_token),
			self.clock.now(),
			Duration::seconds(payload.expires_in.seconds()),
		))
	}

	/// Returns (and creates on demand) the singleflight guard for a scope.
	fn exchange_guard(&self, scope: &Scope) -> Arc<AsyncMutex<()>> {
		let mut guards = self.exchange_guards.lock();

		guards.entry(scope.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}
}
#[cfg(feature = "reqwest")]
impl TokenCache<ReqwestTransport> {
	/// Creates a new cache for the provided descriptor.
	///
	/// The cache provisions its own reqwest-backed transport so callers do not
	/// need to pass HTTP handles explicitly. Use
	/// [`TokenCache::with_client_credentials`] to attach the client id/secret
	/// pair before requesting tokens.
	pub fn new(store: Arc<dyn CredentialStore>, descriptor: MarketplaceDescriptor) -> Self {
		Self::with_transport(store, descriptor, ReqwestTransport::default())
	}
}
impl<T> Debug for TokenCache<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCache")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.finish()
	}
}

/// Raw token endpoint payload.
#[derive(Debug, Deserialize)]
struct TokenPayload {
	#[serde(default)]
	access_token: Option<String>,
	#[serde(default)]
	expires_in: ReportedLifetime,
}

/// Lifetime as reported by the token endpoint.
///
/// Endpoints disagree on the wire type here: integers, floats, numeric
/// strings, and absent fields all occur in the wild. Anything unusable
/// collapses to zero seconds, which the write-time safety margin then treats
/// as already stale instead of failing the exchange.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct ReportedLifetime(i64);
impl ReportedLifetime {
	fn seconds(self) -> i64 {
		self.0
	}
}
impl<'de> Deserialize<'de> for ReportedLifetime {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let seconds = match serde_json::Value::deserialize(deserializer)? {
			serde_json::Value::Number(number) => number
				.as_i64()
				.or_else(|| number.as_f64().map(|seconds| seconds as i64))
				.unwrap_or(0),
			serde_json::Value::String(text) => text.trim().parse().unwrap_or(0),
			_ => 0,
		};

		Ok(Self(seconds))
	}
}

fn basic_authorization(client_id: &ClientId, client_secret: &TokenSecret) -> String {
	let credentials = format!("{}:{}", client_id.as_ref(), client_secret.expose());

	format!("Basic {}", STANDARD.encode(credentials))
}

fn parse_token_payload(response: &TransportResponse) -> Result<TokenPayload> {
	let deserializer = &mut serde_json::Deserializer::from_slice(&response.body);

	serde_path_to_error::deserialize(deserializer)
		.map_err(|e| ExchangeError::Parse { source: e, status: response.status }.into())
}

#[cfg(test)]
mod tests {
	// std
	use std::{
		collections::VecDeque,
		sync::atomic::{AtomicUsize, Ordering},
		time::Duration as StdDuration,
	};
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::{
		clock::ManualClock,
		http::TransportFuture,
		marketplace::FilterEncoding,
	};

	const FRESH_BODY: &str = r#"{"access_token":"token-a","expires_in":1800,"token_type":"Application Access Token"}"#;

	#[derive(Debug)]
	struct SeenRequest {
		url: String,
		authorization: Option<String>,
		form: Vec<(String, String)>,
	}

	/// Transport double that replays canned responses and records requests.
	struct ScriptedTransport {
		responses: Mutex<VecDeque<(u16, &'static str)>>,
		latency: StdDuration,
		hits: AtomicUsize,
		seen: Mutex<Vec<SeenRequest>>,
	}
	impl ScriptedTransport {
		fn replaying<I>(responses: I) -> Arc<Self>
		where
			I: IntoIterator<Item = (u16, &'static str)>,
		{
			Arc::new(Self {
				responses: Mutex::new(responses.into_iter().collect()),
				latency: StdDuration::ZERO,
				hits: AtomicUsize::new(0),
				seen: Mutex::new(Vec::new()),
			})
		}

		fn with_latency(responses: Vec<(u16, &'static str)>, latency: StdDuration) -> Arc<Self> {
			Arc::new(Self {
				responses: Mutex::new(responses.into_iter().collect()),
				latency,
				hits: AtomicUsize::new(0),
				seen: Mutex::new(Vec::new()),
			})
		}

		fn hits(&self) -> usize {
			self.hits.load(Ordering::SeqCst)
		}
	}
	impl HttpTransport for ScriptedTransport {
		fn execute(&self, request: TransportRequest) -> TransportFuture<'_> {
			Box::pin(async move {
				if !self.latency.is_zero() {
					tokio::time::sleep(self.latency).await;
				}

				self.hits.fetch_add(1, Ordering::SeqCst);
				self.seen.lock().push(SeenRequest {
					url: request.url.to_string(),
					authorization: request
						.headers
						.iter()
						.find(|(name, _)| name.eq_ignore_ascii_case(AUTHORIZATION_HEADER))
						.map(|(_, value)| value.clone()),
					form: request.form.clone(),
				});

				let (status, body) = self
					.responses
					.lock()
					.pop_front()
					.expect("Scripted transport ran out of responses.");

				Ok(TransportResponse { status, body: body.as_bytes().to_vec() })
			})
		}
	}

	fn descriptor() -> MarketplaceDescriptor {
		MarketplaceDescriptor::builder(
			crate::auth::MarketplaceId::new("market-1")
				.expect("Marketplace fixture should be valid."),
		)
		.token_endpoint(
			Url::parse("https://auth.example.com/identity/v1/oauth2/token")
				.expect("Token endpoint fixture should parse."),
		)
		.search_endpoint(
			Url::parse("https://api.example.com/search")
				.expect("Search endpoint fixture should parse."),
		)
		.filter_encoding(FilterEncoding::Legacy)
		.default_scope(
			Scope::new("https://api.example.com/oauth/api_scope")
				.expect("Scope fixture should be valid."),
		)
		.build()
		.expect("Descriptor fixture should build.")
	}

	fn cache_with(
		transport: Arc<ScriptedTransport>,
		clock: &ManualClock,
	) -> (TokenCache<ScriptedTransport>, Arc<MemoryStore>) {
		let store = Arc::new(MemoryStore::default());
		let cache = TokenCache::with_transport(store.clone(), descriptor(), transport)
			.with_clock(Arc::new(clock.clone()))
			.with_client_credentials(
				ClientId::new("client-1").expect("Client fixture should be valid."),
				TokenSecret::new("secret-1"),
			);

		(cache, store)
	}

	#[tokio::test]
	async fn fresh_credentials_are_reused_without_exchanging() {
		let clock = ManualClock::starting_at(macros::datetime!(2025-01-01 00:00 UTC));
		let transport = ScriptedTransport::replaying([(200, FRESH_BODY)]);
		let (cache, _) = cache_with(transport.clone(), &clock);

		let first = cache.access_token().await.expect("First call should exchange.");
		let second = cache.access_token().await.expect("Second call should hit the cache.");

		assert_eq!(transport.hits(), 1);
		assert_eq!(first, second);
		assert_eq!(first.access_token.expose(), "token-a");
		assert_eq!(
			first.expires_at,
			macros::datetime!(2025-01-01 00:00 UTC) + Duration::seconds(1_740),
		);
	}

	#[tokio::test]
	async fn stale_credentials_trigger_a_new_exchange() {
		const SECOND_BODY: &str = r#"{"access_token":"token-b","expires_in":1800}"#;

		let clock = ManualClock::starting_at(macros::datetime!(2025-01-01 00:00 UTC));
		let transport = ScriptedTransport::replaying([(200, FRESH_BODY), (200, SECOND_BODY)]);
		let (cache, _) = cache_with(transport.clone(), &clock);

		cache.access_token().await.expect("First call should exchange.");

		// One second past the margin-adjusted expiry.
		clock.advance(Duration::seconds(1_741));

		let renewed = cache.access_token().await.expect("Stale credential should be replaced.");

		assert_eq!(transport.hits(), 2);
		assert_eq!(renewed.access_token.expose(), "token-b");
	}

	#[tokio::test]
	async fn lifetimes_below_the_margin_are_never_cached_as_valid() {
		const SHORT_BODY: &str = r#"{"access_token":"short","expires_in":30}"#;

		let clock = ManualClock::starting_at(macros::datetime!(2025-01-01 00:00 UTC));
		let transport = ScriptedTransport::replaying([(200, SHORT_BODY), (200, SHORT_BODY)]);
		let (cache, _) = cache_with(transport.clone(), &clock);

		let credential = cache.access_token().await.expect("Exchange should succeed.");

		assert!(!credential.is_valid_at(clock.now()));

		cache.access_token().await.expect("Immediately stale credential forces re-exchange.");

		assert_eq!(transport.hits(), 2);
	}

	#[tokio::test]
	async fn concurrent_callers_share_one_exchange() {
		let clock = ManualClock::starting_at(macros::datetime!(2025-01-01 00:00 UTC));
		let transport = ScriptedTransport::with_latency(
			vec![(200, FRESH_BODY)],
			StdDuration::from_millis(50),
		);
		let (cache, _) = cache_with(transport.clone(), &clock);

		let (first, second) = tokio::join!(cache.access_token(), cache.access_token());

		assert_eq!(
			first.expect("First concurrent call should succeed.").access_token.expose(),
			second.expect("Second concurrent call should succeed.").access_token.expose(),
		);
		assert_eq!(transport.hits(), 1);
	}

	#[tokio::test]
	async fn scopes_are_cached_independently() {
		const OTHER_BODY: &str = r#"{"access_token":"token-other","expires_in":1800}"#;

		let clock = ManualClock::starting_at(macros::datetime!(2025-01-01 00:00 UTC));
		let transport = ScriptedTransport::replaying([(200, FRESH_BODY), (200, OTHER_BODY)]);
		let (cache, _) = cache_with(transport.clone(), &clock);
		let other = Scope::new("https://api.example.com/oauth/api_scope/other")
			.expect("Second scope fixture should be valid.");

		let default_scope = cache.access_token().await.expect("Default scope should exchange.");
		let other_scope =
			cache.access_token_for(&other).await.expect("Second scope should exchange.");

		assert_eq!(transport.hits(), 2);
		assert_ne!(default_scope.access_token, other_scope.access_token);

		// Both are now cached; neither should exchange again.
		cache.access_token().await.expect("Default scope should now hit the cache.");
		cache.access_token_for(&other).await.expect("Second scope should now hit the cache.");

		assert_eq!(transport.hits(), 2);
	}

	#[tokio::test]
	async fn failed_exchanges_leave_the_store_untouched() {
		const ERROR_BODY: &str = r#"{"error":"invalid_client"}"#;

		let clock = ManualClock::starting_at(macros::datetime!(2025-01-01 00:00 UTC));
		let transport = ScriptedTransport::replaying([(400, ERROR_BODY)]);
		let (cache, store) = cache_with(transport.clone(), &clock);
		let scope = cache.descriptor.default_scope.clone();
		let stale = Credential::issued(
			scope.clone(),
			TokenSecret::new("stale"),
			clock.now() - Duration::hours(2),
			Duration::seconds(1_800),
		);

		store.save(stale.clone()).await.expect("Seeding the store should succeed.");

		let err = cache.access_token().await.expect_err("Rejected exchange should error.");

		assert!(matches!(
			err,
			Error::Exchange(ExchangeError::Status { status: 400, ref body })
				if body.contains("invalid_client"),
		));

		let kept = store
			.fetch(&scope)
			.await
			.expect("Store fetch should succeed.")
			.expect("Stale credential should still be present.");

		assert_eq!(kept, stale);
	}

	#[tokio::test]
	async fn missing_access_token_is_an_exchange_error() {
		const NO_TOKEN_BODY: &str = r#"{"expires_in":7200}"#;

		let clock = ManualClock::starting_at(macros::datetime!(2025-01-01 00:00 UTC));
		let transport = ScriptedTransport::replaying([(200, NO_TOKEN_BODY)]);
		let (cache, _) = cache_with(transport, &clock);
		let err = cache.access_token().await.expect_err("Tokenless payload should error.");

		assert!(matches!(err, Error::Exchange(ExchangeError::MissingAccessToken)));
	}

	#[tokio::test]
	async fn malformed_json_is_a_parse_error() {
		let clock = ManualClock::starting_at(macros::datetime!(2025-01-01 00:00 UTC));
		let transport = ScriptedTransport::replaying([(200, "not json")]);
		let (cache, _) = cache_with(transport, &clock);
		let err = cache.access_token().await.expect_err("Malformed payload should error.");

		assert!(matches!(err, Error::Exchange(ExchangeError::Parse { status: 200, .. })));
	}

	#[tokio::test]
	async fn missing_client_credentials_fail_before_any_request() {
		let transport = ScriptedTransport::replaying([]);
		let store = Arc::new(MemoryStore::default());
		let cache: TokenCache<ScriptedTransport> =
			TokenCache::with_transport(store, descriptor(), transport.clone());
		let err = cache.access_token().await.expect_err("Credential-less cache should error.");

		assert!(matches!(err, Error::Config(ConfigError::MissingClientCredentials)));
		assert_eq!(transport.hits(), 0);
	}

	#[tokio::test]
	async fn exchanges_use_basic_auth_and_the_standard_form() {
		let clock = ManualClock::starting_at(macros::datetime!(2025-01-01 00:00 UTC));
		let transport = ScriptedTransport::replaying([(200, FRESH_BODY)]);
		let (cache, _) = cache_with(transport.clone(), &clock);

		cache.access_token().await.expect("Exchange should succeed.");

		let seen = transport.seen.lock();
		let request = seen.first().expect("Exactly one request should have been captured.");

		assert_eq!(request.url, "https://auth.example.com/identity/v1/oauth2/token");
		assert_eq!(
			request.authorization.as_deref(),
			Some(format!("Basic {}", STANDARD.encode("client-1:secret-1")).as_str()),
		);
		assert_eq!(
			request.form,
			vec![
				("grant_type".to_string(), GRANT_TYPE.to_string()),
				(
					"scope".to_string(),
					"https://api.example.com/oauth/api_scope".to_string(),
				),
			],
		);
	}

	#[test]
	fn reported_lifetimes_parse_leniently() {
		for (body, expected) in [
			(r#"{"access_token":"t","expires_in":7200}"#, 7_200),
			(r#"{"access_token":"t","expires_in":"7200"}"#, 7_200),
			(r#"{"access_token":"t","expires_in":" 7200 "}"#, 7_200),
			(r#"{"access_token":"t","expires_in":7200.9}"#, 7_200),
			(r#"{"access_token":"t","expires_in":"soon"}"#, 0),
			(r#"{"access_token":"t","expires_in":null}"#, 0),
			(r#"{"access_token":"t","expires_in":{}}"#, 0),
			(r#"{"access_token":"t"}"#, 0),
		] {
			let payload: TokenPayload =
				serde_json::from_str(body).expect("Lenient payload should always deserialize.");

			assert_eq!(payload.expires_in.seconds(), expected, "body: {body}");
		}
	}
}
