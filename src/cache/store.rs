//! Storage contract and the built-in in-memory store for cached credentials.

// self
use crate::{
	_prelude::*,
	auth::{Credential, Scope},
};

/// Future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by credential stores.
///
/// Credentials are keyed by scope. The cache serializes writers per scope, so
/// implementations only need last-writer-wins semantics.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the credential stored for its scope.
	fn save(&self, credential: Credential) -> StoreFuture<'_, ()>;

	/// Fetches the credential cached for the scope, if present.
	fn fetch<'a>(&'a self, scope: &'a Scope) -> StoreFuture<'a, Option<Credential>>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

type StoreMap = Arc<RwLock<HashMap<Scope, Credential>>>;

/// Thread-safe store that keeps credentials in-process.
///
/// This is the default backend; swap in an external [`CredentialStore`] when
/// credentials must survive the process or be shared across hosts.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	fn save_now(map: StoreMap, credential: Credential) {
		map.write().insert(credential.scope.clone(), credential);
	}

	fn fetch_now(map: StoreMap, scope: Scope) -> Option<Credential> {
		map.read().get(&scope).cloned()
	}
}
impl CredentialStore for MemoryStore {
	fn save(&self, credential: Credential) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			Self::save_now(map, credential);

			Ok(())
		})
	}

	fn fetch<'a>(&'a self, scope: &'a Scope) -> StoreFuture<'a, Option<Credential>> {
		let map = self.0.clone();
		let scope = scope.to_owned();

		Box::pin(async move { Ok(Self::fetch_now(map, scope)) })
	}
}
