//! Crate-level error types shared across the token cache, query compiler, and search client.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Longest response-body preview embedded in an error message.
const BODY_PREVIEW_LIMIT: usize = 256;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Store(
		#[from]
		#[source]
		crate::cache::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token endpoint rejected or mangled the credential exchange.
	#[error(transparent)]
	Exchange(#[from] ExchangeError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Search endpoint rejected the request or returned an unreadable payload.
	#[error(transparent)]
	Search(#[from] SearchError),
}

/// Configuration and validation failures raised before any request leaves the process.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Client id/secret pair is required but was never supplied.
	#[error("Client credentials are not configured.")]
	MissingClientCredentials,
	/// Application identifier is required by the legacy query scheme but was never supplied.
	#[error("Application identifier is not configured.")]
	MissingAppId,
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Requested scope cannot be normalized.
	#[error("Requested scope is invalid.")]
	InvalidScope(#[from] crate::auth::ScopeError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised by the client-credentials exchange itself.
///
/// A failed exchange never poisons the cache; the previous credential (if any)
/// stays untouched and the next call retries from scratch.
#[derive(Debug, ThisError)]
pub enum ExchangeError {
	/// Token endpoint answered with a non-success status.
	#[error("Token endpoint returned status {status}: {body}")]
	Status {
		/// HTTP status code of the rejection.
		status: u16,
		/// Bounded preview of the response body.
		body: String,
	},
	/// Token endpoint answered 2xx but the payload carried no usable token.
	#[error("Token endpoint response is missing access_token.")]
	MissingAccessToken,
	/// Token endpoint responded with JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
}

/// Transport-level failures (network, IO, timeout).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the endpoint.")]
	Io(#[from] std::io::Error),
	/// Request exceeded its bounded timeout.
	#[error("Request timed out after {limit} seconds.")]
	Timeout {
		/// Timeout limit in whole seconds.
		limit: u64,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Failures raised while executing a compiled search request.
#[derive(Debug, ThisError)]
pub enum SearchError {
	/// Search endpoint answered with a non-success status.
	#[error("Search endpoint returned status {status}: {body}")]
	Status {
		/// HTTP status code of the rejection.
		status: u16,
		/// Bounded preview of the response body.
		body: String,
	},
	/// Search endpoint responded with JSON that could not be parsed.
	#[error("Search endpoint returned malformed JSON.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Renders a response body as a bounded preview suitable for error messages.
pub(crate) fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);
	let mut preview = text.chars().take(BODY_PREVIEW_LIMIT).collect::<String>();

	if preview.len() < text.len() {
		preview.push_str("...");
	}

	preview
}
