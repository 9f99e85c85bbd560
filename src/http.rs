//! Transport primitives shared by the token exchange and the search client.
//!
//! The module exposes [`HttpTransport`] together with crate-owned
//! [`TransportRequest`]/[`TransportResponse`] types so downstream crates can
//! integrate custom HTTP clients. Requests carry their query strings fully
//! encoded; implementations must send them byte-for-byte. The legacy query
//! scheme keeps `(` and `)` literal in parameter names and a re-encoding
//! transport would corrupt them.

// std
use std::{borrow::Cow, ops::Deref, time::Duration as StdDuration};
// self
use crate::{_prelude::*, error::TransportError};

/// Bound applied to every outbound request unless overridden.
pub const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);
/// Header carrying credentials; redacted wherever requests are rendered.
pub const AUTHORIZATION_HEADER: &str = "authorization";

/// HTTP method subset used by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportMethod {
	/// `GET` request.
	Get,
	/// `POST` request.
	Post,
}

/// Transport-agnostic request description.
///
/// A non-empty `form` implies an `application/x-www-form-urlencoded` body and
/// only accompanies [`TransportMethod::Post`].
pub struct TransportRequest {
	/// Method to dispatch with.
	pub method: TransportMethod,
	/// Fully encoded target URL.
	pub url: Url,
	/// Additional headers as name/value pairs.
	pub headers: Vec<(String, String)>,
	/// Form body fields, encoded by the transport.
	pub form: Vec<(String, String)>,
	/// Per-request timeout; defaults to [`REQUEST_TIMEOUT`].
	pub timeout: StdDuration,
}
impl TransportRequest {
	/// Starts a `GET` request for the provided URL.
	pub fn get(url: Url) -> Self {
		Self::with_method(TransportMethod::Get, url)
	}

	/// Starts a `POST` request for the provided URL.
	pub fn post(url: Url) -> Self {
		Self::with_method(TransportMethod::Post, url)
	}

	fn with_method(method: TransportMethod, url: Url) -> Self {
		Self { method, url, headers: Vec::new(), form: Vec::new(), timeout: REQUEST_TIMEOUT }
	}

	/// Appends a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Replaces the form body fields.
	pub fn with_form<I, K, V>(mut self, fields: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.form = fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect();

		self
	}

	/// Overrides the per-request timeout.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}
}
impl Debug for TransportRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let headers = self
			.headers
			.iter()
			.map(|(name, value)| {
				if name.eq_ignore_ascii_case(AUTHORIZATION_HEADER) {
					(name.as_str(), "<redacted>")
				} else {
					(name.as_str(), value.as_str())
				}
			})
			.collect::<Vec<_>>();

		f.debug_struct("TransportRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &headers)
			.field("form", &self.form)
			.field("timeout", &self.timeout)
			.finish()
	}
}

/// Raw response handed back by a transport.
#[derive(Clone, Debug)]
pub struct TransportResponse {
	/// HTTP status code.
	pub status: u16,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl TransportResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Lossy UTF-8 view of the body.
	pub fn text(&self) -> Cow<'_, str> {
		String::from_utf8_lossy(&self.body)
	}
}

/// Future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<TransportResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing crate requests.
///
/// The trait is the crate's only dependency on an HTTP stack. Implementations
/// must be `Send + Sync + 'static` so they can be shared behind `Arc<T>`
/// across cache and client instances, and the futures they return must be
/// `Send` so callers can box them freely.
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes the request, honoring its timeout, and returns the raw response.
	///
	/// Non-success statuses are not errors at this layer; callers classify them.
	fn execute(&self, request: TransportRequest) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token requests should not follow redirects, matching OAuth 2.0 guidance that
/// token endpoints return results directly instead of delegating to another URI.
/// Configure any custom [`ReqwestClient`] accordingly before wrapping it.
#[cfg(feature = "reqwest")]
#[derive(Clone, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: TransportRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let timeout = request.timeout;
			let mut builder = match request.method {
				TransportMethod::Get => client.get(request.url),
				TransportMethod::Post => client.post(request.url),
			}
			.timeout(timeout);

			for (name, value) in &request.headers {
				builder = builder.header(name.as_str(), value.as_str());
			}
			if !request.form.is_empty() {
				builder = builder.form(&request.form);
			}

			let response =
				builder.send().await.map_err(|e| classify_reqwest_error(e, timeout))?;
			let status = response.status().as_u16();
			let body = response
				.bytes()
				.await
				.map_err(|e| classify_reqwest_error(e, timeout))?
				.to_vec();

			Ok(TransportResponse { status, body })
		})
	}
}

#[cfg(feature = "reqwest")]
fn classify_reqwest_error(e: ReqwestError, timeout: StdDuration) -> TransportError {
	if e.is_timeout() {
		TransportError::Timeout { limit: timeout.as_secs() }
	} else {
		TransportError::network(e)
	}
}
