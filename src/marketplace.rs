//! Marketplace descriptors consumed by the token cache and the search client.
//!
//! A descriptor carries validated, HTTPS-only endpoints, the query scheme its
//! search endpoint speaks, and the scope requested when no explicit scope is
//! provided. Descriptors are plain data; behavior lives in the cache and client.

// self
use crate::{
	_prelude::*,
	auth::{MarketplaceId, Scope},
};

/// Query scheme a marketplace descriptor selects for its search endpoint.
///
/// Exactly one scheme applies per descriptor; compiled requests never mix the
/// two. Pick the scheme the target endpoint actually speaks and keep it fixed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterEncoding {
	/// Indexed `itemFilter(i).*` parameter families on the query string,
	/// authenticated by an application identifier.
	Legacy,
	/// Single `filter=` expression with named clauses, authenticated by a
	/// bearer token.
	Structured,
}
impl FilterEncoding {
	/// Stable label used in logs and metrics.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Legacy => "legacy",
			Self::Structured => "structured",
		}
	}
}
impl Display for FilterEncoding {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Endpoint set declared by a marketplace descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceEndpoints {
	/// Token endpoint used for client-credential exchanges.
	pub token: Url,
	/// Search endpoint compiled queries are dispatched to.
	pub search: Url,
}

/// Immutable marketplace descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketplaceDescriptor {
	/// Descriptor identifier.
	pub id: MarketplaceId,
	/// Endpoint definitions exposed by the marketplace.
	pub endpoints: MarketplaceEndpoints,
	/// Query scheme the search endpoint speaks.
	pub encoding: FilterEncoding,
	/// Scope requested when callers do not name one explicitly.
	pub default_scope: Scope,
}
impl MarketplaceDescriptor {
	/// Creates a new builder for the provided identifier.
	pub fn builder(id: MarketplaceId) -> MarketplaceDescriptorBuilder {
		MarketplaceDescriptorBuilder::new(id)
	}

	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), MarketplaceDescriptorError> {
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("search", &self.endpoints.search)?;

		Ok(())
	}
}

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum MarketplaceDescriptorError {
	/// Token endpoint is mandatory.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// Search endpoint is mandatory.
	#[error("Missing search endpoint.")]
	MissingSearchEndpoint,
	/// The query scheme must be chosen explicitly.
	#[error("Missing filter encoding.")]
	MissingFilterEncoding,
	/// A default scope is required for implicit token requests.
	#[error("Missing default scope.")]
	MissingDefaultScope,
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
}

/// Builder for [`MarketplaceDescriptor`] values.
#[derive(Debug)]
pub struct MarketplaceDescriptorBuilder {
	/// Identifier for the descriptor being constructed.
	pub id: MarketplaceId,
	/// Token endpoint used for client-credential exchanges.
	pub token_endpoint: Option<Url>,
	/// Search endpoint compiled queries are dispatched to.
	pub search_endpoint: Option<Url>,
	/// Query scheme the search endpoint speaks.
	pub encoding: Option<FilterEncoding>,
	/// Scope requested when callers do not name one explicitly.
	pub default_scope: Option<Scope>,
}
impl MarketplaceDescriptorBuilder {
	/// Creates a new builder seeded with the provided identifier.
	pub fn new(id: MarketplaceId) -> Self {
		Self { id, token_endpoint: None, search_endpoint: None, encoding: None, default_scope: None }
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the search endpoint.
	pub fn search_endpoint(mut self, url: Url) -> Self {
		self.search_endpoint = Some(url);

		self
	}

	/// Selects the query scheme.
	pub fn filter_encoding(mut self, encoding: FilterEncoding) -> Self {
		self.encoding = Some(encoding);

		self
	}

	/// Sets the scope requested when callers do not name one.
	pub fn default_scope(mut self, scope: Scope) -> Self {
		self.default_scope = Some(scope);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<MarketplaceDescriptor, MarketplaceDescriptorError> {
		let token = self.token_endpoint.ok_or(MarketplaceDescriptorError::MissingTokenEndpoint)?;
		let search =
			self.search_endpoint.ok_or(MarketplaceDescriptorError::MissingSearchEndpoint)?;
		let encoding = self.encoding.ok_or(MarketplaceDescriptorError::MissingFilterEncoding)?;
		let default_scope =
			self.default_scope.ok_or(MarketplaceDescriptorError::MissingDefaultScope)?;
		let descriptor = MarketplaceDescriptor {
			id: self.id,
			endpoints: MarketplaceEndpoints { token, search },
			encoding,
			default_scope,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), MarketplaceDescriptorError> {
	if url.scheme() != "https" {
		Err(MarketplaceDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	} else {
		Ok(())
	}
}
