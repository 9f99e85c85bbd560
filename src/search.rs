//! Search client composing the descriptor, token cache, and transport.
//!
//! The client compiles a [`SearchRequest`] with whichever query scheme its
//! descriptor selects, dispatches the GET, and lowers the provider payload
//! into [`ListingSummary`] values. The legacy scheme authenticates with the
//! application identifier on the query string; the structured scheme fetches a
//! bearer credential from the cache first. Both requests reuse the cache's
//! transport.

// crates.io
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	auth::AppId,
	cache::TokenCache,
	error::{self, ConfigError, SearchError},
	http::{AUTHORIZATION_HEADER, HttpTransport, TransportRequest, TransportResponse},
	marketplace::{FilterEncoding, MarketplaceDescriptor},
	obs::{self, OpKind, OpOutcome, OpSpan},
	query::{CompiledQuery, SearchRequest, legacy, structured},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Search client specialized for the crate's default reqwest transport.
pub type ReqwestSearchClient = SearchClient<ReqwestTransport>;

/// Price attached to a listing summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingPrice {
	/// Price amount as reported, uninterpreted.
	pub value: String,
	/// ISO 4217 currency code, when the provider reports one.
	pub currency: Option<String>,
}

/// Minimal parsed search hit.
///
/// Only the fields the caller renders are modeled; the rest of the provider
/// schema passes through unread.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingSummary {
	/// Listing title; empty when the provider omits one.
	pub title: String,
	/// Current or asking price.
	pub price: Option<ListingPrice>,
	/// Link to the listing.
	pub url: Option<Url>,
	/// Listing end time, when reported and parseable.
	pub end_time: Option<OffsetDateTime>,
}

/// Marketplace search client.
///
/// Owns a [`TokenCache`] and reuses its transport and descriptor, so one
/// configured cache is all a caller needs to construct. The legacy scheme
/// additionally requires an [`AppId`]; searches without one fail with
/// [`ConfigError::MissingAppId`].
#[derive(Clone, Debug)]
pub struct SearchClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Token cache consulted by the structured scheme.
	pub cache: TokenCache<T>,
	/// Application identifier stamped onto legacy query strings.
	pub app_id: Option<AppId>,
}
impl<T> SearchClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client around an already configured cache.
	pub fn new(cache: TokenCache<T>) -> Self {
		Self { cache, app_id: None }
	}

	/// Sets the application identifier used by the legacy scheme.
	pub fn with_app_id(mut self, app_id: AppId) -> Self {
		self.app_id = Some(app_id);

		self
	}

	/// Descriptor the client compiles requests against.
	pub fn descriptor(&self) -> &MarketplaceDescriptor {
		&self.cache.descriptor
	}

	/// Executes one search and parses the hits into summaries.
	pub async fn search(&self, request: &SearchRequest) -> Result<Vec<ListingSummary>> {
		const KIND: OpKind = OpKind::Search;

		let span = OpSpan::new(KIND, "search");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				match self.descriptor().encoding {
					FilterEncoding::Legacy => self.search_legacy(request).await,
					FilterEncoding::Structured => self.search_structured(request).await,
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	async fn search_legacy(&self, request: &SearchRequest) -> Result<Vec<ListingSummary>> {
		let app_id = self.app_id.as_ref().ok_or(ConfigError::MissingAppId)?;
		let compiled = legacy::compile_request(request, app_id);
		let response = self.transport_get(&compiled, None).await?;
		let envelope = parse_payload::<LegacyEnvelope>(&response)?;
		let items = envelope
			.responses
			.into_iter()
			.next()
			.and_then(|response| response.results.into_iter().next())
			.map(|result| result.items)
			.unwrap_or_default();

		Ok(items.into_iter().map(LegacyItem::into_summary).collect())
	}

	async fn search_structured(&self, request: &SearchRequest) -> Result<Vec<ListingSummary>> {
		let credential = self.cache.access_token().await?;
		let compiled = structured::compile_request(request);
		let bearer = format!("Bearer {}", credential.access_token.expose());
		let response = self.transport_get(&compiled, Some(bearer)).await?;
		let envelope = parse_payload::<StructuredEnvelope>(&response)?;

		Ok(envelope.item_summaries.into_iter().map(StructuredItem::into_summary).collect())
	}

	/// Dispatches a GET with the compiled query attached verbatim.
	async fn transport_get(
		&self,
		compiled: &CompiledQuery,
		bearer: Option<String>,
	) -> Result<TransportResponse> {
		let mut url = self.descriptor().endpoints.search.clone();

		url.set_query(Some(&compiled.encode_for_transport()));

		let mut request = TransportRequest::get(url);

		if let Some(bearer) = bearer {
			request = request.with_header(AUTHORIZATION_HEADER, bearer);
		}

		let response = self.cache.transport.execute(request).await?;

		if !response.is_success() {
			return Err(SearchError::Status {
				status: response.status,
				body: error::body_preview(&response.body),
			}
			.into());
		}

		Ok(response)
	}
}
#[cfg(feature = "reqwest")]
impl ReqwestSearchClient {
	/// Creates a client and cache sharing one fresh reqwest transport.
	pub fn with_descriptor(
		store: Arc<dyn crate::cache::CredentialStore>,
		descriptor: MarketplaceDescriptor,
	) -> Self {
		Self::new(TokenCache::new(store, descriptor))
	}
}

fn parse_payload<P>(response: &TransportResponse) -> Result<P>
where
	P: DeserializeOwned,
{
	let deserializer = &mut serde_json::Deserializer::from_slice(&response.body);

	serde_path_to_error::deserialize(deserializer)
		.map_err(|e| SearchError::Parse { source: e }.into())
}

fn parse_end_time(raw: &str) -> Option<OffsetDateTime> {
	OffsetDateTime::parse(raw, &Rfc3339).ok()
}

fn parse_url(raw: &str) -> Option<Url> {
	Url::parse(raw).ok()
}

/// Legacy payload wraps every field in a single-element array.
#[derive(Debug, Default, Deserialize)]
struct LegacyEnvelope {
	#[serde(default, rename = "findItemsAdvancedResponse")]
	responses: Vec<LegacyResponse>,
}
#[derive(Debug, Default, Deserialize)]
struct LegacyResponse {
	#[serde(default, rename = "searchResult")]
	results: Vec<LegacySearchResult>,
}
#[derive(Debug, Default, Deserialize)]
struct LegacySearchResult {
	#[serde(default, rename = "item")]
	items: Vec<LegacyItem>,
}
#[derive(Debug, Default, Deserialize)]
struct LegacyItem {
	#[serde(default)]
	title: Vec<String>,
	#[serde(default, rename = "viewItemURL")]
	view_item_url: Vec<String>,
	#[serde(default, rename = "sellingStatus")]
	selling_status: Vec<LegacySellingStatus>,
	#[serde(default, rename = "listingInfo")]
	listing_info: Vec<LegacyListingInfo>,
}
impl LegacyItem {
	fn into_summary(self) -> ListingSummary {
		let price = self
			.selling_status
			.into_iter()
			.next()
			.and_then(|status| status.current_price.into_iter().next())
			.and_then(|price| {
				price.value.map(|value| ListingPrice { value, currency: price.currency_id })
			});
		let end_time = self
			.listing_info
			.into_iter()
			.next()
			.and_then(|info| info.end_time.into_iter().next())
			.as_deref()
			.and_then(parse_end_time);

		ListingSummary {
			title: self.title.into_iter().next().unwrap_or_default(),
			price,
			url: self.view_item_url.first().map(String::as_str).and_then(parse_url),
			end_time,
		}
	}
}
#[derive(Debug, Default, Deserialize)]
struct LegacySellingStatus {
	#[serde(default, rename = "currentPrice")]
	current_price: Vec<LegacyPrice>,
}
#[derive(Debug, Deserialize)]
struct LegacyPrice {
	#[serde(default, rename = "@currencyId")]
	currency_id: Option<String>,
	#[serde(default, rename = "__value__")]
	value: Option<String>,
}
#[derive(Debug, Default, Deserialize)]
struct LegacyListingInfo {
	#[serde(default, rename = "endTime")]
	end_time: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct StructuredEnvelope {
	#[serde(default, rename = "itemSummaries")]
	item_summaries: Vec<StructuredItem>,
}
#[derive(Debug, Deserialize)]
struct StructuredItem {
	#[serde(default)]
	title: Option<String>,
	#[serde(default)]
	price: Option<StructuredPrice>,
	#[serde(default, rename = "itemWebUrl")]
	item_web_url: Option<String>,
	#[serde(default, rename = "itemEndDate")]
	item_end_date: Option<String>,
}
impl StructuredItem {
	fn into_summary(self) -> ListingSummary {
		ListingSummary {
			title: self.title.unwrap_or_default(),
			price: self.price.and_then(|price| {
				price.value.map(|value| ListingPrice { value, currency: price.currency })
			}),
			url: self.item_web_url.as_deref().and_then(parse_url),
			end_time: self.item_end_date.as_deref().and_then(parse_end_time),
		}
	}
}
#[derive(Debug, Deserialize)]
struct StructuredPrice {
	#[serde(default)]
	value: Option<String>,
	#[serde(default)]
	currency: Option<String>,
}
