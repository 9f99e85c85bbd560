//! Demonstrates compiling a filtered search against a mocked legacy endpoint and
//! printing the parsed listing summaries.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use market_scout::{
	auth::{AppId, MarketplaceId, Scope},
	cache::{CredentialStore, MemoryStore, TokenCache},
	http::ReqwestTransport,
	marketplace::{FilterEncoding, MarketplaceDescriptor},
	query::{ListingFilters, SearchRequest},
	reqwest::Client,
	search::SearchClient,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/services/search/FindingService/v1")
				.query_param("itemFilter(0).name", "MaxPrice");
			then.status(200).header("content-type", "application/json").body(
				r#"{
					"findItemsAdvancedResponse": [{
						"searchResult": [{
							"item": [{
								"title": ["Seiko SKX007 Diver"],
								"viewItemURL": ["https://www.example.com/itm/123"],
								"sellingStatus": [{
									"currentPrice": [{"@currencyId": "USD", "__value__": "189.99"}]
								}],
								"listingInfo": [{"endTime": ["2025-06-01T17:32:29.000Z"]}]
							}]
						}]
					}]
				}"#,
			);
		})
		.await;

	let descriptor = MarketplaceDescriptor::builder(MarketplaceId::new("demo-marketplace")?)
		.token_endpoint(Url::parse(&server.url("/identity/v1/oauth2/token"))?)
		.search_endpoint(Url::parse(&server.url("/services/search/FindingService/v1"))?)
		.filter_encoding(FilterEncoding::Legacy)
		.default_scope(Scope::new("https://api.example.com/oauth/api_scope")?)
		.build()?;
	let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
	let transport = ReqwestTransport::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let client = SearchClient::new(TokenCache::with_transport(store, descriptor, transport))
		.with_app_id(AppId::new("DemoApp-1234-PRD")?);
	let request = SearchRequest::new("seiko")
		.with_auxiliary_terms(["diver"])
		.with_excluded_terms(["quartz"])
		.with_brand("Seiko")
		.with_filters(ListingFilters::new().with_max_price("200").with_condition("Used"));
	let listings = client.search(&request).await?;

	for (index, listing) in listings.iter().enumerate() {
		let price = listing
			.price
			.as_ref()
			.map(|p| format!("{} {}", p.value, p.currency.as_deref().unwrap_or("")))
			.unwrap_or_else(|| "price unavailable".into());
		let url = listing.url.as_ref().map(Url::as_str).unwrap_or("no URL");

		println!("{:02}. {} | {} | {}", index + 1, listing.title, price.trim_end(), url);
	}

	Ok(())
}
