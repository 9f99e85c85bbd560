// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use url::Url;
// self
use market_scout::{
	auth::{ClientId, MarketplaceId, Scope, TokenSecret},
	cache::{CredentialStore, MemoryStore, TokenCache},
	error::{Error, ExchangeError},
	http::ReqwestTransport,
	marketplace::{FilterEncoding, MarketplaceDescriptor},
	query::{ListingFilters, SearchRequest},
	reqwest::Client,
	search::SearchClient,
};

const TOKEN_BODY: &str =
	"{\"access_token\":\"browse-token\",\"token_type\":\"Application Access Token\",\"expires_in\":7200}";
const SEARCH_BODY: &str = r#"{
	"itemSummaries": [{
		"title": "Omega Speedmaster",
		"price": {"value": "4500.00", "currency": "USD"},
		"itemWebUrl": "https://www.example.com/itm/789"
	}]
}"#;

fn build_descriptor(server: &MockServer) -> MarketplaceDescriptor {
	let id = MarketplaceId::new("mock-structured")
		.expect("Marketplace identifier should be valid for structured search tests.");

	MarketplaceDescriptor::builder(id)
		.token_endpoint(
			Url::parse(&server.url("/identity/v1/oauth2/token"))
				.expect("Mock token endpoint should parse successfully."),
		)
		.search_endpoint(
			Url::parse(&server.url("/buy/browse/v1/item_summary/search"))
				.expect("Mock search endpoint should parse successfully."),
		)
		.filter_encoding(FilterEncoding::Structured)
		.default_scope(
			Scope::new("https://api.example.com/oauth/api_scope")
				.expect("Default scope should be valid for structured search tests."),
		)
		.build()
		.expect("Marketplace descriptor should build successfully.")
}

fn build_client(descriptor: MarketplaceDescriptor) -> SearchClient<ReqwestTransport> {
	let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
	let transport = ReqwestTransport::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Insecure test client should build successfully."),
	);
	let cache = TokenCache::with_transport(store, descriptor, transport)
		.with_client_credentials(
			ClientId::new("client-structured").expect("Client identifier should be valid."),
			TokenSecret::new("secret-structured"),
		);

	SearchClient::new(cache)
}

#[tokio::test]
async fn structured_search_authenticates_with_a_cached_bearer_token() {
	let server = MockServer::start_async().await;
	let client = build_client(build_descriptor(&server));
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/identity/v1/oauth2/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let search_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/buy/browse/v1/item_summary/search")
				.header("authorization", "Bearer browse-token")
				.query_param("q", "omega speedmaster")
				.query_param("limit", "10")
				.query_param("filter", "price:[..5000],priceCurrency:USD,conditions:{USED}");
			then.status(200).header("content-type", "application/json").body(SEARCH_BODY);
		})
		.await;
	let request = SearchRequest::new("omega")
		.with_auxiliary_terms(["speedmaster"])
		.with_entries_per_page(10)
		.with_filters(ListingFilters::new().with_max_price("5000").with_condition("Used"));
	let first = client.search(&request).await.expect("First structured search should succeed.");
	let second = client.search(&request).await.expect("Second structured search should succeed.");

	assert_eq!(first.len(), 1);
	assert_eq!(first[0].title, "Omega Speedmaster");
	assert_eq!(first[0].price.as_ref().map(|p| p.value.as_str()), Some("4500.00"));
	assert_eq!(first, second);

	// The second search reuses the cached credential.
	token_mock.assert_calls_async(1).await;
	search_mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn structured_search_omits_the_filter_parameter_when_unconstrained() {
	let server = MockServer::start_async().await;
	let client = build_client(build_descriptor(&server));
	let _token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/identity/v1/oauth2/token");
			then.status(200).header("content-type", "application/json").body(TOKEN_BODY);
		})
		.await;
	let search_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/buy/browse/v1/item_summary/search")
				.query_param("q", "omega")
				.query_param("limit", "20")
				.query_param_missing("filter");
			then.status(200).header("content-type", "application/json").body(SEARCH_BODY);
		})
		.await;

	client
		.search(&SearchRequest::new("omega"))
		.await
		.expect("Unconstrained structured search should succeed.");

	search_mock.assert_async().await;
}

#[tokio::test]
async fn failed_exchanges_abort_the_search() {
	let server = MockServer::start_async().await;
	let client = build_client(build_descriptor(&server));
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/identity/v1/oauth2/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_scope\"}");
		})
		.await;
	let search_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/buy/browse/v1/item_summary/search");
			then.status(200).body(SEARCH_BODY);
		})
		.await;
	let err = client
		.search(&SearchRequest::new("omega"))
		.await
		.expect_err("Search behind a failed exchange should error.");

	assert!(matches!(err, Error::Exchange(ExchangeError::Status { status: 400, .. })));

	token_mock.assert_async().await;
	search_mock.assert_calls_async(0).await;
}
