//! Demonstrates fetching and reusing cached client-credential tokens against a mocked
//! token endpoint with the default reqwest transport and in-memory store.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use market_scout::{
	auth::{ClientId, MarketplaceId, Scope, TokenSecret},
	cache::{CredentialStore, MemoryStore, TokenCache},
	http::ReqwestTransport,
	marketplace::{FilterEncoding, MarketplaceDescriptor},
	reqwest::Client,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/identity/v1/oauth2/token");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Application Access Token\",\"expires_in\":7200}",
			);
		})
		.await;
	let descriptor = MarketplaceDescriptor::builder(MarketplaceId::new("demo-marketplace")?)
		.token_endpoint(Url::parse(&server.url("/identity/v1/oauth2/token"))?)
		.search_endpoint(Url::parse(&server.url("/buy/browse/v1/item_summary/search"))?)
		.filter_encoding(FilterEncoding::Structured)
		.default_scope(Scope::new("https://api.example.com/oauth/api_scope")?)
		.build()?;
	let store: Arc<dyn CredentialStore> = Arc::new(MemoryStore::default());
	let transport = ReqwestTransport::with_client(
		Client::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()?,
	);
	let cache = TokenCache::with_transport(store, descriptor, transport)
		.with_client_credentials(ClientId::new("demo-client")?, TokenSecret::new("super-secret"));
	let first = cache.access_token().await?;
	let second = cache.access_token().await?;

	println!("scope:       {}", first.scope);
	println!("issued at:   {}", first.issued_at);
	println!("expires at:  {} (60s safety margin already deducted)", first.expires_at);
	println!("still valid: {}", second.is_valid());

	// Both calls were served by a single exchange.
	token_mock.assert_calls_async(1).await;

	Ok(())
}
