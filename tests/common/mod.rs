#![allow(dead_code)]

// std
use std::{sync::Arc, time::Duration as StdDuration};
// crates.io
use reqwest::{Client, redirect::Policy};
use time::{Duration, OffsetDateTime};
// self
use telematics_broker::{
	auth::{ScopeList, Token},
	config::{ApiPaths, Config},
	http::ReqwestHttpClient,
	lifecycle::ReqwestLifecycleManager,
	oauth::ReqwestTransportErrorMapper,
	upstream::UpstreamClient,
	url::Url,
};

/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
/// `httpmock`.
pub fn test_reqwest_http_client() -> ReqwestHttpClient {
	let client = Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.redirect(Policy::none())
		.timeout(StdDuration::from_secs(5))
		.build()
		.expect("Failed to build insecure Reqwest client for tests.");

	ReqwestHttpClient::with_client(client)
}

/// Builds a [`Config`] whose OAuth endpoints and API base all point at `base_url`
/// (an `httpmock` server root).
pub fn test_config(base_url: &str, client_id: &str, client_secret: &str) -> Config {
	let base = base_url.trim_end_matches('/');
	let parse =
		|path: &str| Url::parse(&format!("{base}{path}")).expect("Failed to parse mock server URL.");

	Config::builder()
		.authorization_endpoint(parse("/oauth/authorize"))
		.token_endpoint(parse("/oauth/token"))
		.revocation_endpoint(parse("/oauth/revoke"))
		.api_base(parse("/"))
		.paths(ApiPaths::default())
		.client_id(client_id)
		.client_secret(client_secret)
		.scopes(ScopeList::new(["ag1", "eq1", "org1"]).expect("Test scopes should be valid."))
		.build()
		.expect("Test configuration should validate.")
}

/// Lifecycle manager and upstream client sharing one config and the insecure transport.
pub fn build_reqwest_test_stack(
	config: Config,
) -> (ReqwestLifecycleManager, UpstreamClient<ReqwestHttpClient>) {
	let config = Arc::new(config);
	let http_client = Arc::new(test_reqwest_http_client());
	let manager = ReqwestLifecycleManager::with_http_client(
		config.clone(),
		http_client.clone(),
		Arc::new(ReqwestTransportErrorMapper),
	)
	.expect("Lifecycle manager should build from the test configuration.");
	let client = UpstreamClient::with_http_client(config, http_client);

	(manager, client)
}

/// Real (non-synthetic) token expiring at `expires_at`.
pub fn real_token(access: &str, refresh: Option<&str>, expires_at: OffsetDateTime) -> Token {
	let mut builder = Token::builder(ScopeList::new(["ag1", "eq1", "org1"]).expect("Valid scopes"))
		.access_token(access)
		.issued_at(expires_at - Duration::hours(12))
		.expires_at(expires_at);

	if let Some(refresh) = refresh {
		builder = builder.refresh_token(refresh);
	}

	builder.build().expect("Token fixture should build successfully.")
}
