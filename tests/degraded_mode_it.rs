mod common;

// std
use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};
// crates.io
use time::{Duration, OffsetDateTime};
// self
use common::*;
use telematics_broker::{
	auth::{self, MachineId, OrganizationId, ScopeList, Token},
	error::{Disposition, Error},
	guard::DegradedReason,
	http::{ApiFuture, ApiHttpClient, ApiRequest, ApiResponse},
	lifecycle::ReqwestLifecycleManager,
	upstream::{DateRange, UpstreamClient},
	url::Url,
};

/// Transport that answers every request with an empty listing and counts the calls.
#[derive(Default)]
struct CountingClient {
	calls: AtomicUsize,
}
impl ApiHttpClient for CountingClient {
	fn execute(&self, _request: ApiRequest) -> ApiFuture<'_> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async { Ok(ApiResponse { status: 200, body: b"{\"values\":[]}".to_vec() }) })
	}
}

fn counting_client() -> (UpstreamClient<CountingClient>, Arc<CountingClient>) {
	let transport = Arc::new(CountingClient::default());
	let config = test_config("https://partner.example.com", "client-it", "secret-it");

	(UpstreamClient::with_http_client(config, transport.clone()), transport)
}

fn synthetic_token() -> Token {
	auth::mint_synthetic(ScopeList::default(), OffsetDateTime::now_utc())
		.expect("Synthetic token should mint.")
}

fn assert_degraded<T: std::fmt::Debug>(result: Result<T, Error>) {
	let err = result.expect_err("Synthetic tokens must never reach upstream.");

	assert_eq!(err.disposition(), Disposition::Degraded);

	match err {
		Error::DegradedMode(inner) => assert_eq!(inner.reason, DegradedReason::SyntheticToken),
		other => panic!("Unexpected error: {other:?}."),
	}
}

#[tokio::test]
async fn every_operation_refuses_synthetic_tokens_without_network() {
	let (client, transport) = counting_client();
	let token = synthetic_token();
	let organization = OrganizationId::new("4411").expect("Organization fixture should be valid.");
	let machine = MachineId::new("123456").expect("Machine fixture should be valid.");
	let range = DateRange::trailing(Duration::days(7)).expect("Trailing range should build.");

	assert_degraded(client.list_organizations(&token).await);
	assert_degraded(client.list_machines(&token, &organization).await);
	assert_degraded(client.get_machine(&token, &machine).await);
	assert_degraded(client.get_machine_location(&token, &machine).await);
	assert_degraded(client.list_machine_alerts(&token, &machine, Some(&range)).await);
	assert_degraded(client.get_alert_definition(&token, "/platform/alertDefinitions/1").await);
	assert_degraded(client.get_machine_engine_hours(&token, &machine).await);

	assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn manual_test_code_login_ends_in_degraded_mode() {
	let (client, transport) = counting_client();
	let manager = ReqwestLifecycleManager::new(client.config().clone())
		.expect("Lifecycle manager should build from the test configuration.");
	let redirect = Url::parse("https://dashboard.example.com/auth/callback")
		.expect("Redirect URI fixture should parse.");
	let token = manager
		.acquire("manual_test_code", &redirect)
		.await
		.expect("The manual test code should mint a token.");
	let organization = OrganizationId::new("123456").expect("Organization fixture should be valid.");

	assert!(manager.is_synthetic(&token));
	assert_degraded(client.list_machines(&token, &organization).await);
	assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn both_sentinels_are_refused() {
	let (client, transport) = counting_client();

	for sentinel in auth::SYNTHETIC_ACCESS_TOKENS {
		let token = real_token(sentinel, None, OffsetDateTime::now_utc() + Duration::hours(1));

		assert_degraded(client.list_organizations(&token).await);
	}

	assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn real_tokens_reach_the_transport() {
	let (client, transport) = counting_client();
	let token = real_token("access-real", None, OffsetDateTime::now_utc() + Duration::hours(1));
	let organization = OrganizationId::new("4411").expect("Organization fixture should be valid.");
	let machines =
		client.list_machines(&token, &organization).await.expect("Empty listings are not errors.");

	assert!(machines.is_empty());
	// Both endpoints of the chain answered empty.
	assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
}
