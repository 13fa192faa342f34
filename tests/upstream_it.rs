mod common;

// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::{Duration, OffsetDateTime, macros::datetime};
// self
use common::*;
use telematics_broker::{
	auth::{MachineId, OrganizationId, Token},
	config::DEFAULT_ACCEPT,
	error::{Disposition, Error},
	model::Severity,
	upstream::DateRange,
};

const BEARER: &str = "Bearer access-upstream";

fn live_token() -> Token {
	real_token("access-upstream", Some("refresh-upstream"), OffsetDateTime::now_utc() + Duration::hours(1))
}

fn machine_id(raw: &str) -> MachineId {
	MachineId::new(raw).expect("Machine fixture should be valid.")
}

#[tokio::test]
async fn organizations_carry_api_headers_and_normalize() {
	let server = MockServer::start_async().await;
	let (_, client) = build_reqwest_test_stack(test_config(&server.base_url(), "client-it", "secret-it"));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/platform/organizations")
				.header("authorization", BEARER)
				.header("accept", DEFAULT_ACCEPT)
				.header("x-deere-no-paging", "true");
			then.status(200).header("content-type", "application/json").body(
				json!({
					"values": [
						{ "id": "4411", "name": "North Farm", "type": "customer" },
						{ "id": "4412" },
						{ "name": "Orphan without id" }
					]
				})
				.to_string(),
			);
		})
		.await;
	let organizations =
		client.list_organizations(&live_token()).await.expect("Organizations should load.");

	mock.assert_async().await;

	assert_eq!(organizations.len(), 2);
	assert_eq!(organizations[0].id.as_ref(), "4411");
	assert_eq!(organizations[0].name, "North Farm");
	assert_eq!(organizations[0].kind, "customer");
	assert_eq!(organizations[1].name, "Organization 4412");
	assert_eq!(organizations[1].kind, "UNKNOWN");
}

#[tokio::test]
async fn machines_fall_back_when_primary_listing_is_empty() {
	let server = MockServer::start_async().await;
	let (_, client) = build_reqwest_test_stack(test_config(&server.base_url(), "client-it", "secret-it"));
	let primary = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/platform/equipment")
				.query_param("organizationId", "4411")
				.query_param("categories", "machine");
			then.status(200).header("content-type", "application/json").body("{\"values\":[]}");
		})
		.await;
	let secondary = server
		.mock_async(|when, then| {
			when.method(GET).path("/isg/equipment").query_param("organizationIds", "4411");
			then.status(200).header("content-type", "application/json").body(
				json!([
					{ "id": "9001", "name": "Combine S780", "model": "S780", "category": "COMBINE" },
					{ "id": "9001", "name": "Duplicate entry" },
					{ "id": 9002 }
				])
				.to_string(),
			);
		})
		.await;
	let organization = OrganizationId::new("4411").expect("Organization fixture should be valid.");
	let machines = client
		.list_machines(&live_token(), &organization)
		.await
		.expect("Fallback listing should succeed.");

	primary.assert_calls_async(1).await;
	secondary.assert_calls_async(1).await;

	assert_eq!(machines.len(), 2);
	assert_eq!(machines[0].name, "Combine S780");
	assert_eq!(machines[0].kind, "COMBINE");
	assert_eq!(machines[1].id.as_ref(), "9002");
	assert_eq!(machines[1].name, "Machine 9002");
	assert_eq!(machines[1].model, "Unknown");
}

#[tokio::test]
async fn machines_fall_back_when_primary_listing_fails() {
	let server = MockServer::start_async().await;
	let (_, client) = build_reqwest_test_stack(test_config(&server.base_url(), "client-it", "secret-it"));
	let primary = server
		.mock_async(|when, then| {
			when.method(GET).path("/platform/equipment");
			then.status(403).body("forbidden");
		})
		.await;
	let secondary = server
		.mock_async(|when, then| {
			when.method(GET).path("/isg/equipment");
			then.status(200)
				.header("content-type", "application/json")
				.body(json!({ "values": [{ "id": "9001" }] }).to_string());
		})
		.await;
	let organization = OrganizationId::new("4411").expect("Organization fixture should be valid.");
	let machines = client
		.list_machines(&live_token(), &organization)
		.await
		.expect("Fallback listing should succeed.");

	primary.assert_async().await;
	secondary.assert_async().await;

	assert_eq!(machines.len(), 1);
}

#[tokio::test]
async fn machines_report_primary_error_when_every_endpoint_fails() {
	let server = MockServer::start_async().await;
	let (_, client) = build_reqwest_test_stack(test_config(&server.base_url(), "client-it", "secret-it"));
	let primary = server
		.mock_async(|when, then| {
			when.method(GET).path("/platform/equipment");
			then.status(401).body("token expired");
		})
		.await;
	let secondary = server
		.mock_async(|when, then| {
			when.method(GET).path("/isg/equipment");
			then.status(500).body("boom");
		})
		.await;
	let organization = OrganizationId::new("4411").expect("Organization fixture should be valid.");
	let err = client
		.list_machines(&live_token(), &organization)
		.await
		.expect_err("Every endpoint failing should surface an error.");

	primary.assert_async().await;
	secondary.assert_async().await;

	assert!(matches!(err, Error::UpstreamHttp { status: 401, .. }));
	assert_eq!(err.disposition(), Disposition::Reauthenticate);
}

#[tokio::test]
async fn machine_details_fill_defaults_from_the_requested_id() {
	let server = MockServer::start_async().await;
	let (_, client) = build_reqwest_test_stack(test_config(&server.base_url(), "client-it", "secret-it"));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/platform/machines/123456");
			then.status(200).header("content-type", "application/json").body(
				json!({
					"name": "Tractor 8R",
					"hoursOfOperation": "1520.5",
					"location": { "latitude": 41.59, "longitude": -93.62 }
				})
				.to_string(),
			);
		})
		.await;
	let details = client
		.get_machine(&live_token(), &machine_id("123456"))
		.await
		.expect("Machine details should load.");

	mock.assert_async().await;

	assert_eq!(details.machine.id.as_ref(), "123456");
	assert_eq!(details.machine.name, "Tractor 8R");
	assert_eq!(details.serial_number, "SN-123456");
	assert_eq!(details.status, "ACTIVE");
	assert_eq!(details.hours_of_operation, 1520.5);
	assert_eq!(details.fuel_level, 0.0);

	let location = details.machine.location.expect("Embedded location should be kept.");

	assert_eq!(location.latitude, 41.59);
	assert_eq!(location.longitude, -93.62);
}

#[tokio::test]
async fn missing_machine_maps_to_not_found() {
	let server = MockServer::start_async().await;
	let (_, client) = build_reqwest_test_stack(test_config(&server.base_url(), "client-it", "secret-it"));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/platform/machines/404404");
			then.status(404).body("{\"message\":\"not found\"}");
		})
		.await;
	let err = client
		.get_machine(&live_token(), &machine_id("404404"))
		.await
		.expect_err("Missing machines should fail.");

	mock.assert_async().await;

	assert_eq!(err.disposition(), Disposition::NotFound);
}

#[tokio::test]
async fn location_prefers_the_latest_history_entry() {
	let server = MockServer::start_async().await;
	let (_, client) = build_reqwest_test_stack(test_config(&server.base_url(), "client-it", "secret-it"));
	let history = server
		.mock_async(|when, then| {
			when.method(GET).path("/platform/machines/123456/locationHistory");
			then.status(200).header("content-type", "application/json").body(
				json!({
					"values": [
						{ "point": { "lat": 41.0, "lon": -93.0 }, "eventTimestamp": "2024-04-01T08:00:00Z" },
						{ "point": { "lat": 41.5, "lon": -93.5 }, "eventTimestamp": "2024-04-03T08:00:00Z" },
						{ "point": { "lat": 41.2, "lon": -93.2 }, "eventTimestamp": "2024-04-02T08:00:00Z" }
					]
				})
				.to_string(),
			);
		})
		.await;
	let single = server
		.mock_async(|when, then| {
			when.method(GET).path("/platform/machines/123456/location");
			then.status(500);
		})
		.await;
	let location = client
		.get_machine_location(&live_token(), &machine_id("123456"))
		.await
		.expect("Location lookup should succeed.")
		.expect("History should yield a position.");

	history.assert_async().await;
	single.assert_calls_async(0).await;

	assert_eq!(location.latitude, 41.5);
	assert_eq!(location.longitude, -93.5);
	assert_eq!(location.timestamp.as_deref(), Some("2024-04-03T08:00:00Z"));
}

#[tokio::test]
async fn location_falls_back_to_the_single_fix_endpoint() {
	let server = MockServer::start_async().await;
	let (_, client) = build_reqwest_test_stack(test_config(&server.base_url(), "client-it", "secret-it"));
	let history = server
		.mock_async(|when, then| {
			when.method(GET).path("/platform/machines/123456/locationHistory");
			then.status(200).header("content-type", "application/json").body("{\"values\":[]}");
		})
		.await;
	let single = server
		.mock_async(|when, then| {
			when.method(GET).path("/platform/machines/123456/location");
			then.status(200).header("content-type", "application/json").body(
				json!({
					"type": "Feature",
					"geometry": { "type": "Point", "coordinates": [-73.05, -36.83] },
					"timestamp": "2024-05-01T10:00:00Z"
				})
				.to_string(),
			);
		})
		.await;
	let location = client
		.get_machine_location(&live_token(), &machine_id("123456"))
		.await
		.expect("Location lookup should succeed.")
		.expect("Single-fix endpoint should yield a position.");

	history.assert_async().await;
	single.assert_async().await;

	assert_eq!(location.latitude, -36.83);
	assert_eq!(location.longitude, -73.05);
}

#[tokio::test]
async fn location_is_absent_when_no_endpoint_knows_a_position() {
	let server = MockServer::start_async().await;
	let (_, client) = build_reqwest_test_stack(test_config(&server.base_url(), "client-it", "secret-it"));
	let history = server
		.mock_async(|when, then| {
			when.method(GET).path("/platform/machines/123456/locationHistory");
			then.status(503);
		})
		.await;
	let single = server
		.mock_async(|when, then| {
			when.method(GET).path("/platform/machines/123456/location");
			then.status(200).body("");
		})
		.await;
	let location = client
		.get_machine_location(&live_token(), &machine_id("123456"))
		.await
		.expect("An empty answer outranks a failure.");

	history.assert_async().await;
	single.assert_async().await;

	assert!(location.is_none());
}

#[tokio::test]
async fn alerts_forward_the_date_range() {
	let server = MockServer::start_async().await;
	let (_, client) = build_reqwest_test_stack(test_config(&server.base_url(), "client-it", "secret-it"));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/platform/machines/123456/alerts")
				.query_param("startDate", "2024-05-01T00:00:00Z")
				.query_param("endDate", "2024-05-08T00:00:00Z");
			then.status(200).header("content-type", "application/json").body(
				json!({
					"values": [
						{
							"id": "a-1",
							"content": { "title": "Hydraulic pressure", "description": "Pressure dropped." },
							"severity": "HIGH",
							"time": "2024-05-02T12:00:00Z",
							"links": [{ "rel": "alertDefinition", "uri": "/platform/alertDefinitions/77" }]
						},
						{ "message": "Fuel low", "severity": "Warning" }
					]
				})
				.to_string(),
			);
		})
		.await;
	let range = DateRange::new(datetime!(2024-05-01 0:00 UTC), datetime!(2024-05-08 0:00 UTC))
		.expect("Range fixture should be ordered.");
	let alerts = client
		.list_machine_alerts(&live_token(), &machine_id("123456"), Some(&range))
		.await
		.expect("Alerts should load.");

	mock.assert_async().await;

	assert_eq!(alerts.len(), 2);
	assert_eq!(alerts[0].severity, Severity::Critical);
	assert_eq!(alerts[0].title, "Hydraulic pressure");
	assert_eq!(alerts[0].timestamp.as_deref(), Some("2024-05-02T12:00:00Z"));
	assert_eq!(alerts[0].definition_uri.as_deref(), Some("/platform/alertDefinitions/77"));
	assert_eq!(alerts[1].id, "");
	assert_eq!(alerts[1].title, "Fuel low");
	assert_eq!(alerts[1].severity, Severity::Warning);
}

#[tokio::test]
async fn alert_definitions_resolve_relative_uris() {
	let server = MockServer::start_async().await;
	let (_, client) = build_reqwest_test_stack(test_config(&server.base_url(), "client-it", "secret-it"));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/platform/alertDefinitions/77").header("authorization", BEARER);
			then.status(200).header("content-type", "application/json").body(
				json!({
					"id": 77,
					"title": "Hydraulic pressure",
					"causes": ["Leaking hose", { "description": "Pump wear" }],
					"resolutions": [{ "title": "Inspect hoses" }],
					"additionalInfo": "See operator manual section 4."
				})
				.to_string(),
			);
		})
		.await;
	let definition = client
		.get_alert_definition(&live_token(), "/platform/alertDefinitions/77")
		.await
		.expect("Definition should load.");

	mock.assert_async().await;

	assert_eq!(definition.id, "77");
	assert_eq!(definition.description, "No description");
	assert_eq!(definition.causes, ["Leaking hose", "Pump wear"]);
	assert_eq!(definition.resolutions, ["Inspect hoses"]);
	assert_eq!(definition.additional_info.as_deref(), Some("See operator manual section 4."));

	let absolute = server.url("/platform/alertDefinitions/77");

	client
		.get_alert_definition(&live_token(), &absolute)
		.await
		.expect("Same-origin absolute URIs should load.");
	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn alert_definitions_refuse_foreign_origins() {
	let server = MockServer::start_async().await;
	let (_, client) = build_reqwest_test_stack(test_config(&server.base_url(), "client-it", "secret-it"));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/definitions/77");
			then.status(200);
		})
		.await;
	let err = client
		.get_alert_definition(&live_token(), "https://elsewhere.example.com/definitions/77")
		.await
		.expect_err("Foreign origins must be refused.");

	assert!(matches!(err, Error::InvalidInput { .. }));
	assert!(matches!(
		client.get_alert_definition(&live_token(), "   ").await,
		Err(Error::InvalidInput { .. })
	));

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn engine_hours_pick_the_latest_reading() {
	let server = MockServer::start_async().await;
	let (_, client) = build_reqwest_test_stack(test_config(&server.base_url(), "client-it", "secret-it"));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/platform/machines/123456/engineHours");
			then.status(200).header("content-type", "application/json").body(
				json!({
					"values": [
						{ "reading": { "valueAsDouble": 1200.0, "unit": "Hours" }, "reportTime": "2024-04-01T00:00:00Z" },
						{ "reading": { "valueAsDouble": 1250.5 }, "reportTime": "2024-04-10T00:00:00Z" }
					]
				})
				.to_string(),
			);
		})
		.await;
	let hours = client
		.get_machine_engine_hours(&live_token(), &machine_id("123456"))
		.await
		.expect("Engine hours should load.")
		.expect("A reading should be present.");

	mock.assert_async().await;

	assert_eq!(hours.hours, 1250.5);
	assert_eq!(hours.unit, "Hours");
	assert_eq!(hours.timestamp.as_deref(), Some("2024-04-10T00:00:00Z"));
}

#[tokio::test]
async fn malformed_payloads_report_the_offending_path() {
	let server = MockServer::start_async().await;
	let (_, client) = build_reqwest_test_stack(test_config(&server.base_url(), "client-it", "secret-it"));
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/platform/organizations");
			then.status(200).header("content-type", "application/json").body("{\"values\": 42}");
		})
		.await;
	let err = client
		.list_organizations(&live_token())
		.await
		.expect_err("A non-array listing must be rejected.");

	mock.assert_async().await;

	match err {
		Error::MalformedResponse { path, .. } => assert_eq!(path, "values"),
		other => panic!("Unexpected error: {other:?}."),
	}
}
