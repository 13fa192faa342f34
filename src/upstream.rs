//! Authenticated, normalizing client for the telematics API.
//!
//! Every operation consults [`DegradedModeGuard`] before touching the network, attaches the
//! bearer token plus the configured `Accept` and no-paging headers, and hands the decoded
//! payload to [`crate::normalize`]. Dual-endpoint families (machines, location) walk the
//! configured fallback chain.

mod fallback;

// crates.io
use time::format_description::well_known::Rfc3339;
// self
use crate::{
	_prelude::*,
	auth::{MachineId, OrganizationId, Token},
	config::{Config, EndpointTemplate, TemplateVars, paths},
	error::ConfigError,
	guard::DegradedModeGuard,
	http::{ApiHttpClient, ApiRequest, ReqwestHttpClient},
	model::{Alert, AlertDefinition, EngineHours, Location, Machine, MachineDetails, Organization},
	normalize,
	obs::{self, CallKind, CallOutcome, CallSpan},
};
use fallback::Attempt;

/// Inclusive time window applied to alert listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
	start: OffsetDateTime,
	end: OffsetDateTime,
}
impl DateRange {
	/// Creates a range, rejecting windows whose start lies after their end.
	pub fn new(start: OffsetDateTime, end: OffsetDateTime) -> Result<Self> {
		if start > end {
			return Err(Error::InvalidInput {
				reason: "date range start must not be after its end".into(),
			});
		}

		Ok(Self { start, end })
	}

	/// Window ending now and spanning `length` into the past.
	pub fn trailing(length: Duration) -> Result<Self> {
		let end = OffsetDateTime::now_utc();

		Self::new(end - length, end)
	}

	/// Start of the window.
	pub fn start(&self) -> OffsetDateTime {
		self.start
	}

	/// End of the window.
	pub fn end(&self) -> OffsetDateTime {
		self.end
	}

	fn query_pairs(&self) -> Result<[(&'static str, String); 2]> {
		let format = |instant: OffsetDateTime| {
			instant.format(&Rfc3339).map_err(|err| Error::InvalidInput { reason: err.to_string() })
		};

		Ok([("startDate", format(self.start)?), ("endDate", format(self.end)?)])
	}
}

/// Read-only facade over the telematics API.
///
/// Cloning is cheap; the configuration and transport are shared.
pub struct UpstreamClient<C = ReqwestHttpClient>
where
	C: ?Sized + ApiHttpClient,
{
	config: Arc<Config>,
	http_client: Arc<C>,
}
impl UpstreamClient<ReqwestHttpClient> {
	/// Creates a client with its own reqwest transport bounded by the configured timeout.
	pub fn new(config: impl Into<Arc<Config>>) -> Result<Self> {
		let config = config.into();
		let http_client = ReqwestHttpClient::with_timeout(config.request_timeout)?;

		Ok(Self::with_http_client(config, http_client))
	}
}
impl<C> UpstreamClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_http_client(config: impl Into<Arc<Config>>, http_client: impl Into<Arc<C>>) -> Self {
		Self { config: config.into(), http_client: http_client.into() }
	}

	/// Configuration the client was built with.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Lists the organizations visible to `token`.
	pub async fn list_organizations(&self, token: &Token) -> Result<Vec<Organization>> {
		const KIND: CallKind = CallKind::Organizations;

		self.observe(KIND, "list_organizations", token, async {
			let url = self.config.api_url(&self.config.paths.organizations, &TemplateVars::default())?;
			let payload = self.fetch_json(KIND, token, url).await?;

			normalize::normalize_organizations(&payload)
		})
		.await
	}

	/// Lists the machines of `organization`, consulting fallback endpoints when the primary
	/// one is empty or fails.
	pub async fn list_machines(
		&self,
		token: &Token,
		organization: &OrganizationId,
	) -> Result<Vec<Machine>> {
		const KIND: CallKind = CallKind::Machines;

		self.observe(KIND, "list_machines", token, async {
			let vars = TemplateVars::organization(organization);
			let chain = &self.config.paths.machines;
			let found = fallback::first_found("machines", chain, |template| {
				self.attempt(KIND, token, template, vars, normalize::normalize_machines, Vec::is_empty)
			})
			.await?;

			Ok(found.unwrap_or_default())
		})
		.await
	}

	/// Fetches the detail view of `machine`.
	pub async fn get_machine(&self, token: &Token, machine: &MachineId) -> Result<MachineDetails> {
		const KIND: CallKind = CallKind::Machine;

		self.observe(KIND, "get_machine", token, async {
			let url = self.config.api_url(&self.config.paths.machine, &TemplateVars::machine(machine))?;
			let payload = self.fetch_json(KIND, token, url).await?;

			normalize::normalize_machine_details(&payload, machine)
		})
		.await
	}

	/// Resolves the best known position of `machine`.
	///
	/// Location history is preferred; the single-fix endpoint is consulted when history is
	/// empty or unavailable. `Ok(None)` means no endpoint knows a position.
	pub async fn get_machine_location(
		&self,
		token: &Token,
		machine: &MachineId,
	) -> Result<Option<Location>> {
		const KIND: CallKind = CallKind::MachineLocation;

		self.observe(KIND, "get_machine_location", token, async {
			let vars = TemplateVars::machine(machine);
			let chain = &self.config.paths.machine_location;

			fallback::first_found("location", chain, |template| async move {
				let attempt = self
					.attempt(KIND, token, template, vars, normalize::normalize_location, Option::is_none)
					.await;

				match attempt {
					Attempt::Found(location) => location.map_or(Attempt::Empty, Attempt::Found),
					Attempt::Empty => Attempt::Empty,
					Attempt::Failed(err) => Attempt::Failed(err),
				}
			})
			.await
		})
		.await
	}

	/// Lists the alerts of `machine`, optionally restricted to `range`.
	pub async fn list_machine_alerts(
		&self,
		token: &Token,
		machine: &MachineId,
		range: Option<&DateRange>,
	) -> Result<Vec<Alert>> {
		const KIND: CallKind = CallKind::MachineAlerts;

		self.observe(KIND, "list_machine_alerts", token, async {
			let mut url =
				self.config.api_url(&self.config.paths.machine_alerts, &TemplateVars::machine(machine))?;

			if let Some(range) = range {
				let pairs = range.query_pairs()?;

				url.query_pairs_mut().extend_pairs(pairs);
			}

			let payload = self.fetch_json(KIND, token, url).await?;

			normalize::normalize_alerts(&payload)
		})
		.await
	}

	/// Fetches the definition behind an alert's `definitionUri`.
	///
	/// Relative URIs are resolved against the API base; absolute ones must share its origin so
	/// the bearer token never leaves the telematics API.
	pub async fn get_alert_definition(&self, token: &Token, uri: &str) -> Result<AlertDefinition> {
		const KIND: CallKind = CallKind::AlertDefinition;

		self.observe(KIND, "get_alert_definition", token, async {
			let url = self.definition_url(uri)?;
			let payload = self.fetch_json(KIND, token, url).await?;

			normalize::normalize_alert_definition(&payload)
		})
		.await
	}

	/// Fetches the most recent engine-hour reading of `machine`.
	pub async fn get_machine_engine_hours(
		&self,
		token: &Token,
		machine: &MachineId,
	) -> Result<Option<EngineHours>> {
		const KIND: CallKind = CallKind::EngineHours;

		self.observe(KIND, "get_machine_engine_hours", token, async {
			let url = self
				.config
				.api_url(&self.config.paths.machine_engine_hours, &TemplateVars::machine(machine))?;
			let payload = self.fetch_json(KIND, token, url).await?;

			normalize::normalize_engine_hours(&payload)
		})
		.await
	}

	async fn observe<T, Fut>(
		&self,
		kind: CallKind,
		stage: &'static str,
		token: &Token,
		call: Fut,
	) -> Result<T>
	where
		Fut: Future<Output = Result<T>>,
	{
		let span = CallSpan::new(kind, stage);

		obs::record_call_outcome(kind, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				DegradedModeGuard::check(token)?;

				call.await
			})
			.await;

		obs::record_call_outcome(kind, CallOutcome::of(&result));

		if let Err(err) = &result {
			log_event!(debug, "{kind} call did not complete: {err}");
		}

		result
	}

	async fn attempt<T>(
		&self,
		kind: CallKind,
		token: &Token,
		template: &EndpointTemplate,
		vars: TemplateVars<'_>,
		normalizer: fn(&Value) -> Result<T>,
		is_empty: fn(&T) -> bool,
	) -> Attempt<T> {
		let result = async {
			let url = self.config.api_url(template, &vars)?;
			let payload = self.fetch_json(kind, token, url).await?;

			normalizer(&payload)
		}
		.await;

		Attempt::from_result(result, is_empty)
	}

	async fn fetch_json(&self, kind: CallKind, token: &Token, url: Url) -> Result<Value> {
		log_event!(debug, "Requesting {kind} data from {url}.");

		let request = ApiRequest::get(url)
			.headers(self.config.api_headers())
			.bearer(token.access_token.clone());
		let response = self.http_client.execute(request).await?;

		if !response.is_success() {
			return Err(Error::UpstreamHttp { status: response.status, body: response.body_text() });
		}
		if response.body.iter().all(u8::is_ascii_whitespace) {
			return Ok(Value::Null);
		}

		let mut deserializer = serde_json::Deserializer::from_slice(&response.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|err| Error::malformed(kind.as_str(), err))
	}

	fn definition_url(&self, uri: &str) -> Result<Url> {
		let uri = uri.trim();

		if uri.is_empty() {
			return Err(Error::InvalidInput { reason: "alert definition URI is empty".into() });
		}

		match Url::parse(uri) {
			Ok(url) if url.origin() == self.config.api_base.origin() => Ok(url),
			Ok(url) => Err(Error::InvalidInput {
				reason: format!("alert definition URI `{url}` is outside the telematics API"),
			}),
			Err(url::ParseError::RelativeUrlWithoutBase) =>
				Ok(paths::join_base(&self.config.api_base, uri)?),
			Err(source) =>
				Err(ConfigError::InvalidEndpoint { endpoint: "alert definition", source }.into()),
		}
	}
}
impl<C> Clone for UpstreamClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn clone(&self) -> Self {
		Self { config: self.config.clone(), http_client: self.http_client.clone() }
	}
}
impl<C> Debug for UpstreamClient<C>
where
	C: ?Sized + ApiHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("UpstreamClient").field("api_base", &self.config.api_base.as_str()).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::test_config;

	fn client() -> UpstreamClient {
		UpstreamClient::with_http_client(
			test_config("https://api.example.com/", "client", "secret"),
			ReqwestHttpClient::default(),
		)
	}

	#[test]
	fn date_ranges_must_be_ordered() {
		let now = OffsetDateTime::now_utc();

		assert!(DateRange::new(now - Duration::days(1), now).is_ok());
		assert!(matches!(
			DateRange::new(now, now - Duration::days(1)),
			Err(Error::InvalidInput { .. })
		));
	}

	#[test]
	fn date_ranges_render_rfc3339() {
		let start = OffsetDateTime::from_unix_timestamp(1_714_521_600).expect("Valid timestamp");
		let range = DateRange::new(start, start + Duration::days(1)).expect("Ordered range");
		let pairs = range.query_pairs().expect("Range should format.");

		assert_eq!(pairs[0], ("startDate", "2024-05-01T00:00:00Z".to_owned()));
		assert_eq!(pairs[1], ("endDate", "2024-05-02T00:00:00Z".to_owned()));
	}

	#[test]
	fn definition_urls_stay_on_the_api_origin() {
		let client = client();

		assert_eq!(
			client.definition_url("/alertDefinitions/9").expect("Relative URI").as_str(),
			"https://api.example.com/alertDefinitions/9"
		);
		assert_eq!(
			client
				.definition_url("https://api.example.com/alertDefinitions/9")
				.expect("Same-origin URI")
				.as_str(),
			"https://api.example.com/alertDefinitions/9"
		);
		assert!(matches!(
			client.definition_url("https://evil.example.net/steal"),
			Err(Error::InvalidInput { .. })
		));
		assert!(matches!(client.definition_url("  "), Err(Error::InvalidInput { .. })));
	}
}
