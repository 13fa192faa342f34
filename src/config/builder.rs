// std
use std::{net::IpAddr, time::Duration as StdDuration};
// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	auth::ScopeList,
	config::{
		ApiPaths, Config, DEFAULT_ACCEPT, DEFAULT_REQUEST_TIMEOUT, DEFAULT_TOKEN_LIFETIME,
		HeaderPair, NO_PAGING_HEADER, OAuthEndpoints,
	},
	error::ConfigError,
};

/// Authorize-URL parameters that force the account picker and a fresh consent screen.
pub const DEFAULT_AUTHORIZE_PARAMS: [(&str, &str); 4] = [
	("prompt", "login consent"),
	("max_age", "0"),
	("auth_type", "rerequest"),
	("response_mode", "query"),
];

/// Builder for [`Config`] values.
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
	authorization_endpoint: Option<Url>,
	token_endpoint: Option<Url>,
	revocation_endpoint: Option<Url>,
	api_base: Option<Url>,
	paths: ApiPaths,
	client_id: String,
	client_secret: Option<String>,
	scopes: ScopeList,
	request_timeout: StdDuration,
	default_token_lifetime: StdDuration,
	accept: String,
	paging_header: HeaderPair,
	authorize_params: Vec<(String, String)>,
	accept_test_codes: bool,
}
impl ConfigBuilder {
	pub(crate) fn new() -> Self {
		Self {
			authorization_endpoint: None,
			token_endpoint: None,
			revocation_endpoint: None,
			api_base: None,
			paths: ApiPaths::default(),
			client_id: String::new(),
			client_secret: None,
			scopes: ScopeList::default(),
			request_timeout: DEFAULT_REQUEST_TIMEOUT,
			default_token_lifetime: DEFAULT_TOKEN_LIFETIME,
			accept: DEFAULT_ACCEPT.to_owned(),
			paging_header: HeaderPair::new(NO_PAGING_HEADER, "true"),
			authorize_params: DEFAULT_AUTHORIZE_PARAMS
				.iter()
				.map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
				.collect(),
			accept_test_codes: true,
		}
	}

	/// Sets the authorize endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the optional revocation endpoint.
	pub fn revocation_endpoint(mut self, url: Url) -> Self {
		self.revocation_endpoint = Some(url);

		self
	}

	/// Sets the telematics API base URL.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Replaces the API path templates.
	pub fn paths(mut self, paths: ApiPaths) -> Self {
		self.paths = paths;

		self
	}

	/// Sets the OAuth client identifier.
	pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
		self.client_id = client_id.into();

		self
	}

	/// Sets the OAuth client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Sets the scopes requested at authorization time.
	pub fn scopes(mut self, scopes: ScopeList) -> Self {
		self.scopes = scopes;

		self
	}

	/// Overrides the per-request timeout.
	pub fn request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Overrides the lifetime assumed for token responses without `expires_in`.
	pub fn default_token_lifetime(mut self, lifetime: StdDuration) -> Self {
		self.default_token_lifetime = lifetime;

		self
	}

	/// Overrides the `Accept` header value.
	pub fn accept(mut self, media_type: impl Into<String>) -> Self {
		self.accept = media_type.into();

		self
	}

	/// Overrides the pagination-disable header.
	pub fn paging_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.paging_header = HeaderPair::new(name, value);

		self
	}

	/// Replaces the extra authorize-URL parameters.
	pub fn authorize_params<I, K, V>(mut self, params: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.authorize_params =
			params.into_iter().map(|(key, value)| (key.into(), value.into())).collect();

		self
	}

	/// Enables or disables the reserved test authorization codes.
	pub fn accept_test_codes(mut self, enabled: bool) -> Self {
		self.accept_test_codes = enabled;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<Config, ConfigError> {
		let authorization = self
			.authorization_endpoint
			.ok_or(ConfigError::MissingEndpoint { endpoint: "authorization" })?;
		let token = self.token_endpoint.ok_or(ConfigError::MissingEndpoint { endpoint: "token" })?;
		let api_base = self.api_base.ok_or(ConfigError::MissingEndpoint { endpoint: "api" })?;

		ensure_secure("authorization", &authorization)?;
		ensure_secure("token", &token)?;
		ensure_secure("api", &api_base)?;

		if let Some(revocation) = &self.revocation_endpoint {
			ensure_secure("revocation", revocation)?;
		}
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::MissingClientId);
		}
		if self.request_timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout);
		}
		if self.default_token_lifetime.as_secs() == 0 {
			return Err(ConfigError::ZeroTokenLifetime);
		}

		self.paths.validate()?;

		Ok(Config {
			endpoints: OAuthEndpoints {
				authorization,
				token,
				revocation: self.revocation_endpoint,
			},
			api_base,
			paths: self.paths,
			client_id: self.client_id,
			client_secret: self.client_secret.filter(|secret| !secret.is_empty()),
			scopes: self.scopes,
			request_timeout: self.request_timeout,
			default_token_lifetime: self.default_token_lifetime,
			accept: self.accept,
			paging_header: self.paging_header,
			authorize_params: self.authorize_params,
			accept_test_codes: self.accept_test_codes,
		})
	}
}

fn ensure_secure(endpoint: &'static str, url: &Url) -> Result<(), ConfigError> {
	let loopback = match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	};

	match url.scheme() {
		"https" => Ok(()),
		"http" if loopback => Ok(()),
		_ => Err(ConfigError::InsecureEndpoint { endpoint, url: url.to_string() }),
	}
}
