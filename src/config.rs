//! Explicit runtime configuration for the token lifecycle and upstream client.
//!
//! Nothing in the crate reads process-wide state: every constructor receives a [`Config`]
//! (usually behind an `Arc`), either assembled with [`ConfigBuilder`] or loaded from TOML and
//! environment variables through [`Settings`].

/// Validating builder for [`Config`].
pub mod builder;
pub mod paths;
pub mod settings;

pub use builder::*;
pub use paths::*;
pub use settings::*;

// std
use std::time::Duration as StdDuration;
// self
use crate::{_prelude::*, auth::ScopeList};

/// Per-request timeout applied when no explicit value is configured.
pub const DEFAULT_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);
/// Media type requested from the telematics API.
pub const DEFAULT_ACCEPT: &str = "application/vnd.deere.axiom.v3+json";
/// Lifetime assumed for a token response that omits `expires_in`.
pub const DEFAULT_TOKEN_LIFETIME: StdDuration = StdDuration::from_secs(60 * 60);
/// Header that tells the telematics API to return whole collections in one response.
pub const NO_PAGING_HEADER: &str = "x-deere-no-paging";

/// OAuth endpoints of the authorization server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OAuthEndpoints {
	/// Authorize endpoint users are redirected to.
	pub authorization: Url,
	/// Token endpoint for code exchanges and refreshes.
	pub token: Url,
	/// Optional revocation endpoint used at logout.
	pub revocation: Option<Url>,
}

/// Name/value pair attached to every upstream API request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeaderPair {
	/// Header name.
	pub name: String,
	/// Header value.
	pub value: String,
}
impl HeaderPair {
	/// Creates a header pair.
	pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
		Self { name: name.into(), value: value.into() }
	}
}

/// Validated configuration shared by [`crate::lifecycle::TokenLifecycleManager`] and
/// [`crate::upstream::UpstreamClient`].
#[derive(Clone)]
pub struct Config {
	/// Authorization server endpoints.
	pub endpoints: OAuthEndpoints,
	/// Root of the telematics API; path templates are appended to it.
	pub api_base: Url,
	/// Path templates per resource family.
	pub paths: ApiPaths,
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret used for HTTP Basic client authentication.
	pub client_secret: Option<String>,
	/// Scopes requested at authorization time.
	pub scopes: ScopeList,
	/// Upper bound for every outbound request.
	pub request_timeout: StdDuration,
	/// Lifetime assumed when the token endpoint omits `expires_in` (RFC 6749 §5.1).
	pub default_token_lifetime: StdDuration,
	/// `Accept` header value for API calls.
	pub accept: String,
	/// Pagination-disable directive sent with every API call.
	pub paging_header: HeaderPair,
	/// Extra query parameters appended to the authorize URL.
	pub authorize_params: Vec<(String, String)>,
	/// Whether reserved test codes short-circuit the code exchange.
	pub accept_test_codes: bool,
}
impl Config {
	/// Returns a builder seeded with the crate defaults.
	pub fn builder() -> ConfigBuilder {
		ConfigBuilder::new()
	}

	/// Headers attached to every telematics API request.
	pub fn api_headers(&self) -> Vec<(String, String)> {
		vec![
			("Accept".to_owned(), self.accept.clone()),
			(self.paging_header.name.clone(), self.paging_header.value.clone()),
		]
	}

	/// Renders `template` against the API base.
	pub fn api_url(&self, template: &EndpointTemplate, vars: &TemplateVars) -> Result<Url> {
		template.render(&self.api_base, vars).map_err(Error::from)
	}
}
impl Debug for Config {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Config")
			.field("endpoints", &self.endpoints)
			.field("api_base", &self.api_base)
			.field("paths", &self.paths)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("scopes", &self.scopes)
			.field("request_timeout", &self.request_timeout)
			.field("default_token_lifetime", &self.default_token_lifetime)
			.field("accept", &self.accept)
			.field("paging_header", &self.paging_header)
			.field("authorize_params", &self.authorize_params)
			.field("accept_test_codes", &self.accept_test_codes)
			.finish()
	}
}
