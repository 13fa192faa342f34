//! Layered settings: built-in defaults, an optional TOML file, then `TELEMATICS_*` variables.
//!
//! Nested keys use a double underscore in environment variables, for example
//! `TELEMATICS_PATHS__MACHINE=/platform/machines/{machine_id}`.

// std
use std::{path::Path, time::Duration as StdDuration};
// crates.io
use figment::{
	Figment,
	providers::{Env, Format, Serialized, Toml},
};
// self
use crate::{
	_prelude::*,
	auth::ScopeList,
	config::{ApiPaths, Config, DEFAULT_ACCEPT},
	error::ConfigError,
};

/// Environment variable prefix read by [`Settings::figment`].
pub const ENV_PREFIX: &str = "TELEMATICS_";

const DEFAULT_API_BASE: &str = "https://sandboxapi.deere.com";
const DEFAULT_AUTHORIZATION_ENDPOINT: &str = "https://sandboxapi.deere.com/platform/oauth/authorize";
const DEFAULT_TOKEN_ENDPOINT: &str = "https://sandboxapi.deere.com/platform/oauth/token";
const DEFAULT_REVOCATION_ENDPOINT: &str =
	"https://signin.johndeere.com/oauth2/aus78tnlaysMraFhC1t7/v1/revoke";
const DEFAULT_SCOPES: &str = "ag1 ag2 ag3 org1 org2 files eq1 eq2";
const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3_600;

/// Raw, unvalidated settings as read from files and the environment.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: Option<String>,
	/// Authorize endpoint URL.
	pub authorization_endpoint: String,
	/// Token endpoint URL.
	pub token_endpoint: String,
	/// Revocation endpoint URL; an empty string disables revocation.
	pub revocation_endpoint: String,
	/// Telematics API base URL.
	pub api_base: String,
	/// Space-delimited scopes requested at authorization time.
	pub scopes: String,
	/// Per-request timeout in seconds.
	pub request_timeout_secs: u64,
	/// Lifetime in seconds assumed for token responses without `expires_in`.
	pub default_token_lifetime_secs: u64,
	/// `Accept` header value for API calls.
	pub accept: String,
	/// Whether reserved test codes mint synthetic tokens.
	pub accept_test_codes: bool,
	/// Path template overrides.
	pub paths: ApiPaths,
}
impl Settings {
	/// Provider stack: defaults, then `file` (when given), then prefixed environment variables.
	pub fn figment(file: Option<&Path>) -> Figment {
		let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));

		if let Some(file) = file {
			figment = figment.merge(Toml::file(file));
		}

		figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
	}

	/// Loads settings from the provider stack described in [`Settings::figment`].
	pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
		Ok(Self::figment(file).extract()?)
	}

	/// Validates the settings and converts them into a [`Config`].
	pub fn into_config(self) -> Result<Config, ConfigError> {
		let mut builder = Config::builder()
			.authorization_endpoint(parse_endpoint("authorization", &self.authorization_endpoint)?)
			.token_endpoint(parse_endpoint("token", &self.token_endpoint)?)
			.api_base(parse_endpoint("api", &self.api_base)?)
			.paths(self.paths)
			.client_id(self.client_id)
			.scopes(ScopeList::from_str(&self.scopes)?)
			.request_timeout(StdDuration::from_secs(self.request_timeout_secs))
			.default_token_lifetime(StdDuration::from_secs(self.default_token_lifetime_secs))
			.accept(self.accept)
			.accept_test_codes(self.accept_test_codes);

		if !self.revocation_endpoint.trim().is_empty() {
			builder = builder
				.revocation_endpoint(parse_endpoint("revocation", &self.revocation_endpoint)?);
		}
		if let Some(secret) = self.client_secret {
			builder = builder.client_secret(secret);
		}

		builder.build()
	}
}
impl Default for Settings {
	fn default() -> Self {
		Self {
			client_id: String::new(),
			client_secret: None,
			authorization_endpoint: DEFAULT_AUTHORIZATION_ENDPOINT.to_owned(),
			token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_owned(),
			revocation_endpoint: DEFAULT_REVOCATION_ENDPOINT.to_owned(),
			api_base: DEFAULT_API_BASE.to_owned(),
			scopes: DEFAULT_SCOPES.to_owned(),
			request_timeout_secs: DEFAULT_TIMEOUT_SECS,
			default_token_lifetime_secs: DEFAULT_TOKEN_LIFETIME_SECS,
			accept: DEFAULT_ACCEPT.to_owned(),
			accept_test_codes: true,
			paths: ApiPaths::default(),
		}
	}
}
impl Debug for Settings {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Settings")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("authorization_endpoint", &self.authorization_endpoint)
			.field("token_endpoint", &self.token_endpoint)
			.field("revocation_endpoint", &self.revocation_endpoint)
			.field("api_base", &self.api_base)
			.field("scopes", &self.scopes)
			.field("request_timeout_secs", &self.request_timeout_secs)
			.field("default_token_lifetime_secs", &self.default_token_lifetime_secs)
			.field("accept", &self.accept)
			.field("accept_test_codes", &self.accept_test_codes)
			.field("paths", &self.paths)
			.finish()
	}
}

fn parse_endpoint(endpoint: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidEndpoint { endpoint, source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_target_the_sandbox() {
		let settings = Settings { client_id: "dashboard".into(), ..Settings::default() };
		let config = settings.into_config().expect("Default settings should validate.");

		assert_eq!(config.api_base.as_str(), "https://sandboxapi.deere.com/");
		assert_eq!(config.scopes.len(), 8);
		assert!(config.endpoints.revocation.is_some());
		assert_eq!(config.request_timeout, StdDuration::from_secs(10));
		assert_eq!(config.default_token_lifetime, StdDuration::from_secs(3_600));
	}

	#[test]
	fn empty_revocation_disables_it() {
		let settings = Settings {
			client_id: "dashboard".into(),
			revocation_endpoint: String::new(),
			..Settings::default()
		};
		let config = settings.into_config().expect("Settings should validate.");

		assert!(config.endpoints.revocation.is_none());
	}

	#[test]
	fn environment_overrides_file_and_defaults() {
		figment::Jail::expect_with(|jail| {
			jail.create_file(
				"telematics.toml",
				"client_id = \"from-file\"\nrequest_timeout_secs = 30\naccept_test_codes = false\n",
			)?;
			jail.set_env("TELEMATICS_CLIENT_ID", "from-env");

			let settings = Settings::load(Some(Path::new("telematics.toml")))
				.expect("Layered settings should load.");

			assert_eq!(settings.client_id, "from-env");
			assert_eq!(settings.request_timeout_secs, 30);
			assert!(!settings.accept_test_codes);
			assert_eq!(settings.api_base, DEFAULT_API_BASE);

			Ok(())
		});
	}

	#[test]
	fn bad_urls_name_the_endpoint() {
		let settings = Settings {
			client_id: "dashboard".into(),
			token_endpoint: "not a url".into(),
			..Settings::default()
		};

		assert!(matches!(
			settings.into_config(),
			Err(ConfigError::InvalidEndpoint { endpoint: "token", .. })
		));
	}
}
