//! Authorize-URL construction and redirect `state` handling.

// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{
	_prelude::*,
	config::Config,
	http::{ApiHttpClient, TokenHttpClient},
	lifecycle::TokenLifecycleManager,
	oauth::TransportErrorMapper,
};

const STATE_LEN: usize = 32;

/// Handshake metadata returned by [`TokenLifecycleManager::start_authorization`].
///
/// The route layer stores the session alongside the user's browser session and hands it back
/// to [`TokenLifecycleManager::complete_authorization`] once the redirect arrives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationSession {
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Redirect URI supplied when constructing the authorize URL.
	pub redirect_uri: Url,
	/// Fully-formed authorize URL that end-users should be sent to.
	pub authorize_url: Url,
}
impl AuthorizationSession {
	/// Validates the returned `state` parameter after the authorization redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state { Ok(()) } else { Err(Error::StateMismatch) }
	}
}

impl<C, M> TokenLifecycleManager<C, M>
where
	C: ?Sized + TokenHttpClient + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds the authorize URL for a fresh sign-in attempt.
	///
	/// The URL carries the configured scopes, a random `state`, and the configured extra
	/// parameters that force the consent screen.
	pub fn start_authorization(&self, redirect_uri: Url) -> AuthorizationSession {
		let state = random_string(STATE_LEN);
		let authorize_url = build_authorize_url(&self.config, &redirect_uri, &state);

		log_event!(debug, "Issued an authorization request redirecting to {redirect_uri}.");

		AuthorizationSession { state, redirect_uri, authorize_url }
	}
}

fn build_authorize_url(config: &Config, redirect_uri: &Url, state: &str) -> Url {
	let mut url = config.endpoints.authorization.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", &config.client_id);
	pairs.append_pair("redirect_uri", redirect_uri.as_str());

	if !config.scopes.is_empty() {
		pairs.append_pair("scope", &config.scopes.normalized());
	}

	pairs.append_pair("state", state);

	for (key, value) in &config.authorize_params {
		pairs.append_pair(key, value);
	}

	drop(pairs);

	url
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::test_config;

	#[test]
	fn state_validation_errors_on_mismatch() {
		let session = AuthorizationSession {
			state: "expected".into(),
			redirect_uri: Url::parse("https://dashboard.example.com/callback")
				.expect("Redirect URL fixture should parse successfully."),
			authorize_url: Url::parse("https://signin.example.com/authorize?state=expected")
				.expect("Authorization URL fixture should parse successfully."),
		};

		assert!(session.validate_state("expected").is_ok());
		assert!(matches!(session.validate_state("other"), Err(Error::StateMismatch)));
	}

	#[test]
	fn authorize_url_carries_scopes_state_and_consent_params() {
		let config = test_config("https://signin.example.com", "client-a", "secret-a");
		let redirect = Url::parse("https://dashboard.example.com/callback")
			.expect("Redirect URL fixture should parse successfully.");
		let url = build_authorize_url(&config, &redirect, "state-123");
		let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

		assert_eq!(url.path(), "/oauth/authorize");
		assert_eq!(pairs["response_type"], "code");
		assert_eq!(pairs["client_id"], "client-a");
		assert_eq!(pairs["redirect_uri"], "https://dashboard.example.com/callback");
		assert_eq!(pairs["scope"], "ag1 eq1 org1");
		assert_eq!(pairs["state"], "state-123");
		assert_eq!(pairs["prompt"], "login consent");
		assert_eq!(pairs["max_age"], "0");
	}

	#[test]
	fn random_state_is_alphanumeric() {
		let state = random_string(STATE_LEN);

		assert_eq!(state.len(), STATE_LEN);
		assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
		assert_ne!(state, random_string(STATE_LEN));
	}
}
