// self
use crate::{
	_prelude::*,
	auth::{self, Token},
	error::ConfigError,
	http::{ApiHttpClient, TokenHttpClient},
	lifecycle::{AuthorizationSession, TokenLifecycleManager},
	oauth::{OAuth2Facade, TransportErrorMapper},
	obs::{self, CallKind, CallOutcome, CallSpan},
};

impl<C, M> TokenLifecycleManager<C, M>
where
	C: ?Sized + TokenHttpClient + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges an authorization `code` for a token.
	///
	/// When test codes are enabled, a reserved code mints a synthetic token without any
	/// network call; every later upstream read with that token is refused by the degraded-mode
	/// guard.
	pub async fn acquire(&self, code: &str, redirect_uri: &Url) -> Result<Token> {
		const KIND: CallKind = CallKind::TokenExchange;

		let span = CallSpan::new(KIND, "acquire");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let code = code.trim();

				if code.is_empty() {
					return Err(Error::InvalidInput { reason: "authorization code is empty".into() });
				}
				if self.config.accept_test_codes && auth::is_test_code(code) {
					log_event!(warn, "Accepted a test authorization code; issuing a synthetic token.");

					let token =
						auth::mint_synthetic(self.config.scopes.clone(), OffsetDateTime::now_utc())
							.map_err(ConfigError::from)?;

					return Ok(token);
				}

				self.facade.exchange_authorization_code(code, redirect_uri, &self.config.scopes).await
			})
			.await;

		obs::record_call_outcome(KIND, CallOutcome::of(&result));

		if let Err(err) = &result {
			log_event!(warn, "Authorization code exchange failed: {err}");
		}

		result
	}

	/// Validates the redirect `state` against `session` and exchanges `code`.
	pub async fn complete_authorization(
		&self,
		session: &AuthorizationSession,
		returned_state: &str,
		code: &str,
	) -> Result<Token> {
		session.validate_state(returned_state)?;

		self.acquire(code, &session.redirect_uri).await
	}
}
