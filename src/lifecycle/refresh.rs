//! Refresh of expired tokens through the `refresh_token` grant.
//!
//! A token that is still valid is handed back untouched. An expired token costs exactly one
//! token-endpoint call; when the server does not rotate the refresh secret the previous one is
//! carried over. Expired synthetic tokens are renewed locally and never reach the network.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{self, Token},
	error::ConfigError,
	http::{ApiHttpClient, TokenHttpClient},
	lifecycle::TokenLifecycleManager,
	oauth::{OAuth2Facade, TransportErrorMapper},
	obs::{self, CallKind, CallOutcome, CallSpan},
};

impl<C, M> TokenLifecycleManager<C, M>
where
	C: ?Sized + TokenHttpClient + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Returns `token` if it is still valid, otherwise a refreshed replacement.
	pub async fn refresh_if_needed(&self, token: Token) -> Result<Token> {
		self.refresh_if_needed_at(token, OffsetDateTime::now_utc()).await
	}

	/// Same as [`TokenLifecycleManager::refresh_if_needed`], judged at `now`.
	pub async fn refresh_if_needed_at(&self, token: Token, now: OffsetDateTime) -> Result<Token> {
		const KIND: CallKind = CallKind::TokenRefresh;

		if !token.is_expired_at(now) {
			return Ok(token);
		}

		let span = CallSpan::new(KIND, "refresh_if_needed");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let result = span.instrument(self.refresh_expired(token, now)).await;

		match &result {
			Ok(_) => self.refresh_metrics.record_success(),
			Err(err) => {
				self.refresh_metrics.record_failure();

				log_event!(warn, "Token refresh failed: {err}");
			},
		}

		obs::record_call_outcome(KIND, CallOutcome::of(&result));

		result
	}

	async fn refresh_expired(&self, token: Token, now: OffsetDateTime) -> Result<Token> {
		if auth::is_synthetic(&token) {
			log_event!(debug, "Renewing an expired synthetic token locally.");

			let renewed = auth::mint_synthetic(token.scope.clone(), now).map_err(ConfigError::from)?;

			self.refresh_metrics.record_local_renewal();

			return Ok(renewed);
		}

		let Some(previous_refresh) = token.refresh_token.as_ref() else {
			return Err(Error::TokenRefresh {
				reason: "no refresh token is available".into(),
				status: None,
			});
		};
		let (mut refreshed, rotated) =
			self.facade.refresh_token(previous_refresh.expose(), &token.scope).await?;

		if rotated.is_none() {
			refreshed.refresh_token = Some(previous_refresh.clone());
		} else {
			log_event!(debug, "Token endpoint rotated the refresh token.");
		}

		Ok(refreshed)
	}
}
