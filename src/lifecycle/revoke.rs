// std
use std::iter;
// self
use crate::{
	_prelude::*,
	auth::{self, Token},
	http::{ApiHttpClient, ApiRequest, TokenHttpClient},
	lifecycle::TokenLifecycleManager,
	oauth::TransportErrorMapper,
	obs::{self, CallKind, CallOutcome, CallSpan},
};

impl<C, M> TokenLifecycleManager<C, M>
where
	C: ?Sized + TokenHttpClient + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Revokes the access and refresh secrets of `token` at logout (RFC 7009).
	///
	/// Synthetic tokens and deployments without a revocation endpoint succeed without any
	/// network call. Both secrets are always attempted; the first failure is returned.
	pub async fn revoke(&self, token: &Token) -> Result<()> {
		const KIND: CallKind = CallKind::TokenRevoke;

		if auth::is_synthetic(token) {
			log_event!(debug, "Skipping revocation of a synthetic token.");

			return Ok(());
		}

		let Some(endpoint) = self.config.endpoints.revocation.as_ref() else {
			log_event!(debug, "No revocation endpoint is configured; skipping revocation.");

			return Ok(());
		};
		let span = CallSpan::new(KIND, "revoke");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span
			.instrument(async move {
				let secrets = iter::once(("access_token", &token.access_token))
					.chain(token.refresh_token.as_ref().map(|secret| ("refresh_token", secret)));
				let mut first_error = None;

				for (hint, secret) in secrets {
					let request = ApiRequest::post(endpoint.clone())
						.basic_auth(self.config.client_id.clone(), self.config.client_secret.clone())
						.form_field("token", secret.expose())
						.form_field("token_type_hint", hint);
					let outcome = match self.http_client.execute(request).await {
						Ok(response) if response.is_success() => Ok(()),
						Ok(response) => Err(Error::UpstreamHttp {
							status: response.status,
							body: response.body_text(),
						}),
						Err(err) => Err(Error::from(err)),
					};

					if let Err(err) = outcome {
						log_event!(warn, "Revoking the {hint} failed: {err}");

						first_error.get_or_insert(err);
					}
				}

				first_error.map_or(Ok(()), Err)
			})
			.await;

		obs::record_call_outcome(KIND, CallOutcome::of(&result));

		result
	}
}
