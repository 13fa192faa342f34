//! Token lifecycle orchestration: authorization, code exchange, refresh, and revocation.
//!
//! [`TokenLifecycleManager`] owns the OAuth facade and the shared transport. Callers bring the
//! session-keyed [`TokenStore`] so the manager stays free of per-user state.

pub mod authorize;
pub mod refresh;

mod exchange;
mod revoke;

pub use authorize::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::{self, SessionId, Token},
	config::Config,
	http::{ApiHttpClient, ReqwestHttpClient, TokenHttpClient},
	oauth::{BasicFacade, ReqwestTransportErrorMapper, TransportErrorMapper},
	store::{CompareAndSwapOutcome, TokenStore},
};

/// Lifecycle manager specialized for the crate's default reqwest transport stack.
pub type ReqwestLifecycleManager =
	TokenLifecycleManager<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Obtains, refreshes, and revokes tokens for one OAuth client registration.
pub struct TokenLifecycleManager<C = ReqwestHttpClient, M = ReqwestTransportErrorMapper>
where
	C: ?Sized + TokenHttpClient + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	config: Arc<Config>,
	http_client: Arc<C>,
	facade: BasicFacade<C, M>,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
}
impl TokenLifecycleManager<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a manager with its own reqwest transport bounded by the configured timeout.
	pub fn new(config: impl Into<Arc<Config>>) -> Result<Self> {
		let config = config.into();
		let http_client = ReqwestHttpClient::with_timeout(config.request_timeout)?;

		Self::with_http_client(config, http_client, ReqwestTransportErrorMapper)
	}
}
impl<C, M> TokenLifecycleManager<C, M>
where
	C: ?Sized + TokenHttpClient + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a manager that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: impl Into<Arc<Config>>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let config = config.into();
		let http_client = http_client.into();
		let facade = BasicFacade::from_config(&config, http_client.clone(), mapper)?;

		Ok(Self { config, http_client, facade, refresh_metrics: Default::default() })
	}

	/// Configuration the manager was built with.
	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Returns `true` when `token` is a synthetic sentinel rather than a real credential.
	pub fn is_synthetic(&self, token: &Token) -> bool {
		auth::is_synthetic(token)
	}

	/// Returns a usable token for `session`, refreshing and persisting it when it has expired.
	///
	/// A concurrent refresh that already replaced the stored token wins; its result is
	/// returned instead of the one computed here. A session that disappeared mid-refresh
	/// (logout) reports [`Error::NotAuthenticated`].
	pub async fn valid_token(&self, store: &dyn TokenStore, session: &SessionId) -> Result<Token> {
		let current = store.fetch(session).await?.ok_or(Error::NotAuthenticated)?;

		if !current.is_expired() {
			return Ok(current);
		}

		let expected = current.access_token.expose().to_owned();
		let refreshed = self.refresh_if_needed(current).await?;

		match store.compare_and_swap(session, &expected, refreshed.clone()).await? {
			CompareAndSwapOutcome::Updated => Ok(refreshed),
			CompareAndSwapOutcome::Mismatch => {
				log_event!(debug, "Session {session} was refreshed concurrently; using the stored token.");

				store.fetch(session).await?.ok_or(Error::NotAuthenticated)
			},
			CompareAndSwapOutcome::Missing => Err(Error::NotAuthenticated),
		}
	}
}
impl<C, M> Debug for TokenLifecycleManager<C, M>
where
	C: ?Sized + TokenHttpClient + ApiHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenLifecycleManager")
			.field("config", &self.config)
			.field("refresh_metrics", &self.refresh_metrics)
			.finish()
	}
}
