//! Bearer token values, expiry checks, and builders.

// self
use crate::{
	_prelude::*,
	auth::{ScopeList, token::secret::TokenSecret},
};

const DEFAULT_TOKEN_TYPE: &str = "Bearer";
const SUMMARY_PREVIEW_CHARS: usize = 10;

/// Current lifecycle status for a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is not yet valid because the issued-at instant is in the future.
	Pending,
	/// Token is currently valid.
	Active,
	/// Token reached its expiry instant and must be refreshed before use.
	Expired,
}

/// Errors produced by [`TokenBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// Issued when `issued_at + expires_in` is not a representable instant.
	#[error("Relative expiry is out of range.")]
	ExpiryOutOfRange,
}

/// OAuth bearer token owned by exactly one dashboard session.
///
/// Refreshing never mutates a token in place; the lifecycle manager returns a replacement
/// value and the caller swaps it into its session storage.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret, if the authorization server issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Token type reported by the authorization server (normally `Bearer`).
	pub token_type: String,
	/// Scopes granted to this token, in the order the server reported them.
	pub scope: ScopeList,
	/// Issued-at instant.
	pub issued_at: OffsetDateTime,
	/// Expiry instant.
	pub expires_at: OffsetDateTime,
}
impl Token {
	/// Returns a builder for a token granted `scope`.
	pub fn builder(scope: ScopeList) -> TokenBuilder {
		TokenBuilder::new(scope)
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if instant < self.issued_at {
			return TokenStatus::Pending;
		}
		if instant >= self.expires_at {
			return TokenStatus::Expired;
		}

		TokenStatus::Active
	}

	/// Convenience helper that checks the status using the current UTC instant.
	pub fn status(&self) -> TokenStatus {
		self.status_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Expired)
	}

	/// Returns `true` if the token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		matches!(self.status(), TokenStatus::Expired)
	}

	/// Time left before expiry at `instant`, clamped at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}

	/// Redacted view for the dashboard's token diagnostics panel.
	pub fn summary_at(&self, instant: OffsetDateTime) -> TokenSummary {
		TokenSummary {
			access_token: self.access_token.preview(SUMMARY_PREVIEW_CHARS),
			refresh_token: self
				.refresh_token
				.as_ref()
				.map(|secret| secret.preview(SUMMARY_PREVIEW_CHARS)),
			token_type: self.token_type.clone(),
			expires_in_hours: self.remaining_at(instant).whole_hours(),
			scope: self.scope.clone(),
		}
	}

	/// [`Token::summary_at`] evaluated at the current clock.
	pub fn summary(&self) -> TokenSummary {
		self.summary_at(OffsetDateTime::now_utc())
	}
}
impl Debug for Token {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Token")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("token_type", &self.token_type)
			.field("scope", &self.scope)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Display-safe token diagnostics: truncated secrets and the remaining lifetime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSummary {
	/// First characters of the access token followed by `...`.
	pub access_token: String,
	/// First characters of the refresh token followed by `...`, if one exists.
	pub refresh_token: Option<String>,
	/// Token type.
	pub token_type: String,
	/// Whole hours left before expiry.
	pub expires_in_hours: i64,
	/// Granted scopes.
	pub scope: ScopeList,
}

/// Builder for [`Token`].
#[derive(Clone, Debug)]
pub struct TokenBuilder {
	scope: ScopeList,
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	token_type: Option<String>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl TokenBuilder {
	fn new(scope: ScopeList) -> Self {
		Self {
			scope,
			access_token: None,
			refresh_token: None,
			token_type: None,
			issued_at: None,
			expires_at: None,
			expires_in: None,
		}
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Overrides the token type (defaults to `Bearer`).
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Consumes the builder and produces a [`Token`].
	pub fn build(self) -> Result<Token, TokenBuilderError> {
		let access_token = self.access_token.ok_or(TokenBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) =>
				issued_at.checked_add(delta).ok_or(TokenBuilderError::ExpiryOutOfRange)?,
			(None, None) => return Err(TokenBuilderError::MissingExpiry),
		};

		Ok(Token {
			access_token,
			refresh_token: self.refresh_token,
			token_type: self.token_type.unwrap_or_else(|| DEFAULT_TOKEN_TYPE.to_owned()),
			scope: self.scope,
			issued_at,
			expires_at,
		})
	}
}
