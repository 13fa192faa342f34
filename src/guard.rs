//! Degraded-mode detection for synthetic tokens.

// self
use crate::{
	_prelude::*,
	auth::{self, Token},
};

/// Why the guard refused a call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegradedReason {
	/// The access token is a reserved sentinel minted from a test authorization code.
	SyntheticToken,
}

/// Typed refusal returned before any network traffic happens.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{}", self.message())]
pub struct DegradedModeError {
	/// Why the call was refused.
	pub reason: DegradedReason,
}
impl DegradedModeError {
	/// Creates an error for `reason`.
	pub fn new(reason: DegradedReason) -> Self {
		Self { reason }
	}

	/// User-facing explanation that tells the user what to do next.
	pub fn message(&self) -> &'static str {
		match self.reason {
			DegradedReason::SyntheticToken =>
				"A simulated token is in use, so live telematics data is unavailable; sign in with real credentials to reach the API",
		}
	}
}

/// Gatekeeper consulted by every upstream operation before it touches the network.
#[derive(Clone, Copy, Debug, Default)]
pub struct DegradedModeGuard;
impl DegradedModeGuard {
	/// Fails when `token` is synthetic.
	pub fn check(token: &Token) -> Result<(), DegradedModeError> {
		if auth::is_synthetic(token) {
			return Err(DegradedModeError::new(DegradedReason::SyntheticToken));
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::auth::ScopeList;

	fn token(access: &str) -> Token {
		Token::builder(ScopeList::default())
			.access_token(access)
			.expires_in(Duration::hours(1))
			.build()
			.expect("Token fixture should build.")
	}

	#[test]
	fn sentinels_are_refused() {
		for sentinel in auth::SYNTHETIC_ACCESS_TOKENS {
			let err = DegradedModeGuard::check(&token(sentinel))
				.expect_err("Synthetic tokens must be refused.");

			assert_eq!(err.reason, DegradedReason::SyntheticToken);
			assert!(err.to_string().contains("sign in with real credentials"));
		}
	}

	#[test]
	fn real_tokens_pass() {
		DegradedModeGuard::check(&token("eyJhbGciOiJSUzI1NiJ9.payload.sig"))
			.expect("Real tokens must pass the guard.");
	}
}
