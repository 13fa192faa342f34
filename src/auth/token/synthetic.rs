//! Reserved authorization codes and sentinel access tokens for credential-free runs.
//!
//! Exchanging one of [`TEST_AUTHORIZATION_CODES`] produces a token whose access secret is a
//! sentinel from [`SYNTHETIC_ACCESS_TOKENS`]. The degraded-mode guard recognizes those values
//! and refuses to forward them upstream.

// self
use crate::{
	_prelude::*,
	auth::{ScopeList, Token, TokenBuilderError},
};

/// Authorization codes that mint a synthetic token instead of calling the token endpoint.
pub const TEST_AUTHORIZATION_CODES: [&str; 2] = ["manual_test_code", "test_code"];
/// Access-token values that mark a token as synthetic.
pub const SYNTHETIC_ACCESS_TOKENS: [&str; 2] = ["test_token", "simulated_token_manual"];
/// Refresh secret attached to minted synthetic tokens.
pub const SYNTHETIC_REFRESH_TOKEN: &str = "test_refresh_token";
/// Lifetime of a minted synthetic token.
pub const SYNTHETIC_LIFETIME: Duration = Duration::hours(1);

/// Returns `true` if `code` is one of the reserved test authorization codes.
pub fn is_test_code(code: &str) -> bool {
	TEST_AUTHORIZATION_CODES.contains(&code)
}

/// Returns `true` if the token's access secret is a reserved sentinel.
pub fn is_synthetic(token: &Token) -> bool {
	SYNTHETIC_ACCESS_TOKENS.contains(&token.access_token.expose())
}

/// Mints a synthetic token issued at `issued_at`.
pub fn mint_synthetic(
	scope: ScopeList,
	issued_at: OffsetDateTime,
) -> Result<Token, TokenBuilderError> {
	Token::builder(scope)
		.access_token(SYNTHETIC_ACCESS_TOKENS[0])
		.refresh_token(SYNTHETIC_REFRESH_TOKEN)
		.issued_at(issued_at)
		.expires_in(SYNTHETIC_LIFETIME)
		.build()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn minted_tokens_are_synthetic() {
		let now = OffsetDateTime::now_utc();
		let token = mint_synthetic(ScopeList::default(), now).expect("Minting should succeed.");

		assert!(is_synthetic(&token));
		assert_eq!(token.access_token.expose(), "test_token");
		assert_eq!(token.expires_at, now + Duration::hours(1));
		assert!(is_test_code("manual_test_code"));
		assert!(!is_test_code("real-code-123"));
	}

	#[test]
	fn manual_sentinel_is_detected() {
		let token = Token::builder(ScopeList::default())
			.access_token("simulated_token_manual")
			.expires_in(Duration::hours(1))
			.build()
			.expect("Token fixture should build.");

		assert!(is_synthetic(&token));
	}
}
