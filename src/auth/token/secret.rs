//! Bearer and refresh token secrets that stay out of logs.

// self
use crate::_prelude::*;

const PREVIEW_SUFFIX: &str = "...";

/// Redacted wrapper around an access or refresh token string.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// First `chars` characters followed by `...`, for diagnostic panels.
	pub fn preview(&self, chars: usize) -> String {
		let mut preview = self.0.chars().take(chars).collect::<String>();

		preview.push_str(PREVIEW_SUFFIX);

		preview
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
