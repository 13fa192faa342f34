//! Storage contracts and the built-in in-memory store for session tokens.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{SessionId, Token},
};

/// Future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Session-keyed persistence for tokens.
///
/// Implementations own durability; the lifecycle manager only reads and replaces whole tokens.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the token of `session`.
	fn save<'a>(&'a self, session: &'a SessionId, token: Token) -> StoreFuture<'a, ()>;

	/// Fetches the token of `session`, if any.
	fn fetch<'a>(&'a self, session: &'a SessionId) -> StoreFuture<'a, Option<Token>>;

	/// Replaces the token of `session` only while its access token still equals `expected`.
	fn compare_and_swap<'a>(
		&'a self,
		session: &'a SessionId,
		expected: &'a str,
		replacement: Token,
	) -> StoreFuture<'a, CompareAndSwapOutcome>;

	/// Removes and returns the token of `session` (logout).
	fn remove<'a>(&'a self, session: &'a SessionId) -> StoreFuture<'a, Option<Token>>;
}

/// Result of a [`TokenStore::compare_and_swap`] attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareAndSwapOutcome {
	/// The stored token matched and was replaced.
	Updated,
	/// A different token is stored; another caller replaced it first.
	Mismatch,
	/// Nothing is stored for the session.
	Missing,
}

/// Error type produced by [`TokenStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
