//! Thread-safe in-memory [`TokenStore`] for single-process deployments and tests.

// self
use crate::{
	_prelude::*,
	auth::{SessionId, Token},
	store::{CompareAndSwapOutcome, StoreError, StoreFuture, TokenStore},
};

type SessionMap = Arc<RwLock<HashMap<SessionId, Token>>>;

/// Storage backend that keeps one token per session in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(SessionMap);
impl MemoryStore {
	/// Number of sessions currently holding a token.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no session holds a token.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn cas_now(
		map: &SessionMap,
		session: &SessionId,
		expected: &str,
		replacement: Token,
	) -> CompareAndSwapOutcome {
		let mut guard = map.write();
		let outcome = match guard.get(session) {
			Some(current) if current.access_token.expose() == expected =>
				CompareAndSwapOutcome::Updated,
			Some(_) => CompareAndSwapOutcome::Mismatch,
			None => CompareAndSwapOutcome::Missing,
		};

		if outcome == CompareAndSwapOutcome::Updated {
			guard.insert(session.clone(), replacement);
		}

		outcome
	}
}
impl TokenStore for MemoryStore {
	fn save<'a>(&'a self, session: &'a SessionId, token: Token) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			self.0.write().insert(session.clone(), token);

			Ok::<_, StoreError>(())
		})
	}

	fn fetch<'a>(&'a self, session: &'a SessionId) -> StoreFuture<'a, Option<Token>> {
		Box::pin(async move { Ok(self.0.read().get(session).cloned()) })
	}

	fn compare_and_swap<'a>(
		&'a self,
		session: &'a SessionId,
		expected: &'a str,
		replacement: Token,
	) -> StoreFuture<'a, CompareAndSwapOutcome> {
		Box::pin(async move { Ok(Self::cas_now(&self.0, session, expected, replacement)) })
	}

	fn remove<'a>(&'a self, session: &'a SessionId) -> StoreFuture<'a, Option<Token>> {
		Box::pin(async move { Ok(self.0.write().remove(session)) })
	}
}
