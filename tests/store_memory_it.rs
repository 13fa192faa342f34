mod common;

// crates.io
use time::macros;
// self
use common::*;
use telematics_broker::{
	auth::{SessionId, Token},
	store::{CompareAndSwapOutcome, MemoryStore, TokenStore},
};

fn session(raw: &str) -> SessionId {
	SessionId::new(raw).expect("Session fixture should be valid.")
}

fn token(access: &str) -> Token {
	real_token(access, Some("refresh-1"), macros::datetime!(2025-11-10 13:00 UTC))
}

#[tokio::test]
async fn save_fetch_and_remove_per_session() {
	let store = MemoryStore::default();
	let alice = session("session-alice");
	let bob = session("session-bob");

	store.save(&alice, token("access-alice")).await.expect("Saving should succeed.");
	store.save(&bob, token("access-bob")).await.expect("Saving should succeed.");

	assert_eq!(store.len(), 2);

	let fetched = store
		.fetch(&alice)
		.await
		.expect("Fetching should succeed.")
		.expect("Alice should hold a token.");

	assert_eq!(fetched.access_token.expose(), "access-alice");

	let removed = store.remove(&alice).await.expect("Removal should succeed.");

	assert_eq!(removed.map(|token| token.access_token.expose().to_owned()).as_deref(), Some("access-alice"));
	assert!(store.fetch(&alice).await.expect("Fetching should succeed.").is_none());
	assert!(store.fetch(&bob).await.expect("Fetching should succeed.").is_some());
	assert!(store.remove(&alice).await.expect("Removal should succeed.").is_none());
}

#[tokio::test]
async fn compare_and_swap_detects_concurrent_replacement() {
	let store = MemoryStore::default();
	let id = session("session-cas");

	assert_eq!(
		store
			.compare_and_swap(&id, "access-0", token("access-1"))
			.await
			.expect("CAS should succeed."),
		CompareAndSwapOutcome::Missing
	);

	store.save(&id, token("access-0")).await.expect("Saving should succeed.");

	assert_eq!(
		store
			.compare_and_swap(&id, "access-0", token("access-1"))
			.await
			.expect("CAS should succeed."),
		CompareAndSwapOutcome::Updated
	);
	assert_eq!(
		store
			.compare_and_swap(&id, "access-0", token("access-stale"))
			.await
			.expect("CAS should succeed."),
		CompareAndSwapOutcome::Mismatch
	);

	let current = store
		.fetch(&id)
		.await
		.expect("Fetching should succeed.")
		.expect("Session should keep its token.");

	assert_eq!(current.access_token.expose(), "access-1");
}

#[tokio::test]
async fn clones_share_one_session_map() {
	let store = MemoryStore::default();
	let clone = store.clone();
	let id = session("session-shared");

	clone.save(&id, token("access-shared")).await.expect("Saving should succeed.");

	assert!(!store.is_empty());
	assert!(store.fetch(&id).await.expect("Fetching should succeed.").is_some());
}
