//! Ordered endpoint chains: a later endpoint is consulted only when every earlier one came up
//! empty or failed.

// self
use crate::{_prelude::*, config::EndpointTemplate};

/// Result of querying one endpoint in a chain.
#[derive(Debug)]
pub(crate) enum Attempt<T> {
	/// The endpoint produced usable data; the chain stops here.
	Found(T),
	/// The endpoint answered but had nothing to offer.
	Empty,
	/// The endpoint could not be queried or its answer could not be understood.
	Failed(Error),
}
impl<T> Attempt<T> {
	/// Classifies a normalized value, treating `is_empty` values as [`Attempt::Empty`].
	pub(crate) fn from_result(result: Result<T>, is_empty: impl FnOnce(&T) -> bool) -> Self {
		match result {
			Ok(value) if is_empty(&value) => Attempt::Empty,
			Ok(value) => Attempt::Found(value),
			Err(err) => Attempt::Failed(err),
		}
	}
}

/// Walks `chain` in order and returns the first [`Attempt::Found`] value.
///
/// When nothing is found the result is `Ok(None)` as long as at least one endpoint answered
/// with an empty payload; only when every endpoint failed does the primary endpoint's error
/// surface.
pub(crate) async fn first_found<'a, T, F, Fut>(
	family: &'static str,
	chain: &'a [EndpointTemplate],
	mut attempt: F,
) -> Result<Option<T>>
where
	F: FnMut(&'a EndpointTemplate) -> Fut,
	Fut: Future<Output = Attempt<T>>,
{
	let mut primary_error = None;
	let mut answered_empty = false;

	for (position, template) in chain.iter().enumerate() {
		match attempt(template).await {
			Attempt::Found(value) => {
				if position > 0 {
					log_event!(info, "Fallback endpoint {template} served {family} data.");
				}

				return Ok(Some(value));
			},
			Attempt::Empty => {
				log_event!(debug, "Endpoint {template} returned no {family} data.");

				answered_empty = true;
			},
			Attempt::Failed(err) => {
				log_event!(warn, "Endpoint {template} failed for {family}: {err}.");

				primary_error.get_or_insert(err);
			},
		}
	}

	match primary_error {
		Some(err) if !answered_empty => Err(err),
		_ => Ok(None),
	}
}
