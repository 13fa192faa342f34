//! OAuth 2.0 token lifecycle and normalizing API facade for OEM telematics dashboards.
//!
//! The crate obtains, refreshes, and revokes bearer tokens against the OEM authorization
//! server, guards every upstream call against synthetic tokens, walks dual-endpoint fallback
//! chains, and turns the inconsistent JSON shapes the telematics API emits into one canonical
//! model (organizations, machines, locations, alerts, engine hours).

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

#[macro_use]
mod macros;

pub mod auth;
pub mod config;
pub mod error;
pub mod guard;
pub mod http;
pub mod lifecycle;
pub mod model;
pub mod normalize;
pub mod oauth;
pub mod obs;
pub mod store;
pub mod upstream;
#[cfg(test)]
mod _preludet {
	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::ScopeList,
		config::{ApiPaths, Config},
	};

	/// Builds a [`Config`] whose OAuth endpoints and API base all point at `base_url`.
	pub fn test_config(base_url: &str, client_id: &str, client_secret: &str) -> Config {
		let base = base_url.trim_end_matches('/');
		let parse = |path: &str| {
			Url::parse(&format!("{base}{path}")).expect("Failed to parse test base URL.")
		};

		Config::builder()
			.authorization_endpoint(parse("/oauth/authorize"))
			.token_endpoint(parse("/oauth/token"))
			.revocation_endpoint(parse("/oauth/revoke"))
			.api_base(parse("/"))
			.paths(ApiPaths::default())
			.client_id(client_id)
			.client_secret(client_secret)
			.scopes(ScopeList::new(["ag1", "eq1", "org1"]).expect("Test scopes should be valid."))
			.build()
			.expect("Test configuration should validate.")
	}
}

mod _prelude {
	pub use std::{
		collections::{HashMap, HashSet},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
