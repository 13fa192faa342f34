//! Crate-level error types shared by the token lifecycle, upstream client, and normalizer.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Absence of data is never reported through this type; empty collections and missing
/// locations are ordinary values. Every variant describes an inability to authenticate,
/// reach, or understand the upstream service.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// A synthetic token blocked the call before any network traffic.
	#[error(transparent)]
	DegradedMode(#[from] crate::guard::DegradedModeError),
	/// Network, timeout, or I/O failure while talking to upstream.
	#[error(transparent)]
	UpstreamUnreachable(#[from] TransportError),

	/// The token endpoint rejected an authorization-code exchange.
	#[error("Authorization code exchange failed: {reason}.")]
	TokenExchange {
		/// Upstream- or crate-supplied reason string.
		reason: String,
		/// HTTP status code, when the token endpoint answered.
		status: Option<u16>,
		/// Raw response body, when the token endpoint answered.
		body: Option<String>,
	},
	/// A refresh-token grant could not be performed or was rejected.
	#[error("Token refresh failed: {reason}.")]
	TokenRefresh {
		/// Upstream- or crate-supplied reason string.
		reason: String,
		/// HTTP status code, when the token endpoint answered.
		status: Option<u16>,
	},
	/// The telematics API answered with a non-success status.
	#[error("Upstream API responded with HTTP {status}.")]
	UpstreamHttp {
		/// HTTP status code.
		status: u16,
		/// Response body as text.
		body: String,
	},
	/// Upstream JSON violated the structure the normalizer relies on.
	#[error("Upstream returned a malformed {context} payload at `{path}`: {message}.")]
	MalformedResponse {
		/// Entity family or endpoint the payload belonged to.
		context: &'static str,
		/// JSON path of the offending value (`.` for the document root).
		path: String,
		/// Parser message.
		message: String,
	},
	/// Caller-supplied input cannot be turned into an upstream request.
	#[error("Invalid request input: {reason}.")]
	InvalidInput {
		/// Human-readable explanation.
		reason: String,
	},
	/// No token is stored for the requested session.
	#[error("No token is stored for this session; sign in first.")]
	NotAuthenticated,
	/// The `state` returned by the authorization redirect does not match the issued one.
	#[error("Authorization state mismatch.")]
	StateMismatch,
}
impl Error {
	/// Classifies the error into the response the route layer should produce.
	pub fn disposition(&self) -> Disposition {
		match self {
			Error::UpstreamHttp { status: 401, .. }
			| Error::TokenRefresh { .. }
			| Error::NotAuthenticated => Disposition::Reauthenticate,
			Error::UpstreamHttp { status: 404, .. } => Disposition::NotFound,
			Error::DegradedMode(_) => Disposition::Degraded,
			_ => Disposition::Failure,
		}
	}

	pub(crate) fn malformed(
		context: &'static str,
		err: serde_path_to_error::Error<serde_json::Error>,
	) -> Self {
		Error::MalformedResponse {
			context,
			path: err.path().to_string(),
			message: err.into_inner().to_string(),
		}
	}
}

/// How the route layer should surface an [`Error`] to the end user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Disposition {
	/// The session must sign in again (HTTP 401, failed refresh, missing token).
	Reauthenticate,
	/// The requested resource does not exist upstream (HTTP 404).
	NotFound,
	/// A synthetic token is in use; upstream data is unavailable by construction.
	Degraded,
	/// Any other upstream or local failure.
	Failure,
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Layered settings could not be loaded or extracted.
	#[error("Settings could not be loaded.")]
	Settings {
		/// Underlying figment failure.
		#[source]
		source: Box<figment::Error>,
	},
	/// An endpoint URL cannot be parsed.
	#[error("The {endpoint} endpoint is not a valid URL.")]
	InvalidEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A required endpoint was never configured.
	#[error("Missing {endpoint} endpoint.")]
	MissingEndpoint {
		/// Which endpoint is missing.
		endpoint: &'static str,
	},
	/// Endpoints must use HTTPS unless they target a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// An API path template is unusable.
	#[error("API path template `{template}` is invalid: {reason}.")]
	InvalidPathTemplate {
		/// Offending template text.
		template: String,
		/// Why the template was rejected.
		reason: &'static str,
	},
	/// A dual-endpoint family was configured without any endpoint.
	#[error("The {family} endpoint family needs at least one path.")]
	EmptyFallbackChain {
		/// Endpoint family label.
		family: &'static str,
	},
	/// The OAuth client identifier is empty.
	#[error("Client identifier cannot be empty.")]
	MissingClientId,
	/// Request timeouts must be positive.
	#[error("Request timeout must be greater than zero.")]
	ZeroTimeout,
	/// The fallback token lifetime must be at least one second.
	#[error("Default token lifetime must be at least one second.")]
	ZeroTokenLifetime,
	/// Configured scopes cannot be normalized.
	#[error("Configured scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Token builder validation failed.
	#[error("Unable to build token.")]
	TokenBuild(#[from] crate::auth::TokenBuilderError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
impl From<figment::Error> for ConfigError {
	fn from(e: figment::Error) -> Self {
		Self::Settings { source: Box::new(e) }
	}
}

/// Transport-level failures (network, timeout, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling upstream.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request exceeded the configured timeout.
	#[error("Upstream call timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling upstream.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
