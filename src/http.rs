//! Transport primitives for token exchanges and telematics API calls.
//!
//! Two seams live here. [`TokenHttpClient`] hands the `oauth2` crate instrumented
//! [`AsyncHttpClient`] handles that publish [`ResponseMetadata`] (status and error body) into
//! a [`ResponseMetadataSlot`], so failed exchanges can report what the token endpoint said.
//! [`ApiHttpClient`] executes plain [`ApiRequest`] values for the upstream client and the
//! revocation call. [`ReqwestHttpClient`] implements both.

// std
use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
use reqwest::redirect::Policy;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, TransportError},
};

/// Longest error body (in characters) kept in [`ResponseMetadata`].
const BODY_CAPTURE_LIMIT: usize = 2_048;

/// Future returned by [`ApiHttpClient::execute`].
pub type ApiFuture<'a> =
	Pin<Box<dyn Future<Output = Result<ApiResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports capable of executing OAuth token exchanges while
/// publishing response metadata for error mapping.
///
/// Implementations must be `Send + Sync + 'static` so one transport can be shared by the
/// lifecycle manager and the upstream client, and the handles they return must own whatever
/// state is required so their request futures remain `Send`.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle tied to a [`ResponseMetadataSlot`].
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds an [`AsyncHttpClient`] handle that records outcomes in `slot`.
	///
	/// # Metadata Contract
	///
	/// - Call [`ResponseMetadataSlot::take`] before submitting the HTTP request so stale
	///   information never leaks across calls.
	/// - Once a response arrives, save its status (and, for non-success statuses, its body) with
	///   [`ResponseMetadataSlot::store`].
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Minimal request executor used for telematics API reads and token revocation.
pub trait ApiHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Executes `request` and returns the raw status and body.
	///
	/// Non-success statuses are ordinary responses; only failures to obtain a response are
	/// errors.
	fn execute(&self, request: ApiRequest) -> ApiFuture<'_>;
}

/// Metadata captured from the most recent token-endpoint response.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the token endpoint, if available.
	pub status: Option<u16>,
	/// Response body for non-success statuses, truncated for diagnostics.
	pub body: Option<String>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// HTTP method used by [`ApiRequest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiMethod {
	/// `GET`
	Get,
	/// `POST`
	Post,
}

/// HTTP Basic credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuth {
	/// User name (the OAuth client id).
	pub username: String,
	/// Password (the OAuth client secret).
	pub password: Option<String>,
}
impl Debug for BasicAuth {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BasicAuth")
			.field("username", &self.username)
			.field("password_set", &self.password.is_some())
			.finish()
	}
}

/// Transport-neutral request description.
///
/// `Debug` prints form field names only; form values may carry token secrets.
#[derive(Clone)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: ApiMethod,
	/// Fully rendered URL including query.
	pub url: Url,
	/// Extra headers.
	pub headers: Vec<(String, String)>,
	/// Bearer token for the `Authorization` header.
	pub bearer: Option<TokenSecret>,
	/// Basic credentials for the `Authorization` header.
	pub basic_auth: Option<BasicAuth>,
	/// URL-encoded form body.
	pub form: Vec<(String, String)>,
}
impl ApiRequest {
	/// Starts a `GET` request.
	pub fn get(url: Url) -> Self {
		Self::new(ApiMethod::Get, url)
	}

	/// Starts a `POST` request.
	pub fn post(url: Url) -> Self {
		Self::new(ApiMethod::Post, url)
	}

	/// Adds headers.
	pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
		self.headers.extend(headers);

		self
	}

	/// Authenticates with a bearer token.
	pub fn bearer(mut self, token: TokenSecret) -> Self {
		self.bearer = Some(token);

		self
	}

	/// Authenticates with HTTP Basic credentials.
	pub fn basic_auth(mut self, username: impl Into<String>, password: Option<String>) -> Self {
		self.basic_auth = Some(BasicAuth { username: username.into(), password });

		self
	}

	/// Appends a form field.
	pub fn form_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.form.push((key.into(), value.into()));

		self
	}

	fn new(method: ApiMethod, url: Url) -> Self {
		Self {
			method,
			url,
			headers: Vec::new(),
			bearer: None,
			basic_auth: None,
			form: Vec::new(),
		}
	}
}

impl Debug for ApiRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let form_fields = self.form.iter().map(|(key, _)| key.as_str()).collect::<Vec<_>>();

		f.debug_struct("ApiRequest")
			.field("method", &self.method)
			.field("url", &self.url.as_str())
			.field("headers", &self.headers)
			.field("bearer", &self.bearer)
			.field("basic_auth", &self.basic_auth)
			.field("form_fields", &form_fields)
			.finish()
	}
}

/// Raw response returned by [`ApiHttpClient::execute`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Body decoded as UTF-8, replacing invalid sequences.
	pub fn body_text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The same client serves token requests and API reads, so it never follows redirects: token
/// endpoints must answer directly and bearer tokens must not travel to redirect targets.
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that bounds every request by `timeout` and disables redirects.
	pub fn with_timeout(timeout: std::time::Duration) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().timeout(timeout).redirect(Policy::none()).build()?;

		Ok(Self(client))
	}

	pub(crate) fn instrumented(&self, slot: ResponseMetadataSlot) -> InstrumentedHandle {
		InstrumentedHandle::new(self.0.clone(), slot)
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl TokenHttpClient for ReqwestHttpClient {
	type Handle = InstrumentedHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		self.instrumented(slot)
	}
}
impl ApiHttpClient for ReqwestHttpClient {
	fn execute(&self, request: ApiRequest) -> ApiFuture<'_> {
		Box::pin(async move {
			let ApiRequest { method, url, headers, bearer, basic_auth, form } = request;
			let mut builder = match method {
				ApiMethod::Get => self.0.get(url),
				ApiMethod::Post => self.0.post(url),
			};

			for (name, value) in &headers {
				builder = builder.header(name.as_str(), value.as_str());
			}

			if let Some(token) = &bearer {
				builder = builder.bearer_auth(token.expose());
			}
			if let Some(BasicAuth { username, password }) = basic_auth {
				builder = builder.basic_auth(username, password);
			}
			if !form.is_empty() {
				builder = builder.form(&form);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let body = response.bytes().await?.to_vec();

			Ok(ApiResponse { status, body })
		})
	}
}

/// Instrumented adapter that implements [`AsyncHttpClient`] for reqwest.
pub(crate) struct InstrumentedHttpClient {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}
impl InstrumentedHttpClient {
	fn new(client: ReqwestClient, slot: ResponseMetadataSlot) -> Self {
		Self { client, slot }
	}
}

/// Public handle returned by [`ReqwestHttpClient`] that satisfies [`TokenHttpClient`].
#[derive(Clone)]
pub struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
impl InstrumentedHandle {
	fn new(client: ReqwestClient, slot: ResponseMetadataSlot) -> Self {
		Self(Arc::new(InstrumentedHttpClient::new(client, slot)))
	}
}
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = Arc::clone(&self.0);

		Box::pin(async move {
			client.slot.take();

			let response = client
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let bytes = response.bytes().await.map_err(Box::new)?.to_vec();
			let body = (!status.is_success()).then(|| capture_body(&bytes));

			client.slot.store(ResponseMetadata { status: Some(status.as_u16()), body });

			let mut response_new = HttpResponse::new(bytes);

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

fn capture_body(bytes: &[u8]) -> String {
	String::from_utf8_lossy(bytes).chars().take(BODY_CAPTURE_LIMIT).collect()
}
