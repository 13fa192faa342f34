//! OAuth client facade over the `oauth2` crate.
//!
//! The facade performs the two token-endpoint grants the dashboard needs, authorization code
//! and refresh token, using HTTP Basic client authentication, and maps every failure into the
//! crate's [`Error`] taxonomy.

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RedirectUrl, RefreshToken, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError},
};
// self
use crate::{
	_prelude::*,
	auth::{ScopeList, Token, TokenBuilderError},
	config::Config,
	error::{ConfigError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
};

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeTokenResponse = oauth2::basic::BasicTokenResponse;
type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

const TOKEN_RESPONSE: &str = "token response";

/// Token-endpoint grants issued through the facade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenGrant {
	/// `grant_type=authorization_code`
	AuthorizationCode,
	/// `grant_type=refresh_token`
	RefreshToken,
}
impl TokenGrant {
	/// Returns the OAuth `grant_type` value.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenGrant::AuthorizationCode => "authorization_code",
			TokenGrant::RefreshToken => "refresh_token",
		}
	}

	/// Builds the grant-specific rejection error.
	pub fn failure(self, reason: String, meta: Option<&ResponseMetadata>) -> Error {
		match self {
			TokenGrant::AuthorizationCode => Error::TokenExchange {
				reason,
				status: meta_status(meta),
				body: meta.and_then(|value| value.body.clone()),
			},
			TokenGrant::RefreshToken => Error::TokenRefresh { reason, status: meta_status(meta) },
		}
	}
}
impl Display for TokenGrant {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(
		&self,
		grant: TokenGrant,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		grant: TokenGrant,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(*inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) =>
				grant.failure(format!("HTTP client error: {message}"), meta),
			_ => grant.failure("unrecognized HTTP client error".into(), meta),
		}
	}
}

pub(crate) trait OAuth2Facade {
	fn exchange_authorization_code<'a, 'code, 'redirect, 'scope>(
		&'a self,
		code: &'code str,
		redirect_uri: &'redirect Url,
		requested_scope: &'scope ScopeList,
	) -> FacadeFuture<'a, Token>
	where
		'code: 'a,
		'redirect: 'a,
		'scope: 'a;

	fn refresh_token<'a, 'refresh, 'scope>(
		&'a self,
		refresh_token: &'refresh str,
		requested_scope: &'scope ScopeList,
	) -> FacadeFuture<'a, (Token, Option<String>)>
	where
		'refresh: 'a,
		'scope: 'a;
}

pub(crate) struct BasicFacade<C = ReqwestHttpClient, M = ReqwestTransportErrorMapper>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	default_lifetime: Duration,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_config(
		config: &Config,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let auth_url = AuthUrl::new(config.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "authorization", source })?;
		let token_url = TokenUrl::new(config.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "token", source })?;
		let mut oauth_client = BasicClient::new(ClientId::new(config.client_id.clone()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url);

		if let Some(secret) = &config.client_secret {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.clone()));
		}

		let default_lifetime = Duration::try_from(config.default_token_lifetime)
			.map_err(|_| ConfigError::ZeroTokenLifetime)?;

		Ok(Self {
			oauth_client,
			default_lifetime,
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
		})
	}
}
impl<C, M> OAuth2Facade for BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange_authorization_code<'a, 'code, 'redirect, 'scope>(
		&'a self,
		code: &'code str,
		redirect_uri: &'redirect Url,
		requested_scope: &'scope ScopeList,
	) -> FacadeFuture<'a, Token>
	where
		'code: 'a,
		'redirect: 'a,
		'scope: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let redirect_url = RedirectUrl::new(redirect_uri.to_string())
				.map_err(|source| ConfigError::InvalidRedirect { source })?;
			let response = self
				.oauth_client
				.exchange_code(AuthorizationCode::new(code.to_owned()))
				.set_redirect_uri(Cow::Owned(redirect_url))
				.request_async(&instrumented)
				.await
				.map_err(|err| {
					map_request_error(
						TokenGrant::AuthorizationCode,
						meta.take(),
						err,
						self.error_mapper.as_ref(),
					)
				})?;

			token_from_response(requested_scope, &response, self.default_lifetime)
		})
	}

	fn refresh_token<'a, 'refresh, 'scope>(
		&'a self,
		refresh_token: &'refresh str,
		requested_scope: &'scope ScopeList,
	) -> FacadeFuture<'a, (Token, Option<String>)>
	where
		'refresh: 'a,
		'scope: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let refresh_secret = RefreshToken::new(refresh_token.to_owned());
			let response = self
				.oauth_client
				.exchange_refresh_token(&refresh_secret)
				.request_async(&instrumented)
				.await
				.map_err(|err| {
					map_request_error(
						TokenGrant::RefreshToken,
						meta.take(),
						err,
						self.error_mapper.as_ref(),
					)
				})?;
			let token = token_from_response(requested_scope, &response, self.default_lifetime)?;
			let rotated = response.refresh_token().map(|secret| secret.secret().to_owned());

			Ok((token, rotated))
		})
	}
}

fn token_from_response(
	requested_scope: &ScopeList,
	response: &FacadeTokenResponse,
	default_lifetime: Duration,
) -> Result<Token> {
	let expires_in = match response.expires_in() {
		Some(expires_in) => {
			let seconds = i64::try_from(expires_in.as_secs())
				.map_err(|_| malformed_token("expires_in", "value exceeds the supported range"))?;

			if seconds <= 0 {
				return Err(malformed_token("expires_in", "value must be positive"));
			}

			Duration::seconds(seconds)
		},
		None => {
			log_event!(debug, "Token response omitted expires_in; assuming {default_lifetime}.");

			default_lifetime
		},
	};

	let scope = match response.scopes() {
		Some(scopes) => ScopeList::new(scopes.iter().map(|scope| scope.as_str().to_owned()))
			.map_err(|err| malformed_token("scope", &err.to_string()))?,
		None => requested_scope.clone(),
	};
	let mut builder = Token::builder(scope)
		.access_token(response.access_token().secret().to_owned())
		.token_type(response.token_type().as_ref())
		.issued_at(OffsetDateTime::now_utc())
		.expires_in(expires_in);

	if let Some(refresh) = response.refresh_token() {
		builder = builder.refresh_token(refresh.secret().to_owned());
	}

	builder.build().map_err(|err| match err {
		TokenBuilderError::ExpiryOutOfRange =>
			malformed_token("expires_in", "value exceeds the supported range"),
		err => ConfigError::from(err).into(),
	})
}

fn malformed_token(path: &str, message: &str) -> Error {
	Error::MalformedResponse {
		context: TOKEN_RESPONSE,
		path: path.to_owned(),
		message: message.to_owned(),
	}
}

fn map_request_error<E, M>(
	grant: TokenGrant,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			grant.failure(server_response_reason(&response), meta_ref),
		RequestTokenError::Request(error) => mapper.map_transport_error(grant, meta_ref, error),
		RequestTokenError::Parse(error, _body) => match meta_status(meta_ref) {
			Some(status) if !(200..300).contains(&status) => grant
				.failure(format!("token endpoint answered HTTP {status}"), meta_ref),
			_ => Error::malformed(TOKEN_RESPONSE, error),
		},
		RequestTokenError::Other(message) => grant.failure(message, meta_ref),
	}
}

fn server_response_reason(response: &BasicErrorResponse) -> String {
	match response.error_description() {
		Some(description) => format!("{}: {description}", response.error().as_ref()),
		None => response.error().as_ref().to_owned(),
	}
}

fn map_reqwest_error(err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}

	TransportError::from(err).into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}
