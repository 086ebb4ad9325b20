//! OAuth 1.0a PIN-based authorization flow
//!
//! The classic three-legged flow for desktop applications without a
//! callback endpoint: fetch a request token, send the user to the
//! authorization page in a browser, then exchange the PIN they receive
//! for a durable access token. Each step is a stateless, blocking call
//! over a fresh HTTP exchange; token persistence is the caller's problem.

pub mod sign;

use crate::http::{self, uri, ClientConfig, HttpClient};

/// Result type for OAuth operations
pub type Result<T> = std::result::Result<T, Error>;

/// OAuth flow errors.
///
/// Transport and protocol failures (`Http`, `Status`) mean the service
/// could not be reached or misbehaved; `MissingToken` and `LaunchFailed`
/// are application failures the caller should present differently
/// ("service unavailable" vs "couldn't authorize").
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(#[from] http::Error),

    #[error("service replied with HTTP {0}")]
    Status(u16),

    #[error("authorization reply is missing the oauth token fields")]
    MissingToken,

    #[error("could not open the authorization page in a browser")]
    LaunchFailed,
}

/// Provider endpoints and consumer credentials
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub request_token_url: String,
    pub authorize_url: String,
    pub access_token_url: String,
}

impl OAuthConfig {
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        request_token_url: impl Into<String>,
        authorize_url: impl Into<String>,
        access_token_url: impl Into<String>,
    ) -> Self {
        OAuthConfig {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            request_token_url: request_token_url.into(),
            authorize_url: authorize_url.into(),
            access_token_url: access_token_url.into(),
        }
    }

    /// Twitter's three OAuth endpoints; the consumer pair is the
    /// application's own registration
    pub fn twitter(consumer_key: impl Into<String>, consumer_secret: impl Into<String>) -> Self {
        Self::new(
            consumer_key,
            consumer_secret,
            "https://api.twitter.com/oauth/request_token",
            "https://api.twitter.com/oauth/authorize",
            "https://api.twitter.com/oauth/access_token",
        )
    }
}

/// A (key, secret) token pair - request stage or access stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub key: String,
    pub secret: String,
}

/// Capability to open a URL for the user, typically in a browser
pub trait UrlLauncher {
    fn launch(&self, url: &str) -> bool;
}

/// The three-legged flow over a provider configuration
pub struct OAuthFlow {
    config: OAuthConfig,
}

impl OAuthFlow {
    pub fn new(config: OAuthConfig) -> Self {
        OAuthFlow { config }
    }

    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Step 1: fetch a short-lived request token.
    ///
    /// Signs the request-token endpoint with the consumer pair only and
    /// parses the form-encoded reply. Both token fields must be present;
    /// a reply with one missing fails without returning a partial pair.
    pub fn request_token(&self) -> Result<TokenPair> {
        let url = sign::signed_url(
            "GET",
            &self.config.request_token_url,
            &self.config.consumer_key,
            &self.config.consumer_secret,
            None,
            &[],
        );
        self.fetch_token(&url)
    }

    /// Step 2: the URL the user must visit to authorize the application.
    /// Pure string construction, no network.
    pub fn authorization_url(&self, request: &TokenPair) -> String {
        format!(
            "{}?oauth_token={}",
            self.config.authorize_url,
            crate::http::form::percent_escape(&request.key)
        )
    }

    /// Step 3: exchange the user's PIN for the durable access token
    pub fn access_token(&self, request: &TokenPair, pin: &str) -> Result<TokenPair> {
        let url = sign::signed_url(
            "GET",
            &self.config.access_token_url,
            &self.config.consumer_key,
            &self.config.consumer_secret,
            Some((&request.key, &request.secret)),
            &[("oauth_verifier", pin)],
        );
        self.fetch_token(&url)
    }

    /// Fetch a request token and open the authorization page.
    ///
    /// Returns the request pair only when the launch succeeded; the
    /// caller then collects the PIN from the user and calls
    /// `access_token`.
    pub fn request_authorization(&self, launcher: &dyn UrlLauncher) -> Result<TokenPair> {
        let request = self.request_token()?;
        let url = self.authorization_url(&request);

        if !launcher.launch(&url) {
            return Err(Error::LaunchFailed);
        }

        Ok(request)
    }

    fn fetch_token(&self, url: &str) -> Result<TokenPair> {
        let parsed = uri::parse(url).map_err(Error::Http)?;

        // An explicit port in the endpoint URL wins over the scheme default
        let (host, explicit_port) = split_host_port(&parsed.host)
            .ok_or_else(|| Error::Http(http::Error::InvalidUri(url.to_string())))?;
        let port = match explicit_port {
            Some(port) => port,
            None => uri::port_for_scheme(&parsed.scheme)
                .ok_or_else(|| Error::Http(http::Error::UnknownScheme(parsed.scheme.clone())))?,
        };

        let client = HttpClient::new(ClientConfig::new(host, port, parsed.scheme == "https"));
        let response = client.get(&parsed.path)?;

        if response.status() != 200 {
            return Err(Error::Status(response.status()));
        }

        parse_token_reply(&response.text()?)
    }
}

/// Split a URI authority into host and optional port. IPv6 literals keep
/// their bracketed form out of the port scan: `[::1]:8080` is host `::1`
/// with port 8080, not a host ending in `:8080`.
fn split_host_port(host: &str) -> Option<(String, Option<u16>)> {
    if let Some(rest) = host.strip_prefix('[') {
        let (addr, tail) = rest.split_once(']')?;
        let port = match tail {
            "" => None,
            _ => Some(tail.strip_prefix(':')?.parse().ok()?),
        };
        Some((addr.to_string(), port))
    } else {
        match host.rsplit_once(':') {
            Some((name, port)) => Some((name.to_string(), Some(port.parse().ok()?))),
            None => Some((host.to_string(), None)),
        }
    }
}

/// Parse a form-encoded token reply into a pair. Both `oauth_token` and
/// `oauth_token_secret` are required.
pub(crate) fn parse_token_reply(body: &str) -> Result<TokenPair> {
    let mut key = None;
    let mut secret = None;

    for pair in body.trim().split('&') {
        if let Some((name, value)) = pair.split_once('=') {
            match name {
                "oauth_token" => key = Some(value.to_string()),
                "oauth_token_secret" => secret = Some(value.to_string()),
                _ => {}
            }
        }
    }

    match (key, secret) {
        (Some(key), Some(secret)) => Ok(TokenPair { key, secret }),
        _ => Err(Error::MissingToken),
    }
}
