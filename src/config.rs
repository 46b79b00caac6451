/*
 * Copyright (c) 2025 the flickr crate contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

use crate::response::ResponseFormat;
use chrono::Duration;
use std::fmt;
use strum_macros::{EnumString, IntoStaticStr};

/// Endpoint all method calls are sent to unless reconfigured.
pub const DEFAULT_ENDPOINT: &str = "https://api.flickr.com/services/rest/";

/// API credentials for one application, optionally carrying a user token.
///
/// The secrets participate in request signing only. They are redacted from
/// the `Debug` output and never logged or persisted by this crate.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    api_key: String,
    api_secret: String,
    token: Option<String>,
    token_secret: Option<String>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            token: None,
            token_secret: None,
        }
    }

    pub fn from_tokens(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        token: impl Into<String>,
        token_secret: Option<String>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            token: Some(token.into()),
            token_secret,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub(crate) fn api_secret(&self) -> &str {
        &self.api_secret
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub(crate) fn token_secret(&self) -> Option<&str> {
        self.token_secret.as_deref()
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn set_token_secret(&mut self, token_secret: impl Into<String>) {
        self.token_secret = Some(token_secret.into());
    }

    /// Installs a new token pair. The previous token secret never survives a
    /// rotation; it belonged to the old token and would corrupt the signing
    /// key.
    pub fn rotate_token(&mut self, token: impl Into<String>, token_secret: Option<String>) {
        self.token = Some(token.into());
        self.token_secret = token_secret;
    }

    pub fn clear_token(&mut self) {
        self.token = None;
        self.token_secret = None;
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"xxx")
            .field("api_secret", &"xxx")
            .field("token", &"xxx")
            .field("token_secret", &"xxx")
            .finish()
    }
}

/// HTTP verb a call is issued with.
///
/// Query-style verbs carry the parameters in the URL; the body verbs send
/// them form-encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Delete,
    Head,
    Patch,
}

impl HttpMethod {
    pub fn sends_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Patch)
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Patch => reqwest::Method::PATCH,
        }
    }
}

/// Access level an authorization grant asks for or carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Perms {
    #[default]
    Read,
    Write,
    Delete,
}

/// Per-client request configuration, applied to every call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    /// Wire format responses are requested and decoded in.
    pub format: ResponseFormat,
    /// Verb method calls are issued with.
    pub http_method: HttpMethod,
    /// Endpoint URL method calls are sent to.
    pub endpoint: String,
    /// Callback URL forwarded with authorization requests, if any.
    pub callback_url: Option<String>,
    /// Time to live for cached responses. `None` caches without expiry.
    pub cache_ttl: Option<Duration>,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            format: ResponseFormat::Serialized,
            http_method: HttpMethod::Get,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            callback_url: None,
            cache_ttl: None,
        }
    }
}

/// Per-call switches for one `execute` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallOptions {
    /// Serve a stored response when one is live. Off forces the network.
    pub allow_cached: bool,
    /// Turn a `stat="fail"` response into an error instead of returning it.
    pub raise_on_failure: bool,
}

impl Default for CallOptions {
    fn default() -> Self {
        Self {
            allow_cached: true,
            raise_on_failure: false,
        }
    }
}

impl CallOptions {
    pub fn bypass_cache(mut self) -> Self {
        self.allow_cached = false;
        self
    }

    pub fn raising(mut self) -> Self {
        self.raise_on_failure = true;
        self
    }
}
