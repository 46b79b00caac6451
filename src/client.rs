/*
 * Copyright (c) 2025 the flickr crate contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

use crate::cache::ResponseCache;
use crate::config::{CallOptions, Credentials, HttpMethod, Perms, RequestConfig};
use crate::errors::FlickrError;
use crate::params::{ApiParams, ParameterSet};
use crate::response::{ApiResponse, ResponseFormat};
use crate::settings::Settings;
use crate::sign;
use reqwest::header::CONTENT_TYPE;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Mutex, RwLock};
use url::Url;

/// Endpoint users are sent to for interactive authorization.
pub const AUTH_ENDPOINT: &str = "https://www.flickr.com/services/auth/";

/// A user token granted through the frob exchange, with its access level and
/// the identity it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub token: String,
    pub perms: Option<Perms>,
    pub user: AuthUser,
}

/// Identity fields the token grant reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub nsid: String,
    pub username: String,
    pub fullname: Option<String>,
}

/// Client for the remote photo service.
///
/// Cheap to clone; clones share the HTTP connection pool, credentials,
/// configuration and response cache. Every method call goes through
/// [`Client::execute`], which signs the request, consults the cache and
/// decodes the response in the configured wire format.
#[derive(Debug, Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

#[derive(Debug)]
struct ClientInner {
    http: reqwest::Client,
    creds: RwLock<Credentials>,
    config: RwLock<RequestConfig>,
    cache: Mutex<ResponseCache>,
    cache_file: Option<PathBuf>,
    auth_user: Mutex<Option<String>>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        let Some(path) = &self.cache_file else {
            return;
        };
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(err) = cache.save_to(path) {
            log::warn!("failed to persist response cache: {err}");
        }
    }
}

impl Client {
    /// Creates a client with the default configuration and no cache file.
    pub fn new(creds: Credentials) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                http: reqwest::Client::new(),
                creds: RwLock::new(creds),
                config: RwLock::new(RequestConfig::default()),
                cache: Mutex::new(ResponseCache::new()),
                cache_file: None,
                auth_user: Mutex::new(None),
            }),
        }
    }

    pub fn builder(creds: Credentials) -> ClientBuilder {
        ClientBuilder::new(creds)
    }

    /// Creates a client from loaded [`Settings`].
    pub fn from_settings(settings: &Settings) -> Result<Self, FlickrError> {
        ClientBuilder::from_settings(settings).build()
    }

    /// Snapshot of the current request configuration.
    pub fn config(&self) -> RequestConfig {
        self.inner
            .config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Applies a configuration change for all subsequent calls.
    pub fn configure<F: FnOnce(&mut RequestConfig)>(&self, apply: F) {
        let mut config = self.inner.config.write().unwrap_or_else(|e| e.into_inner());
        apply(&mut config);
    }

    /// Installs a user token pair. Any memoized identity and any previous
    /// token secret belong to the old token and are dropped.
    pub fn set_token(&self, token: impl Into<String>, token_secret: Option<String>) {
        self.inner
            .creds
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .rotate_token(token, token_secret);
        *self.inner.auth_user.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    pub fn has_token(&self) -> bool {
        self.inner
            .creds
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .has_token()
    }

    /// Calls a method with the default per-call options.
    pub async fn call(
        &self,
        method: &str,
        params: &ApiParams<'_>,
    ) -> Result<ApiResponse, FlickrError> {
        self.execute(method, params, CallOptions::default()).await
    }

    /// Issues one signed method call.
    ///
    /// The full parameter set is assembled from the caller's parameters, the
    /// method name, the application key, the format selectors and the user
    /// token when one is installed. A live cached response short-circuits the
    /// network entirely; otherwise the signed request is sent, the payload is
    /// decoded in the configured format and the raw payload is stored under
    /// the call's cache identity.
    pub async fn execute(
        &self,
        method: &str,
        params: &ApiParams<'_>,
        options: CallOptions,
    ) -> Result<ApiResponse, FlickrError> {
        let (creds, config) = self.snapshot();
        let call = call_params(&creds, config.format, method, params);

        // The cache identity is settled before the volatile signing
        // parameters exist.
        let key = {
            let cache = self.inner.cache.lock().unwrap_or_else(|e| e.into_inner());
            cache.derive_key(method, &call)
        };

        if options.allow_cached {
            let mut cache = self.inner.cache.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(entry) = cache.get(&key) {
                log::debug!("cache hit for {method}");
                let resp = ApiResponse::decode(entry.format, &entry.payload)?;
                return finish(resp, options);
            }
        }

        let signed = sign_call(&creds, call);
        let http_method: reqwest::Method = config.http_method.into();
        log::debug!("{} {method}", <&str>::from(config.http_method));

        let request = if config.http_method.sends_body() {
            let url = Url::parse(&config.endpoint)?;
            self.inner
                .http
                .request(http_method, url)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(signed.canonical_query())
        } else {
            let mut url = Url::parse(&config.endpoint)?;
            url.set_query(Some(&signed.canonical_query()));
            self.inner.http.request(http_method, url)
        };

        let payload = request.send().await?.text().await?;
        let resp = ApiResponse::decode(config.format, &payload)?;

        {
            let mut cache = self.inner.cache.lock().unwrap_or_else(|e| e.into_inner());
            cache.set(key, payload, config.format, config.cache_ttl);
        }

        finish(resp, options)
    }

    /// Requests a frob, the one-time ticket that starts the authorization
    /// exchange.
    pub async fn get_frob(&self) -> Result<String, FlickrError> {
        let resp = self
            .execute(
                "flickr.auth.getFrob",
                &[],
                CallOptions::default().bypass_cache().raising(),
            )
            .await?;
        resp.field_text(&["frob"]).ok_or_else(|| FlickrError::Parse {
            raw: resp.to_string(),
            detail: "payload has no frob".into(),
        })
    }

    /// Builds the signed link a user visits to authorize the application for
    /// the given access level.
    pub fn auth_url(&self, perms: Perms, frob: &str) -> Result<Url, FlickrError> {
        let (creds, config) = self.snapshot();

        let mut params = ParameterSet::new();
        params.insert("api_key", creds.api_key());
        params.insert("perms", <&str>::from(perms));
        params.insert("frob", frob);
        if let Some(extra) = &config.callback_url {
            params.insert("extra", extra.as_str());
        }
        let key = sign::signing_key(creds.api_secret(), creds.token_secret());
        let signature = sign::sign(&key, &params.canonical_query());
        params.insert("api_sig", signature);

        let mut url = Url::parse(AUTH_ENDPOINT)?;
        url.set_query(Some(&params.canonical_query()));
        Ok(url)
    }

    /// Exchanges an authorized frob for a user token and installs it, so
    /// subsequent calls are signed as that user.
    pub async fn get_token(&self, frob: &str) -> Result<AuthToken, FlickrError> {
        let resp = self
            .execute(
                "flickr.auth.getToken",
                &[("frob", frob)],
                CallOptions::default().bypass_cache().raising(),
            )
            .await?;
        let auth = auth_token_from(&resp)?;

        // Installing the grant drops any identity memoized for the old
        // token; the payload refills it only when it names a user.
        self.set_token(auth.token.as_str(), None);
        self.remember_user(&auth);
        Ok(auth)
    }

    /// Validates the installed token against the service and refreshes the
    /// memoized identity. Calling without an installed token is a
    /// [`FlickrError::Config`].
    pub async fn check_token(&self) -> Result<AuthToken, FlickrError> {
        if !self.has_token() {
            return Err(FlickrError::Config("no user token is installed".into()));
        }
        let resp = self
            .execute(
                "flickr.auth.checkToken",
                &[],
                CallOptions::default().bypass_cache().raising(),
            )
            .await?;
        let auth = auth_token_from(&resp)?;
        self.remember_user(&auth);
        Ok(auth)
    }

    /// Identity of the authorized user, if any.
    ///
    /// Returns the memoized identity when one is known. Otherwise a token
    /// check is attempted once; any failure is reported as `None` rather than
    /// an error, so an invalid token simply reads as signed out.
    pub async fn user_id(&self) -> Option<String> {
        let memoized = self
            .inner
            .auth_user
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        if memoized.is_some() {
            return memoized;
        }
        if !self.has_token() {
            return None;
        }
        match self.check_token().await {
            Ok(auth) => Some(auth.user.nsid),
            Err(err) => {
                log::debug!("token check failed: {err}");
                None
            }
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.user_id().await.is_some()
    }

    /// Drops the stored response for one call, if present.
    pub fn invalidate(&self, method: &str, params: &ApiParams<'_>) -> bool {
        let (creds, config) = self.snapshot();
        let call = call_params(&creds, config.format, method, params);
        let mut cache = self.inner.cache.lock().unwrap_or_else(|e| e.into_inner());
        let key = cache.derive_key(method, &call);
        cache.invalidate(&key).is_some()
    }

    pub fn clear_cache(&self) {
        self.inner
            .cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn cache_len(&self) -> usize {
        self.inner
            .cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Persists the response cache to the configured cache file now. The
    /// same write also happens automatically when the last clone is dropped.
    pub fn save(&self) -> Result<(), FlickrError> {
        match &self.inner.cache_file {
            Some(path) => self
                .inner
                .cache
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .save_to(path),
            None => Err(FlickrError::Config("no cache file is configured".into())),
        }
    }

    fn snapshot(&self) -> (Credentials, RequestConfig) {
        let creds = self
            .inner
            .creds
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        let config = self
            .inner
            .config
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        (creds, config)
    }

    fn remember_user(&self, auth: &AuthToken) {
        if !auth.user.nsid.is_empty() {
            log::debug!("authorized as {}", auth.user.nsid);
            *self.inner.auth_user.lock().unwrap_or_else(|e| e.into_inner()) =
                Some(auth.user.nsid.clone());
        }
    }
}

/// Builder for a [`Client`] with a persisted cache or custom configuration.
#[derive(Debug)]
pub struct ClientBuilder {
    creds: Credentials,
    config: RequestConfig,
    cache_file: Option<PathBuf>,
    key_filter: Option<Vec<String>>,
    http: Option<reqwest::Client>,
}

impl ClientBuilder {
    pub fn new(creds: Credentials) -> Self {
        Self {
            creds,
            config: RequestConfig::default(),
            cache_file: None,
            key_filter: None,
            http: None,
        }
    }

    /// Seeds the builder from loaded [`Settings`].
    pub fn from_settings(settings: &Settings) -> Self {
        let mut builder = Self::new(settings.credentials());
        if let Some(format) = settings.format {
            builder.config.format = format;
        }
        if let Some(method) = settings.http_method {
            builder.config.http_method = method;
        }
        if let Some(endpoint) = &settings.endpoint {
            builder.config.endpoint = endpoint.clone();
        }
        builder.cache_file = settings.cache_file.clone();
        builder
    }

    pub fn format(mut self, format: ResponseFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn http_method(mut self, method: HttpMethod) -> Self {
        self.config.http_method = method;
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn callback_url(mut self, url: impl Into<String>) -> Self {
        self.config.callback_url = Some(url.into());
        self
    }

    pub fn cache_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.config.cache_ttl = Some(ttl);
        self
    }

    /// File the response cache is loaded from at build time and persisted to
    /// on [`Client::save`] and drop.
    pub fn cache_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_file = Some(path.into());
        self
    }

    /// Overrides the parameter names excluded from cache identity.
    pub fn cache_key_filter<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_filter = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Uses a preconfigured HTTP client instead of the default.
    pub fn http_client(mut self, http: reqwest::Client) -> Self {
        self.http = Some(http);
        self
    }

    /// Builds the client, loading the persisted cache when the cache file
    /// exists. A missing file starts empty; an unreadable one is an error.
    pub fn build(self) -> Result<Client, FlickrError> {
        let mut cache = ResponseCache::new();
        if let Some(filter) = self.key_filter {
            cache.set_key_filter(filter);
        }
        if let Some(path) = &self.cache_file {
            match cache.load_from(path) {
                Ok(()) => {
                    log::info!(
                        "loaded {} cached responses from {}",
                        cache.len(),
                        path.display()
                    );
                }
                Err(FlickrError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }

        Ok(Client {
            inner: Arc::new(ClientInner {
                http: self.http.unwrap_or_default(),
                creds: RwLock::new(self.creds),
                config: RwLock::new(self.config),
                cache: Mutex::new(cache),
                cache_file: self.cache_file,
                auth_user: Mutex::new(None),
            }),
        })
    }
}

/// Full parameter set for one call, before signing.
fn call_params(
    creds: &Credentials,
    format: ResponseFormat,
    method: &str,
    params: &ApiParams<'_>,
) -> ParameterSet {
    let mut call: ParameterSet = params.iter().copied().collect();
    call.insert("method", method);
    call.insert("api_key", creds.api_key());
    for (name, value) in format.request_params() {
        call.insert(*name, *value);
    }
    if let Some(token) = creds.token() {
        call.insert("auth_token", token);
    }
    call
}

/// Adds the signing parameters and the signature itself.
fn sign_call(creds: &Credentials, mut call: ParameterSet) -> ParameterSet {
    call.insert("oauth_consumer_key", creds.api_key());
    call.insert("oauth_nonce", sign::nonce());
    call.insert("oauth_timestamp", sign::timestamp());
    call.insert("oauth_signature_method", sign::SIGNATURE_METHOD);
    call.insert("oauth_version", sign::PROTOCOL_VERSION);
    if let Some(token) = creds.token() {
        call.insert("oauth_token", token);
    }
    let key = sign::signing_key(creds.api_secret(), creds.token_secret());
    let signature = sign::sign(&key, &call.canonical_query());
    call.insert("oauth_signature", signature);
    call
}

fn finish(resp: ApiResponse, options: CallOptions) -> Result<ApiResponse, FlickrError> {
    if options.raise_on_failure {
        resp.into_result()
    } else {
        Ok(resp)
    }
}

fn auth_token_from(resp: &ApiResponse) -> Result<AuthToken, FlickrError> {
    let token = resp
        .field_text(&["auth", "token"])
        .ok_or_else(|| FlickrError::Parse {
            raw: resp.to_string(),
            detail: "auth payload has no token".into(),
        })?;
    let perms = resp
        .field_text(&["auth", "perms"])
        .and_then(|p| Perms::from_str(&p).ok());
    let user = AuthUser {
        nsid: resp.field_text(&["auth", "user", "nsid"]).unwrap_or_default(),
        username: resp
            .field_text(&["auth", "user", "username"])
            .unwrap_or_default(),
        fullname: resp.field_text(&["auth", "user", "fullname"]),
    };
    Ok(AuthToken { token, perms, user })
}
