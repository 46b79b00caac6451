/*
 * Copyright (c) 2025 the flickr crate contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

use crate::config::{Credentials, HttpMethod};
use crate::errors::FlickrError;
use crate::response::ResponseFormat;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Application settings loaded from a `key = value` file or the environment.
///
/// The file format is one assignment per line, `#` comments and blank lines
/// ignored, optional single or double quotes around the value. Unknown keys
/// are skipped with a warning so a shared settings file can carry entries for
/// other tools.
#[derive(Clone, PartialEq)]
pub struct Settings {
    pub api_key: String,
    pub api_secret: String,
    pub api_token: Option<String>,
    pub token_secret: Option<String>,
    pub cache_file: Option<PathBuf>,
    pub format: Option<ResponseFormat>,
    pub http_method: Option<HttpMethod>,
    pub endpoint: Option<String>,
}

impl Settings {
    /// Reads settings from a file.
    pub fn load(path: &Path) -> Result<Self, FlickrError> {
        Self::parse(&fs::read_to_string(path)?)
    }

    /// Reads settings from `FLICKR_API_KEY`, `FLICKR_API_SECRET` and the
    /// optional `FLICKR_API_TOKEN`, `FLICKR_TOKEN_SECRET` and
    /// `FLICKR_CACHE_FILE` variables.
    pub fn from_env() -> Result<Self, FlickrError> {
        let require = |name: &str| {
            std::env::var(name)
                .map_err(|_| FlickrError::Config(format!("{name} is not set")))
        };
        Ok(Self {
            api_key: require("FLICKR_API_KEY")?,
            api_secret: require("FLICKR_API_SECRET")?,
            api_token: std::env::var("FLICKR_API_TOKEN").ok(),
            token_secret: std::env::var("FLICKR_TOKEN_SECRET").ok(),
            cache_file: std::env::var("FLICKR_CACHE_FILE").ok().map(PathBuf::from),
            format: None,
            http_method: None,
            endpoint: None,
        })
    }

    /// Parses settings file content.
    pub fn parse(content: &str) -> Result<Self, FlickrError> {
        let mut api_key = None;
        let mut api_secret = None;
        let mut api_token = None;
        let mut token_secret = None;
        let mut cache_file = None;
        let mut format = None;
        let mut http_method = None;
        let mut endpoint = None;

        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| {
                FlickrError::Config(format!(
                    "settings line {}: expected key = value",
                    lineno + 1
                ))
            })?;
            let key = key.trim();
            let value = unquote(value);

            match key {
                "api_key" => api_key = Some(value.to_string()),
                "api_secret" => api_secret = Some(value.to_string()),
                "api_token" => api_token = Some(value.to_string()),
                "token_secret" => token_secret = Some(value.to_string()),
                "cache_file" => cache_file = Some(PathBuf::from(value)),
                "format" => {
                    format = Some(ResponseFormat::from_str(value).map_err(|_| {
                        FlickrError::Config(format!(
                            "settings line {}: unknown format {value:?}",
                            lineno + 1
                        ))
                    })?);
                }
                "http_method" => {
                    http_method = Some(HttpMethod::from_str(value).map_err(|_| {
                        FlickrError::Config(format!(
                            "settings line {}: unknown HTTP method {value:?}",
                            lineno + 1
                        ))
                    })?);
                }
                "endpoint" => endpoint = Some(value.to_string()),
                other => log::warn!("ignoring unknown settings key {other:?}"),
            }
        }

        Ok(Self {
            api_key: api_key
                .ok_or_else(|| FlickrError::Config("settings are missing api_key".into()))?,
            api_secret: api_secret
                .ok_or_else(|| FlickrError::Config("settings are missing api_secret".into()))?,
            api_token,
            token_secret,
            cache_file,
            format,
            http_method,
            endpoint,
        })
    }

    /// Credentials carried by these settings.
    pub fn credentials(&self) -> Credentials {
        match &self.api_token {
            Some(token) => Credentials::from_tokens(
                &self.api_key,
                &self.api_secret,
                token,
                self.token_secret.clone(),
            ),
            None => Credentials::new(&self.api_key, &self.api_secret),
        }
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key)
            .field("api_secret", &"xxx")
            .field("api_token", &self.api_token)
            .field("token_secret", &self.token_secret.as_ref().map(|_| "xxx"))
            .field("cache_file", &self.cache_file)
            .field("format", &self.format)
            .field("http_method", &self.http_method)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_settings_file() {
        let settings = Settings::parse(
            r#"
            # application credentials
            api_key = abc123
            api_secret = "s3cret"
            api_token = 'tok-456'
            token_secret = sig==
            cache_file = /tmp/flickr-cache.json
            format = json
            http_method = post
            endpoint = https://example.test/services/rest/
            "#,
        )
        .unwrap();

        assert_eq!(settings.api_key, "abc123");
        assert_eq!(settings.api_secret, "s3cret");
        assert_eq!(settings.api_token.as_deref(), Some("tok-456"));
        assert_eq!(settings.token_secret.as_deref(), Some("sig=="));
        assert_eq!(
            settings.cache_file.as_deref(),
            Some(Path::new("/tmp/flickr-cache.json"))
        );
        assert_eq!(settings.format, Some(ResponseFormat::Json));
        assert_eq!(settings.http_method, Some(HttpMethod::Post));
        assert_eq!(
            settings.endpoint.as_deref(),
            Some("https://example.test/services/rest/")
        );
    }

    #[test]
    fn minimal_file_needs_only_key_and_secret() {
        let settings = Settings::parse("api_key=k\napi_secret=s\n").unwrap();
        assert_eq!(settings.api_token, None);
        assert_eq!(settings.cache_file, None);

        let creds = settings.credentials();
        assert_eq!(creds.api_key(), "k");
        assert!(!creds.has_token());
    }

    #[test]
    fn credentials_carry_the_token_when_present() {
        let settings = Settings::parse("api_key=k\napi_secret=s\napi_token=t\n").unwrap();
        let creds = settings.credentials();
        assert_eq!(creds.token(), Some("t"));
    }

    #[test]
    fn missing_required_keys_are_config_errors() {
        assert!(matches!(
            Settings::parse("api_secret=s\n"),
            Err(FlickrError::Config(_))
        ));
        assert!(matches!(
            Settings::parse("api_key=k\n"),
            Err(FlickrError::Config(_))
        ));
    }

    #[test]
    fn malformed_lines_and_bad_formats_are_rejected() {
        assert!(matches!(
            Settings::parse("api_key=k\nthis is not an assignment\n"),
            Err(FlickrError::Config(_))
        ));
        assert!(matches!(
            Settings::parse("api_key=k\napi_secret=s\nformat=soap\n"),
            Err(FlickrError::Config(_))
        ));
        assert!(matches!(
            Settings::parse("api_key=k\napi_secret=s\nhttp_method=teleport\n"),
            Err(FlickrError::Config(_))
        ));
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let settings =
            Settings::parse("api_key=k\napi_secret=s\nsomething_else=ignored\n").unwrap();
        assert_eq!(settings.api_key, "k");
    }

    #[test]
    fn values_may_contain_equals_signs() {
        let settings = Settings::parse("api_key=k\napi_secret=a=b=c\n").unwrap();
        assert_eq!(settings.api_secret, "a=b=c");
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flickr.conf");
        fs::write(&path, "api_key=k\napi_secret=s\n").unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.api_key, "k");

        assert!(matches!(
            Settings::load(&dir.path().join("absent.conf")),
            Err(FlickrError::Io(_))
        ));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let settings = Settings::parse("api_key=k\napi_secret=hidden\ntoken_secret=also\n")
            .unwrap();
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("hidden"));
        assert!(!rendered.contains("also"));
    }
}
