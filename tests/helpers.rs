/*
 * Copyright (c) 2025 the flickr crate contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */
use flickr::{Client, Credentials, ResponseFormat, Settings};

#[allow(dead_code)]
pub(crate) fn test_creds() -> Credentials {
    Credentials::from_tokens("test-key", "test-secret", "test-token", None)
}

/// Client wired to a mock server, in the given response format.
#[allow(dead_code)]
pub(crate) fn mock_client(server: &mockito::ServerGuard, format: ResponseFormat) -> Client {
    Client::builder(test_creds())
        .format(format)
        .endpoint(format!("{}/services/rest/", server.url()))
        .build()
        .unwrap()
}

#[allow(dead_code)]
pub(crate) fn env_creds() -> anyhow::Result<Credentials> {
    Ok(Settings::from_env()?.credentials())
}
