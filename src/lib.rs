/*
 * Copyright (c) 2025 the flickr crate contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

//! # Flickr
//!
//! This library was created for working with the Flickr REST interface.
//!
//! For further details on the methods themselves refer to the
//! [Flickr API Docs](https://www.flickr.com/services/api/)
//!
//! ## Features
//!
//! - Method calls over GET or POST with deterministic request signing
//! - Three response formats
//!     - `rest`, decoded into an XML element tree
//!     - `json`, the `jsonFlickrApi(...)` envelope kept as raw JSON text
//!     - `serialized`, unwrapped JSON deserialized into native values
//! - Response caching keyed by call identity
//!     - Optional time to live per client
//!     - Optional on-disk persistence between runs
//! - The frob based authorization exchange (auth URL, token fetch and check)
//! - Typed photo search and photoset listings with streaming pagination
//! - Lower level interface for calling any method via [`Client::execute`]
//!
//! *Every request is signed with your API secret. The secret never appears
//! in logs, in the persisted cache or in `Debug` output*
//!
//! *Methods without a typed wrapper can still be called through
//! [`Client::call`]; the decoded response exposes its fields generically*
//!
//! ## Installation
//!
//! ```toml
//! [dependencies]
//! flickr = "0.3.0"
//! ```
//!
//! ## Usage
//!
//! **You will need to acquire an API key/secret from the service prior to
//! using the API**
//!
//! ```rust
//! use flickr::{Client, Credentials, Photo, ResponseFormat};
//! use futures::{pin_mut, StreamExt};
//!
//! async fn list_sunsets(api_key: &str, api_secret: &str) -> anyhow::Result<()> {
//!     // The API key/secret is obtained from your account pages
//!     let client = Client::builder(Credentials::new(api_key, api_secret))
//!         .format(ResponseFormat::Serialized)
//!         .cache_file("flickr-cache.json")
//!         .build()?;
//!
//!     // Any method can be called directly
//!     let resp = client.call("flickr.test.echo", &[("name", "value")]).await?;
//!     println!("{resp}");
//!
//!     // Typed search, paginated behind a stream
//!     let filters = [("tags", "sunset"), ("per_page", "100")];
//!     let results = Photo::search_stream(&client, &filters);
//!     pin_mut!(results);
//!     while let Some(photo) = results.next().await {
//!         println!("{}", photo?.source_url());
//!     }
//!     Ok(())
//! }
//! ```
//!
mod cache;
mod client;
mod config;
mod errors;
mod params;
mod parsers;
pub mod photos;
pub mod photosets;
mod response;
mod settings;
pub mod sign;
mod xml;

pub use cache::*;
pub use client::*;
pub use config::*;
pub use errors::*;
pub use params::*;
pub use photos::*;
pub use photosets::*;
pub use response::*;
pub use settings::*;
pub use xml::XmlElement;
