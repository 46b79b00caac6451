/*
 * Copyright (c) 2025 the flickr crate contributors.
 * Licensed under either of
 *  - Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> OR
 *  - MIT license <http://opensource.org/licenses/MIT>
 *  at your option.
 */

use crate::client::Client;
use crate::config::CallOptions;
use crate::errors::FlickrError;
use crate::params::ApiParams;
use crate::parsers;
use crate::photos::PhotoPage;
use serde::Deserialize;

/// One photoset (album) belonging to a user.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Photoset {
    pub id: String,
    #[serde(default)]
    pub primary: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default, deserialize_with = "parsers::u64_from_string_or_int")]
    pub photos: u64,
    #[serde(default, deserialize_with = "parsers::content_string")]
    pub title: String,
    #[serde(default, deserialize_with = "parsers::content_string")]
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct PhotosetList {
    #[serde(default, rename = "photoset")]
    photosets: Vec<Photoset>,
}

impl Photoset {
    /// Lists the photosets of a user, or of the authorized user when no id
    /// is given.
    pub async fn list_for_user(
        client: &Client,
        user_id: Option<&str>,
    ) -> Result<Vec<Photoset>, FlickrError> {
        let params: Vec<(&str, &str)> = match user_id {
            Some(id) => vec![("user_id", id)],
            None => Vec::new(),
        };
        let resp = client
            .execute(
                "flickr.photosets.getList",
                &params,
                CallOptions::default().raising(),
            )
            .await?;
        let list: PhotosetList = resp.parse_payload("photosets")?;
        Ok(list.photosets)
    }

    /// Fetches one page of the photos in a photoset.
    pub async fn photos(
        client: &Client,
        photoset_id: &str,
        params: &ApiParams<'_>,
    ) -> Result<PhotoPage, FlickrError> {
        let mut call: Vec<(&str, &str)> = params.iter().copied().collect();
        call.push(("photoset_id", photoset_id));
        let resp = client
            .execute(
                "flickr.photosets.getPhotos",
                &call,
                CallOptions::default().raising(),
            )
            .await?;
        resp.parse_payload("photoset")
    }
}
