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
use async_stream::try_stream;
use futures::Stream;
use serde::Deserialize;

/// One photo as listed by the search and listing methods.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Photo {
    pub id: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub server: String,
    #[serde(default, deserialize_with = "parsers::u64_from_string_or_int")]
    pub farm: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "ispublic", deserialize_with = "parsers::bool_from_int")]
    pub is_public: bool,
    #[serde(default, rename = "isfriend", deserialize_with = "parsers::bool_from_int")]
    pub is_friend: bool,
    #[serde(default, rename = "isfamily", deserialize_with = "parsers::bool_from_int")]
    pub is_family: bool,
}

impl Photo {
    /// Direct URL of the medium-sized image file.
    pub fn source_url(&self) -> String {
        format!(
            "https://farm{}.staticflickr.com/{}/{}_{}.jpg",
            self.farm, self.server, self.id, self.secret
        )
    }

    /// Searches photos with the given filter parameters.
    ///
    /// Requires a JSON-based response format on the client; see
    /// [`ApiResponse::parse_payload`](crate::ApiResponse::parse_payload).
    pub async fn search(
        client: &Client,
        params: &ApiParams<'_>,
    ) -> Result<PhotoPage, FlickrError> {
        let resp = client
            .execute(
                "flickr.photos.search",
                params,
                CallOptions::default().raising(),
            )
            .await?;
        resp.parse_payload("photos")
    }

    /// Lists recently uploaded public photos.
    pub async fn recent(
        client: &Client,
        params: &ApiParams<'_>,
    ) -> Result<PhotoPage, FlickrError> {
        let resp = client
            .execute(
                "flickr.photos.getRecent",
                params,
                CallOptions::default().raising(),
            )
            .await?;
        resp.parse_payload("photos")
    }

    /// Streams search results across pages, fetching each page on demand.
    ///
    /// The caller's parameters select the filters and page size; the `page`
    /// parameter is managed by the stream itself, counting up until the
    /// reported page count is reached.
    pub fn search_stream<'a>(
        client: &'a Client,
        params: &'a ApiParams<'a>,
    ) -> impl Stream<Item = Result<Photo, FlickrError>> + 'a {
        try_stream! {
            let mut page: u64 = 1;
            loop {
                let page_param = page.to_string();
                let mut call: Vec<(&str, &str)> = params.iter().copied().collect();
                call.push(("page", page_param.as_str()));

                let result = Photo::search(client, &call).await?;
                for photo in result.photos {
                    yield photo;
                }
                // The local counter drives termination; an echoed page
                // number is absent from some payloads.
                if result.pages == 0 || page >= result.pages {
                    break;
                }
                page += 1;
            }
        }
    }
}

/// One page of photo results.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PhotoPage {
    #[serde(default, deserialize_with = "parsers::u64_from_string_or_int")]
    pub page: u64,
    #[serde(default, deserialize_with = "parsers::u64_from_string_or_int")]
    pub pages: u64,
    #[serde(default, rename = "perpage", deserialize_with = "parsers::u64_from_string_or_int")]
    pub per_page: u64,
    #[serde(default, deserialize_with = "parsers::u64_from_string_or_int")]
    pub total: u64,
    #[serde(default, rename = "photo")]
    pub photos: Vec<Photo>,
}
