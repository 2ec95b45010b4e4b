// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::error::FeedError;
use crate::http::HttpClient;

use super::model::Entry;
use super::parse::parse_entries;

/// Fetch a feed's current entry list from its URL.
///
/// Transport failures and non-2xx statuses are errors; unparseable feed
/// content is not, and comes back as an empty entry list.
pub async fn fetch_entries<C: HttpClient>(client: &C, url: &str) -> Result<Vec<Entry>, FeedError> {
    let response = client
        .get_bytes(url)
        .await
        .map_err(|e| FeedError::FetchFailed {
            url: url.to_string(),
            source: e,
        })?;

    if response.status >= 400 {
        return Err(FeedError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    Ok(parse_entries(&response.body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{BufferedResponse, HttpResponse};
    use async_trait::async_trait;
    use bytes::Bytes;

    struct MockHttpClient {
        body: &'static str,
        status: u16,
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get_bytes(&self, _url: &str) -> Result<BufferedResponse, reqwest::Error> {
            Ok(BufferedResponse {
                status: self.status,
                body: Bytes::from_static(self.body.as_bytes()),
            })
        }

        async fn get_stream(&self, _url: &str) -> Result<HttpResponse, reqwest::Error> {
            unimplemented!("feed fetches never stream")
        }
    }

    const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Show</title>
    <description>Test</description>
    <item>
      <title>Episode 1</title>
      <enclosure url="https://example.com/ep1.mp3" type="audio/mpeg"/>
    </item>
  </channel>
</rss>"#;

    #[tokio::test]
    async fn fetch_parses_entries_on_success() {
        let client = MockHttpClient {
            body: FEED,
            status: 200,
        };

        let entries = fetch_entries(&client, "https://example.com/feed.xml")
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Episode 1");
    }

    #[tokio::test]
    async fn fetch_fails_on_http_error() {
        let client = MockHttpClient {
            body: "gone",
            status: 503,
        };

        let result = fetch_entries(&client, "https://example.com/feed.xml").await;

        match result.unwrap_err() {
            FeedError::HttpStatus { status, .. } => assert_eq!(status, 503),
            other => panic!("Expected HttpStatus error, got {other:?}"),
        }
    }
}
