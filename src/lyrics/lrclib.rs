use super::{
    downloader::{DownloadError, LyricDownloader},
    types::LyricPayload,
};
use crate::config::LrcLibConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;
use url::Url;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LrcLibTrack {
    #[serde(default)]
    instrumental: bool,
    plain_lyrics: Option<String>,
    synced_lyrics: Option<String>,
}

impl LrcLibTrack {
    /// Synced lyrics are preferred over plain text
    fn into_payload(self) -> Option<LyricPayload> {
        self.synced_lyrics
            .filter(|s| !s.trim().is_empty())
            .or(self.plain_lyrics.filter(|s| !s.trim().is_empty()))
            .map(LyricPayload::new)
    }
}

/// Downloader backed by the LRCLIB `/api/get` endpoint.
pub struct LrcLibDownloader {
    client: reqwest::Client,
    endpoint: Url,
}

impl LrcLibDownloader {
    pub fn new(config: &LrcLibConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.base_url)
            .and_then(|base| base.join("/api/get"))
            .with_context(|| format!("Invalid LRCLIB base URL: {}", config.base_url))?;

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, endpoint })
    }

    fn request_url(&self, song: &str, artist: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("track_name", song)
            .append_pair("artist_name", artist);
        url
    }
}

#[async_trait]
impl LyricDownloader for LrcLibDownloader {
    fn name(&self) -> &'static str {
        "lrclib"
    }

    async fn download(
        &self,
        song: &str,
        artist: &str,
    ) -> Result<Option<LyricPayload>, DownloadError> {
        let url = self.request_url(song, artist);
        debug!("Requesting lyric from {}", url);

        let response = self.client.get(url).send().await?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(DownloadError::NotFound),
            status => return Err(DownloadError::Status(status)),
        }

        let track: LrcLibTrack = response.json().await?;
        if track.instrumental {
            return Err(DownloadError::NotFound);
        }

        Ok(track.into_payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn downloader_for(server: &MockServer) -> LrcLibDownloader {
        LrcLibDownloader::new(&LrcLibConfig {
            base_url: server.uri(),
            user_agent: "lyricgrab-test".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_request_url_encodes_query() {
        let downloader = LrcLibDownloader::new(&LrcLibConfig::default()).unwrap();
        let url = downloader.request_url("Song & Dance", "AC/DC");
        assert_eq!(url.path(), "/api/get");
        assert_eq!(
            url.query(),
            Some("track_name=Song+%26+Dance&artist_name=AC%2FDC")
        );
    }

    #[tokio::test]
    async fn test_prefers_synced_lyrics() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/get"))
            .and(query_param("track_name", "SongA"))
            .and(query_param("artist_name", "ArtistA"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1,
                "instrumental": false,
                "plainLyrics": "hello",
                "syncedLyrics": "[00:01.00]hello"
            })))
            .mount(&server)
            .await;

        let payload = downloader_for(&server)
            .await
            .download("SongA", "ArtistA")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payload.as_bytes(), b"[00:01.00]hello");
    }

    #[tokio::test]
    async fn test_falls_back_to_plain_lyrics() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "instrumental": false,
                "plainLyrics": "hello",
                "syncedLyrics": null
            })))
            .mount(&server)
            .await;

        let payload = downloader_for(&server)
            .await
            .download("SongA", "ArtistA")
            .await
            .unwrap();
        assert_eq!(payload, Some(LyricPayload::new("hello")));
    }

    #[tokio::test]
    async fn test_missing_lyrics_is_absent_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "instrumental": false,
                "plainLyrics": null,
                "syncedLyrics": ""
            })))
            .mount(&server)
            .await;

        let result = downloader_for(&server)
            .await
            .download("SongA", "ArtistA")
            .await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_404_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/get"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "code": 404,
                "name": "TrackNotFound"
            })))
            .mount(&server)
            .await;

        let result = downloader_for(&server)
            .await
            .download("SongB", "ArtistB")
            .await;
        assert!(matches!(result, Err(DownloadError::NotFound)));
    }

    #[tokio::test]
    async fn test_instrumental_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/get"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "instrumental": true,
                "plainLyrics": null,
                "syncedLyrics": null
            })))
            .mount(&server)
            .await;

        let result = downloader_for(&server)
            .await
            .download("Interlude", "ArtistA")
            .await;
        assert!(matches!(result, Err(DownloadError::NotFound)));
    }

    #[tokio::test]
    async fn test_server_error_is_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/get"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = downloader_for(&server)
            .await
            .download("SongA", "ArtistA")
            .await;
        assert!(matches!(
            result,
            Err(DownloadError::Status(StatusCode::SERVICE_UNAVAILABLE))
        ));
    }

    #[tokio::test]
    async fn test_malformed_body_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/get"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let result = downloader_for(&server)
            .await
            .download("SongA", "ArtistA")
            .await;
        assert!(matches!(result, Err(DownloadError::Http(_))));
    }
}
