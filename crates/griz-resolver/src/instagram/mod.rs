//! Photo listing for public Instagram posts, read from the post's embed page.

mod model;

use crate::fetch::build_client;
use async_trait::async_trait;
use griz_core::{PhotoSourcer, SourceError};
use model::EmbedResponse;
use reqwest::{header, Client, StatusCode};
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, trace, warn};
use url::Url;

const INSTAGRAM_BASE_URL: &str = "https://www.instagram.com";
const POST_HOST: &str = "www.instagram.com";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
const MEDIA_SCRIPT_PREFIX: &str = "window.__additionalDataLoaded('extra',";
const MEDIA_SCRIPT_SUFFIX: &str = ");";
const MEDIA_IMAGE_SELECTOR: &str = "img.EmbeddedMediaImage";

/// [`PhotoSourcer`] for links of the form `https://www.instagram.com/p/<key>/...`.
///
/// The embed page of the post is fetched and the media JSON it ships in a
/// `<script>` block is used to list every photo. When the JSON is missing
/// the `<img class="EmbeddedMediaImage">` of the page is used instead.
#[derive(Debug, Clone)]
pub struct InstagramPhotoSource {
    client: Client,
    base_url: String,
}

impl InstagramPhotoSource {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, INSTAGRAM_BASE_URL)
    }

    /// Uses a fresh client with the given request deadline, e.g.
    /// [`crate::DEFAULT_HTTP_TIMEOUT`].
    pub fn with_timeout(timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self::new(build_client(timeout)?))
    }

    /// Fetches embed pages from `base_url` instead of instagram.com.
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn embed_url(&self, key: &str) -> String {
        format!("{}/p/{}/embed/", self.base_url, key)
    }
}

/// Extracts the post key from a post link.
pub fn post_key(link: &str) -> Result<String, SourceError> {
    let invalid =
        || SourceError::InvalidReference(format!("'{link}' is not an instagram post link"));

    let url = Url::parse(link).map_err(|_| invalid())?;
    if url.scheme() != "https" || url.host_str() != Some(POST_HOST) || url.port().is_some() {
        return Err(invalid());
    }

    let mut segments = url.path_segments().ok_or_else(invalid)?;
    let (Some("p"), Some(key), Some(_)) = (segments.next(), segments.next(), segments.next())
    else {
        return Err(invalid());
    };
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(invalid());
    }
    Ok(key.to_string())
}

fn selector(css: &str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|e| SourceError::Parse(format!("invalid selector '{css}': {e}")))
}

fn parse_media_script(script: &str) -> Option<Result<EmbedResponse, serde_json::Error>> {
    let json = script.trim().strip_prefix(MEDIA_SCRIPT_PREFIX)?;
    let json = json.strip_suffix(MEDIA_SCRIPT_SUFFIX).unwrap_or(json);
    Some(serde_json::from_str(json))
}

/// Lists photo URLs from an embed page.
fn photos_from_page(page: &str) -> Result<Vec<String>, SourceError> {
    let document = Html::parse_document(page);
    let mut embed = EmbedResponse::default();

    for script in document.select(&selector("script")?) {
        let text: String = script.text().collect();
        match parse_media_script(&text) {
            Some(Ok(parsed)) => {
                embed = parsed;
                break;
            }
            Some(Err(e)) => {
                warn!(error = %e, "Media script is not valid JSON");
            }
            None => {}
        }
    }

    if !embed.is_empty() {
        return Ok(embed.photo_urls());
    }

    trace!("No media JSON on embed page, falling back to media image");
    Ok(document
        .select(&selector(MEDIA_IMAGE_SELECTOR)?)
        .find_map(|img| img.value().attr("src"))
        .filter(|src| !src.is_empty())
        .map(str::to_string)
        .into_iter()
        .collect())
}

#[async_trait]
impl PhotoSourcer for InstagramPhotoSource {
    async fn get_photos(&self, reference: &str) -> Result<Vec<String>, SourceError> {
        let key = post_key(reference)?;
        let url = self.embed_url(&key);
        trace!(url = %url, "Fetching embed page");

        let response = self
            .client
            .get(&url)
            .header(header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .map_err(|e| SourceError::Request(format!("GET {url}: {e}")))?;

        if response.status() != StatusCode::OK {
            return Err(SourceError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        let page = response
            .text()
            .await
            .map_err(|e| SourceError::Request(format!("reading body of {url}: {e}")))?;

        let photos = photos_from_page(&page)?;
        debug!(key = %key, photos = photos.len(), "Listed post photos");
        Ok(photos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CAROUSEL_PAGE: &str = r#"<html><head>
<script type="text/javascript">window._sharedData = {};</script>
<script type="text/javascript">window.__additionalDataLoaded('extra',{"shortcode_media":{"id":"1","is_video":false,"display_url":"https://cdn/cover.jpg","edge_sidecar_to_children":{"edges":[{"node":{"is_video":false,"display_url":"https://cdn/a-1080.jpg","display_resources":[{"config_width":1080,"config_height":1080,"src":"https://cdn/a-1080.jpg"},{"config_width":320,"config_height":320,"src":"https://cdn/a-320.jpg"}]}},{"node":{"is_video":true,"display_url":"https://cdn/b.jpg"}}]}}});</script>
</head><body></body></html>"#;

    const IMAGE_ONLY_PAGE: &str = r#"<html><body>
<img class="Avatar" src="https://cdn/avatar.jpg" />
<img class="EmbeddedMediaImage" alt="post" src="https://cdn/photo.jpg?a=1&amp;b=2" />
</body></html>"#;

    #[test]
    fn accepts_post_links() {
        assert_eq!(
            post_key("https://www.instagram.com/p/CVabc123/").unwrap(),
            "CVabc123"
        );
        assert_eq!(
            post_key("https://www.instagram.com/p/CVabc123/?utm_source=ig_web_copy_link").unwrap(),
            "CVabc123"
        );
    }

    #[test]
    fn rejects_other_links() {
        for link in [
            "https://www.instagram.com/p/CVabc123",
            "https://www.instagram.com/reel/CVabc123/",
            "https://instagram.com/p/CVabc123/",
            "http://www.instagram.com/p/CVabc123/",
            "https://www.instagram.com/p/CV-abc/",
            "https://www.instagram.com/p//",
            "not a link",
        ] {
            let err = post_key(link).unwrap_err();
            assert!(matches!(err, SourceError::InvalidReference(_)), "{link}");
        }
    }

    #[test]
    fn reads_media_script() {
        let photos = photos_from_page(CAROUSEL_PAGE).unwrap();
        assert_eq!(photos, ["https://cdn/a-320.jpg"]);
    }

    #[test]
    fn falls_back_to_media_image() {
        let photos = photos_from_page(IMAGE_ONLY_PAGE).unwrap();
        assert_eq!(photos, ["https://cdn/photo.jpg?a=1&b=2"]);
    }

    #[test]
    fn media_image_matches_class_token() {
        let page = r#"<html><body>
<img class="EmbeddedMediaImageFoo" src="https://cdn/wrong.jpg">
<img data-x="1" class='Embed EmbeddedMediaImage' src='https://cdn/right.jpg?a=1&#38;b=2'>
</body></html>"#;
        let photos = photos_from_page(page).unwrap();
        assert_eq!(photos, ["https://cdn/right.jpg?a=1&b=2"]);
    }

    #[test]
    fn media_script_with_invalid_json_falls_back() {
        let page = r#"<html><head>
<script>window.__additionalDataLoaded('extra',{not json});</script>
</head><body><img class="EmbeddedMediaImage" src="https://cdn/photo.jpg"></body></html>"#;
        let photos = photos_from_page(page).unwrap();
        assert_eq!(photos, ["https://cdn/photo.jpg"]);
    }

    #[test]
    fn page_without_media_has_no_photos() {
        let photos = photos_from_page("<html><body>nothing</body></html>").unwrap();
        assert!(photos.is_empty());
    }

    #[tokio::test]
    async fn fetches_embed_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/p/CVabc123/embed/"))
            .and(header_exists("user-agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CAROUSEL_PAGE))
            .expect(1)
            .mount(&server)
            .await;

        let source = InstagramPhotoSource::with_base_url(Client::new(), server.uri());
        let photos = source
            .get_photos("https://www.instagram.com/p/CVabc123/")
            .await
            .unwrap();
        assert_eq!(photos, ["https://cdn/a-320.jpg"]);
    }

    #[tokio::test]
    async fn upstream_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let source = InstagramPhotoSource::with_base_url(Client::new(), server.uri());
        let err = source
            .get_photos("https://www.instagram.com/p/CVabc123/")
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Status { status: 429, .. }));
    }

    #[tokio::test]
    async fn invalid_reference_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let source = InstagramPhotoSource::with_base_url(Client::new(), server.uri());
        let err = source
            .get_photos("https://example.com/p/CVabc123/")
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::InvalidReference(_)));
    }
}
