use crate::error::{Result, TokenError};
use url::Url;

/// Deep link every QR code carries. The hash token follows as the `d` value.
pub const DEEP_LINK_PREFIX: &str = "https://griz.grizzlytics.com/app?d=";

const LINK_SCHEME: &str = "https";
const LINK_HOST: &str = "griz.grizzlytics.com";
const LINK_PATH: &str = "/app";
const HASH_PARAM: &str = "d";

/// Returns the deep link for `hash`.
pub fn build_link(hash: &str) -> String {
    format!("{DEEP_LINK_PREFIX}{hash}")
}

/// Pulls the hash token out of a decoded QR payload.
///
/// The payload must be a Griz deep link: scheme, host and path have to match
/// exactly and the `d` query parameter must be present and non-empty.
pub fn extract_hash(link: &str) -> Result<String> {
    let url = Url::parse(link)
        .map_err(|e| TokenError::Format(format!("payload is not a URL: {e}")))?;

    if url.scheme() != LINK_SCHEME
        || url.host_str() != Some(LINK_HOST)
        || url.port().is_some()
        || url.path() != LINK_PATH
    {
        return Err(TokenError::Format(format!(
            "'{link}' is not a griz deep link"
        )));
    }

    url.query_pairs()
        .find(|(name, _)| name == HASH_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| TokenError::Format(format!("'{link}' carries no hash")))
}
