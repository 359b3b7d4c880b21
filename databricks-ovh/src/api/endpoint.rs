//! OVH endpoint resolution and request signing

use super::error::ApiError;
use sha1::{Digest, Sha1};
use url::Url;

const ENDPOINTS: &[(&str, &str)] = &[
    ("ovh-eu", "https://eu.api.ovh.com/1.0"),
    ("ovh-ca", "https://ca.api.ovh.com/1.0"),
    ("ovh-us", "https://api.us.ovhcloud.com/1.0"),
    ("kimsufi-eu", "https://eu.api.kimsufi.com/1.0"),
    ("kimsufi-ca", "https://ca.api.kimsufi.com/1.0"),
    ("soyoustart-eu", "https://eu.api.soyoustart.com/1.0"),
    ("soyoustart-ca", "https://ca.api.soyoustart.com/1.0"),
];

/// Maps an endpoint alias such as `ovh-eu` to its base URL. Full
/// `http(s)://` URLs are accepted as-is, minus any trailing slash.
pub fn resolve_endpoint(endpoint: &str) -> Result<String, ApiError> {
    if let Some((_, url)) = ENDPOINTS.iter().find(|(alias, _)| *alias == endpoint) {
        return Ok(url.to_string());
    }

    let parsed =
        Url::parse(endpoint).map_err(|_| ApiError::InvalidEndpoint(endpoint.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(endpoint.trim_end_matches('/').to_string()),
        _ => Err(ApiError::InvalidEndpoint(endpoint.to_string())),
    }
}

/// `$1$` followed by the hex SHA-1 of
/// `secret+consumer+METHOD+url+body+timestamp`
pub fn sign(
    application_secret: &str,
    consumer_key: &str,
    method: &str,
    url: &str,
    body: &str,
    timestamp: i64,
) -> String {
    let payload = format!(
        "{}+{}+{}+{}+{}+{}",
        application_secret, consumer_key, method, url, body, timestamp
    );
    format!("$1${}", hex::encode(Sha1::digest(payload.as_bytes())))
}
