use url::Url;

use crate::error::ConfigError;

const SUPPORTED_SCHEMES: [&str; 3] = ["http", "https", "socks5"];

/// Accepts `http`, `https` and `socks5` URLs with a non-empty host.
pub fn validate_proxy_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::invalid_proxy(raw, e))?;

    if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
        return Err(ConfigError::invalid_proxy(
            raw,
            format!("unsupported proxy scheme: {}", url.scheme()),
        ));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(ConfigError::invalid_proxy(
            raw,
            "missing hostname or IP address",
        ));
    }
    Ok(url)
}
