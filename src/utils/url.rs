//! URL utilities for the conversation service endpoints
//!
//! The service is addressed by a single base URL. HTTP endpoints are appended
//! to it directly and the socket endpoint is derived by swapping the scheme.

/// Normalize a base URL by removing trailing slashes
///
/// # Examples
///
/// ```
/// use weai::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:8000"), "http://localhost:8000");
/// assert_eq!(normalize_base_url("http://localhost:8000///"), "http://localhost:8000");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Join an endpoint path onto a base URL without doubling slashes
///
/// # Examples
///
/// ```
/// use weai::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:8000/", "/conversations"),
///     "http://localhost:8000/conversations"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{}/{}", normalized_base, endpoint)
}

/// Build the socket URL for an endpoint, mapping `http` to `ws` and `https` to `wss`.
///
/// Bases that already carry a `ws`/`wss` scheme are kept as-is; a base with no
/// scheme is treated as plain `ws`.
pub fn construct_socket_url(base_url: &str, endpoint: &str) -> String {
    let joined = construct_api_url(base_url, endpoint);
    if let Some(rest) = joined.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = joined.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if joined.starts_with("ws://") || joined.starts_with("wss://") {
        joined
    } else {
        format!("ws://{joined}")
    }
}
