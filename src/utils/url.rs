//! URL utilities for consistent endpoint construction.
//!
//! The daemon host is user-supplied and may carry trailing slashes; these
//! helpers keep the joined endpoint URLs free of doubled slashes.

/// Normalize a base URL by removing trailing slashes.
///
/// # Examples
///
/// ```
/// use ollaterm::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:11434"), "http://localhost:11434");
/// assert_eq!(normalize_base_url("http://localhost:11434/"), "http://localhost:11434");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Construct a complete endpoint URL from a base URL and an endpoint path.
///
/// # Examples
///
/// ```
/// use ollaterm::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:11434", "api/chat"),
///     "http://localhost:11434/api/chat"
/// );
/// assert_eq!(
///     construct_api_url("http://localhost:11434/", "/api/tags"),
///     "http://localhost:11434/api/tags"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{normalized_base}/{endpoint}")
}
