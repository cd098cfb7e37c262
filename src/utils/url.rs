//! Endpoint URL helpers for the generation API.

/// Strip trailing slashes so joined paths never contain `//`.
///
/// ```
/// use nexus::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("https://api.example.com/v1beta/"), "https://api.example.com/v1beta");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// URL of the server-sent-events streaming route for `model`.
///
/// ```
/// use nexus::utils::url::stream_content_url;
///
/// assert_eq!(
///     stream_content_url("https://api.example.com/v1beta", "gemini-3-flash-preview"),
///     "https://api.example.com/v1beta/models/gemini-3-flash-preview:streamGenerateContent?alt=sse"
/// );
/// ```
pub fn stream_content_url(base_url: &str, model: &str) -> String {
    let model = model.trim().trim_start_matches("models/");
    format!(
        "{}/models/{}:streamGenerateContent?alt=sse",
        normalize_base_url(base_url),
        model
    )
}
