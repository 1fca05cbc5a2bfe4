//! Utility functions

/// Derive the media file name for a download from the HTTP response
///
/// Tries the Content-Disposition header first (both plain and RFC 5987 encoded
/// forms), then falls back to the last URL path segment. The extension is kept —
/// the file's type is only knowable from the source resource.
///
/// # Arguments
///
/// * `response` - The reqwest Response object
/// * `url` - The original URL (used as fallback)
///
/// # Returns
///
/// Returns the derived file name, or "media" as last resort.
pub fn media_file_name(response: &reqwest::Response, url: &str) -> String {
    if let Some(content_disposition) = response.headers().get("content-disposition")
        && let Ok(value) = content_disposition.to_str()
    {
        // Format: attachment; filename="file.jpg" or filename*=UTF-8''file.jpg
        for part in value.split(';') {
            let part = part.trim();
            if let Some(raw) = part.strip_prefix("filename=") {
                let filename = sanitize_file_name(raw.trim_matches('"'));
                if !filename.is_empty() {
                    return filename;
                }
            } else if let Some(encoded) = part.strip_prefix("filename*=") {
                // RFC 5987: charset'lang'encoded-filename
                if let Some(idx) = encoded.rfind('\'')
                    && let Ok(decoded) = urlencoding::decode(&encoded[idx + 1..])
                {
                    let filename = sanitize_file_name(&decoded);
                    if !filename.is_empty() {
                        return filename;
                    }
                }
            }
        }
    }

    file_name_from_url(url).unwrap_or_else(|| "media".to_string())
}

/// Derive a file name from a URL's last path segment
///
/// Query strings and fragments are dropped by the URL parser; percent-encoding
/// is decoded. Returns None when the path has no usable segment.
pub fn file_name_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let last_segment = parsed.path_segments()?.next_back()?;
    if last_segment.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(last_segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| last_segment.to_string());
    let sanitized = sanitize_file_name(&decoded);
    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized)
    }
}

/// Strip path separators and traversal components from a file name
///
/// Keeps only the final component so a hostile header cannot escape the
/// post's media folder.
fn sanitize_file_name(name: &str) -> String {
    let name = name.rsplit(['/', '\\']).next().unwrap_or(name);
    if name == "." || name == ".." {
        return String::new();
    }
    name.to_string()
}
