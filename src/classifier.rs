//! Media classification — categorizes a post's outbound link into a download strategy
//!
//! Pure, total over all posts: every post maps to exactly one [`MediaStrategy`],
//! falling back to an explicit skip. The checks form a priority chain evaluated
//! top to bottom; categories overlap (a cross-post can also be a direct link), so
//! the first match wins and later predicates are never evaluated.

use crate::config::DownloadConfig;
use crate::db::Post;

/// Skip reason for video posts when video downloads are disabled
pub const REASON_VIDEO_DISABLED: &str = "Video downloads disabled";
/// Skip reason for self posts with no embedded URL
pub const REASON_TEXT_POST_NO_URL: &str = "Is a text-post with no url in post";
/// Skip reason for cross-posts whose target has no directly downloadable URL
pub const REASON_CROSS_POST_NO_URL: &str = "Is a cross-post with no direct download url";
/// Fallback skip reason when no category matched
pub const REASON_NO_MATCH: &str = "No media match for download.";

/// URL path extensions treated as directly downloadable media
const MEDIA_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "gifv", "webp", "bmp", "mp4", "webm", "mov", "mkv", "avi", "mp3",
    "ogg", "wav", "flac",
];

/// Host domains that count as the source platform; anything else is off-site
const HOST_DOMAINS: &[&str] = &["reddit.com", "redd.it"];

/// Video host whose downloads are gated by `video_downloads_enabled`
const VIDEO_HOST: &str = "v.redd.it";

/// Classified handling approach for one post's media
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaStrategy {
    /// Stream the post's URL straight to a file in the post's media folder
    DirectDownload,
    /// Off-site link: reserved for generic page capture (no executor yet)
    PageCapture,
    /// No download; record the given human-readable reason
    Skip {
        /// Why the post is skipped
        reason: &'static str,
    },
}

/// Classify a post's outbound link into a [`MediaStrategy`]
///
/// No I/O and no side effects; calling twice on the same post yields the same
/// strategy. Chain order:
/// 1. Direct media link (URL extension) — also wins for cross-posts that are
///    direct links
/// 2. Video host, gated by `video_downloads_enabled`
/// 3. Text post with no embedded URL
/// 4. Off-site URL (reserved page capture)
/// 5. Cross-post with no direct download URL
/// 6. Fallback skip
pub fn classify(post: &Post, config: &DownloadConfig) -> MediaStrategy {
    if let Some(url) = post.url.as_deref() {
        if has_media_extension(url) {
            return MediaStrategy::DirectDownload;
        }

        if is_video_url(url) {
            return if config.video_downloads_enabled {
                MediaStrategy::DirectDownload
            } else {
                MediaStrategy::Skip {
                    reason: REASON_VIDEO_DISABLED,
                }
            };
        }
    }

    if post.is_self && post.url.is_none() {
        return MediaStrategy::Skip {
            reason: REASON_TEXT_POST_NO_URL,
        };
    }

    if let Some(url) = post.url.as_deref()
        && is_offsite_url(url)
    {
        return MediaStrategy::PageCapture;
    }

    if post.crosspost_parent_url.is_some() {
        return MediaStrategy::Skip {
            reason: REASON_CROSS_POST_NO_URL,
        };
    }

    MediaStrategy::Skip {
        reason: REASON_NO_MATCH,
    }
}

/// Whether the URL path ends in a known media extension
fn has_media_extension(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    let path = parsed.path().to_ascii_lowercase();
    MEDIA_EXTENSIONS
        .iter()
        .any(|ext| path.ends_with(&format!(".{}", ext)))
}

/// Whether the URL points at the gated video host
fn is_video_url(url: &str) -> bool {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h == VIDEO_HOST))
        .unwrap_or(false)
}

/// Whether the URL leaves the source platform entirely
fn is_offsite_url(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        // Relative permalinks stay on the platform
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    !HOST_DOMAINS
        .iter()
        .any(|domain| host == *domain || host.ends_with(&format!(".{}", domain)))
}
