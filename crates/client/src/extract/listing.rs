//! Video cards and tag clouds on listing and search pages.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use super::{element_text, sorted_unique_texts};

/// One video card from a listing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRecord {
    /// Numeric id from the video path (`/video/<id>/<slug>/`).
    pub id: String,
    /// Absolute URL of the video page.
    pub link: String,
    /// Thumbnail image URL, or empty.
    pub thumbnail: String,
    pub title: String,
    /// `"HD"` when the card carries a quality badge, else empty.
    pub is_hd: String,
    /// Display duration, e.g. `"12:04"`.
    pub duration: String,
    /// Always empty on listings; tags come from resolving the video page.
    pub tags: Vec<String>,
}

/// Extract video cards, resolving relative links against `base_url`.
///
/// Cards without a video link are skipped.
pub fn extract_videos(html: &str, base_url: &Url) -> Vec<VideoRecord> {
    let document = Html::parse_document(html);
    let card = Selector::parse("div.item.thumb").expect("invalid selector");
    let link = Selector::parse(r#"a.js-open-popup[href*="/video/"]"#).expect("invalid selector");

    let mut videos = Vec::new();

    for item in document.select(&card) {
        let Some(link_tag) = item.select(&link).next() else {
            continue;
        };
        let Some(href) = link_tag.value().attr("href") else {
            continue;
        };

        let full_link = match base_url.join(href) {
            Ok(u) => u.to_string(),
            Err(_) => continue,
        };

        let thumbnail = thumbnail(item);
        let id = video_id(href);
        tracing::trace!("extracted thumbnail for {}: {}", id, thumbnail);

        videos.push(VideoRecord {
            id,
            link: full_link,
            thumbnail,
            title: link_tag.value().attr("title").unwrap_or_default().trim().to_string(),
            is_hd: if has_match(item, ".quality") { "HD".into() } else { String::new() },
            duration: first_text(item, ".time"),
            tags: Vec::new(),
        });
    }

    tracing::debug!("extracted {} videos", videos.len());
    videos
}

/// Sorted, unique tag names from the first tag cloud present on the page.
pub fn extract_popular_tags(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    for css in [".categories a", ".tags a", ".list a"] {
        let selector = Selector::parse(css).expect("invalid selector");
        if document.select(&selector).next().is_some() {
            return sorted_unique_texts(document.select(&selector));
        }
    }

    Vec::new()
}

/// Second-to-last non-empty path segment: `/video/3821357/title/` -> `3821357`.
fn video_id(href: &str) -> String {
    let segments: Vec<&str> = href.split('/').filter(|s| !s.is_empty()).collect();
    segments
        .len()
        .checked_sub(2)
        .and_then(|i| segments.get(i))
        .map(|s| s.to_string())
        .unwrap_or_default()
}

/// Lazy-load image source first, then plain sources, then any image in the card.
fn thumbnail(item: ElementRef<'_>) -> String {
    let lazy = Selector::parse("img.thumb.lazy-load").expect("invalid selector");
    let any = Selector::parse("img").expect("invalid selector");

    if let Some(img) = item.select(&lazy).next() {
        let value = img.value();
        let found = ["data-original", "src", "data-src"].iter().find_map(|a| value.attr(a).filter(|v| !v.is_empty()));
        if let Some(found) = found {
            return found.to_string();
        }
    }

    item.select(&any)
        .next()
        .and_then(|img| {
            let value = img.value();
            ["src", "data-src", "data-original"].iter().find_map(|a| value.attr(a).filter(|v| !v.is_empty()))
        })
        .unwrap_or_default()
        .to_string()
}

fn has_match(item: ElementRef<'_>, css: &str) -> bool {
    let selector = Selector::parse(css).expect("invalid selector");
    item.select(&selector).next().is_some()
}

fn first_text(item: ElementRef<'_>, css: &str) -> String {
    let selector = Selector::parse(css).expect("invalid selector");
    item.select(&selector).next().map(element_text).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = r#"
        <html>
            <body>
                <div class="item thumb">
                    <a class="js-open-popup" href="/video/3821357/sunset-bay/" title=" Sunset bay ">
                        <img class="thumb lazy-load" data-original="https://img.test/1.jpg" src="data:blank">
                    </a>
                    <div class="time">12:04</div>
                    <span class="quality">HD</span>
                </div>
                <div class="item thumb">
                    <a class="js-open-popup" href="https://origin.test/video/42/rain/">
                        <img class="thumb" src="https://img.test/2.jpg">
                    </a>
                </div>
                <div class="item thumb">
                    <a href="/albums/7/">an album</a>
                </div>
                <div class="categories">
                    <a href="/c/b">beach</a>
                    <a href="/c/a">animals</a>
                    <a href="/c/b">beach</a>
                </div>
                <div class="list"><a href="/x">ignored</a></div>
            </body>
        </html>
    "#;

    fn base() -> Url {
        Url::parse("https://origin.test").unwrap()
    }

    #[test]
    fn test_extract_videos() {
        let videos = extract_videos(LISTING, &base());
        assert_eq!(videos.len(), 2);

        let first = &videos[0];
        assert_eq!(first.id, "3821357");
        assert_eq!(first.link, "https://origin.test/video/3821357/sunset-bay/");
        assert_eq!(first.thumbnail, "https://img.test/1.jpg");
        assert_eq!(first.title, "Sunset bay");
        assert_eq!(first.is_hd, "HD");
        assert_eq!(first.duration, "12:04");
        assert!(first.tags.is_empty());

        let second = &videos[1];
        assert_eq!(second.id, "42");
        assert_eq!(second.thumbnail, "https://img.test/2.jpg");
        assert_eq!(second.title, "");
        assert_eq!(second.is_hd, "");
        assert_eq!(second.duration, "");
    }

    #[test]
    fn test_extract_videos_empty_document() {
        assert!(extract_videos("", &base()).is_empty());
    }

    #[test]
    fn test_popular_tags_first_cloud_wins() {
        assert_eq!(extract_popular_tags(LISTING), vec!["animals", "beach"]);
    }

    #[test]
    fn test_popular_tags_fallback() {
        let html = r#"<div class="list"><a>zeta</a><a> alpha </a><a></a></div>"#;
        assert_eq!(extract_popular_tags(html), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_video_id() {
        assert_eq!(video_id("/video/3821357/title/"), "3821357");
        assert_eq!(video_id("https://origin.test/video/9/x"), "9");
        assert_eq!(video_id("/video"), "");
    }

    #[test]
    fn test_video_record_json_fields() {
        let json = serde_json::to_value(VideoRecord::default()).unwrap();
        for field in ["id", "link", "thumbnail", "title", "is_hd", "duration", "tags"] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
    }
}
