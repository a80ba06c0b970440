//! Markup extraction for origin pages.
//!
//! ### Video pages
//! - Stream URLs keyed by a quality label (see [`streams`]).
//! - Tags: sorted, de-duplicated texts of `.tag_item` elements.
//! - Title: first of `.title_video`, `h1.title`, `h1`.
//!
//! ### Listing pages
//! - Video cards and the popular-tag cloud (see [`listing`]).
//!
//! Extraction never fails: missing markup yields empty fields, so an empty
//! document resolves to [`Resolution::default`].

pub mod listing;
pub mod streams;

pub use listing::{VideoRecord, extract_popular_tags, extract_videos};
pub use streams::extract_streams;

use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Everything resolved from one video page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Quality label to direct media URL, in page order.
    pub streams: IndexMap<String, String>,
    /// Sorted, unique tag names.
    pub tags: Vec<String>,
    /// Page title, or empty.
    pub title: String,
}

impl Resolution {
    /// No streams, tags or title.
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty() && self.tags.is_empty() && self.title.is_empty()
    }
}

/// Resolve stream URLs, tags and title from a video page.
pub fn resolve_page(html: &str) -> Resolution {
    if html.trim().is_empty() {
        return Resolution::default();
    }

    let document = Html::parse_document(html);
    Resolution {
        streams: streams::streams_from_document(&document),
        tags: tags_from_document(&document),
        title: title_from_document(&document),
    }
}

/// Sorted, de-duplicated tag names of a video page.
pub fn extract_tags(html: &str) -> Vec<String> {
    tags_from_document(&Html::parse_document(html))
}

/// Title of a video page, or the empty string.
pub fn extract_title(html: &str) -> String {
    title_from_document(&Html::parse_document(html))
}

fn tags_from_document(document: &Html) -> Vec<String> {
    let selector = Selector::parse(".tag_item").expect("invalid selector");
    // blank tag texts are kept, unlike the listing tag cloud
    document
        .select(&selector)
        .map(element_text)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn title_from_document(document: &Html) -> String {
    let selector = Selector::parse(".title_video, h1.title, h1").expect("invalid selector");
    document.select(&selector).next().map(element_text).unwrap_or_default()
}

/// Whitespace-trimmed text content of an element.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

pub(crate) fn sorted_unique_texts<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> Vec<String> {
    elements
        .map(element_text)
        .filter(|text| !text.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIDEO_PAGE: &str = r#"
        <html>
            <body>
                <h1 class="title_video">  Sunset over the bay  </h1>
                <div class="wrap">
                    <a class="tag_item" href="https://cdn.test/v/1_720p.mp4?x=1&amp;y=2">720p</a>
                    <a class="tag_item" href="https://cdn.test/v/1_480p.mp4">480p</a>
                </div>
                <div class="tags">
                    <a class="tag_item" href="/tags/nature/">nature</a>
                    <a class="tag_item" href="/tags/beach/">beach</a>
                    <a class="tag_item" href="/tags/nature/">nature</a>
                </div>
            </body>
        </html>
    "#;

    #[test]
    fn test_resolve_page_full() {
        let resolution = resolve_page(VIDEO_PAGE);

        assert_eq!(resolution.title, "Sunset over the bay");
        assert_eq!(resolution.streams.len(), 2);
        assert_eq!(resolution.streams["720p"], "https://cdn.test/v/1_720p.mp4?x=1&y=2");
        assert_eq!(resolution.streams["480p"], "https://cdn.test/v/1_480p.mp4");
        assert_eq!(resolution.tags, vec!["480p", "720p", "beach", "nature"]);
    }

    #[test]
    fn test_resolve_empty_document() {
        let resolution = resolve_page("");
        assert!(resolution.is_empty());
        assert_eq!(resolution, Resolution::default());
    }

    #[test]
    fn test_title_fallback_order() {
        let html = r#"<h1>Plain heading</h1><h1 class="title">Titled</h1>"#;
        assert_eq!(extract_title(html), "Plain heading");

        let html = r#"<p>no heading</p>"#;
        assert_eq!(extract_title(html), "");
    }

    #[test]
    fn test_tags_keep_blank_once() {
        let html = r#"<span class="tag_item">  </span><span class="tag_item">b</span><span class="tag_item"></span><span class="tag_item">a</span>"#;
        assert_eq!(extract_tags(html), vec!["", "a", "b"]);
    }

    #[test]
    fn test_empty_resolution_json_shape() {
        let json = serde_json::to_value(Resolution::default()).unwrap();
        assert_eq!(json, serde_json::json!({"streams": {}, "tags": [], "title": ""}));
    }

    #[test]
    fn test_streams_serialize_in_page_order() {
        let resolution = resolve_page(VIDEO_PAGE);
        let json = serde_json::to_string(&resolution.streams).unwrap();
        assert!(json.find("720p").unwrap() < json.find("480p").unwrap());
    }
}
