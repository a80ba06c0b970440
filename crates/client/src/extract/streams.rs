//! Direct media URL discovery on video pages.
//!
//! 1. Anchors under `.wrap a.tag_item`, falling back to any `a[href*='.mp4']`;
//!    hrefs must mention `mp4`. Label is the anchor text, or `Quality N`.
//! 2. Only if no anchor matched: quoted `http(s)://...mp4` literals inside
//!    `<script>` bodies, labelled `Source N` with N counted per script. A
//!    later script's `Source 1` replaces an earlier one.
//!
//! URLs are HTML-entity-decoded. A repeated label overwrites the earlier URL
//! but keeps its position.

use html_escape::decode_html_entities;
use indexmap::IndexMap;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

use super::element_text;

static SCRIPT_MP4: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["'](https?://[^"']+\.mp4)["']"#).expect("invalid regex"));

/// Extract quality-labelled stream URLs from a video page.
pub fn extract_streams(html: &str) -> IndexMap<String, String> {
    streams_from_document(&Html::parse_document(html))
}

pub(crate) fn streams_from_document(document: &Html) -> IndexMap<String, String> {
    let mut streams = from_anchors(document);

    if streams.is_empty() {
        streams = from_scripts(document);
    }

    tracing::debug!("found {} stream links", streams.len());
    streams
}

fn from_anchors(document: &Html) -> IndexMap<String, String> {
    let primary = Selector::parse(".wrap a.tag_item").expect("invalid selector");
    let fallback = Selector::parse("a[href*='.mp4']").expect("invalid selector");

    let mut anchors: Vec<_> = document.select(&primary).collect();
    if anchors.is_empty() {
        anchors = document.select(&fallback).collect();
    }

    let mut streams = IndexMap::new();
    for anchor in anchors {
        let href = match anchor.value().attr("href") {
            Some(h) if h.to_lowercase().contains("mp4") => h,
            _ => continue,
        };

        let label = element_text(anchor);
        let label = if label.is_empty() { format!("Quality {}", streams.len() + 1) } else { label };

        streams.insert(label, decode_html_entities(href).into_owned());
    }

    streams
}

fn from_scripts(document: &Html) -> IndexMap<String, String> {
    let selector = Selector::parse("script").expect("invalid selector");

    let mut streams = IndexMap::new();
    for script in document.select(&selector) {
        let body: String = script.text().collect();
        for (i, capture) in SCRIPT_MP4.captures_iter(&body).enumerate() {
            let url = decode_html_entities(&capture[1]).into_owned();
            streams.insert(format!("Source {}", i + 1), url);
        }
    }

    streams
}
