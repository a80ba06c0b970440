//! Server-rendered listing page.
//!
//! Plain string assembly; every interpolated value goes through `html-escape`.

use html_escape::{encode_double_quoted_attribute, encode_text};
use vidrelay_client::VideoRecord;

/// Everything the listing page shows.
#[derive(Debug, Default)]
pub struct ListingPage<'a> {
    pub videos: &'a [VideoRecord],
    pub tags: &'a [String],
    pub current_page: u32,
    pub query: &'a str,
    pub proxy_enabled: bool,
}

impl ListingPage<'_> {
    /// Empty first page, served for unknown routes.
    pub fn empty(proxy_enabled: bool) -> Self {
        Self { current_page: 1, proxy_enabled, ..Default::default() }
    }
}

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>vidrelay</title>
<style>
body{background:#111827;color:#f3f4f6;font-family:system-ui,sans-serif;margin:0;padding:1rem}
.grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(240px,1fr));gap:1rem}
.card{background:#1f2937;border:1px solid #374151;border-radius:.5rem;overflow:hidden;cursor:pointer}
.thumb{position:relative;aspect-ratio:16/9;background:#374151}
.thumb img{width:100%;height:100%;object-fit:cover}
.badge{position:absolute;font-size:.75rem;padding:.1rem .4rem;border-radius:.25rem}
.hd{top:.5rem;right:.5rem;background:#dc2626}
.time{bottom:.5rem;right:.5rem;background:rgba(0,0,0,.8)}
.tags a{margin-right:.5rem;color:#93c5fd}
.pager a{margin:0 .5rem;color:#93c5fd}
</style>
</head>
<body>
"#;

const PLAYER_SCRIPT: &str = r#"<script>
document.querySelectorAll('.card').forEach(function (card) {
  card.addEventListener('click', function () {
    fetch('/resolve?url=' + encodeURIComponent(card.dataset.link))
      .then(function (r) { return r.json(); })
      .then(function (res) {
        var labels = Object.keys(res.streams);
        if (!labels.length) { alert('no streams found'); return; }
        var player = document.getElementById('player');
        player.src = '/stream?url=' + encodeURIComponent(res.streams[labels[labels.length - 1]]);
        player.hidden = false;
        player.play();
      });
  });
});
</script>
"#;

pub fn listing(page: &ListingPage<'_>) -> String {
    let mut html = String::from(HEAD);

    html.push_str("<header><form action=\"/\" method=\"get\">");
    html.push_str(&format!(
        "<input type=\"search\" name=\"q\" value=\"{}\" placeholder=\"Search\">",
        encode_double_quoted_attribute(page.query)
    ));
    html.push_str("<button type=\"submit\">Search</button></form>");
    if page.proxy_enabled {
        html.push_str("<small>proxy enabled</small>");
    }
    html.push_str("</header>\n");

    if !page.tags.is_empty() {
        html.push_str("<nav class=\"tags\">");
        for tag in page.tags {
            html.push_str(&format!(
                "<a href=\"/?q={}\">{}</a>",
                query_value(tag),
                encode_text(tag)
            ));
        }
        html.push_str("</nav>\n");
    }

    html.push_str("<video id=\"player\" controls hidden></video>\n<main class=\"grid\">\n");
    if page.videos.is_empty() {
        html.push_str("<p>No videos found.</p>\n");
    }
    for video in page.videos {
        video_card(&mut html, video);
    }
    html.push_str("</main>\n");

    pager(&mut html, page);
    html.push_str(PLAYER_SCRIPT);
    html.push_str("</body>\n</html>\n");
    html
}

fn video_card(html: &mut String, video: &VideoRecord) {
    html.push_str(&format!(
        "<div class=\"card\" data-id=\"{}\" data-link=\"{}\"><div class=\"thumb\">",
        encode_double_quoted_attribute(&video.id),
        encode_double_quoted_attribute(&video.link)
    ));
    if video.thumbnail.is_empty() {
        html.push_str("<span>No Thumbnail</span>");
    } else {
        html.push_str(&format!(
            "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
            encode_double_quoted_attribute(&video.thumbnail),
            encode_double_quoted_attribute(&video.title)
        ));
    }
    if !video.duration.is_empty() {
        html.push_str(&format!("<span class=\"badge time\">{}</span>", encode_text(&video.duration)));
    }
    if !video.is_hd.is_empty() {
        html.push_str("<span class=\"badge hd\">HD</span>");
    }
    html.push_str(&format!("</div><h3>{}</h3></div>\n", encode_text(&video.title)));
}

fn pager(html: &mut String, page: &ListingPage<'_>) {
    let query = if page.query.is_empty() {
        String::new()
    } else {
        format!("&amp;q={}", query_value(page.query))
    };

    html.push_str("<nav class=\"pager\">");
    if page.current_page > 1 {
        html.push_str(&format!("<a href=\"/?page={}{}\">Previous</a>", page.current_page - 1, query));
    }
    html.push_str(&format!("<span>Page {}</span>", page.current_page));
    html.push_str(&format!("<a href=\"/?page={}{}\">Next</a>", page.current_page.saturating_add(1), query));
    html.push_str("</nav>\n");
}

/// Form-encode a query value; the result is also attribute-safe.
fn query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
