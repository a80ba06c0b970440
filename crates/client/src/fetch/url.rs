//! Origin URL construction for listing and search pages.

/// Listing page for the newest uploads, e.g. `{base}/latest-updates/2/`.
pub fn latest_url(base_url: &str, page: u32) -> String {
    format!("{}/latest-updates/{page}/", base_url.trim_end_matches('/'))
}

/// Search results page for `query`.
///
/// The origin expects each space in the query path segment as a dash (runs
/// are not collapsed) and the page number inside the `sort_by` parameter.
pub fn search_url(base_url: &str, query: &str, page: u32) -> String {
    let slug = query.trim().replace(' ', "-");
    format!("{}/search/{slug}?sort_by=post_date;from:{page}", base_url.trim_end_matches('/'))
}
