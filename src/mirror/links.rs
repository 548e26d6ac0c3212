// src/mirror/links.rs
// =============================================================================
// This module pulls raw anchor targets out of a directory listing.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever (Mozilla's HTML parser), so broken markup
//   still produces a tree instead of an error
//
// Unlike a link checker we do NOT resolve or filter here: the scope
// pipeline needs the href exactly as written (it drops "../" and "./"
// before resolution), so this function returns the raw attribute values.
// =============================================================================

use scraper::{Html, Selector};

// Extracts every <a href="..."> value from HTML content
//
// Parameters:
//   html: the listing page (borrowed as &str)
//
// Returns: Vec<String> of raw href values, in document order
//
// Example:
//   html = "<a href='sub/'>sub</a><a href='?C=M'>sort</a>"
//   result = ["sub/", "?C=M"]
pub fn extract_hrefs(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    // The selector is a constant, so failing to parse it is a programmer
    // error rather than something a caller could recover from
    let selector = Selector::parse("a[href]").expect("a[href] is a valid selector");

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}
