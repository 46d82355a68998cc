//! Scrapes the portal's own human-readable status message out of HTML.

use std::sync::LazyLock;

use docverify_core::PortalProfile;
use scraper::{ElementRef, Html, Selector};

static ID_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("[id]").expect("id selector is valid"));

static ALERT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".alert, .alert-danger, .alert-warning, .alert-info, .alert-success")
        .expect("alert selector is valid")
});

static DIV_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div").expect("div selector is valid"));

/// Phrases that mark a generic container as an error explanation.
const ERROR_HINTS: [&str; 4] = ["error", "invalid", "not found", "no record"];

/// Returns the first non-empty message found in `html`.
///
/// Precedence: the portal's status region, then the first alert-styled
/// element, then the first `<div>` whose text mentions one of
/// [`ERROR_HINTS`]. Only the first alert is considered; when it is empty the
/// div scan decides.
#[must_use]
pub fn scrape_message(html: &str, profile: &PortalProfile) -> Option<String> {
    if html.trim().is_empty() {
        return None;
    }
    let document = Html::parse_document(html);

    let status_region = document
        .select(&ID_SELECTOR)
        .filter(|el| {
            el.value()
                .attr("id")
                .is_some_and(|id| id.contains(profile.status_region.as_str()))
        })
        .map(|el| element_text(&el))
        .find(|text| !text.is_empty());
    if status_region.is_some() {
        return status_region;
    }

    let alert = document
        .select(&ALERT_SELECTOR)
        .next()
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty());
    if alert.is_some() {
        return alert;
    }

    document
        .select(&DIV_SELECTOR)
        .map(|el| element_text(&el))
        .find(|text| {
            let lowered = text.to_lowercase();
            ERROR_HINTS.iter().any(|hint| lowered.contains(hint))
        })
}

/// Text content of an element, whitespace-collapsed.
fn element_text(el: &ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
