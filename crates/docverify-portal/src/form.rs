//! Loads the verification page and captures its form.

use std::sync::LazyLock;

use docverify_core::PortalProfile;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use scraper::{Html, Selector};

use crate::artifacts::ArtifactSink;
use crate::deadline::Deadline;
use crate::error::PortalError;
use crate::session::PortalSession;
use crate::types::{FormFields, FormState};

static FORM_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("form[id]").expect("form selector is valid"));

static INPUT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input").expect("input selector is valid"));

static HIDDEN_INPUT_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"input[type="hidden"]"#).expect("hidden input selector is valid")
});

/// GETs the verification page and returns the form to submit.
///
/// The referer recorded for later posts is the page's effective URL after
/// redirects.
///
/// # Errors
///
/// - [`PortalError::FormNotFound`] if the page has no verification form.
/// - [`PortalError::InvalidUrl`] if the form action cannot be resolved.
/// - [`PortalError::Http`] on transport failure.
pub async fn bootstrap(
    session: &PortalSession,
    portal_url: &str,
    profile: &PortalProfile,
    deadline: &Deadline,
    artifacts: &ArtifactSink,
) -> Result<FormState, PortalError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml"),
    );

    let page = session.get_page(portal_url, headers, deadline).await?;
    let html = page.text();
    tracing::debug!(
        status = page.status,
        url = %page.url,
        content_type = page.content_type().as_deref().unwrap_or(""),
        len = html.len(),
        "fetched verification page"
    );
    artifacts.write("verify_page.html", html.as_bytes()).await;

    let form = parse_form(&html, &page.url, profile)?;
    tracing::debug!(
        action = %form.action_url,
        field_count = form.fields.len(),
        "captured verification form"
    );
    Ok(form)
}

/// Extracts the verification form from a page served at `page_url`.
///
/// Inputs inside the form are captured in document order; a repeated name
/// keeps its last value. Hidden inputs anywhere else on the page are then
/// added only under names not captured yet, because Visualforce renders its
/// view-state fields outside the `<form>` element.
///
/// # Errors
///
/// [`PortalError::FormNotFound`] or [`PortalError::InvalidUrl`].
pub fn parse_form(
    html: &str,
    page_url: &str,
    profile: &PortalProfile,
) -> Result<FormState, PortalError> {
    let document = Html::parse_document(html);

    let form = document
        .select(&FORM_SELECTOR)
        .find(|el| {
            el.value()
                .attr("id")
                .is_some_and(|id| id.contains(profile.form_id.as_str()))
        })
        .ok_or_else(|| PortalError::FormNotFound {
            url: page_url.to_string(),
        })?;

    let action = form
        .value()
        .attr("action")
        .map(str::trim)
        .filter(|a| !a.is_empty());
    let action_url = match action {
        Some(action) => resolve_url(page_url, action)?,
        None => page_url.to_string(),
    };

    let mut fields = FormFields::new();
    for input in form.select(&INPUT_SELECTOR) {
        if let Some(name) = input.value().attr("name").filter(|n| !n.is_empty()) {
            fields.set(name, input.value().attr("value").unwrap_or(""));
        }
    }
    for hidden in document.select(&HIDDEN_INPUT_SELECTOR) {
        if let Some(name) = hidden.value().attr("name").filter(|n| !n.is_empty()) {
            fields.insert_if_absent(name, hidden.value().attr("value").unwrap_or(""));
        }
    }

    Ok(FormState {
        action_url,
        fields,
        referer: page_url.to_string(),
    })
}

/// Resolves `target` against `base` unless it is already absolute.
///
/// # Errors
///
/// [`PortalError::InvalidUrl`] if `base` is not a URL or the join fails.
pub(crate) fn resolve_url(base: &str, target: &str) -> Result<String, PortalError> {
    if target.starts_with("http://") || target.starts_with("https://") {
        return Ok(target.to_string());
    }
    let base_url = url::Url::parse(base).map_err(|e| PortalError::InvalidUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    base_url
        .join(target)
        .map(|u| u.to_string())
        .map_err(|e| PortalError::InvalidUrl {
            url: target.to_string(),
            reason: e.to_string(),
        })
}
