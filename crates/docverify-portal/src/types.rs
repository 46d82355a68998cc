//! Values flowing through one document lookup.

use std::borrow::Cow;

use reqwest::header::{HeaderMap, CONTENT_TYPE, LOCATION};

use crate::error::PortalError;
use crate::strategy::SubmissionStrategy;

/// User-supplied reference code of the document to retrieve.
///
/// Only emptiness is checked; the value, whitespace included, is sent to the
/// portal verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentCode(String);

impl DocumentCode {
    /// # Errors
    ///
    /// Returns [`PortalError::EmptyCode`] when `raw` is empty.
    pub fn new(raw: impl Into<String>) -> Result<Self, PortalError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(PortalError::EmptyCode);
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Insertion-ordered string map.
///
/// Form payloads must keep the order the portal rendered its inputs in, and
/// partial-update regions are scanned in response order. Re-inserting a key
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderedMap {
    entries: Vec<(String, String)>,
}

impl OrderedMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to `value`, overwriting an existing entry in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Adds `name` only when it is not present yet. Returns whether it was added.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.entries.push((name, value.into()));
        true
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries as `(name, value)` pairs, suitable for form encoding.
    #[must_use]
    pub fn as_pairs(&self) -> &[(String, String)] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Input fields of the verification form, in document order.
pub type FormFields = OrderedMap;

/// Region id to HTML fragment, parsed from one AJAX partial response.
pub type PartialUpdateMap = OrderedMap;

/// The verification form as scraped from the portal page.
#[derive(Debug, Clone)]
pub struct FormState {
    /// Absolute URL the form posts to.
    pub action_url: String,
    pub fields: FormFields,
    /// Effective URL of the verification page after redirects.
    pub referer: String,
}

/// One HTTP response, kept only for the attempt that produced it.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// Final URL after any automatic redirects.
    pub url: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self, PortalError> {
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        Ok(Self {
            status,
            url,
            headers,
            body,
        })
    }

    #[must_use]
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    /// Lowercased `Content-Type` header, if present and readable.
    #[must_use]
    pub fn content_type(&self) -> Option<String> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase)
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn is_redirect(&self) -> bool {
        matches!(self.status, 301 | 302 | 303 | 307 | 308)
    }

    /// `200` with an `application/pdf` content type.
    #[must_use]
    pub fn is_pdf(&self) -> bool {
        self.status == 200
            && self
                .content_type()
                .is_some_and(|ct| ct.starts_with("application/pdf"))
    }
}

/// What the sniffer found in a set of response texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// Decoded inline PDF payload.
    PdfBytes(Vec<u8>),
    /// Link that still has to be downloaded.
    PdfUrl(String),
    Nothing,
}

/// Terminal result of one lookup that did not fail with an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievalResult {
    Found {
        pdf: Vec<u8>,
        strategy: SubmissionStrategy,
    },
    /// Every strategy missed. `message` is the portal's own explanation, when
    /// one could be scraped.
    NotFound { message: Option<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_code_rejects_only_empty_input() {
        assert!(matches!(DocumentCode::new(""), Err(PortalError::EmptyCode)));
        let spaces = DocumentCode::new("   ").expect("whitespace is a code");
        assert_eq!(spaces.as_str(), "   ");
    }

    #[test]
    fn document_code_is_kept_verbatim() {
        let code = DocumentCode::new(" AB-12 ").expect("non-empty");
        assert_eq!(code.as_str(), " AB-12 ");
    }

    #[test]
    fn ordered_map_set_overwrites_in_place() {
        let mut map = OrderedMap::new();
        map.set("a", "1");
        map.set("b", "2");
        map.set("a", "3");
        assert_eq!(map.iter().collect::<Vec<_>>(), vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn ordered_map_insert_if_absent_keeps_first_value() {
        let mut map = OrderedMap::new();
        assert!(map.insert_if_absent("viewstate", "first"));
        assert!(!map.insert_if_absent("viewstate", "second"));
        assert_eq!(map.get("viewstate"), Some("first"));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn raw_response_pdf_check_needs_status_and_type() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            "Application/PDF; charset=binary".parse().expect("header"),
        );
        let ok = RawResponse {
            status: 200,
            url: "https://portal.example.com/doc".to_string(),
            headers,
            body: b"%PDF-1.4".to_vec(),
        };
        assert!(ok.is_pdf());

        let not_ok = RawResponse { status: 203, ..ok };
        assert!(!not_ok.is_pdf());
    }
}
