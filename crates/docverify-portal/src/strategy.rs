//! The four request shapes used to submit the verification form.
//!
//! The portal's AJAX handling is undocumented and behaves differently
//! depending on which markers a request carries, so the form is submitted in
//! up to four shapes, from the most complete emulation of a browser click to
//! the most minimal. Building a request is pure; sending it is the
//! orchestrator's job.

use docverify_core::PortalProfile;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, REFERER};

use crate::types::{DocumentCode, FormFields, FormState};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const FORM_URLENCODED_UTF8: &str = "application/x-www-form-urlencoded; charset=UTF-8";
const PARTIAL_ACCEPT: &str = "text/xml,application/xml,text/html,*/*;q=0.8";

const AJAX_REQUEST_FIELD: &str = "AJAXREQUEST";
const AJAX_VIEW_ROOT: &str = "_viewRoot";
const AJAX_EVENTS_COUNT_FIELD: &str = "AJAX:EVENTS_COUNT";
const SIMILARITY_GROUPING_FIELD: &str = "similarityGroupingId";
const AJAX4JSF_FLAG_FIELD: &str = "org.ajax4jsf.ajax";

static FACES_REQUEST: HeaderName = HeaderName::from_static("faces-request");
static X_REQUESTED_WITH: HeaderName = HeaderName::from_static("x-requested-with");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionStrategy {
    /// Full ajax4jsf click dispatch: event marker, AJAX markers and headers.
    ClickEmulation,
    /// Non-AJAX full-page submit.
    PlainPost,
    /// Only the `AJAXREQUEST` parameter.
    AjaxParam,
    /// Only the JSF `Faces-Request` header.
    FacesHeader,
}

impl SubmissionStrategy {
    /// Strategies in the order they are tried.
    pub const ALL: [Self; 4] = [
        Self::ClickEmulation,
        Self::PlainPost,
        Self::AjaxParam,
        Self::FacesHeader,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ClickEmulation => "click-emulation",
            Self::PlainPost => "plain-post",
            Self::AjaxParam => "ajax-param",
            Self::FacesHeader => "faces-header",
        }
    }

    /// Builds this strategy's POST for `code` against `form`.
    #[must_use]
    pub fn build(
        self,
        form: &FormState,
        code: &DocumentCode,
        profile: &PortalProfile,
    ) -> SubmissionRequest {
        let mut payload = base_payload(form, code, profile);
        let mut headers = HeaderMap::new();

        match self {
            Self::ClickEmulation => {
                let events_count = payload
                    .get(AJAX_EVENTS_COUNT_FIELD)
                    .filter(|v| !v.is_empty())
                    .unwrap_or("1")
                    .to_string();
                payload.set(profile.event_marker.as_str(), profile.event_marker.as_str());
                payload.set(AJAX_REQUEST_FIELD, AJAX_VIEW_ROOT);
                payload.set(AJAX_EVENTS_COUNT_FIELD, events_count);
                payload.set(SIMILARITY_GROUPING_FIELD, profile.event_marker.as_str());
                payload.set(AJAX4JSF_FLAG_FIELD, "true");

                headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_URLENCODED_UTF8));
                headers.insert(ACCEPT, HeaderValue::from_static(PARTIAL_ACCEPT));
                headers.insert(X_REQUESTED_WITH.clone(), HeaderValue::from_static("XMLHttpRequest"));
                headers.insert(FACES_REQUEST.clone(), HeaderValue::from_static("partial/ajax"));
            }
            Self::PlainPost => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_URLENCODED));
            }
            Self::AjaxParam => {
                payload.set(AJAX_REQUEST_FIELD, AJAX_VIEW_ROOT);

                headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_URLENCODED_UTF8));
                headers.insert(ACCEPT, HeaderValue::from_static(PARTIAL_ACCEPT));
            }
            Self::FacesHeader => {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_URLENCODED_UTF8));
                headers.insert(ACCEPT, HeaderValue::from_static(PARTIAL_ACCEPT));
                headers.insert(FACES_REQUEST.clone(), HeaderValue::from_static("partial/ajax"));
            }
        }

        if let Ok(referer) = HeaderValue::from_str(&form.referer) {
            headers.insert(REFERER, referer);
        }

        SubmissionRequest {
            strategy: self,
            url: form.action_url.clone(),
            payload,
            headers,
        }
    }
}

impl std::fmt::Display for SubmissionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A fully built form submission, ready to send.
#[derive(Debug, Clone)]
pub struct SubmissionRequest {
    pub strategy: SubmissionStrategy,
    pub url: String,
    pub payload: FormFields,
    pub headers: HeaderMap,
}

/// The scraped form fields plus the form marker and the document code.
#[must_use]
pub fn base_payload(form: &FormState, code: &DocumentCode, profile: &PortalProfile) -> FormFields {
    let mut payload = form.fields.clone();
    payload.set(profile.form_id.as_str(), profile.form_id.as_str());
    payload.set(profile.code_field.as_str(), code.as_str());
    payload
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> FormState {
        let mut fields = FormFields::new();
        fields.set("com.salesforce.visualforce.ViewState", "VS123");
        fields.set("VerifyDocPG:documentform:docReference", "");
        FormState {
            action_url: "https://portal.example.com/Auth/VerifyDocument".to_string(),
            fields,
            referer: "https://portal.example.com/Auth/VerifyDocument".to_string(),
        }
    }

    fn build(strategy: SubmissionStrategy) -> SubmissionRequest {
        let code = DocumentCode::new("VALID123").expect("code");
        strategy.build(&form(), &code, &PortalProfile::default())
    }

    fn header<'a>(request: &'a SubmissionRequest, name: &str) -> Option<&'a str> {
        request.headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[test]
    fn base_payload_sets_marker_and_code_without_reordering() {
        let code = DocumentCode::new("ABC").expect("code");
        let payload = base_payload(&form(), &code, &PortalProfile::default());
        assert_eq!(
            payload.iter().collect::<Vec<_>>(),
            vec![
                ("com.salesforce.visualforce.ViewState", "VS123"),
                ("VerifyDocPG:documentform:docReference", "ABC"),
                ("VerifyDocPG:documentform", "VerifyDocPG:documentform"),
            ]
        );
    }

    #[test]
    fn strategies_are_tried_most_complete_first() {
        assert_eq!(
            SubmissionStrategy::ALL.map(SubmissionStrategy::name),
            ["click-emulation", "plain-post", "ajax-param", "faces-header"]
        );
    }

    #[test]
    fn click_emulation_carries_every_marker() {
        let request = build(SubmissionStrategy::ClickEmulation);
        let marker = "VerifyDocPG:documentform:j_id7";
        assert_eq!(request.payload.get(marker), Some(marker));
        assert_eq!(request.payload.get("AJAXREQUEST"), Some("_viewRoot"));
        assert_eq!(request.payload.get("AJAX:EVENTS_COUNT"), Some("1"));
        assert_eq!(request.payload.get("similarityGroupingId"), Some(marker));
        assert_eq!(request.payload.get("org.ajax4jsf.ajax"), Some("true"));
        assert_eq!(header(&request, "x-requested-with"), Some("XMLHttpRequest"));
        assert_eq!(header(&request, "faces-request"), Some("partial/ajax"));
        assert_eq!(
            header(&request, "content-type"),
            Some("application/x-www-form-urlencoded; charset=UTF-8")
        );
        assert_eq!(
            header(&request, "referer"),
            Some("https://portal.example.com/Auth/VerifyDocument")
        );
    }

    #[test]
    fn click_emulation_keeps_scraped_event_count() {
        let mut state = form();
        state.fields.set("AJAX:EVENTS_COUNT", "3");
        let code = DocumentCode::new("X").expect("code");
        let request =
            SubmissionStrategy::ClickEmulation.build(&state, &code, &PortalProfile::default());
        assert_eq!(request.payload.get("AJAX:EVENTS_COUNT"), Some("3"));
    }

    #[test]
    fn plain_post_adds_nothing_beyond_base() {
        let request = build(SubmissionStrategy::PlainPost);
        assert_eq!(request.payload.len(), 3);
        assert!(!request.payload.contains("AJAXREQUEST"));
        assert_eq!(
            header(&request, "content-type"),
            Some("application/x-www-form-urlencoded")
        );
        assert_eq!(header(&request, "accept"), None);
        assert_eq!(header(&request, "faces-request"), None);
    }

    #[test]
    fn ajax_param_has_no_faces_header() {
        let request = build(SubmissionStrategy::AjaxParam);
        assert_eq!(request.payload.get("AJAXREQUEST"), Some("_viewRoot"));
        assert_eq!(header(&request, "faces-request"), None);
        assert_eq!(header(&request, "x-requested-with"), None);
        assert!(header(&request, "accept").is_some());
    }

    #[test]
    fn faces_header_has_no_ajax_param() {
        let request = build(SubmissionStrategy::FacesHeader);
        assert!(!request.payload.contains("AJAXREQUEST"));
        assert_eq!(header(&request, "faces-request"), Some("partial/ajax"));
        assert_eq!(request.url, "https://portal.example.com/Auth/VerifyDocument");
    }
}
