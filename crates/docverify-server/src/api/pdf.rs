//! `GET /api/pdf/{code}`: looks a document up on the portal and streams it
//! back inline.

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};
use docverify_portal::{
    retrieve_document, DocumentCode, PortalError, PortalSession, RetrievalResult,
};
use tracing::Instrument;

use crate::middleware::RequestId;

use super::AppState;

const MISSING_CODE: &str = "Missing document code.";
const NOT_FOUND: &str = "No PDF found for the provided code.";
const FETCH_FAILED: &str = "Failed to fetch document. Please try again later.";

pub(super) async fn missing_code() -> Response {
    (StatusCode::BAD_REQUEST, MISSING_CODE).into_response()
}

pub(super) async fn get_pdf(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(code): Path<String>,
) -> Response {
    let Ok(code) = DocumentCode::new(code) else {
        return missing_code().await;
    };

    let span = tracing::info_span!("lookup", request_id = %req_id.0);
    let outcome = async {
        let session = PortalSession::new(&state.session)?;
        retrieve_document(&session, &code, &state.retrieval).await
    }
    .instrument(span)
    .await;

    match outcome {
        Ok(RetrievalResult::Found { pdf, .. }) => pdf_response(pdf),
        Ok(RetrievalResult::NotFound { message }) => {
            (StatusCode::NOT_FOUND, not_found_text(message.as_deref())).into_response()
        }
        Err(PortalError::EmptyCode) => missing_code().await,
        Err(e) => {
            tracing::error!(request_id = %req_id.0, %code, error = %e, "document lookup failed");
            (StatusCode::INTERNAL_SERVER_ERROR, FETCH_FAILED).into_response()
        }
    }
}

fn pdf_response(pdf: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, r#"inline; filename="document.pdf""#),
            (header::CACHE_CONTROL, "no-store"),
        ],
        pdf,
    )
        .into_response()
}

fn not_found_text(message: Option<&str>) -> String {
    match message {
        Some(msg) => format!("No PDF found. Server said: {msg}"),
        None => NOT_FOUND.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use tower::ServiceExt;
    use wiremock::matchers::{header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::api::{build_app, test_support::state_for};

    const PDF: &[u8] = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n1 0 obj\n<<>>\nendobj\n%%EOF\n";

    const PAGE: &str = r#"<html><body>
<input type="hidden" name="com.salesforce.visualforce.ViewState" value="VS" />
<form id="VerifyDocPG:documentform" action="/Auth/VerifyDocument">
  <input type="text" name="VerifyDocPG:documentform:docReference" />
</form>
</body></html>"#;

    async fn portal() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Auth/VerifyDocument"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;
        server
    }

    async fn get(portal: &MockServer, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let app = build_app(state_for(&format!("{}/Auth/VerifyDocument", portal.uri())));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        (status, headers, body.to_vec())
    }

    #[test]
    fn not_found_text_includes_server_message() {
        assert_eq!(
            not_found_text(Some("No record found")),
            "No PDF found. Server said: No record found"
        );
        assert_eq!(not_found_text(None), NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_code_is_rejected_without_contacting_portal() {
        let server = MockServer::start().await;

        for uri in ["/api/pdf/", "/api/pdf"] {
            let (status, _, body) = get(&server, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "uri {uri}");
            assert_eq!(body, MISSING_CODE.as_bytes());
        }
        let received = server.received_requests().await.unwrap_or_default();
        assert!(received.is_empty(), "portal was contacted: {received:?}");
    }

    #[tokio::test]
    async fn found_document_is_served_inline() {
        let server = portal().await;
        let viewer = format!(
            r#"<?xml version="1.0"?><partial-response><changes><update id="VerifyDocPG:docviewer"><![CDATA[<script>pdf_base64Str = "{}";</script>]]></update></changes></partial-response>"#,
            STANDARD.encode(PDF)
        );
        Mock::given(method("POST"))
            .and(path("/Auth/VerifyDocument"))
            .and(header_eq("x-requested-with", "XMLHttpRequest"))
            .respond_with(ResponseTemplate::new(200).set_body_string(viewer))
            .mount(&server)
            .await;

        let (status, headers, body) = get(&server, "/api/pdf/VALID123").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["content-type"], "application/pdf");
        assert_eq!(
            headers["content-disposition"],
            r#"inline; filename="document.pdf""#
        );
        assert_eq!(headers["cache-control"], "no-store");
        assert!(headers.contains_key("x-request-id"));
        assert_eq!(body, PDF);
    }

    #[tokio::test]
    async fn missing_document_reports_server_message() {
        let server = portal().await;
        Mock::given(method("POST"))
            .and(path("/Auth/VerifyDocument"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<div class="error">No record found</div>"#),
            )
            .expect(4)
            .mount(&server)
            .await;

        let (status, _, body) = get(&server, "/api/pdf/UNKNOWN").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            String::from_utf8(body).expect("utf-8"),
            "No PDF found. Server said: No record found"
        );
    }

    #[tokio::test]
    async fn missing_document_without_message_uses_generic_text() {
        let server = portal().await;
        Mock::given(method("POST"))
            .and(path("/Auth/VerifyDocument"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>Try again</p>"))
            .mount(&server)
            .await;

        let (status, _, body) = get(&server, "/api/pdf/UNKNOWN").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, NOT_FOUND.as_bytes());
    }

    #[tokio::test]
    async fn changed_portal_markup_is_a_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Auth/VerifyDocument"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>Down for maintenance</html>"))
            .mount(&server)
            .await;

        let (status, _, body) = get(&server, "/api/pdf/VALID123").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, FETCH_FAILED.as_bytes());
    }

    #[tokio::test]
    async fn whitespace_code_is_sent_to_portal() {
        let server = portal().await;
        Mock::given(method("POST"))
            .and(path("/Auth/VerifyDocument"))
            .and(wiremock::matchers::body_string_contains("docReference=++"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>nothing</p>"))
            .expect(4)
            .mount(&server)
            .await;

        let (status, _, body) = get(&server, "/api/pdf/%20%20").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, NOT_FOUND.as_bytes());
    }

    #[tokio::test]
    async fn percent_encoded_code_is_decoded_before_lookup() {
        let server = portal().await;
        Mock::given(method("POST"))
            .and(path("/Auth/VerifyDocument"))
            .and(wiremock::matchers::body_string_contains("docReference=AB%2F12"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>nothing</p>"))
            .expect(4)
            .mount(&server)
            .await;

        let (status, _, _) = get(&server, "/api/pdf/AB%2F12").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
