//! Drives one document lookup from bootstrap to PDF.
//!
//! Bootstrap once, then try each [`SubmissionStrategy`] in order until one
//! response yields inline PDF bytes or a link that downloads as a PDF. A miss
//! only advances to the next strategy; transport errors and deadline expiry
//! abort the lookup.

use std::time::Duration;

use docverify_core::{AppConfig, PortalProfile};

use crate::artifacts::ArtifactSink;
use crate::deadline::Deadline;
use crate::download::{download_pdf, DownloadOutcome};
use crate::error::PortalError;
use crate::form::bootstrap;
use crate::message::scrape_message;
use crate::partial::{looks_like_xml, parse_partial_response};
use crate::session::PortalSession;
use crate::sniff::sniff;
use crate::strategy::{SubmissionRequest, SubmissionStrategy};
use crate::types::{
    DocumentCode, ExtractionOutcome, FormState, PartialUpdateMap, RetrievalResult,
};

/// Per-process settings for lookups.
#[derive(Debug, Clone)]
pub struct RetrievalOptions {
    pub portal_url: String,
    pub profile: PortalProfile,
    /// Overall budget per lookup; `None` disables it.
    pub deadline: Option<Duration>,
    pub artifacts: ArtifactSink,
}

impl RetrievalOptions {
    #[must_use]
    pub fn new(portal_url: impl Into<String>) -> Self {
        Self {
            portal_url: portal_url.into(),
            profile: PortalProfile::default(),
            deadline: None,
            artifacts: ArtifactSink::disabled(),
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            portal_url: config.portal_url.clone(),
            profile: PortalProfile::default(),
            deadline: config.lookup_deadline(),
            artifacts: ArtifactSink::from_option(config.debug_dir.as_deref()),
        }
    }
}

/// Result of sending one strategy's request.
enum Attempt {
    Found(Vec<u8>),
    /// Nothing usable. `diagnostic` is the text to scrape for a portal
    /// message if every strategy misses.
    Missed { diagnostic: String },
}

/// Looks up `code` on the portal.
///
/// # Errors
///
/// - [`PortalError::FormNotFound`] if the verification page changed shape.
/// - [`PortalError::Http`] on any transport failure.
/// - [`PortalError::DeadlineExceeded`] if the lookup ran out of time.
pub async fn retrieve_document(
    session: &PortalSession,
    code: &DocumentCode,
    options: &RetrievalOptions,
) -> Result<RetrievalResult, PortalError> {
    let deadline = Deadline::from_budget(options.deadline);
    tracing::info!(%code, "starting document lookup");

    let form = bootstrap(
        session,
        &options.portal_url,
        &options.profile,
        &deadline,
        &options.artifacts,
    )
    .await?;

    let mut message: Option<String> = None;
    let mut diagnostics = Vec::with_capacity(SubmissionStrategy::ALL.len());

    for strategy in SubmissionStrategy::ALL {
        let request = strategy.build(&form, code, &options.profile);
        match run_attempt(session, &form, &request, options, &deadline).await? {
            Attempt::Found(pdf) => {
                tracing::info!(%code, %strategy, bytes = pdf.len(), "document retrieved");
                return Ok(RetrievalResult::Found { pdf, strategy });
            }
            Attempt::Missed { diagnostic } => {
                if message.is_none() {
                    message = scrape_message(&diagnostic, &options.profile);
                    if let Some(msg) = &message {
                        tracing::info!(%strategy, message = %msg, "server message");
                    }
                }
                diagnostics.push(diagnostic);
            }
        }
    }

    if options.artifacts.is_enabled() {
        let dump = SubmissionStrategy::ALL
            .iter()
            .zip(&diagnostics)
            .map(|(strategy, text)| format!("--- {strategy} ---\n{text}"))
            .collect::<Vec<_>>()
            .join("\n\n");
        options.artifacts.write("final_dump.txt", dump).await;
    }

    tracing::info!(%code, message = message.as_deref().unwrap_or(""), "no document found");
    Ok(RetrievalResult::NotFound { message })
}

async fn run_attempt(
    session: &PortalSession,
    form: &FormState,
    request: &SubmissionRequest,
    options: &RetrievalOptions,
    deadline: &Deadline,
) -> Result<Attempt, PortalError> {
    let strategy = request.strategy;
    let response = session
        .post_form(
            &request.url,
            request.payload.as_pairs(),
            request.headers.clone(),
            deadline,
        )
        .await?;
    let body = response.text();

    let updates = if looks_like_xml(&body) {
        parse_partial_response(&body)
    } else {
        PartialUpdateMap::new()
    };

    tracing::debug!(
        %strategy,
        status = response.status,
        content_type = response.content_type().as_deref().unwrap_or(""),
        len = body.len(),
        regions = ?updates.keys().collect::<Vec<_>>(),
        "submission response"
    );
    options
        .artifacts
        .write_response(strategy.name(), &response)
        .await;
    options.artifacts.write_updates(strategy.name(), &updates).await;

    let texts = candidate_texts(&updates, &body, &options.profile.viewer_region);
    match sniff(texts.as_slice()) {
        ExtractionOutcome::PdfBytes(pdf) => return Ok(Attempt::Found(pdf)),
        ExtractionOutcome::PdfUrl(url) => {
            match download_pdf(session, &url, &form.referer, deadline).await? {
                DownloadOutcome::Pdf(pdf) => return Ok(Attempt::Found(pdf)),
                DownloadOutcome::Rejected {
                    status,
                    content_type,
                } => {
                    tracing::warn!(
                        %strategy,
                        %url,
                        status,
                        content_type = content_type.as_deref().unwrap_or(""),
                        "sniffed link did not download as a PDF"
                    );
                }
            }
        }
        ExtractionOutcome::Nothing => {}
    }

    Ok(Attempt::Missed {
        diagnostic: combined_text(&updates, &body),
    })
}

/// Texts to sniff, highest priority first: the viewer region, every region
/// in response order, then the raw body.
fn candidate_texts<'a>(
    updates: &'a PartialUpdateMap,
    body: &'a str,
    viewer_region: &str,
) -> Vec<&'a str> {
    let mut texts = Vec::with_capacity(updates.len() + 2);
    if let Some(viewer) = updates.get(viewer_region) {
        texts.push(viewer);
    }
    texts.extend(updates.values());
    texts.push(body);
    texts
}

/// All region fragments followed by the raw body.
fn combined_text(updates: &PartialUpdateMap, body: &str) -> String {
    let mut parts: Vec<&str> = updates.values().collect();
    parts.push(body);
    parts.join(" ")
}
