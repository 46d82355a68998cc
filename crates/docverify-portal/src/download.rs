//! Fetches a PDF from a link the sniffer found.

use crate::deadline::Deadline;
use crate::error::PortalError;
use crate::form::resolve_url;
use crate::session::PortalSession;
use crate::types::RawResponse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Pdf(Vec<u8>),
    /// The link did not lead to a PDF. Only the current attempt fails.
    Rejected { status: u16, content_type: Option<String> },
}

/// GETs `url` and accepts the body only if it is a `200 application/pdf`.
///
/// A single redirect is followed by hand so the content type of the target
/// is checked as well; a second redirect is a rejection.
///
/// # Errors
///
/// Transport failures and deadline expiry propagate; everything else is a
/// [`DownloadOutcome::Rejected`].
pub async fn download_pdf(
    session: &PortalSession,
    url: &str,
    referer: &str,
    deadline: &Deadline,
) -> Result<DownloadOutcome, PortalError> {
    let first = session.get_document(url, referer, deadline).await?;
    if first.is_pdf() {
        return Ok(DownloadOutcome::Pdf(first.body));
    }

    let next = match first.location().filter(|_| first.is_redirect()) {
        Some(location) => match resolve_url(url, location) {
            Ok(next) => next,
            Err(e) => {
                tracing::debug!(url, location, error = %e, "unusable redirect target");
                return Ok(rejected(&first));
            }
        },
        None => return Ok(rejected(&first)),
    };

    tracing::debug!(from = url, to = %next, "following download redirect");
    let second = session.get_document(&next, referer, deadline).await?;
    if second.is_pdf() {
        return Ok(DownloadOutcome::Pdf(second.body));
    }
    Ok(rejected(&second))
}

fn rejected(response: &RawResponse) -> DownloadOutcome {
    DownloadOutcome::Rejected {
        status: response.status,
        content_type: response.content_type(),
    }
}
