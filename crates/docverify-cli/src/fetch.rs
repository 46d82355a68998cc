use std::path::PathBuf;

use anyhow::Context;
use docverify_core::AppConfig;
use docverify_portal::{
    retrieve_document, ArtifactSink, DocumentCode, PortalSession, RetrievalOptions,
    RetrievalResult, SessionConfig, SubmissionStrategy,
};

#[derive(Debug)]
pub(crate) struct FetchRequest {
    pub code: String,
    pub output: PathBuf,
    /// Enables debug artifacts when set; overrides `DOCVERIFY_DEBUG_DIR`.
    pub debug_dir: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum FetchOutcome {
    Saved {
        path: PathBuf,
        bytes: usize,
        strategy: SubmissionStrategy,
    },
    NotFound {
        message: Option<String>,
    },
}

pub(crate) async fn run_fetch(
    config: &AppConfig,
    request: FetchRequest,
) -> anyhow::Result<FetchOutcome> {
    let code = DocumentCode::new(request.code).context("document code is required")?;

    let mut options = RetrievalOptions::from_app_config(config);
    if let Some(dir) = request.debug_dir {
        tracing::info!(dir = %dir.display(), "writing debug artifacts");
        options.artifacts = ArtifactSink::to_dir(dir);
    }

    let session = PortalSession::new(&SessionConfig::from_app_config(config))?;
    let result = retrieve_document(&session, &code, &options)
        .await
        .with_context(|| format!("lookup failed for code {code}"))?;

    match result {
        RetrievalResult::Found { pdf, strategy } => {
            if let Some(parent) = request.output.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            tokio::fs::write(&request.output, &pdf)
                .await
                .with_context(|| format!("failed to write {}", request.output.display()))?;
            Ok(FetchOutcome::Saved {
                path: request.output,
                bytes: pdf.len(),
                strategy,
            })
        }
        RetrievalResult::NotFound { message } => Ok(FetchOutcome::NotFound { message }),
    }
}
