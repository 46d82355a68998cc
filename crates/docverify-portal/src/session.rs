//! Browser-like HTTP session against the portal.

use std::sync::Arc;
use std::time::Duration;

use docverify_core::{AppConfig, DEFAULT_USER_AGENT};
use reqwest::cookie::Jar;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE, REFERER};
use reqwest::redirect::Policy;
use reqwest::Client;

use crate::deadline::Deadline;
use crate::error::PortalError;
use crate::types::RawResponse;

/// Connection settings shared by every session a process creates.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub user_agent: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Automatic redirects followed for page loads and form posts.
    pub max_redirects: usize,
}

impl SessionConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            max_redirects: config.max_redirects,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            max_redirects: 5,
        }
    }
}

/// One lookup's view of the portal: a cookie jar plus two clients over it.
///
/// Page loads and form posts follow redirects automatically. Document
/// downloads use a client that never does, so the caller can re-check the
/// content type after each hop. Sessions are never shared between lookups;
/// the portal's server-side view state advances with every post.
pub struct PortalSession {
    client: Client,
    download_client: Client,
}

impl PortalSession {
    /// Builds a fresh session with an empty cookie jar.
    ///
    /// # Errors
    ///
    /// Returns [`PortalError::ClientBuild`] if either `reqwest::Client`
    /// cannot be constructed (e.g., invalid TLS config).
    pub fn new(config: &SessionConfig) -> Result<Self, PortalError> {
        let jar = Arc::new(Jar::default());

        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let builder = || {
            Client::builder()
                .timeout(config.request_timeout)
                .connect_timeout(config.connect_timeout)
                .user_agent(config.user_agent.as_str())
                .default_headers(default_headers.clone())
                .cookie_provider(Arc::clone(&jar))
        };

        let client = builder()
            .redirect(Policy::limited(config.max_redirects))
            .build()
            .map_err(PortalError::ClientBuild)?;
        let download_client = builder()
            .redirect(Policy::none())
            .build()
            .map_err(PortalError::ClientBuild)?;

        Ok(Self {
            client,
            download_client,
        })
    }

    /// GETs a page, following redirects. Any status is returned as-is.
    ///
    /// # Errors
    ///
    /// [`PortalError::Http`] on transport failure, or `DeadlineExceeded`.
    pub async fn get_page(
        &self,
        url: &str,
        headers: HeaderMap,
        deadline: &Deadline,
    ) -> Result<RawResponse, PortalError> {
        deadline
            .run(async {
                let response = self.client.get(url).headers(headers).send().await?;
                RawResponse::read(response).await
            })
            .await
    }

    /// POSTs `payload` form-encoded. Any status is returned as-is.
    ///
    /// `headers` are applied after the body, so an explicit `Content-Type`
    /// replaces the one `reqwest` derives from the form.
    ///
    /// # Errors
    ///
    /// [`PortalError::Http`] on transport failure, or `DeadlineExceeded`.
    pub async fn post_form(
        &self,
        url: &str,
        payload: &[(String, String)],
        headers: HeaderMap,
        deadline: &Deadline,
    ) -> Result<RawResponse, PortalError> {
        deadline
            .run(async {
                let response = self
                    .client
                    .post(url)
                    .form(payload)
                    .headers(headers)
                    .send()
                    .await?;
                RawResponse::read(response).await
            })
            .await
    }

    /// GETs a document without following redirects.
    ///
    /// # Errors
    ///
    /// [`PortalError::Http`] on transport failure, or `DeadlineExceeded`.
    pub async fn get_document(
        &self,
        url: &str,
        referer: &str,
        deadline: &Deadline,
    ) -> Result<RawResponse, PortalError> {
        deadline
            .run(async {
                let mut request = self.download_client.get(url);
                if let Ok(value) = HeaderValue::from_str(referer) {
                    request = request.header(REFERER, value);
                }
                let response = request.send().await?;
                RawResponse::read(response).await
            })
            .await
    }
}
