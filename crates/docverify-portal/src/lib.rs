//! Retrieval pipeline for documents held by the verification portal.
//!
//! The portal has no download API. A lookup bootstraps a browser-like
//! session, submits the verification form in up to four request shapes and
//! sniffs whatever fragment comes back for an inline PDF or a download link.

pub mod artifacts;
pub mod deadline;
pub mod download;
pub mod error;
pub mod form;
pub mod message;
pub mod partial;
pub mod retrieve;
pub mod session;
pub mod sniff;
pub mod strategy;
pub mod types;

pub use artifacts::ArtifactSink;
pub use deadline::Deadline;
pub use error::PortalError;
pub use retrieve::{retrieve_document, RetrievalOptions};
pub use session::{PortalSession, SessionConfig};
pub use strategy::SubmissionStrategy;
pub use types::{DocumentCode, ExtractionOutcome, FormState, RetrievalResult};
