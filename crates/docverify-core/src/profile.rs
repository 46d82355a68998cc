//! Fixed markup identifiers of the verification portal.
//!
//! The portal is a Visualforce page rendered by JSF/RichFaces; its component
//! ids are generated by the framework and only change when the page is
//! rebuilt. Keeping them in one value lets tests point the pipeline at a
//! fixture page with different ids.

/// Component ids the retrieval pipeline relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalProfile {
    /// Fragment contained in the id of the verification `<form>`.
    /// Also used as the form-marker field name and value.
    pub form_id: String,
    /// Input carrying the user's document reference code.
    pub code_field: String,
    /// Search button; sent as event marker and similarity grouping id.
    pub event_marker: String,
    /// Messages region rendered next to the form.
    pub status_region: String,
    /// Partial-update region that holds the document viewer.
    pub viewer_region: String,
}

impl Default for PortalProfile {
    fn default() -> Self {
        Self {
            form_id: "VerifyDocPG:documentform".to_string(),
            code_field: "VerifyDocPG:documentform:docReference".to_string(),
            event_marker: "VerifyDocPG:documentform:j_id7".to_string(),
            status_region: "VerifyDocPG:documentform:j_id21".to_string(),
            viewer_region: "VerifyDocPG:docviewer".to_string(),
        }
    }
}
