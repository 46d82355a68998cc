//! Optional on-disk dumps of what the portal sent back.
//!
//! When the portal changes its markup, the only way to see why a lookup
//! stopped working is to look at the raw exchanges. Writes are best-effort
//! and never affect the lookup itself.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::types::{PartialUpdateMap, RawResponse};

#[derive(Debug, Clone, Default)]
pub struct ArtifactSink {
    dir: Option<PathBuf>,
}

impl ArtifactSink {
    /// A sink that discards everything.
    #[must_use]
    pub fn disabled() -> Self {
        Self { dir: None }
    }

    #[must_use]
    pub fn to_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    #[must_use]
    pub fn from_option(dir: Option<&Path>) -> Self {
        Self {
            dir: dir.map(Path::to_path_buf),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    pub async fn write(&self, name: &str, contents: impl AsRef<[u8]>) {
        let Some(dir) = &self.dir else {
            return;
        };
        let path = dir.join(name);
        let result = async {
            tokio::fs::create_dir_all(dir).await?;
            tokio::fs::write(&path, contents.as_ref()).await
        }
        .await;
        if let Err(e) = result {
            tracing::debug!(path = %path.display(), error = %e, "could not write debug artifact");
        }
    }

    /// Writes `<label>.body` and `<label>.headers.txt`.
    pub async fn write_response(&self, label: &str, response: &RawResponse) {
        if !self.is_enabled() {
            return;
        }
        self.write(&format!("{label}.body"), &response.body).await;
        self.write(&format!("{label}.headers.txt"), render_headers(response))
            .await;
    }

    /// Writes every region as its own file plus the list of region ids.
    pub async fn write_updates(&self, label: &str, updates: &PartialUpdateMap) {
        if !self.is_enabled() || updates.is_empty() {
            return;
        }
        let ids = updates.keys().collect::<Vec<_>>().join("\n");
        self.write(&format!("{label}.partial_updates.ids.txt"), ids)
            .await;
        for (id, html) in updates.iter() {
            let name = format!("{label}.partial_update__{}.html", region_file_stem(id));
            self.write(&name, html).await;
        }
    }
}

fn render_headers(response: &RawResponse) -> String {
    let mut out = format!("HTTP {} {}\n", response.status, response.url);
    for (name, value) in &response.headers {
        let _ = writeln!(
            out,
            "{}: {}",
            name,
            String::from_utf8_lossy(value.as_bytes())
        );
    }
    out
}

/// Region ids contain `:` which is not portable in file names.
fn region_file_stem(id: &str) -> String {
    let stem: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect();
    if stem.is_empty() {
        "update".to_string()
    } else {
        stem
    }
}
