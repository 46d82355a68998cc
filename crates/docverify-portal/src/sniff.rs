//! Best-effort PDF extraction from arbitrary response text.
//!
//! The sniffer is a short ordered list of regex rules. Inline payload rules
//! are evaluated across every text before any link rule, so a decodable
//! payload anywhere in the input beats a link that appears earlier: inline
//! bytes need no further round trip. Sniffing never fails; a rule whose
//! capture does not decode is simply a miss.

use std::sync::LazyLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use regex::Regex;

use crate::types::ExtractionOutcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleKind {
    /// `pdf_base64Str = "..."`, optionally carrying a `<mime>,` prefix.
    InlineAssignment,
    /// `data:application/pdf;base64,...`
    DataUri,
    /// Absolute URL that the caller must download.
    Link,
}

struct SniffRule {
    name: &'static str,
    kind: RuleKind,
    pattern: Regex,
}

impl SniffRule {
    fn new(name: &'static str, kind: RuleKind, pattern: &str) -> Self {
        Self {
            name,
            kind,
            pattern: Regex::new(pattern).expect("valid sniff rule regex"),
        }
    }

    fn is_inline(&self) -> bool {
        self.kind != RuleKind::Link
    }

    /// Returns the first usable match of this rule in `text`.
    fn apply(&self, text: &str) -> Option<ExtractionOutcome> {
        match self.kind {
            RuleKind::InlineAssignment => self.pattern.captures_iter(text).find_map(|caps| {
                let value = caps.get(1)?.as_str();
                if value.trim().is_empty() {
                    return None;
                }
                decode_pdf_base64(strip_mime_prefix(value)).map(ExtractionOutcome::PdfBytes)
            }),
            RuleKind::DataUri => self
                .pattern
                .captures_iter(text)
                .find_map(|caps| decode_pdf_base64(caps.get(1)?.as_str()))
                .map(ExtractionOutcome::PdfBytes),
            RuleKind::Link => self
                .pattern
                .find(text)
                .map(|m| ExtractionOutcome::PdfUrl(m.as_str().to_string())),
        }
    }
}

/// Rules in priority order.
static RULES: LazyLock<Vec<SniffRule>> = LazyLock::new(|| {
    vec![
        SniffRule::new(
            "inline-assignment",
            RuleKind::InlineAssignment,
            r#"pdf_base64Str\s*=\s*["']([^"']+)["']"#,
        ),
        SniffRule::new(
            "data-uri",
            RuleKind::DataUri,
            r#"(?i)data:application/pdf(?:;base64)?,([^"'>\s]+)"#,
        ),
        SniffRule::new(
            "pdf-link",
            RuleKind::Link,
            r#"(?i)https?://[^\s"'<>]+\.pdf\b"#,
        ),
        SniffRule::new(
            "shepherd-link",
            RuleKind::Link,
            r#"(?i)https?://[^\s"'<>]+/sfc/servlet\.shepherd/[^\s"'<>]+"#,
        ),
    ]
});

/// Scans `texts` in order for an inline PDF payload, then for a PDF link.
///
/// Empty texts are skipped. Returns [`ExtractionOutcome::Nothing`] when no
/// rule produced a usable result.
pub fn sniff<S: AsRef<str>>(texts: &[S]) -> ExtractionOutcome {
    let inline = RULES.iter().filter(|r| r.is_inline());
    let links = RULES.iter().filter(|r| !r.is_inline());

    for rules in [inline.collect::<Vec<_>>(), links.collect::<Vec<_>>()] {
        for text in texts.iter().map(AsRef::as_ref).filter(|t| !t.is_empty()) {
            for rule in &rules {
                if let Some(outcome) = rule.apply(text) {
                    tracing::debug!(rule = rule.name, "sniffer matched");
                    return outcome;
                }
            }
        }
    }

    ExtractionOutcome::Nothing
}

/// Drops a data-URI style `<mime>,` header from a captured payload.
fn strip_mime_prefix(value: &str) -> &str {
    match value.split_once(',') {
        Some((head, rest)) if !head.is_empty() => rest,
        _ => value,
    }
}

/// Decodes a base64 PDF payload leniently.
///
/// Whitespace anywhere in the input is ignored and missing `=` padding is
/// restored. Returns `None` for anything that still does not decode, or that
/// decodes to nothing.
#[must_use]
pub fn decode_pdf_base64(data: &str) -> Option<Vec<u8>> {
    let mut compact: String = data.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }
    let missing = compact.len() % 4;
    if missing != 0 {
        compact.extend(std::iter::repeat_n('=', 4 - missing));
    }
    STANDARD.decode(compact).ok().filter(|bytes| !bytes.is_empty())
}
