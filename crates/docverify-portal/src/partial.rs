//! Parser for AJAX partial-page-update envelopes.
//!
//! RichFaces/JSF answers an AJAX form submit with
//! `<partial-response><changes><update id="…">…</update></changes></partial-response>`.
//! Each update carries the new HTML of one page region, usually as CDATA.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::types::PartialUpdateMap;

/// Returns `true` when `body` is worth handing to [`parse_partial_response`].
#[must_use]
pub fn looks_like_xml(body: &str) -> bool {
    body.trim_start().starts_with('<')
}

/// Parses a partial-response envelope into region id → HTML fragment.
///
/// Updates without an `id` are skipped; a repeated id keeps the last
/// occurrence. Non-XML or malformed input yields an empty map, since callers
/// always fall back to sniffing the raw body.
#[must_use]
pub fn parse_partial_response(xml: &str) -> PartialUpdateMap {
    match collect_updates(xml) {
        Ok(updates) => updates,
        Err(e) => {
            tracing::debug!(error = %e, "response is not a well-formed partial response");
            PartialUpdateMap::new()
        }
    }
}

/// Region currently being collected.
struct OpenUpdate {
    id: Option<String>,
    html: String,
    /// Depth of markup nested inside the `<update>` element.
    depth: usize,
}

fn collect_updates(xml: &str) -> Result<PartialUpdateMap, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut updates = PartialUpdateMap::new();
    let mut current: Option<OpenUpdate> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match current.as_mut() {
                Some(open) => {
                    open.depth += 1;
                    open.html.push('<');
                    open.html.push_str(&String::from_utf8_lossy(&e));
                    open.html.push('>');
                }
                None if is_update(&e) => {
                    current = Some(OpenUpdate {
                        id: update_id(&e),
                        html: String::new(),
                        depth: 0,
                    });
                }
                None => {}
            },
            Event::Empty(e) => match current.as_mut() {
                Some(open) => {
                    open.html.push('<');
                    open.html.push_str(&String::from_utf8_lossy(&e));
                    open.html.push_str("/>");
                }
                None if is_update(&e) => {
                    if let Some(id) = update_id(&e) {
                        updates.set(id, String::new());
                    }
                }
                None => {}
            },
            Event::End(e) => match current.as_ref().map(|open| open.depth) {
                Some(0) => {
                    if let Some(OpenUpdate { id: Some(id), html, .. }) = current.take() {
                        updates.set(id, html);
                    }
                }
                Some(_) => {
                    if let Some(open) = current.as_mut() {
                        open.depth -= 1;
                        open.html.push_str("</");
                        open.html.push_str(&String::from_utf8_lossy(e.name().as_ref()));
                        open.html.push('>');
                    }
                }
                None => {}
            },
            Event::Text(e) => {
                if let Some(open) = current.as_mut() {
                    // Escaped markup at the top of an update is the fragment
                    // itself; text between nested tags stays escaped HTML.
                    if open.depth == 0 {
                        match e.unescape() {
                            Ok(text) => open.html.push_str(&text),
                            Err(_) => open.html.push_str(&String::from_utf8_lossy(&e)),
                        }
                    } else {
                        open.html.push_str(&String::from_utf8_lossy(&e));
                    }
                }
            }
            Event::CData(e) => {
                if let Some(open) = current.as_mut() {
                    open.html.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if current.is_some() {
        // Truncated envelope: an <update> never closed.
        return Ok(PartialUpdateMap::new());
    }

    Ok(updates)
}

fn is_update(e: &BytesStart<'_>) -> bool {
    e.local_name().as_ref() == b"update"
}

fn update_id(e: &BytesStart<'_>) -> Option<String> {
    e.try_get_attribute("id")
        .ok()
        .flatten()
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
        .filter(|id| !id.is_empty())
}
