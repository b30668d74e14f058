//! Provenance records and their place in the TEI header
//!
//! Every revision run appends one `<change>` to `teiHeader/revisionDesc` and
//! one `<application>` to `teiHeader/encodingDesc/appInfo`, creating the
//! containing elements when they are missing. Insertion works on byte
//! offsets found with a quick-xml scan, so the rest of the header is left
//! exactly as it was.

use crate::config::ProvenanceConfig;
use crate::markup::{
    escape_attribute, escape_text, local_name, qualified_name, MarkupError, MarkupResult,
};
use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};

/// One entry in a document's change log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    pub timestamp: DateTime<Utc>,
    pub actor: String,
    pub tool: String,
    pub version: String,
    pub note: String,
}

impl ProvenanceRecord {
    /// Record stamped with the current time.
    pub fn new(config: &ProvenanceConfig) -> Self {
        Self::with_timestamp(config, Utc::now())
    }

    pub fn with_timestamp(config: &ProvenanceConfig, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            actor: config.actor.clone(),
            tool: config.tool.clone(),
            version: config.version.clone(),
            note: config.note.clone(),
        }
    }

    /// `YYYY-MM-DD`, as written in `change/@when`
    pub fn date(&self) -> String {
        self.timestamp.format("%Y-%m-%d").to_string()
    }

    fn change_markup(&self, prefix: &str) -> String {
        let change = qualify(prefix, "change");
        format!(
            "<{change} when=\"{}\" who=\"#{}\">{}</{change}>",
            self.date(),
            escape_attribute(&self.actor),
            escape_text(&self.note),
        )
    }

    fn application_markup(&self, prefix: &str) -> String {
        let application = qualify(prefix, "application");
        let label = qualify(prefix, "label");
        let p = qualify(prefix, "p");
        format!(
            "<{application} ident=\"{}\" version=\"{}\"><{label}>{} App</{label}><{p}>{}</{p}></{application}>",
            escape_attribute(&self.tool),
            escape_attribute(&self.version),
            escape_text(&self.tool),
            escape_text(&self.note),
        )
    }
}

fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}:{}", prefix, name)
    }
}

fn wrap(prefix: &str, name: &str, content: &str) -> String {
    let name = qualify(prefix, name);
    format!("<{name}>{content}</{name}>")
}

/// Byte offsets of one header element
#[derive(Debug, Clone)]
struct Element {
    name: String,
    start: usize,
    /// Offset of `</name>`, or `start` for a self-closing element
    close: usize,
    end: usize,
    empty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Header,
    FileDesc,
    EncodingDesc,
    AppInfo,
    RevisionDesc,
}

#[derive(Debug, Default)]
struct HeaderMap {
    header: Option<Element>,
    file_desc: Option<Element>,
    encoding_desc: Option<Element>,
    app_info: Option<Element>,
    revision_desc: Option<Element>,
}

impl HeaderMap {
    fn slot_mut(&mut self, slot: Slot) -> &mut Option<Element> {
        match slot {
            Slot::Header => &mut self.header,
            Slot::FileDesc => &mut self.file_desc,
            Slot::EncodingDesc => &mut self.encoding_desc,
            Slot::AppInfo => &mut self.app_info,
            Slot::RevisionDesc => &mut self.revision_desc,
        }
    }

    fn get(&self, slot: Slot) -> Option<&Element> {
        match slot {
            Slot::Header => self.header.as_ref(),
            Slot::FileDesc => self.file_desc.as_ref(),
            Slot::EncodingDesc => self.encoding_desc.as_ref(),
            Slot::AppInfo => self.app_info.as_ref(),
            Slot::RevisionDesc => self.revision_desc.as_ref(),
        }
    }

    /// Which slot, if any, an element opening at `depth` fills.
    fn classify(&self, local: &str, depth: usize, header_depth: Option<usize>) -> Option<Slot> {
        let slot = match (local, header_depth) {
            ("teiHeader", None) => Slot::Header,
            ("fileDesc", Some(h)) if depth == h + 1 => Slot::FileDesc,
            ("encodingDesc", Some(h)) if depth == h + 1 => Slot::EncodingDesc,
            ("revisionDesc", Some(h)) if depth == h + 1 => Slot::RevisionDesc,
            ("appInfo", Some(_)) => Slot::AppInfo,
            _ => return None,
        };
        self.get(slot).is_none().then_some(slot)
    }
}

fn scan(body: &str) -> MarkupResult<HeaderMap> {
    let mut reader = Reader::from_str(body);
    let mut map = HeaderMap::default();
    let mut open: Vec<Option<Slot>> = Vec::new();
    let mut header_depth: Option<usize> = None;

    loop {
        let offset = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|e| MarkupError::Syntax {
            offset: reader.error_position() as usize,
            message: e.to_string(),
        })?;
        let end = reader.buffer_position() as usize;

        match event {
            Event::Start(start) | Event::Empty(start) if header_depth.is_some() || map.header.is_none() => {
                let empty = end >= 2 && &body.as_bytes()[end - 2..end] == b"/>";
                let name = qualified_name(&start);
                let slot = map.classify(local_name(&name), open.len(), header_depth);
                if let Some(slot) = slot {
                    if slot == Slot::Header && !empty {
                        header_depth = Some(open.len());
                    }
                    *map.slot_mut(slot) = Some(Element {
                        name,
                        start: offset,
                        close: offset,
                        end,
                        empty,
                    });
                }
                if !empty {
                    open.push(slot);
                }
                if slot == Some(Slot::Header) && empty {
                    break;
                }
            }
            Event::Start(_) => open.push(None),
            Event::End(_) => {
                if let Some(Some(slot)) = open.pop() {
                    if let Some(element) = map.slot_mut(slot).as_mut() {
                        element.close = offset;
                        element.end = end;
                    }
                    if slot == Slot::Header {
                        break;
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(map)
}

struct Edit {
    at: usize,
    remove: usize,
    text: String,
}

/// Append `content` as the last child of `element`.
fn append(body: &str, element: &Element, content: &str) -> Edit {
    if element.empty {
        let open = body[element.start..element.end - 2].trim_end();
        Edit {
            at: element.start,
            remove: element.end - element.start,
            text: format!("{}>{}</{}>", open, content, element.name),
        }
    } else {
        Edit {
            at: element.close,
            remove: 0,
            text: content.to_string(),
        }
    }
}

/// Write `record` into the TEI header of `body`.
///
/// Returns `None` when the document has no `teiHeader`.
pub fn insert_into_header(body: &str, record: &ProvenanceRecord) -> MarkupResult<Option<String>> {
    let map = scan(body)?;
    let Some(header) = map.header.as_ref() else {
        return Ok(None);
    };
    let prefix = header
        .name
        .rsplit_once(':')
        .map(|(prefix, _)| prefix)
        .unwrap_or_default();

    let application = record.application_markup(prefix);
    let change = record.change_markup(prefix);

    // Edits at equal offsets apply in reverse creation order, so the
    // encodingDesc lands before the revisionDesc when both are new.
    let mut edits: Vec<Edit> = Vec::new();
    let mut header_content = String::new();

    match (&map.app_info, &map.encoding_desc) {
        (Some(app_info), _) => edits.push(append(body, app_info, &application)),
        (None, Some(encoding_desc)) => {
            edits.push(append(body, encoding_desc, &wrap(prefix, "appInfo", &application)))
        }
        (None, None) => {
            let encoding_desc = wrap(prefix, "encodingDesc", &wrap(prefix, "appInfo", &application));
            match &map.file_desc {
                Some(file_desc) => edits.push(Edit {
                    at: file_desc.end,
                    remove: 0,
                    text: encoding_desc,
                }),
                None => header_content.push_str(&encoding_desc),
            }
        }
    }

    match &map.revision_desc {
        Some(revision_desc) => edits.push(append(body, revision_desc, &change)),
        None => header_content.push_str(&wrap(prefix, "revisionDesc", &change)),
    }

    if !header_content.is_empty() {
        edits.push(append(body, header, &header_content));
    }

    let mut ordered: Vec<(usize, Edit)> = edits.into_iter().enumerate().collect();
    ordered.sort_by(|(a_seq, a), (b_seq, b)| b.at.cmp(&a.at).then(b_seq.cmp(a_seq)));

    let mut out = body.to_string();
    for (_, edit) in &ordered {
        out.replace_range(edit.at..edit.at + edit.remove, &edit.text);
    }
    Ok(Some(out))
}
