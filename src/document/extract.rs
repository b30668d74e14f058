//! Fragment extraction over a quick-xml event stream

use super::{Fragment, FragmentKey};
use crate::config::ContainerConfig;
use crate::markup::{local_name, normalize_whitespace, qualified_name, MarkupError, MarkupResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Byte offset of the root element's start tag.
pub(super) fn root_offset(source: &str) -> MarkupResult<usize> {
    let mut reader = Reader::from_str(source);
    loop {
        let offset = reader.buffer_position() as usize;
        match reader.read_event().map_err(|e| syntax(&reader, e))? {
            Event::Start(_) | Event::Empty(_) => return Ok(offset),
            Event::Eof => return Err(MarkupError::NoRoot),
            _ => {}
        }
    }
}

struct Open {
    name: String,
    container: Option<String>,
}

struct Capture {
    name: String,
    depth: usize,
    start: usize,
    text: String,
    label: String,
}

/// Direct element children of every container under a `body` element.
///
/// Containers nested inside a fragment are part of that fragment and are
/// not scanned again.
pub(super) fn fragments(body: &str, container: &ContainerConfig) -> MarkupResult<Vec<Fragment>> {
    let mut reader = Reader::from_str(body);
    let mut open: Vec<Open> = Vec::new();
    let mut capture: Option<Capture> = None;
    let mut fragments = Vec::new();
    let mut containers = 0usize;

    loop {
        let offset = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|e| syntax(&reader, e))?;
        let end = reader.buffer_position() as usize;

        match event {
            Event::Start(start) => {
                if capture.is_none() {
                    if let Some(label) = parent_container(&open) {
                        capture = Some(Capture {
                            name: qualified_name(&start),
                            depth: open.len(),
                            start: offset,
                            text: String::new(),
                            label,
                        });
                    }
                }
                let label = if capture.is_none() && is_container(&start, container, &open)? {
                    containers += 1;
                    Some(container_label(&start, container, containers)?)
                } else {
                    None
                };
                open.push(Open {
                    name: qualified_name(&start),
                    container: label,
                });
            }
            Event::Empty(start) => {
                if capture.is_none() {
                    if let Some(label) = parent_container(&open) {
                        let name = qualified_name(&start);
                        fragments.push(fragment(
                            &label,
                            &name,
                            fragments.len() + 1,
                            &body[offset..end],
                            String::new(),
                            offset..end,
                        ));
                    }
                }
            }
            Event::End(_) => {
                open.pop();
                if capture.as_ref().is_some_and(|c| c.depth == open.len()) {
                    if let Some(done) = capture.take() {
                        fragments.push(fragment(
                            &done.label,
                            &done.name,
                            fragments.len() + 1,
                            &body[done.start..end],
                            done.text,
                            done.start..end,
                        ));
                    }
                }
            }
            Event::Text(text) => {
                if let Some(capture) = capture.as_mut() {
                    let text = text.unescape().map_err(|e| MarkupError::Syntax {
                        offset,
                        message: e.to_string(),
                    })?;
                    capture.text.push_str(&text);
                }
            }
            Event::CData(cdata) => {
                if let Some(capture) = capture.as_mut() {
                    capture.text.push_str(&String::from_utf8_lossy(&cdata));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(fragments)
}

fn fragment(
    container: &str,
    child: &str,
    sequence_index: usize,
    markup: &str,
    text: String,
    range: std::ops::Range<usize>,
) -> Fragment {
    Fragment {
        key: FragmentKey::new(format!("{}/{}", container, child), sequence_index),
        markup: markup.to_string(),
        text: normalize_whitespace(&text),
        range,
    }
}

fn parent_container(open: &[Open]) -> Option<String> {
    open.last().and_then(|parent| parent.container.clone())
}

fn is_container(start: &BytesStart<'_>, config: &ContainerConfig, open: &[Open]) -> MarkupResult<bool> {
    if local_name(&qualified_name(start)) != config.tag {
        return Ok(false);
    }
    if !open.iter().any(|o| local_name(&o.name) == "body") {
        return Ok(false);
    }
    if open.iter().any(|o| o.container.is_some()) {
        return Ok(false);
    }
    Ok(attribute(start, "type")?.as_deref() == Some(config.type_value.as_str()))
}

/// `body//div[@xml:id="..."]`, or `body//div[n]` counting matching
/// containers when there is no id.
fn container_label(start: &BytesStart<'_>, config: &ContainerConfig, ordinal: usize) -> MarkupResult<String> {
    Ok(match attribute(start, "xml:id")? {
        Some(id) => format!("body//{}[@xml:id=\"{}\"]", config.tag, id),
        None => format!("body//{}[{}]", config.tag, ordinal),
    })
}

fn attribute(start: &BytesStart<'_>, key: &str) -> MarkupResult<Option<String>> {
    let syntax = |message: String| MarkupError::Syntax { offset: 0, message };
    match start
        .try_get_attribute(key)
        .map_err(|e| syntax(e.to_string()))?
    {
        Some(attribute) => Ok(Some(
            attribute
                .unescape_value()
                .map_err(|e| syntax(e.to_string()))?
                .into_owned(),
        )),
        None => Ok(None),
    }
}

fn syntax(reader: &Reader<&[u8]>, error: quick_xml::Error) -> MarkupError {
    MarkupError::Syntax {
        offset: reader.error_position() as usize,
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_offset_skips_prolog() {
        let source = r#"<?xml version="1.0"?> <!-- c --> <TEI><text/></TEI>"#;
        assert_eq!(root_offset(source).unwrap(), source.find("<TEI>").unwrap());
        assert_eq!(root_offset("<!-- only -->"), Err(MarkupError::NoRoot));
    }

    #[test]
    fn containers_outside_body_are_ignored() {
        let body = r#"<TEI><teiHeader><div type="docbody"><p>header</p></div></teiHeader><text><body><div type="docbody"><p>kept</p></div></body></text></TEI>"#;
        let fragments = fragments(body, &ContainerConfig::default()).unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].text, "kept");
        assert_eq!(fragments[0].key.location_path, "body//div[1]/p");
    }

    #[test]
    fn nested_containers_belong_to_their_fragment() {
        let body = r#"<TEI><text><body><div type="docbody"><floatingText><div type="docbody"><p>inner</p></div></floatingText><p>outer</p></div></body></text></TEI>"#;
        let fragments = fragments(body, &ContainerConfig::default()).unwrap();
        let texts: Vec<&str> = fragments.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, vec!["inner", "outer"]);
        assert_eq!(fragments[0].key.location_path, "body//div[1]/floatingText");
    }

    #[test]
    fn prefixed_names_and_entities() {
        let body = r#"<tei:TEI xmlns:tei="http://www.tei-c.org/ns/1.0"><tei:body><tei:div type="docbody" xml:id="d&amp;1"><tei:p>AT&amp;T <![CDATA[x<y]]></tei:p></tei:div></tei:body></tei:TEI>"#;
        let fragments = fragments(body, &ContainerConfig::default()).unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(
            fragments[0].key.location_path,
            "body//div[@xml:id=\"d&1\"]/tei:p"
        );
        assert_eq!(fragments[0].text, "AT&T x<y");
    }
}
