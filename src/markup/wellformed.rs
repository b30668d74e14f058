//! Well-formedness checking and escaping, backed by quick-xml

use super::{MarkupError, MarkupResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::borrow::Cow;

/// Escape `&`, `<` and `>` for use in character data.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    quick_xml::escape::partial_escape(text)
}

/// Escape a value for use inside a double-quoted attribute.
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(value)
}

/// Check that `markup` is a well-formed XML document or element.
///
/// Requires exactly one root element, properly nested and matching tags,
/// valid attributes and entity references, and nothing but whitespace,
/// comments, processing instructions or a doctype outside the root.
pub fn check_well_formed(markup: &str) -> MarkupResult<()> {
    let mut reader = Reader::from_str(markup);
    let mut open: Vec<String> = Vec::new();
    let mut roots = 0usize;

    loop {
        let offset = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|e| MarkupError::Syntax {
            offset: reader.error_position() as usize,
            message: e.to_string(),
        })?;

        match event {
            Event::Start(start) => {
                if open.is_empty() {
                    roots += 1;
                    if roots > 1 {
                        return Err(MarkupError::MultipleRoots { offset });
                    }
                }
                check_attributes(&start, offset)?;
                open.push(qualified_name(&start));
            }
            Event::Empty(start) => {
                if open.is_empty() {
                    roots += 1;
                    if roots > 1 {
                        return Err(MarkupError::MultipleRoots { offset });
                    }
                }
                check_attributes(&start, offset)?;
            }
            Event::End(end) => {
                let found = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                match open.pop() {
                    Some(expected) if expected == found => {}
                    Some(expected) => {
                        return Err(MarkupError::MismatchedEnd {
                            expected,
                            found,
                            offset,
                        })
                    }
                    None => return Err(MarkupError::UnexpectedEnd { found, offset }),
                }
            }
            Event::Text(text) => {
                if open.is_empty() && !text.iter().all(u8::is_ascii_whitespace) {
                    return Err(MarkupError::TextOutsideRoot { offset });
                }
                text.unescape().map_err(|e| MarkupError::Syntax {
                    offset,
                    message: e.to_string(),
                })?;
            }
            Event::CData(_) if open.is_empty() => {
                return Err(MarkupError::TextOutsideRoot { offset });
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(unclosed) = open.pop() {
        return Err(MarkupError::Unclosed(unclosed));
    }
    if roots == 0 {
        return Err(MarkupError::NoRoot);
    }
    Ok(())
}

/// Check a single fragment: one well-formed element with nothing but
/// whitespace around it.
///
/// A fragment is spliced back in place of one element, so comments,
/// processing instructions or a doctype next to the root would leak into
/// the surrounding document.
pub fn check_fragment(fragment: &str) -> MarkupResult<()> {
    check_well_formed(fragment)?;

    let mut reader = Reader::from_str(fragment);
    let mut depth = 0usize;
    loop {
        let offset = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|e| MarkupError::Syntax {
            offset: reader.error_position() as usize,
            message: e.to_string(),
        })?;
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Empty(_) | Event::Text(_) | Event::CData(_) => {}
            Event::Eof => return Ok(()),
            _ if depth == 0 => return Err(MarkupError::OutsideFragment { offset }),
            _ => {}
        }
    }
}

pub(crate) fn qualified_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.name().as_ref()).into_owned()
}

fn check_attributes(start: &BytesStart<'_>, offset: usize) -> MarkupResult<()> {
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| MarkupError::Syntax {
            offset,
            message: e.to_string(),
        })?;
        attribute.unescape_value().map_err(|e| MarkupError::Syntax {
            offset,
            message: e.to_string(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_document_with_prolog() {
        let doc = r#"<?xml version="1.0" encoding="UTF-8"?> <?xml-model href="tei.rng"?> <TEI xmlns="http://www.tei-c.org/ns/1.0"><text><body><p>Hi &amp; bye</p></body></text></TEI>"#;
        assert_eq!(check_well_formed(doc), Ok(()));
    }

    #[test]
    fn accepts_single_fragment() {
        assert!(check_well_formed("<p>Mr. <persRef>Abel</persRef> lived here.</p>").is_ok());
    }

    #[test]
    fn rejects_crossed_elements() {
        let err = check_well_formed("<p><hi><persRef>Abel</hi> Adams</persRef></p>").unwrap_err();
        assert!(matches!(
            err,
            MarkupError::MismatchedEnd { .. } | MarkupError::Syntax { .. }
        ));
    }

    #[test]
    fn rejects_unclosed_root() {
        let err = check_well_formed("<p>open").unwrap_err();
        assert!(
            matches!(err, MarkupError::Unclosed(ref name) if name == "p")
                || matches!(err, MarkupError::Syntax { .. })
        );
    }

    #[test]
    fn rejects_text_outside_root_and_missing_root() {
        assert!(matches!(
            check_well_formed("Mr. Abel"),
            Err(MarkupError::TextOutsideRoot { .. })
        ));
        assert_eq!(check_well_formed("   "), Err(MarkupError::NoRoot));
    }

    #[test]
    fn fragment_check() {
        assert!(check_fragment("<p>Mr. <persRef ref=\"a\">Abel</persRef>.</p>").is_ok());
        assert!(check_fragment("<p>Mr. <persRef>Abel</p></persRef>").is_err());
        assert!(check_fragment(" <p>a <!-- inner --> b</p> ").is_ok());
    }

    #[test]
    fn fragment_rejects_markup_beside_the_element() {
        assert_eq!(
            check_fragment("<!-- c --><p>x</p>"),
            Err(MarkupError::OutsideFragment { offset: 0 })
        );
        assert!(matches!(
            check_fragment("<p>x</p><?pi data?>"),
            Err(MarkupError::OutsideFragment { .. })
        ));
        assert!(check_well_formed("<!-- c --><p>x</p>").is_ok());
    }

    #[test]
    fn rejects_two_roots() {
        assert!(matches!(
            check_well_formed("<p>a</p><p>b</p>"),
            Err(MarkupError::MultipleRoots { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_attributes() {
        assert!(check_well_formed(r#"<p n="1" n="2">x</p>"#).is_err());
    }

    #[test]
    fn escaping() {
        assert_eq!(escape_text("AT&T <co>"), "AT&amp;T &lt;co&gt;");
        assert_eq!(escape_text("Abel's"), "Abel's");
        assert_eq!(escape_attribute(r#"a "b""#), "a &quot;b&quot;");
    }
}
