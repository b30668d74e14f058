//! Documents and their addressable fragments
//!
//! A [`Document`] is read once from TEI source. Whitespace is normalised the
//! same way fragments are, so every fragment's text appears verbatim in the
//! document body at a known byte range. That range is what final assembly
//! splices revised fragments into.

mod extract;
mod provenance;

pub use provenance::{insert_into_header, ProvenanceRecord};

use crate::config::ContainerConfig;
use crate::markup::{check_well_formed, normalize_whitespace, MarkupResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Stable address of a fragment within its document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FragmentKey {
    /// `body//div[@xml:id="..."]/p` style structural locator
    pub location_path: String,
    /// 1-based position among all fragments of the document
    pub sequence_index: usize,
}

impl FragmentKey {
    pub fn new(location_path: impl Into<String>, sequence_index: usize) -> Self {
        Self {
            location_path: location_path.into(),
            sequence_index,
        }
    }
}

impl fmt::Display for FragmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.location_path, self.sequence_index)
    }
}

/// One markup-bearing subdivision of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub key: FragmentKey,
    /// Whitespace-normalised markup of the element
    pub markup: String,
    /// Plain text content, whitespace-normalised
    pub text: String,
    /// Byte range of `markup` inside [`Document::body`]
    pub range: Range<usize>,
}

/// A parsed source document
#[derive(Debug, Clone)]
pub struct Document {
    /// File name the document was read from
    pub name: String,
    /// Everything before the root element (declaration, schema PIs)
    pub prolog: String,
    /// Root element onwards, whitespace-normalised
    pub body: String,
    pub fragments: Vec<Fragment>,
    /// Append-only change log for this run
    pub provenance: Vec<ProvenanceRecord>,
}

impl Document {
    /// Parse `source` and extract the fragments selected by `container`.
    ///
    /// Fails if the source is not well-formed.
    pub fn parse(
        name: impl Into<String>,
        source: &str,
        container: &ContainerConfig,
    ) -> MarkupResult<Self> {
        let normalized = normalize_whitespace(source);
        check_well_formed(&normalized)?;

        let root = extract::root_offset(&normalized)?;
        let (prolog, body) = normalized.split_at(root);
        let fragments = extract::fragments(body, container)?;

        Ok(Self {
            name: name.into(),
            prolog: prolog.to_string(),
            body: body.to_string(),
            fragments,
            provenance: Vec::new(),
        })
    }

    pub fn fragment(&self, key: &FragmentKey) -> Option<&Fragment> {
        self.fragments.iter().find(|f| &f.key == key)
    }

    /// Replace the body and re-extract fragments from it.
    pub fn replace_body(&mut self, body: String, container: &ContainerConfig) -> MarkupResult<()> {
        self.fragments = extract::fragments(&body, container)?;
        self.body = body;
        Ok(())
    }

    /// Prolog followed by the body
    pub fn to_markup(&self) -> String {
        format!("{}{}", self.prolog, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LETTER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<?xml-model href="http://www.tei-c.org/release/xml/tei/custom/schema/relaxng/tei_all.rng"?>
<TEI xmlns="http://www.tei-c.org/ns/1.0">
  <teiHeader>
    <fileDesc><titleStmt><title>Letter</title></titleStmt></fileDesc>
  </teiHeader>
  <text>
    <body>
      <div type="docbody" xml:id="JQADiaries-v01-1820-01">
        <p>Mr. Abel lived in
           Boston.</p>
        <p>Dined with <persRef ref="adams-louisa">Mrs. Adams</persRef> at Quincy.</p>
      </div>
      <div type="appendix"><p>Not extracted.</p></div>
      <div type="docbody">
        <dateline>Washington, <date when="1820-01-02">2 Jan.</date></dateline>
        <note/>
      </div>
    </body>
  </text>
</TEI>
"#;

    fn letter() -> Document {
        Document::parse("letter.xml", LETTER, &ContainerConfig::default()).unwrap()
    }

    #[test]
    fn splits_prolog_from_body() {
        let doc = letter();
        assert!(doc.prolog.starts_with("<?xml version=\"1.0\""));
        assert!(doc.prolog.ends_with("?> "));
        assert!(doc.body.starts_with("<TEI "));
        assert!(doc.body.ends_with("</TEI>"));
        assert_eq!(doc.to_markup(), normalize_whitespace(LETTER));
    }

    #[test]
    fn extracts_children_of_docbody_containers() {
        let doc = letter();
        let keys: Vec<String> = doc.fragments.iter().map(|f| f.key.to_string()).collect();
        assert_eq!(
            keys,
            vec![
                r#"body//div[@xml:id="JQADiaries-v01-1820-01"]/p #1"#,
                r#"body//div[@xml:id="JQADiaries-v01-1820-01"]/p #2"#,
                "body//div[2]/dateline #3",
                "body//div[2]/note #4",
            ]
        );
    }

    #[test]
    fn fragment_markup_text_and_range() {
        let doc = letter();
        let first = &doc.fragments[0];
        assert_eq!(first.markup, "<p>Mr. Abel lived in Boston.</p>");
        assert_eq!(first.text, "Mr. Abel lived in Boston.");
        assert_eq!(&doc.body[first.range.clone()], first.markup);

        let second = &doc.fragments[1];
        assert_eq!(second.text, "Dined with Mrs. Adams at Quincy.");

        let dateline = &doc.fragments[2];
        assert_eq!(dateline.text, "Washington, 2 Jan.");

        let empty = &doc.fragments[3];
        assert_eq!(empty.markup, "<note/>");
        assert_eq!(empty.text, "");
    }

    #[test]
    fn lookup_by_key() {
        let doc = letter();
        let key = FragmentKey::new("body//div[2]/dateline", 3);
        assert!(doc.fragment(&key).is_some());
        assert!(doc.fragment(&FragmentKey::new("body//div[2]/dateline", 9)).is_none());
    }

    #[test]
    fn malformed_source_is_rejected() {
        let err = Document::parse("bad.xml", "<TEI><text></TEI>", &ContainerConfig::default());
        assert!(err.is_err());
    }
}
