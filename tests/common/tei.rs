//! TEI document fixtures

use std::path::{Path, PathBuf};

pub const PROLOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<?xml-model href="http://www.tei-c.org/release/xml/tei/custom/schema/relaxng/tei_all.rng" type="application/xml" schematypens="http://relaxng.org/ns/structure/1.0"?>
"#;

const DEFAULT_HEADER: &str =
    "<teiHeader><fileDesc><titleStmt><title>Test Diary</title></titleStmt></fileDesc></teiHeader>";

/// Builds small TEI documents with `docbody` divisions
#[derive(Debug, Clone)]
pub struct TeiBuilder {
    header: Option<String>,
    divs: Vec<(Option<String>, Vec<String>)>,
}

impl Default for TeiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TeiBuilder {
    pub fn new() -> Self {
        Self {
            header: Some(DEFAULT_HEADER.to_string()),
            divs: Vec::new(),
        }
    }

    pub fn header(mut self, header: &str) -> Self {
        self.header = Some(header.to_string());
        self
    }

    pub fn without_header(mut self) -> Self {
        self.header = None;
        self
    }

    /// Add a `div[@type="docbody"]` holding the given child elements
    pub fn div(mut self, id: Option<&str>, children: &[&str]) -> Self {
        self.divs.push((
            id.map(str::to_string),
            children.iter().map(|c| c.to_string()).collect(),
        ));
        self
    }

    pub fn build(&self) -> String {
        let mut out = String::from(PROLOG);
        out.push_str("<TEI xmlns=\"http://www.tei-c.org/ns/1.0\">\n");
        if let Some(header) = &self.header {
            out.push_str("  ");
            out.push_str(header);
            out.push('\n');
        }
        out.push_str("  <text>\n    <body>\n");
        for (id, children) in &self.divs {
            match id {
                Some(id) => out.push_str(&format!(
                    "      <div type=\"docbody\" xml:id=\"{}\">\n",
                    id
                )),
                None => out.push_str("      <div type=\"docbody\">\n"),
            }
            for child in children {
                out.push_str("        ");
                out.push_str(child);
                out.push('\n');
            }
            out.push_str("      </div>\n");
        }
        out.push_str("    </body>\n  </text>\n</TEI>\n");
        out
    }
}

/// The diary entry used across scenarios
pub fn diary() -> String {
    TeiBuilder::new()
        .div(
            Some("JQADiaries-v01-1820-01-01"),
            &[
                "<p>Mr. Abel lived in Boston.</p>",
                "<p>Dined with <persRef ref=\"adams-louisa\">Mrs. Adams</persRef> at Quincy.</p>",
            ],
        )
        .build()
}

pub fn write_fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("write fixture");
    path
}
