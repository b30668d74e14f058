//! Token types produced by up-conversion

/// What a tag atom does to the element structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagKind {
    /// `<name ...>`
    Start(String),
    /// `</name>`
    End(String),
    /// `<name .../>`
    Empty(String),
    /// Comments, CDATA sections, processing instructions, declarations
    Other,
}

impl TagKind {
    /// Classify a raw tag atom such as `<persRef ref="x">`.
    pub fn classify(raw: &str) -> Self {
        let inner = raw.trim_start_matches('<').trim_end_matches('>');
        if inner.starts_with('!') || inner.starts_with('?') {
            return TagKind::Other;
        }
        if let Some(rest) = inner.strip_prefix('/') {
            return TagKind::End(tag_name(rest));
        }
        if inner.ends_with('/') {
            return TagKind::Empty(tag_name(inner));
        }
        TagKind::Start(tag_name(inner))
    }

    /// Qualified element name, if this tag has one
    pub fn name(&self) -> Option<&str> {
        match self {
            TagKind::Start(name) | TagKind::End(name) | TagKind::Empty(name) => Some(name),
            TagKind::Other => None,
        }
    }

    /// Element name with any namespace prefix removed
    pub fn local_name(&self) -> Option<&str> {
        self.name().map(local_name)
    }
}

/// Strip a namespace prefix (`tei:persRef` -> `persRef`).
pub(crate) fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
}

fn tag_name(inner: &str) -> String {
    inner
        .split(|c: char| c.is_whitespace() || c == '/' || c == '>')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Kind of an atomic token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    Tag(TagKind),
}

/// One atom of an up-converted fragment.
///
/// `space_before` records whether a space separated this token from the
/// previous one, which is all [`render`](super::render) needs to restore
/// the normalised fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub raw: String,
    pub space_before: bool,
}

impl Token {
    pub fn word(raw: impl Into<String>, space_before: bool) -> Self {
        Self {
            kind: TokenKind::Word,
            raw: raw.into(),
            space_before,
        }
    }

    pub fn tag(raw: impl Into<String>, space_before: bool) -> Self {
        let raw = raw.into();
        Self {
            kind: TokenKind::Tag(TagKind::classify(&raw)),
            raw,
            space_before,
        }
    }

    pub fn is_word(&self) -> bool {
        matches!(self.kind, TokenKind::Word)
    }

    pub fn is_tag(&self) -> bool {
        matches!(self.kind, TokenKind::Tag(_))
    }

    /// The tag kind, or `None` for words
    pub fn tag_kind(&self) -> Option<&TagKind> {
        match &self.kind {
            TokenKind::Tag(kind) => Some(kind),
            TokenKind::Word => None,
        }
    }
}
