//! Generated files and the boilerplate wrapped around them.

use std::collections::BTreeMap;

use shoal_diagnostic::{DiagResult, Diagnostic, ErrorCode};

/// Comment syntax of a generated file.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CommentStyle {
    /// `/* ... */`
    C,
    /// `# ...` for typemaps and scripts.
    Hash,
}

/// Text placed at the top and bottom of every generated file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Boilerplate {
    pub header: String,
    pub footer: String,
}

impl Boilerplate {
    pub fn new(header: impl Into<String>, footer: impl Into<String>) -> Self {
        Boilerplate {
            header: header.into(),
            footer: footer.into(),
        }
    }

    /// `body` with header and footer added as comments of the given style.
    pub fn wrap(&self, body: &str, style: CommentStyle) -> String {
        let mut out = String::with_capacity(self.header.len() + body.len() + self.footer.len() + 8);
        let header = as_comment(&self.header, style);
        if !header.is_empty() {
            out.push_str(&header);
            out.push('\n');
        }
        out.push_str(body);
        if !out.ends_with('\n') {
            out.push('\n');
        }
        let footer = as_comment(&self.footer, style);
        if !footer.is_empty() {
            out.push('\n');
            out.push_str(&footer);
        }
        out
    }
}

/// Turn free text into a comment, leaving text that already is one alone.
pub fn as_comment(text: &str, style: CommentStyle) -> String {
    let trimmed = text.trim_end();
    if trimmed.trim().is_empty() {
        return String::new();
    }
    let mut out = String::with_capacity(trimmed.len() + 16);
    match style {
        CommentStyle::C => {
            if trimmed.trim_start().starts_with("/*") {
                out.push_str(trimmed);
            } else {
                out.push_str("/*");
                for line in trimmed.lines() {
                    out.push('\n');
                    out.push_str(if line.is_empty() { " *" } else { " * " });
                    out.push_str(line);
                }
                out.push_str("\n */");
            }
        }
        CommentStyle::Hash => {
            for (i, line) in trimmed.lines().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                if line.starts_with('#') {
                    out.push_str(line);
                } else if line.is_empty() {
                    out.push('#');
                } else {
                    out.push_str("# ");
                    out.push_str(line);
                }
            }
        }
    }
    out.push('\n');
    out
}

/// One generated file, addressed by a `/`-separated path relative to the
/// destination directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub path: String,
    pub content: String,
}

impl Artifact {
    fn from_entry((path, content): (String, String)) -> Self {
        Artifact { path, content }
    }
}

/// Generated files keyed by path, iterated in path order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArtifactSet {
    files: BTreeMap<String, String>,
}

impl ArtifactSet {
    pub fn new() -> Self {
        ArtifactSet::default()
    }

    /// Add a file.
    ///
    /// # Errors
    ///
    /// `E3003` if two generators produce the same path.
    pub fn insert(&mut self, path: impl Into<String>, content: String) -> DiagResult<()> {
        let path = path.into();
        if self.files.contains_key(&path) {
            return Err(Diagnostic::error(ErrorCode::E3003)
                .with_message(format!("Artifact '{path}' generated twice"))
                .with_label(path, "each generated path must be unique"));
        }
        self.files.insert(path, content);
        Ok(())
    }

    /// Move every file of `other` into this set.
    ///
    /// # Errors
    ///
    /// `E3003` on the first path present in both sets.
    pub fn merge(&mut self, other: ArtifactSet) -> DiagResult<()> {
        for (path, content) in other.files {
            self.insert(path, content)?;
        }
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }
}

impl IntoIterator for ArtifactSet {
    type Item = Artifact;
    type IntoIter = std::iter::Map<
        std::collections::btree_map::IntoIter<String, String>,
        fn((String, String)) -> Artifact,
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.files
            .into_iter()
            .map(Artifact::from_entry as fn((String, String)) -> Artifact)
    }
}
