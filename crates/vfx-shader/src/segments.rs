//! The five ordered text segments of a generated shader.

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

/// One of the ordered segments making up a shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Uniforms, textures and other global declarations.
    Declarations,
    /// Helper functions called from the main function.
    Helpers,
    /// Signature and opening of the main function.
    FunctionHeader,
    /// Color transform steps.
    FunctionBody,
    /// Return statement and closing of the main function.
    FunctionFooter,
}

impl Segment {
    /// Segments in assembly order.
    pub const ALL: [Segment; 5] = [
        Segment::Declarations,
        Segment::Helpers,
        Segment::FunctionHeader,
        Segment::FunctionBody,
        Segment::FunctionFooter,
    ];

    /// Comment injected before the first fragment of this segment.
    pub fn banner(&self) -> &'static str {
        match self {
            Segment::Declarations => "\n// Declaration of all variables\n\n",
            Segment::Helpers => "\n// Declaration of all helper methods\n\n",
            Segment::FunctionHeader => "\n// Declaration of the main shader function\n\n",
            Segment::FunctionBody => "\n// Add the color transforms\n\n",
            Segment::FunctionFooter => "\n// Close the main shader function\n\n",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Append-only text buffers, one per [`Segment`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderSegments {
    texts: [String; 5],
}

impl ShaderSegments {
    /// Creates empty segments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment. Empty fragments are ignored; the first non-empty
    /// one is preceded by the segment banner.
    pub fn append(&mut self, segment: Segment, code: &str) {
        if code.is_empty() {
            return;
        }
        let text = &mut self.texts[segment.slot()];
        if text.is_empty() {
            text.push_str(segment.banner());
        }
        text.push_str(code);
    }

    /// Current text of a segment.
    pub fn get(&self, segment: Segment) -> &str {
        &self.texts[segment.slot()]
    }

    /// Returns true if no segment received any fragment.
    pub fn is_empty(&self) -> bool {
        self.texts.iter().all(String::is_empty)
    }

    /// Concatenates `header`, all segments in order, then `footer`.
    pub fn assemble(&self, header: &str, footer: &str) -> String {
        let len = header.len() + footer.len() + self.texts.iter().map(String::len).sum::<usize>();
        let mut out = String::with_capacity(len);
        out.push_str(header);
        for text in &self.texts {
            out.push_str(text);
        }
        out.push_str(footer);
        out
    }
}

impl fmt::Display for ShaderSegments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.texts.iter().try_for_each(|t| f.write_str(t))
    }
}

/// Hex SHA-256 of the program text, used as the content part of cache keys.
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Fully assembled program and its content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledProgram {
    text: Arc<str>,
    hash: String,
}

impl AssembledProgram {
    /// Hashes `text`.
    pub fn new(text: String) -> Self {
        let hash = content_hash(&text);
        Self {
            text: text.into(),
            hash,
        }
    }

    /// Program source.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Shared handle to the program source.
    pub fn shared_text(&self) -> Arc<str> {
        Arc::clone(&self.text)
    }

    /// Content hash.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Short form of the hash for log lines.
    pub fn short_hash(&self) -> String {
        self.hash[..8.min(self.hash.len())].to_string()
    }
}
