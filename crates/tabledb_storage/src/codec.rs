//! JSON encoding of whole documents.

use crate::document::Document;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

/// Indentation used when writing a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Indent {
    /// Everything on one line.
    #[default]
    Compact,
    /// Pretty-printed with the given number of spaces per level.
    Spaces(usize),
}

impl Indent {
    /// Maps an optional `json.spaces` setting to an indentation.
    ///
    /// `None` and `Some(0)` both mean compact output.
    #[must_use]
    pub const fn from_spaces(spaces: Option<usize>) -> Self {
        match spaces {
            None | Some(0) => Self::Compact,
            Some(n) => Self::Spaces(n),
        }
    }
}

/// Serializes a document to JSON bytes.
pub fn encode(doc: &Document, indent: Indent) -> serde_json::Result<Vec<u8>> {
    match indent {
        Indent::Compact => serde_json::to_vec(doc),
        Indent::Spaces(n) => {
            let pad = vec![b' '; n];
            let mut buf = Vec::new();
            let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(&pad));
            doc.serialize(&mut ser)?;
            Ok(buf)
        }
    }
}

/// Parses JSON bytes into a document.
pub fn decode(bytes: &[u8]) -> serde_json::Result<Document> {
    serde_json::from_slice(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        decode(br#"{"users":[{"_id":"a","name":"Tom","tags":["x"]}],"posts":[]}"#).unwrap()
    }

    #[test]
    fn compact_has_no_newlines() {
        let bytes = encode(&sample(), Indent::Compact).unwrap();
        assert!(!bytes.contains(&b'\n'));
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            r#"{"users":[{"_id":"a","name":"Tom","tags":["x"]}],"posts":[]}"#
        );
    }

    #[test]
    fn spaces_indent_each_level() {
        let text = String::from_utf8(encode(&sample(), Indent::Spaces(2)).unwrap()).unwrap();
        assert!(text.starts_with("{\n  \"users\": [\n    {\n      \"_id\""));
        assert!(text.contains("\"posts\": []"));
    }

    #[test]
    fn zero_spaces_is_compact() {
        assert_eq!(Indent::from_spaces(Some(0)), Indent::Compact);
        assert_eq!(Indent::from_spaces(None), Indent::Compact);
        assert_eq!(Indent::from_spaces(Some(4)), Indent::Spaces(4));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode(b"").is_err());
        assert!(decode(b"{not json").is_err());
        assert!(decode(b"\"text\"").is_err());
    }

    #[test]
    fn pretty_output_decodes_to_same_document() {
        let doc = sample();
        let bytes = encode(&doc, Indent::Spaces(4)).unwrap();
        assert_eq!(decode(&bytes).unwrap(), doc);
    }
}
