//! Loosely-typed message segments.
//!
//! A [`Segment`] is the pivot representation between the typed element
//! model and the two wire shapes: the `[CQ:kind,key=value,...]` marker
//! string and the JSON array of `{"type": ..., "data": {...}}` records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CodecError, CodecResult};
use crate::escape::{escape_text, escape_value, unescape_text, unescape_value};
use crate::media::{MediaCodec, Text, weak_str};

/// A single `{type, data}` message segment.
///
/// Field order in `data` is first-seen insertion order and is preserved
/// through decode/re-encode cycles, so markers of unrecognized kinds
/// round-trip byte-exactly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Kind tag, e.g. `"face"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Field map.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl Segment {
    /// Creates an empty segment of the given kind.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            data: Map::new(),
        }
    }

    /// Creates a plain text segment.
    pub fn text(text: impl Into<String>) -> Self {
        let mut data = Map::new();
        data.insert("text".to_string(), Value::from(text.into()));
        Self {
            kind: "text".to_string(),
            data,
        }
    }

    /// Builds the segment form of a typed element through its field table.
    pub fn from_media<T: MediaCodec>(media: &T) -> Segment {
        let mut data = Map::new();
        for field in T::FIELDS {
            data.insert(field.key.to_string(), (field.get)(media));
        }
        Segment {
            kind: T::KIND.to_string(),
            data,
        }
    }

    /// Parses a `[CQ:...]` marker.
    ///
    /// Returns `None` when the input does not have the marker shape; the
    /// caller decides whether that means plain text or an error.
    pub fn parse_cq(input: &str) -> Option<Segment> {
        if input.len() <= 5 || !input.starts_with("[CQ:") || !input.ends_with(']') {
            return None;
        }
        let body = &input[4..input.len() - 1];
        let mut parts = body.split(',');
        let kind = parts.next().unwrap_or_default().to_string();
        let mut data = Map::new();
        for part in parts {
            // A value may itself contain `=`; only the first one splits.
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            data.insert(key.to_string(), Value::from(unescape_value(value)));
        }
        Some(Segment { kind, data })
    }

    /// Parses a marker, falling back to a text segment for non-marker
    /// input.
    pub fn from_cq(input: &str) -> Segment {
        Segment::parse_cq(input).unwrap_or_else(|| Segment::text(unescape_text(input)))
    }

    /// Formats this segment as its CQ string.
    ///
    /// A `text` segment yields the escaped run with no brackets; it is
    /// protected plain text, not a marker.
    pub fn to_cq(&self) -> String {
        if self.kind == Text::KIND {
            return self
                .data
                .get("text")
                .map(|v| escape_text(&weak_str(v)))
                .unwrap_or_default();
        }
        let mut out = format!("[CQ:{}", self.kind);
        for (key, value) in &self.data {
            out.push(',');
            out.push_str(key);
            out.push('=');
            out.push_str(&escape_value(&weak_str(value)));
        }
        out.push(']');
        out
    }

    /// Best-effort decode into an existing typed element.
    ///
    /// Name-matching fields are applied first; missing keys keep their
    /// current values and unknown keys are ignored. A kind mismatch is
    /// then reported as [`CodecError::WrongMediaType`]; the copied fields
    /// stay applied.
    pub fn decode_into<T: MediaCodec>(&self, media: &mut T) -> CodecResult<()> {
        for field in T::FIELDS {
            if let Some(value) = self.data.get(field.key) {
                (field.set)(media, value);
            }
        }
        if self.kind != T::KIND {
            return Err(CodecError::WrongMediaType {
                expected: T::KIND,
                actual: self.kind.clone(),
            });
        }
        Ok(())
    }

    /// Decodes this segment into a fresh typed element.
    pub fn decode<T: MediaCodec>(&self) -> CodecResult<T> {
        let mut media = T::default();
        self.decode_into(&mut media)?;
        Ok(media)
    }
}

/// Parses a single CQ-encoded string into a specific element type.
///
/// Non-marker input (no bracket pair, or an empty body) decodes into a
/// text target as unescaped plain text; any other target fails with
/// [`CodecError::InvalidCode`].
pub fn parse_cq_into<T: MediaCodec>(input: &str, media: &mut T) -> CodecResult<()> {
    match Segment::parse_cq(input) {
        Some(seg) => seg.decode_into(media),
        None if T::KIND == Text::KIND => {
            let decoded = Value::from(unescape_text(input));
            for field in T::FIELDS {
                if field.key == "text" {
                    (field.set)(media, &decoded);
                }
            }
            Ok(())
        }
        None => Err(CodecError::InvalidCode),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{Face, Image};

    #[test]
    fn test_parse_cq() {
        let seg = Segment::parse_cq("[CQ:face,id=14]").unwrap();
        assert_eq!(seg.kind, "face");
        assert_eq!(seg.data.get("id"), Some(&Value::from("14")));

        assert!(Segment::parse_cq("[CQ:]").is_none());
        assert!(Segment::parse_cq("no markers here").is_none());
        assert!(Segment::parse_cq("[CQ:face,id=14").is_none());
    }

    #[test]
    fn test_parse_cq_value_with_equals_and_commas() {
        let seg = Segment::parse_cq("[CQ:share,url=http://e.com/?a=1&#44;2,title=t]").unwrap();
        assert_eq!(seg.data.get("url"), Some(&Value::from("http://e.com/?a=1,2")));
        assert_eq!(seg.data.get("title"), Some(&Value::from("t")));
    }

    #[test]
    fn test_from_cq_text_fallback() {
        let seg = Segment::from_cq("&#91;he&#44;ym");
        assert_eq!(seg.kind, "text");
        assert_eq!(seg.data.get("text"), Some(&Value::from("[he,ym")));
    }

    #[test]
    fn test_to_cq() {
        let shake = Segment::new("shake");
        assert_eq!(shake.to_cq(), "[CQ:shake]");

        let text = Segment::text("[,]&");
        assert_eq!(text.to_cq(), "&#91;,&#93;&amp;");

        let seg = Segment::from_media(&Image::new("a,b.jpg"));
        assert_eq!(seg.to_cq(), "[CQ:image,file=a&#44;b.jpg,url=]");
    }

    #[test]
    fn test_unknown_kind_roundtrip() {
        // First-seen field order survives a decode/re-encode cycle.
        let raw = "[CQ:fancy,zeta=1,alpha=2,mid=a&#44;b]";
        let seg = Segment::parse_cq(raw).unwrap();
        assert_eq!(seg.to_cq(), raw);
    }

    #[test]
    fn test_decode_wrong_media_type() {
        let seg = Segment::parse_cq("[CQ:face,id=14]").unwrap();
        let err = seg.decode::<crate::media::Text>().unwrap_err();
        assert_eq!(
            err,
            CodecError::WrongMediaType {
                expected: "text",
                actual: "face".to_string()
            }
        );

        // Name-matching fields still land despite the mismatch.
        let mut image = Image::default();
        let seg = Segment::parse_cq("[CQ:record,file=1.amr,magic=true]").unwrap();
        let err = seg.decode_into(&mut image).unwrap_err();
        assert!(matches!(err, CodecError::WrongMediaType { .. }));
        assert_eq!(image.file, "1.amr");
    }

    #[test]
    fn test_decode_weakly_typed_id() {
        let seg = Segment::parse_cq("[CQ:face,id=14]").unwrap();
        let face: Face = seg.decode().unwrap();
        assert_eq!(face.id, 14);
    }

    #[test]
    fn test_segment_json_shape() {
        let seg = Segment::from_media(&Face::new(178));
        let json = serde_json::to_string(&seg).unwrap();
        assert_eq!(json, r#"{"type":"face","data":{"id":178}}"#);

        let seg: Segment = serde_json::from_str(r#"{"type":"at","data":{"qq":"all"}}"#).unwrap();
        assert_eq!(seg.kind, "at");
        assert_eq!(seg.data.get("qq"), Some(&Value::from("all")));
    }
}
