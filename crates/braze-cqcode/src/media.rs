//! Media element model.
//!
//! A message is an ordered sequence of media elements. Each element kind
//! (plain text, mention, face, image, ...) is a plain struct implementing
//! [`MediaCodec`]: a kind tag plus an ordered field table that drives both
//! directions of the codec. The [`Media`] enum closes the set, with
//! [`Media::Unknown`] preserving unrecognized kinds as raw segments so a
//! decode/re-encode cycle never drops information.
//!
//! # Example
//!
//! ```rust,ignore
//! use braze_cqcode::{Face, Media, Message};
//!
//! let msg = Message::new().text("roll: ").with(Media::Dice(Default::default()));
//! assert_eq!(msg.to_cq_string(), "roll: [CQ:dice,type=0]");
//! let face: Face = "[CQ:face,id=14]".parse()?;
//! ```

use std::str::FromStr;

use serde_json::Value;

use crate::error::CodecError;
use crate::helpers::{NetImage, NetRecord};
use crate::segment::{Segment, parse_cq_into};

// ============================================================================
// Field tables
// ============================================================================

/// One field of a media variant: the marker key plus the accessors used by
/// both the encode and the decode path.
pub struct Field<T> {
    /// Key inside `[CQ:kind,key=value]` and in the segment data map.
    pub key: &'static str,
    /// Reads the field as a JSON value for segment data and marker output.
    pub get: fn(&T) -> Value,
    /// Weakly-typed assignment from segment data.
    pub set: fn(&mut T, &Value),
}

/// Per-variant codec contract.
///
/// The field table is declared once per variant, in wire order, and is
/// consulted by encoding (segment data, marker formatting) and decoding
/// (segment field assignment) alike. Setters are weakly typed: the wire
/// may deliver any field as a string, a number or a bool.
pub trait MediaCodec: Default + Clone + 'static {
    /// The marker kind tag, e.g. `"face"`.
    const KIND: &'static str;
    /// Fields in their fixed wire order.
    const FIELDS: &'static [Field<Self>];
}

// Weakly-typed readers. Missing coercions fall back to zero values, the
// same policy as missing keys.

pub(crate) fn weak_str(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub(crate) fn weak_i64(v: &Value) -> i64 {
    match v {
        Value::Number(n) => n.as_i64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    }
}

pub(crate) fn weak_bool(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => matches!(s.as_str(), "true" | "1"),
        _ => false,
    }
}

// ============================================================================
// Element variants
// ============================================================================

/// Plain text run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text {
    pub text: String,
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl MediaCodec for Text {
    const KIND: &'static str = "text";
    const FIELDS: &'static [Field<Self>] = &[Field {
        key: "text",
        get: |m| Value::from(m.text.clone()),
        set: |m, v| m.text = weak_str(v),
    }];
}

/// Mention (@ someone).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct At {
    /// Account id of the mentioned user, or `"all"` for everyone.
    pub qq: String,
}

impl At {
    pub fn new(qq: impl Into<String>) -> Self {
        Self { qq: qq.into() }
    }

    /// Mentions every member of the chat.
    pub fn all() -> Self {
        Self { qq: "all".to_string() }
    }
}

impl MediaCodec for At {
    const KIND: &'static str = "at";
    const FIELDS: &'static [Field<Self>] = &[Field {
        key: "qq",
        get: |m| Value::from(m.qq.clone()),
        set: |m, v| m.qq = weak_str(v),
    }];
}

/// Built-in sticker face, referenced by numeric id.
///
/// The bundled name table enables lookups in both directions, see
/// [`Face::from_name`] and [`Face::name`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Face {
    pub id: i64,
}

impl Face {
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

impl MediaCodec for Face {
    const KIND: &'static str = "face";
    const FIELDS: &'static [Field<Self>] = &[Field {
        key: "id",
        get: |m| Value::from(m.id),
        set: |m, v| m.id = weak_i64(v),
    }];
}

/// Unicode emoji, referenced by its decimal code point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Emoji {
    pub id: i64,
}

impl MediaCodec for Emoji {
    const KIND: &'static str = "emoji";
    const FIELDS: &'static [Field<Self>] = &[Field {
        key: "id",
        get: |m| Value::from(m.id),
        set: |m, v| m.id = weak_i64(v),
    }];
}

/// Big custom sticker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bface {
    pub id: i64,
}

impl MediaCodec for Bface {
    const KIND: &'static str = "bface";
    const FIELDS: &'static [Field<Self>] = &[Field {
        key: "id",
        get: |m| Value::from(m.id),
        set: |m, v| m.id = weak_i64(v),
    }];
}

/// Small sticker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sface {
    pub id: i64,
}

impl MediaCodec for Sface {
    const KIND: &'static str = "sface";
    const FIELDS: &'static [Field<Self>] = &[Field {
        key: "id",
        get: |m| Value::from(m.id),
        set: |m, v| m.id = weak_i64(v),
    }];
}

/// Image reference: a gateway file id, a `file://` path, a `base64://`
/// payload or a remote URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Image {
    pub file: String,
    /// Download URL, filled on received images.
    pub url: String,
}

impl Image {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            url: String::new(),
        }
    }
}

impl MediaCodec for Image {
    const KIND: &'static str = "image";
    const FIELDS: &'static [Field<Self>] = &[
        Field {
            key: "file",
            get: |m| Value::from(m.file.clone()),
            set: |m, v| m.file = weak_str(v),
        },
        Field {
            key: "url",
            get: |m| Value::from(m.url.clone()),
            set: |m, v| m.url = weak_str(v),
        },
    ];
}

/// Audio record reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub file: String,
    /// Voice-change effect.
    pub magic: bool,
    /// Download URL, filled on received records.
    pub url: String,
}

impl Record {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Default::default()
        }
    }
}

impl MediaCodec for Record {
    const KIND: &'static str = "record";
    const FIELDS: &'static [Field<Self>] = &[
        Field {
            key: "file",
            get: |m| Value::from(m.file.clone()),
            set: |m, v| m.file = weak_str(v),
        },
        Field {
            key: "magic",
            get: |m| Value::from(m.magic),
            set: |m, v| m.magic = weak_bool(v),
        },
        Field {
            key: "url",
            get: |m| Value::from(m.url.clone()),
            set: |m, v| m.url = weak_str(v),
        },
    ];
}

/// Rock-paper-scissors system action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rps {
    /// Thrown hand, see the associated constants.
    pub value: i64,
}

impl Rps {
    pub const ROCK: i64 = 1;
    pub const PAPER: i64 = 2;
    pub const SCISSORS: i64 = 3;
}

impl MediaCodec for Rps {
    const KIND: &'static str = "rps";
    const FIELDS: &'static [Field<Self>] = &[Field {
        key: "type",
        get: |m| Value::from(m.value),
        set: |m, v| m.value = weak_i64(v),
    }];
}

/// Dice roll system action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dice {
    /// Rolled value, 1 through 6.
    pub value: i64,
}

impl MediaCodec for Dice {
    const KIND: &'static str = "dice";
    const FIELDS: &'static [Field<Self>] = &[Field {
        key: "type",
        get: |m| Value::from(m.value),
        set: |m, v| m.value = weak_i64(v),
    }];
}

/// Window-shake system action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shake {}

impl MediaCodec for Shake {
    const KIND: &'static str = "shake";
    const FIELDS: &'static [Field<Self>] = &[];
}

/// Music share card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Music {
    /// Provider: `"qq"`, `"163"`, `"xiami"` or `"custom"`.
    pub music_type: String,
    /// Track id for provider-hosted music.
    pub id: String,
    /// Click-through link for custom cards.
    pub url: String,
    /// Audio link for custom cards.
    pub audio: String,
    pub title: String,
    pub content: String,
    /// Cover image link.
    pub image: String,
}

impl Music {
    /// Whether this card carries its own links instead of a provider id.
    pub fn is_custom(&self) -> bool {
        self.music_type == "custom"
    }
}

impl MediaCodec for Music {
    const KIND: &'static str = "music";
    const FIELDS: &'static [Field<Self>] = &[
        Field {
            key: "type",
            get: |m| Value::from(m.music_type.clone()),
            set: |m, v| m.music_type = weak_str(v),
        },
        Field {
            key: "id",
            get: |m| Value::from(m.id.clone()),
            set: |m, v| m.id = weak_str(v),
        },
        Field {
            key: "url",
            get: |m| Value::from(m.url.clone()),
            set: |m, v| m.url = weak_str(v),
        },
        Field {
            key: "audio",
            get: |m| Value::from(m.audio.clone()),
            set: |m, v| m.audio = weak_str(v),
        },
        Field {
            key: "title",
            get: |m| Value::from(m.title.clone()),
            set: |m, v| m.title = weak_str(v),
        },
        Field {
            key: "content",
            get: |m| Value::from(m.content.clone()),
            set: |m, v| m.content = weak_str(v),
        },
        Field {
            key: "image",
            get: |m| Value::from(m.image.clone()),
            set: |m, v| m.image = weak_str(v),
        },
    ];
}

/// Link share card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Share {
    pub url: String,
    pub title: String,
    pub content: String,
    /// Cover image link.
    pub image: String,
}

impl MediaCodec for Share {
    const KIND: &'static str = "share";
    const FIELDS: &'static [Field<Self>] = &[
        Field {
            key: "url",
            get: |m| Value::from(m.url.clone()),
            set: |m, v| m.url = weak_str(v),
        },
        Field {
            key: "title",
            get: |m| Value::from(m.title.clone()),
            set: |m, v| m.title = weak_str(v),
        },
        Field {
            key: "content",
            get: |m| Value::from(m.content.clone()),
            set: |m, v| m.content = weak_str(v),
        },
        Field {
            key: "image",
            get: |m| Value::from(m.image.clone()),
            set: |m, v| m.image = weak_str(v),
        },
    ];
}

/// Location card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub lat: String,
    pub lon: String,
    pub title: String,
    pub content: String,
}

impl MediaCodec for Location {
    const KIND: &'static str = "location";
    const FIELDS: &'static [Field<Self>] = &[
        Field {
            key: "lat",
            get: |m| Value::from(m.lat.clone()),
            set: |m, v| m.lat = weak_str(v),
        },
        Field {
            key: "lon",
            get: |m| Value::from(m.lon.clone()),
            set: |m, v| m.lon = weak_str(v),
        },
        Field {
            key: "title",
            get: |m| Value::from(m.title.clone()),
            set: |m, v| m.title = weak_str(v),
        },
        Field {
            key: "content",
            get: |m| Value::from(m.content.clone()),
            set: |m, v| m.content = weak_str(v),
        },
    ];
}

/// Avatar-show system action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Show {
    pub id: i64,
}

impl MediaCodec for Show {
    const KIND: &'static str = "show";
    const FIELDS: &'static [Field<Self>] = &[Field {
        key: "id",
        get: |m| Value::from(m.id),
        set: |m, v| m.id = weak_i64(v),
    }];
}

/// Sign-in card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sign {}

impl MediaCodec for Sign {
    const KIND: &'static str = "sign";
    const FIELDS: &'static [Field<Self>] = &[];
}

/// Other rich media the gateway renders itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rich {}

impl MediaCodec for Rich {
    const KIND: &'static str = "rich";
    const FIELDS: &'static [Field<Self>] = &[];
}

// ============================================================================
// Media — the closed element set
// ============================================================================

/// Any kind of media that can appear in a message.
///
/// Unrecognized kinds are preserved as [`Media::Unknown`] carrying the raw
/// segment, so decoding and re-encoding a message never drops information.
#[derive(Debug, Clone, PartialEq)]
pub enum Media {
    Text(Text),
    At(At),
    Face(Face),
    Emoji(Emoji),
    Bface(Bface),
    Sface(Sface),
    Image(Image),
    /// Image referencing a network resource, with a cache modifier.
    NetImage(NetImage),
    Record(Record),
    /// Record referencing a network resource, with a cache modifier.
    NetRecord(NetRecord),
    Rps(Rps),
    Dice(Dice),
    Shake(Shake),
    Music(Music),
    Share(Share),
    Location(Location),
    Show(Show),
    Sign(Sign),
    Rich(Rich),
    /// Pass-through for kinds this library does not model.
    Unknown(Segment),
}

impl Media {
    /// Returns the kind tag of this element.
    pub fn kind(&self) -> &str {
        match self {
            Media::Text(_) => Text::KIND,
            Media::At(_) => At::KIND,
            Media::Face(_) => Face::KIND,
            Media::Emoji(_) => Emoji::KIND,
            Media::Bface(_) => Bface::KIND,
            Media::Sface(_) => Sface::KIND,
            Media::Image(_) => Image::KIND,
            Media::NetImage(_) => NetImage::KIND,
            Media::Record(_) => Record::KIND,
            Media::NetRecord(_) => NetRecord::KIND,
            Media::Rps(_) => Rps::KIND,
            Media::Dice(_) => Dice::KIND,
            Media::Shake(_) => Shake::KIND,
            Media::Music(_) => Music::KIND,
            Media::Share(_) => Share::KIND,
            Media::Location(_) => Location::KIND,
            Media::Show(_) => Show::KIND,
            Media::Sign(_) => Sign::KIND,
            Media::Rich(_) => Rich::KIND,
            Media::Unknown(seg) => &seg.kind,
        }
    }

    /// Converts this element to its loosely-typed segment form.
    pub fn to_segment(&self) -> Segment {
        match self {
            Media::Text(m) => Segment::from_media(m),
            Media::At(m) => Segment::from_media(m),
            Media::Face(m) => Segment::from_media(m),
            Media::Emoji(m) => Segment::from_media(m),
            Media::Bface(m) => Segment::from_media(m),
            Media::Sface(m) => Segment::from_media(m),
            Media::Image(m) => Segment::from_media(m),
            Media::NetImage(m) => Segment::from_media(m),
            Media::Record(m) => Segment::from_media(m),
            Media::NetRecord(m) => Segment::from_media(m),
            Media::Rps(m) => Segment::from_media(m),
            Media::Dice(m) => Segment::from_media(m),
            Media::Shake(m) => Segment::from_media(m),
            Media::Music(m) => Segment::from_media(m),
            Media::Share(m) => Segment::from_media(m),
            Media::Location(m) => Segment::from_media(m),
            Media::Show(m) => Segment::from_media(m),
            Media::Sign(m) => Segment::from_media(m),
            Media::Rich(m) => Segment::from_media(m),
            Media::Unknown(seg) => seg.clone(),
        }
    }

    /// Formats this element as its CQ string.
    ///
    /// Text yields the escaped run with no brackets; everything else
    /// yields a `[CQ:...]` marker.
    pub fn to_cq(&self) -> String {
        self.to_segment().to_cq()
    }

    /// Builds the typed element for a segment, selected by its kind.
    ///
    /// Never fails: an unrecognized kind becomes [`Media::Unknown`].
    pub fn from_segment(seg: &Segment) -> Media {
        // The kind is matched here, so only the fields remain to apply
        // and the per-variant decode cannot report a mismatch.
        fn typed<T: MediaCodec>(seg: &Segment) -> T {
            let mut media = T::default();
            let _ = seg.decode_into(&mut media);
            media
        }

        match seg.kind.as_str() {
            "text" => Media::Text(typed(seg)),
            "at" => Media::At(typed(seg)),
            "face" => Media::Face(typed(seg)),
            "emoji" => Media::Emoji(typed(seg)),
            "bface" => Media::Bface(typed(seg)),
            "sface" => Media::Sface(typed(seg)),
            "image" => Media::Image(typed(seg)),
            "record" => Media::Record(typed(seg)),
            "rps" => Media::Rps(typed(seg)),
            "dice" => Media::Dice(typed(seg)),
            "shake" => Media::Shake(typed(seg)),
            "music" => Media::Music(typed(seg)),
            "share" => Media::Share(typed(seg)),
            "location" => Media::Location(typed(seg)),
            "show" => Media::Show(typed(seg)),
            "sign" => Media::Sign(typed(seg)),
            "rich" => Media::Rich(typed(seg)),
            _ => Media::Unknown(seg.clone()),
        }
    }

    /// Returns the text content if this is a text element.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Media::Text(t) => Some(&t.text),
            _ => None,
        }
    }
}

impl From<Text> for Media {
    fn from(m: Text) -> Self {
        Media::Text(m)
    }
}

impl From<At> for Media {
    fn from(m: At) -> Self {
        Media::At(m)
    }
}

impl From<Face> for Media {
    fn from(m: Face) -> Self {
        Media::Face(m)
    }
}

impl From<Emoji> for Media {
    fn from(m: Emoji) -> Self {
        Media::Emoji(m)
    }
}

impl From<Bface> for Media {
    fn from(m: Bface) -> Self {
        Media::Bface(m)
    }
}

impl From<Sface> for Media {
    fn from(m: Sface) -> Self {
        Media::Sface(m)
    }
}

impl From<Image> for Media {
    fn from(m: Image) -> Self {
        Media::Image(m)
    }
}

impl From<NetImage> for Media {
    fn from(m: NetImage) -> Self {
        Media::NetImage(m)
    }
}

impl From<Record> for Media {
    fn from(m: Record) -> Self {
        Media::Record(m)
    }
}

impl From<NetRecord> for Media {
    fn from(m: NetRecord) -> Self {
        Media::NetRecord(m)
    }
}

impl From<Rps> for Media {
    fn from(m: Rps) -> Self {
        Media::Rps(m)
    }
}

impl From<Dice> for Media {
    fn from(m: Dice) -> Self {
        Media::Dice(m)
    }
}

impl From<Shake> for Media {
    fn from(m: Shake) -> Self {
        Media::Shake(m)
    }
}

impl From<Music> for Media {
    fn from(m: Music) -> Self {
        Media::Music(m)
    }
}

impl From<Share> for Media {
    fn from(m: Share) -> Self {
        Media::Share(m)
    }
}

impl From<Location> for Media {
    fn from(m: Location) -> Self {
        Media::Location(m)
    }
}

impl From<Show> for Media {
    fn from(m: Show) -> Self {
        Media::Show(m)
    }
}

impl From<Sign> for Media {
    fn from(m: Sign) -> Self {
        Media::Sign(m)
    }
}

impl From<Rich> for Media {
    fn from(m: Rich) -> Self {
        Media::Rich(m)
    }
}

impl From<Segment> for Media {
    fn from(seg: Segment) -> Self {
        Media::from_segment(&seg)
    }
}

// Strict single-marker parsing for the typed variants.
impl FromStr for Face {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut face = Face::default();
        parse_cq_into(s, &mut face)?;
        Ok(face)
    }
}

impl FromStr for Text {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut text = Text::default();
        parse_cq_into(s, &mut text)?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(Media::from(Face::new(14)).kind(), "face");
        assert_eq!(Media::from(Text::new("hi")).kind(), "text");
        assert_eq!(Media::from(Shake {}).kind(), "shake");
    }

    #[test]
    fn test_field_table_roundtrip() {
        let record = Record {
            file: "1.amr".to_string(),
            magic: true,
            url: "http://example.com/1.amr".to_string(),
        };
        let seg = Segment::from_media(&record);
        assert_eq!(seg.kind, "record");
        let back: Record = seg.decode().unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_weak_typing() {
        // The wire frequently delivers numbers and bools as strings.
        assert_eq!(weak_i64(&Value::from("14")), 14);
        assert_eq!(weak_i64(&Value::from(14)), 14);
        assert_eq!(weak_i64(&Value::from("junk")), 0);
        assert!(weak_bool(&Value::from("true")));
        assert!(weak_bool(&Value::from("1")));
        assert!(!weak_bool(&Value::from("0")));
        assert_eq!(weak_str(&Value::from(14)), "14");
        assert_eq!(weak_str(&Value::from(true)), "true");
    }

    #[test]
    fn test_from_segment_unknown_passthrough() {
        let seg = Segment::parse_cq("[CQ:fancy,foo=1,bar=x]").unwrap();
        let media = Media::from_segment(&seg);
        assert!(matches!(media, Media::Unknown(_)));
        assert_eq!(media.kind(), "fancy");
        assert_eq!(media.to_cq(), "[CQ:fancy,foo=1,bar=x]");
    }

    #[test]
    fn test_parse_face_from_str() {
        let face: Face = "[CQ:face,id=14]".parse().unwrap();
        assert_eq!(face.id, 14);

        let err = "&#91;he&#44;ym".parse::<Face>().unwrap_err();
        assert_eq!(err, CodecError::InvalidCode);

        let text: Text = "&#91;he&#44;ym".parse().unwrap();
        assert_eq!(text.text, "[he,ym");

        let err = "[CQ:face,id=14]".parse::<Text>().unwrap_err();
        assert!(matches!(err, CodecError::WrongMediaType { expected: "text", .. }));
    }
}
