//! Message container and whole-message conversions.
//!
//! A [`Message`] is an ordered sequence of [`Media`] elements; insertion
//! order is transmission order. The container converts to and from both
//! wire shapes (the concatenated CQ string and the segment array) and
//! feeds the command extractor.
//!
//! # Example
//!
//! ```rust,ignore
//! use braze_cqcode::Message;
//!
//! let msg = Message::new().text("Hello, ").at("10001000").text("!");
//! assert_eq!(msg.to_cq_string(), "Hello, [CQ:at,qq=10001000]!");
//!
//! let back = Message::from_cq_string("A[CQ:shake]B");
//! assert_eq!(back.len(), 3);
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::command::{self, CommandConfig};
use crate::escape::unescape_text;
use crate::media::{
    At, Bface, Dice, Emoji, Face, Image, Media, Music, Record, Rps, Sface, Shake, Share, Show,
    Sign, Text,
};
use crate::segment::Segment;

/// Non-greedy marker pattern used to scan mixed text.
static CQ_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[CQ:[\s\S]*?\]").expect("valid marker pattern"));

/// An ordered, append-only sequence of media elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    media: Vec<Media>,
}

// ============================================================================
// Construction
// ============================================================================

impl Message {
    /// Creates an empty message.
    pub fn new() -> Self {
        Self { media: Vec::new() }
    }

    /// Creates a message from a vector of elements.
    pub fn from_media(media: Vec<Media>) -> Self {
        Self { media }
    }

    /// Creates a message containing only plain text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            media: vec![Media::Text(Text::new(text))],
        }
    }

    /// Decodes a mixed text/marker string.
    ///
    /// Gaps between markers become text elements; unrecognized marker
    /// kinds are preserved as pass-through elements. Never fails.
    pub fn from_cq_string(input: &str) -> Self {
        Self::from_segments(segments_from_cq_string(input))
    }

    /// Converts a segment array, dispatching each segment by kind.
    pub fn from_segments(segments: impl IntoIterator<Item = Segment>) -> Self {
        Self {
            media: segments
                .into_iter()
                .map(|seg| Media::from_segment(&seg))
                .collect(),
        }
    }

    /// Decodes the polymorphic wire shape of a message payload: either a
    /// CQ string or a segment array. Array items that are not segment
    /// records are skipped.
    pub fn parse(value: &Value) -> Self {
        match value {
            Value::String(s) => Self::from_cq_string(s),
            Value::Array(items) => Self::from_segments(
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok()),
            ),
            _ => Self::new(),
        }
    }
}

// ============================================================================
// Access
// ============================================================================

impl Message {
    /// Returns the elements in transmission order.
    pub fn media(&self) -> &[Media] {
        &self.media
    }

    /// Returns an iterator over the elements.
    pub fn iter(&self) -> std::slice::Iter<'_, Media> {
        self.media.iter()
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.media.len()
    }

    /// Returns true if the message has no elements.
    pub fn is_empty(&self) -> bool {
        self.media.is_empty()
    }

    /// Appends an element.
    pub fn push(&mut self, media: impl Into<Media>) -> &mut Self {
        self.media.push(media.into());
        self
    }

    /// Appends multiple elements.
    pub fn extend(&mut self, media: impl IntoIterator<Item = Media>) -> &mut Self {
        self.media.extend(media);
        self
    }

    /// Concatenates the content of all text elements.
    pub fn extract_plain_text(&self) -> String {
        self.media.iter().filter_map(Media::as_text).collect()
    }
}

// ============================================================================
// Builder methods
// ============================================================================

impl Message {
    /// Appends any element.
    pub fn with(mut self, media: impl Into<Media>) -> Self {
        self.media.push(media.into());
        self
    }

    /// Appends a text element.
    pub fn text(self, text: impl Into<String>) -> Self {
        self.with(Text::new(text))
    }

    /// Appends a mention.
    pub fn at(self, qq: impl Into<String>) -> Self {
        self.with(At::new(qq))
    }

    /// Appends an @all mention.
    pub fn at_all(self) -> Self {
        self.with(At::all())
    }

    /// Appends a face by id.
    pub fn face(self, id: i64) -> Self {
        self.with(Face::new(id))
    }

    /// Appends an emoji by code point.
    pub fn emoji(self, id: i64) -> Self {
        self.with(Emoji { id })
    }

    /// Appends a big sticker.
    pub fn bface(self, id: i64) -> Self {
        self.with(Bface { id })
    }

    /// Appends a small sticker.
    pub fn sface(self, id: i64) -> Self {
        self.with(Sface { id })
    }

    /// Appends an image by file reference.
    pub fn image(self, file: impl Into<String>) -> Self {
        self.with(Image::new(file))
    }

    /// Appends an audio record by file reference.
    pub fn record(self, file: impl Into<String>) -> Self {
        self.with(Record::new(file))
    }

    /// Appends a rock-paper-scissors action.
    pub fn rps(self) -> Self {
        self.with(Rps::default())
    }

    /// Appends a dice roll.
    pub fn dice(self) -> Self {
        self.with(Dice::default())
    }

    /// Appends a window shake.
    pub fn shake(self) -> Self {
        self.with(Shake {})
    }

    /// Appends a music card.
    pub fn music(self, music: Music) -> Self {
        self.with(music)
    }

    /// Appends a link share card.
    pub fn share(self, share: Share) -> Self {
        self.with(share)
    }

    /// Appends an avatar show.
    pub fn show(self, id: i64) -> Self {
        self.with(Show { id })
    }

    /// Appends a sign-in card.
    pub fn sign(self) -> Self {
        self.with(Sign {})
    }
}

// ============================================================================
// Wire conversions
// ============================================================================

impl Message {
    /// Encodes the message as one CQ string.
    ///
    /// Elements are concatenated in order with no separators; markers and
    /// escaped text are self-delimiting.
    pub fn to_cq_string(&self) -> String {
        self.media.iter().map(Media::to_cq).collect()
    }

    /// Converts the message to its segment-array form.
    pub fn segments(&self) -> Vec<Segment> {
        self.media.iter().map(Media::to_segment).collect()
    }
}

// ============================================================================
// Command extraction
// ============================================================================

impl Message {
    /// Reports whether this message is a command under `config`.
    pub fn is_command(&self, config: &CommandConfig) -> bool {
        command::is_command(&self.to_cq_string(), config)
    }

    /// Splits this message into a command token and its arguments.
    ///
    /// Tokens keep their CQ encoding; re-run [`Message::from_cq_string`]
    /// on an argument to get typed media back out of it.
    pub fn command(&self, config: &CommandConfig) -> (String, Vec<String>) {
        command::parse_command(&self.to_cq_string(), config)
    }
}

// ============================================================================
// Serialization
// ============================================================================

impl Serialize for Message {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Always serialize as the segment-array format.
        self.segments().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // The gateway delivers either shape depending on its configuration.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Array(Vec<Segment>),
            String(String),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Array(segments) => Ok(Message::from_segments(segments)),
            Wire::String(s) => Ok(Message::from_cq_string(&s)),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cq_string())
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<Media> for Message {
    fn from(media: Media) -> Self {
        Self { media: vec![media] }
    }
}

impl From<Vec<Media>> for Message {
    fn from(media: Vec<Media>) -> Self {
        Self { media }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Self::from_text(text)
    }
}

impl FromIterator<Media> for Message {
    fn from_iter<T: IntoIterator<Item = Media>>(iter: T) -> Self {
        Self {
            media: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Message {
    type Item = Media;
    type IntoIter = std::vec::IntoIter<Media>;

    fn into_iter(self) -> Self::IntoIter {
        self.media.into_iter()
    }
}

impl<'a> IntoIterator for &'a Message {
    type Item = &'a Media;
    type IntoIter = std::slice::Iter<'a, Media>;

    fn into_iter(self) -> Self::IntoIter {
        self.media.iter()
    }
}

/// Scans a mixed text/marker string into segments.
///
/// Spans matching the non-greedy marker pattern are parsed as markers;
/// everything between them becomes text segments with the escapes
/// reversed.
pub fn segments_from_cq_string(input: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;
    for found in CQ_MARKER.find_iter(input) {
        if found.start() > last {
            segments.push(Segment::text(unescape_text(&input[last..found.start()])));
        }
        segments.push(Segment::from_cq(found.as_str()));
        last = found.end();
    }
    if input.len() > last {
        segments.push(Segment::text(unescape_text(&input[last..])));
    }
    segments
}
