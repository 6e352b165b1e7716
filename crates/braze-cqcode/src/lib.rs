//! # braze-cqcode
//!
//! The CQ-code message model and codec: a typed element model for rich
//! chat-message content and the bidirectional transformation between it
//! and the two wire shapes used by CQHTTP-style gateways — the escaped
//! marker string (`text [CQ:face,id=14] more text`) and the JSON segment
//! array (`[{"type": "face", "data": {"id": 14}}]`).
//!
//! ## Layers
//!
//! - [`Media`] / the per-variant structs — the closed element set. Each
//!   variant declares its kind tag and an ordered field table
//!   ([`MediaCodec`]) that drives both the encode and the decode path.
//! - [`escape`] — the escape primitives of the marker grammar.
//! - [`Segment`] — the loosely-typed `{type, data}` pivot record; an
//!   unrecognized kind stays representable here and survives re-encoding
//!   byte-exactly.
//! - [`Message`] — the ordered element sequence with whole-message
//!   conversions in all four directions.
//! - [`command`] — command detection and shell-like argument splitting
//!   that respects quoting, escapes and embedded markers.
//!
//! Everything in this crate is pure and synchronous: encode and decode
//! are deterministic functions of their input and the [`CommandConfig`]
//! passed in by the caller, and may run concurrently from any number of
//! threads.
//!
//! ## Example
//!
//! ```rust,ignore
//! use braze_cqcode::{CommandConfig, Message};
//!
//! let msg = Message::from_cq_string("/roll [CQ:dice,type=0]");
//! let config = CommandConfig::strict();
//! if msg.is_command(&config) {
//!     let (cmd, args) = msg.command(&config);
//!     assert_eq!(cmd, "roll");
//! }
//! ```

pub mod command;
pub mod error;
pub mod escape;
mod face;
pub mod helpers;
pub mod media;
pub mod message;
pub mod segment;

pub use command::{CommandConfig, is_command, parse_command};
pub use error::{CodecError, CodecResult};
pub use escape::{escape_text, escape_value, unescape_text, unescape_value};
pub use helpers::{
    CACHE_DISABLED, CACHE_ENABLED, NetImage, NetRecord, NetResource, file_base64,
    file_base64_from_path, file_local,
};
pub use media::{
    At, Bface, Dice, Emoji, Face, Field, Image, Location, Media, MediaCodec, Music, Record, Rich,
    Rps, Sface, Shake, Share, Show, Sign, Text,
};
pub use message::{Message, segments_from_cq_string};
pub use segment::{Segment, parse_cq_into};
