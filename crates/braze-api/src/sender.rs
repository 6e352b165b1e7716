//! Chainable message sender.
//!
//! A [`Sender`] is bound to a client and a target chat; element appenders
//! return the sender so a message can be built and sent in one chain:
//!
//! ```rust,ignore
//! bot.clone()
//!     .message(10000, "group")
//!     .text("hello ")
//!     .face_by_name("微笑")
//!     .image_web(&url)
//!     .send()
//!     .await?;
//! ```

use std::sync::Arc;

use url::Url;

use braze_cqcode::{
    At, Bface, Dice, Emoji, Face, Image, Location, Media, Message as CqMessage, Music, Record,
    Rps, Sface, Shake, Share, Show, Sign, Text,
};

use crate::bot::BotApi;
use crate::error::{ApiError, ApiResult};
use crate::types::Message;

/// Builds a message element by element and sends it in one call.
///
/// The first failing element constructor is remembered and surfaced by
/// [`Sender::send`]; appenders after a failure are no-ops.
pub struct Sender {
    bot: Arc<BotApi>,
    chat_id: i64,
    chat_type: String,
    cache: CqMessage,
    err: Option<ApiError>,
}

impl BotApi {
    /// Starts a chainable message to a chat.
    pub fn message(self: Arc<Self>, chat_id: i64, chat_type: impl Into<String>) -> Sender {
        Sender {
            bot: self,
            chat_id,
            chat_type: chat_type.into(),
            cache: CqMessage::new(),
            err: None,
        }
    }
}

impl Sender {
    fn push(mut self, media: impl Into<Media>) -> Self {
        if self.err.is_none() {
            self.cache.push(media);
        }
        self
    }

    /// Appends plain text.
    pub fn text(self, text: impl Into<String>) -> Self {
        self.push(Text::new(text))
    }

    /// Appends a line break.
    pub fn newline(self) -> Self {
        self.push(Text::new("\n"))
    }

    /// Appends a mention.
    pub fn at(self, qq: impl Into<String>) -> Self {
        self.push(At::new(qq))
    }

    /// Appends a face by id.
    pub fn face(self, id: i64) -> Self {
        self.push(Face::new(id))
    }

    /// Appends a face by its bundled display name.
    ///
    /// An unknown name poisons the sender; [`Sender::send`] reports it.
    pub fn face_by_name(mut self, name: &str) -> Self {
        match Face::from_name(name) {
            Ok(face) => self.push(face),
            Err(err) => {
                self.err.get_or_insert(err.into());
                self
            }
        }
    }

    /// Appends an emoji by code point.
    pub fn emoji(self, id: i64) -> Self {
        self.push(Emoji { id })
    }

    /// Appends a big sticker.
    pub fn bface(self, id: i64) -> Self {
        self.push(Bface { id })
    }

    /// Appends a small sticker.
    pub fn sface(self, id: i64) -> Self {
        self.push(Sface { id })
    }

    /// Appends an image by raw file reference.
    pub fn image(self, file: impl Into<String>) -> Self {
        self.push(Image::new(file))
    }

    /// Appends an image inlined as `base64://`.
    pub fn image_base64(self, data: impl AsRef<[u8]>) -> Self {
        self.push(Image::base64(data))
    }

    /// Appends an image referencing a path local to the gateway host.
    pub fn image_local(self, path: impl AsRef<str>) -> Self {
        self.push(Image::local(path))
    }

    /// Appends a web image, cache enabled.
    pub fn image_web(self, url: &Url) -> Self {
        self.push(Image::web(url))
    }

    /// Appends an audio record by raw file reference.
    pub fn record(self, file: impl Into<String>, magic: bool) -> Self {
        let mut record = Record::new(file);
        record.magic = magic;
        self.push(record)
    }

    /// Appends an audio record inlined as `base64://`.
    pub fn record_base64(self, data: impl AsRef<[u8]>, magic: bool) -> Self {
        let mut record = Record::base64(data);
        record.magic = magic;
        self.push(record)
    }

    /// Appends an audio record referencing a path local to the gateway host.
    pub fn record_local(self, path: impl AsRef<str>, magic: bool) -> Self {
        let mut record = Record::local(path);
        record.magic = magic;
        self.push(record)
    }

    /// Appends a web audio record, cache enabled.
    pub fn record_web(self, url: &Url, magic: bool) -> Self {
        let mut record = Record::web(url);
        record.record.magic = magic;
        self.push(record)
    }

    /// Appends a rock-paper-scissors action.
    pub fn rps(self) -> Self {
        self.push(Rps::default())
    }

    /// Appends a dice roll.
    pub fn dice(self) -> Self {
        self.push(Dice::default())
    }

    /// Appends a window shake.
    pub fn shake(self) -> Self {
        self.push(Shake {})
    }

    /// Appends a music card.
    pub fn music(self, music: Music) -> Self {
        self.push(music)
    }

    /// Appends a link share card.
    pub fn share(self, share: Share) -> Self {
        self.push(share)
    }

    /// Appends a location card.
    pub fn location(self, location: Location) -> Self {
        self.push(location)
    }

    /// Appends an avatar show.
    pub fn show(self, id: i64) -> Self {
        self.push(Show { id })
    }

    /// Appends a sign-in card.
    pub fn sign(self) -> Self {
        self.push(Sign {})
    }

    /// Appends any element.
    pub fn media(self, media: impl Into<Media>) -> Self {
        self.push(media)
    }

    /// Returns the accumulated message without sending it.
    pub fn peek(&self) -> &CqMessage {
        &self.cache
    }

    /// Sends the accumulated message.
    pub async fn send(self) -> ApiResult<Message> {
        if let Some(err) = self.err {
            return Err(err);
        }
        self.bot
            .send_message(self.chat_id, &self.chat_type, self.cache)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::Transport;
    use crate::types::User;

    fn stub_bot() -> Arc<BotApi> {
        Arc::new(BotApi {
            token: String::new(),
            transport: Transport::Http {
                client: reqwest::Client::new(),
                endpoint: "http://127.0.0.1:1".to_string(),
            },
            self_info: User::default(),
            buffer: 16,
        })
    }

    #[test]
    fn test_chain_accumulates_in_order() {
        let sender = stub_bot()
            .message(10000, "group")
            .text("hello ")
            .at("42")
            .newline()
            .face(14)
            .dice();
        assert_eq!(
            sender.peek().to_cq_string(),
            "hello [CQ:at,qq=42]\n[CQ:face,id=14][CQ:dice,type=0]"
        );
    }

    #[test]
    fn test_record_web_magic() {
        let url = Url::parse("https://example.com/1.amr").unwrap();
        let sender = stub_bot().message(1, "private").record_web(&url, true);
        assert_eq!(
            sender.peek().to_cq_string(),
            "[CQ:record,file=https://example.com/1.amr,magic=true,url=,cache=1]"
        );
    }

    #[tokio::test]
    async fn test_unknown_face_poisons_chain() {
        let sender = stub_bot()
            .message(10000, "group")
            .face_by_name("nonexistent")
            .text("never sent");
        // The appender after the failure is a no-op.
        assert!(sender.peek().is_empty());
        let err = sender.send().await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Codec(braze_cqcode::CodecError::UnknownFace)
        ));
    }
}
