//! Wire types mirroring the gateway's JSON payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use braze_cqcode::{CommandConfig, Message as CqMessage};

// ============================================================================
// API envelope
// ============================================================================

/// Envelope of every API response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiResponse {
    /// `"ok"`, `"async"` or `"failed"`.
    pub status: String,
    /// Gateway return code; `0` on success.
    pub retcode: i64,
    /// Action-specific payload.
    pub data: Value,
    /// Echo correlation value (WebSocket only).
    #[serde(skip_serializing_if = "Value::is_null")]
    pub echo: Value,
}

// ============================================================================
// Accounts and chats
// ============================================================================

/// A user account as reported by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(rename = "user_id")]
    pub id: i64,
    pub nickname: String,
    /// Group name card, when the user was resolved through a group.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub card: String,
    /// Anonymous identity, present on anonymous group messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anonymous: Option<Anonymous>,
}

impl User {
    /// Display name: the group card when set, the nickname otherwise.
    pub fn display_name(&self) -> &str {
        if self.card.is_empty() {
            &self.nickname
        } else {
            &self.card
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous.is_some()
    }
}

/// Anonymous sender identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Anonymous {
    pub id: i64,
    pub name: String,
    /// Opaque flag used to act on the anonymous member (e.g. bans).
    pub flag: String,
}

/// Where a message was sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Chat {
    pub id: i64,
    /// `"private"`, `"group"` or `"discuss"`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sub_type: String,
}

impl Chat {
    pub fn is_private(&self) -> bool {
        self.kind == "private"
    }

    pub fn is_group(&self) -> bool {
        self.kind == "group"
    }

    pub fn is_discuss(&self) -> bool {
        self.kind == "discuss"
    }
}

/// A group the bot is a member of.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    #[serde(rename = "group_id")]
    pub id: i64,
    #[serde(rename = "group_name")]
    pub name: String,
}

// ============================================================================
// Messages
// ============================================================================

/// A fully-parsed incoming message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Message {
    /// Typed media content.
    pub message: CqMessage,
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Option<Chat>,
    /// CQ-encoded text form of the content.
    pub text: String,
    /// `"normal"`, `"anonymous"`, `"notice"`, `"friend"`, ...
    pub sub_type: String,
}

impl Message {
    /// Reports whether this message is a command under `config`.
    pub fn is_command(&self, config: &CommandConfig) -> bool {
        self.message.is_command(config)
    }

    /// Splits this message into a command token and its arguments.
    pub fn command(&self, config: &CommandConfig) -> (String, Vec<String>) {
        self.message.command(config)
    }

    pub fn is_anonymous(&self) -> bool {
        self.from.as_ref().is_some_and(User::is_anonymous)
    }
}

// ============================================================================
// Updates
// ============================================================================

/// One push event from the gateway, as delivered on the wire.
///
/// Call [`Update::parse_raw_message`] once after receiving to populate
/// the typed [`Update::message`] view. The client does this for every
/// update it hands out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Update {
    /// `"message"`, `"notice"`, `"request"` or the legacy `"event"`.
    pub post_type: String,
    pub message_type: String,
    pub notice_type: String,
    pub request_type: String,
    /// Legacy spelling of `notice_type`, kept aliased both ways.
    pub event: String,
    pub sub_type: String,
    pub message_id: i64,
    pub group_id: i64,
    pub discuss_id: i64,
    pub user_id: i64,
    pub self_id: i64,
    pub time: i64,
    /// Request-handling flag on `request` updates.
    pub flag: String,
    /// Raw `message` payload: a CQ string or a segment array.
    #[serde(rename = "message")]
    pub raw_message: Value,
    /// Anonymous identity: an object, a bare name string, or null.
    pub anonymous: Value,
    pub anonymous_flag: String,
    /// Full sender info, when the gateway includes it.
    pub sender: Option<User>,
    /// Parsed form, filled by [`Update::parse_raw_message`].
    #[serde(skip)]
    pub message: Option<Message>,
    /// CQ string form of the content, filled alongside `message`.
    #[serde(skip)]
    pub text: String,
}

impl Update {
    /// Rebuilds the typed [`Message`] from the raw wire payload.
    ///
    /// Safe to call more than once; the parse is deterministic.
    pub fn parse_raw_message(&mut self) {
        let text = self.raw_message.as_str().unwrap_or_default().to_string();
        if self.post_type != "message" {
            self.text = text;
            // Keep both spellings of the notice type populated.
            if self.post_type == "event" {
                self.notice_type = self.event.clone();
            } else if self.post_type == "notice" {
                self.event = self.notice_type.clone();
            }
            return;
        }

        let mut chat = Chat {
            kind: self.message_type.clone(),
            ..Default::default()
        };
        let mut sub_type = "normal".to_string();
        if chat.is_private() {
            chat.id = self.user_id;
            chat.sub_type = self.sub_type.clone();
        }
        if chat.is_group() {
            chat.id = self.group_id;
            sub_type = self.sub_type.clone();
        }
        if chat.is_discuss() {
            chat.id = self.discuss_id;
        }

        let message = CqMessage::parse(&self.raw_message);
        let text = if self.raw_message.is_string() {
            text
        } else {
            message.to_cq_string()
        };

        let mut from = User {
            id: self.user_id,
            ..Default::default()
        };
        if sub_type == "anonymous" {
            from.anonymous = self.parse_anonymous();
        }
        if let Some(sender) = &self.sender {
            from = sender.clone();
        }

        self.message = Some(Message {
            message,
            message_id: self.message_id,
            from: Some(from),
            chat: Some(chat),
            text: text.clone(),
            sub_type,
        });
        self.text = text;
    }

    /// Decodes the anonymous identity, which historically arrived either
    /// as a structured object or as a bare name string.
    fn parse_anonymous(&self) -> Option<Anonymous> {
        if let Ok(anon) = serde_json::from_value::<Anonymous>(self.anonymous.clone())
            && self.anonymous.is_object()
        {
            return Some(anon);
        }
        self.anonymous.as_str().map(|name| Anonymous {
            id: self.user_id,
            name: name.to_string(),
            flag: self.anonymous_flag.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(value: Value) -> Update {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_api_response_deserialize() {
        let resp: ApiResponse = serde_json::from_str(
            r#"{"status":"ok","retcode":0,"data":{"user_id":123,"nickname":"bot"}}"#,
        )
        .unwrap();
        assert_eq!(resp.status, "ok");
        assert_eq!(resp.retcode, 0);
        let user: User = serde_json::from_value(resp.data).unwrap();
        assert_eq!(user.id, 123);
        assert_eq!(user.nickname, "bot");
    }

    #[test]
    fn test_parse_raw_message_group_string() {
        let mut update = update(json!({
            "post_type": "message",
            "message_type": "group",
            "sub_type": "normal",
            "message_id": 7,
            "group_id": 1000,
            "user_id": 42,
            "message": "hi [CQ:face,id=14]",
        }));
        update.parse_raw_message();

        let message = update.message.as_ref().unwrap();
        let chat = message.chat.as_ref().unwrap();
        assert!(chat.is_group());
        assert_eq!(chat.id, 1000);
        assert_eq!(message.sub_type, "normal");
        assert_eq!(message.message.len(), 2);
        assert_eq!(message.from.as_ref().unwrap().id, 42);
        assert_eq!(update.text, "hi [CQ:face,id=14]");
    }

    #[test]
    fn test_parse_raw_message_private_array() {
        let mut update = update(json!({
            "post_type": "message",
            "message_type": "private",
            "sub_type": "friend",
            "user_id": 42,
            "message": [
                {"type": "text", "data": {"text": "hello"}},
                {"type": "shake", "data": {}},
            ],
        }));
        update.parse_raw_message();

        let message = update.message.as_ref().unwrap();
        let chat = message.chat.as_ref().unwrap();
        assert!(chat.is_private());
        assert_eq!(chat.id, 42);
        assert_eq!(chat.sub_type, "friend");
        // Array payloads render the text form from the parsed message.
        assert_eq!(update.text, "hello[CQ:shake]");
    }

    #[test]
    fn test_parse_raw_message_anonymous() {
        let mut update = update(json!({
            "post_type": "message",
            "message_type": "group",
            "sub_type": "anonymous",
            "group_id": 1000,
            "user_id": 42,
            "anonymous": {"id": 9, "name": "ghost", "flag": "f"},
            "message": "boo",
        }));
        update.parse_raw_message();

        let message = update.message.as_ref().unwrap();
        assert!(message.is_anonymous());
        let anon = message.from.as_ref().unwrap().anonymous.as_ref().unwrap();
        assert_eq!(anon.name, "ghost");

        // The bare-name historical shape.
        let mut update = update_legacy_anonymous();
        update.parse_raw_message();
        let message = update.message.as_ref().unwrap();
        let anon = message.from.as_ref().unwrap().anonymous.as_ref().unwrap();
        assert_eq!(anon.name, "ghost");
        assert_eq!(anon.id, 42);
        assert_eq!(anon.flag, "f");
    }

    fn update_legacy_anonymous() -> Update {
        update(json!({
            "post_type": "message",
            "message_type": "group",
            "sub_type": "anonymous",
            "group_id": 1000,
            "user_id": 42,
            "anonymous": "ghost",
            "anonymous_flag": "f",
            "message": "boo",
        }))
    }

    #[test]
    fn test_parse_raw_message_sender_wins() {
        let mut update = update(json!({
            "post_type": "message",
            "message_type": "private",
            "user_id": 42,
            "sender": {"user_id": 42, "nickname": "alice"},
            "message": "hi",
        }));
        update.parse_raw_message();
        let from = update.message.as_ref().unwrap().from.as_ref().unwrap();
        assert_eq!(from.nickname, "alice");
    }

    #[test]
    fn test_notice_type_aliasing() {
        let mut legacy = update(json!({
            "post_type": "event",
            "event": "group_upload",
            "message": "",
        }));
        legacy.parse_raw_message();
        assert_eq!(legacy.notice_type, "group_upload");

        let mut modern = update(json!({
            "post_type": "notice",
            "notice_type": "group_upload",
            "message": "",
        }));
        modern.parse_raw_message();
        assert_eq!(modern.event, "group_upload");
    }

    #[test]
    fn test_user_display_name() {
        let user = User {
            nickname: "nick".to_string(),
            card: "card".to_string(),
            ..Default::default()
        };
        assert_eq!(user.display_name(), "card");
        let user = User {
            nickname: "nick".to_string(),
            ..Default::default()
        };
        assert_eq!(user.display_name(), "nick");
    }

    #[test]
    fn test_message_command_delegation() {
        let mut update = update(json!({
            "post_type": "message",
            "message_type": "private",
            "user_id": 42,
            "message": "/echo hello world",
        }));
        update.parse_raw_message();
        let message = update.message.as_ref().unwrap();

        let config = braze_cqcode::CommandConfig::strict();
        assert!(message.is_command(&config));
        let (cmd, args) = message.command(&config);
        assert_eq!(cmd, "echo");
        assert_eq!(args, vec!["hello", "world"]);
    }
}
