//! Typed request payloads.
//!
//! Every gateway action is a struct implementing [`Payload`]: an action
//! name plus the JSON parameter map. [`BotApi::send`](crate::BotApi::send)
//! and [`BotApi::execute`](crate::BotApi::execute) accept any of them, and
//! the typed wrappers on the client build them internally.

use std::time::Duration;

use serde_json::{Map, Value};

use braze_cqcode::Message;

/// A request payload that can be submitted through the client.
pub trait Payload {
    /// Gateway action name, e.g. `"send_msg"`.
    fn action(&self) -> &'static str;

    /// JSON parameters of the action.
    fn params(&self) -> Map<String, Value>;
}

/// Parameters of a `send_msg` request.
#[derive(Debug, Clone, Default)]
pub struct SendMessage {
    pub chat_id: i64,
    /// `"private"`, `"group"` or `"discuss"`.
    pub chat_type: String,
    pub message: Message,
    /// Escape markers instead of interpreting them. Only meaningful for
    /// raw-string sends; segment arrays are always taken literally.
    pub auto_escape: bool,
}

impl SendMessage {
    pub fn new(chat_id: i64, chat_type: impl Into<String>, message: impl Into<Message>) -> Self {
        Self {
            chat_id,
            chat_type: chat_type.into(),
            message: message.into(),
            auto_escape: false,
        }
    }
}

impl Payload for SendMessage {
    fn action(&self) -> &'static str {
        "send_msg"
    }

    fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("message_type".to_string(), Value::from(self.chat_type.clone()));
        // The gateway picks the id matching message_type.
        params.insert("user_id".to_string(), Value::from(self.chat_id));
        params.insert("group_id".to_string(), Value::from(self.chat_id));
        params.insert("discuss_id".to_string(), Value::from(self.chat_id));
        params.insert(
            "message".to_string(),
            serde_json::to_value(&self.message).unwrap_or_default(),
        );
        params.insert("auto_escape".to_string(), Value::from(self.auto_escape));
        params
    }
}

/// Parameters of a `delete_msg` request.
#[derive(Debug, Clone, Default)]
pub struct DeleteMessage {
    pub message_id: i64,
}

impl Payload for DeleteMessage {
    fn action(&self) -> &'static str {
        "delete_msg"
    }

    fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("message_id".to_string(), Value::from(self.message_id));
        params
    }
}

/// Parameters of a `send_like` request (profile-page likes).
#[derive(Debug, Clone, Default)]
pub struct SendLike {
    pub user_id: i64,
    pub times: i64,
}

impl Payload for SendLike {
    fn action(&self) -> &'static str {
        "send_like"
    }

    fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("user_id".to_string(), Value::from(self.user_id));
        params.insert("times".to_string(), Value::from(self.times));
        params
    }
}

/// Parameters of a `set_group_kick` request.
#[derive(Debug, Clone, Default)]
pub struct GroupKick {
    pub group_id: i64,
    pub user_id: i64,
    /// Also reject future join requests from this user.
    pub reject_add_request: bool,
}

impl Payload for GroupKick {
    fn action(&self) -> &'static str {
        "set_group_kick"
    }

    fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("group_id".to_string(), Value::from(self.group_id));
        params.insert("user_id".to_string(), Value::from(self.user_id));
        params.insert(
            "reject_add_request".to_string(),
            Value::from(self.reject_add_request),
        );
        params
    }
}

/// Parameters of a `set_group_ban` request.
#[derive(Debug, Clone, Default)]
pub struct GroupBan {
    pub group_id: i64,
    pub user_id: i64,
    /// Zero lifts the ban.
    pub duration: Duration,
}

impl Payload for GroupBan {
    fn action(&self) -> &'static str {
        "set_group_ban"
    }

    fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("group_id".to_string(), Value::from(self.group_id));
        params.insert("user_id".to_string(), Value::from(self.user_id));
        params.insert("duration".to_string(), Value::from(self.duration.as_secs()));
        params
    }
}

/// Parameters of a `set_group_anonymous_ban` request.
#[derive(Debug, Clone, Default)]
pub struct GroupAnonymousBan {
    pub group_id: i64,
    /// The anonymous flag taken from the offending message.
    pub flag: String,
    pub duration: Duration,
}

impl Payload for GroupAnonymousBan {
    fn action(&self) -> &'static str {
        "set_group_anonymous_ban"
    }

    fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("group_id".to_string(), Value::from(self.group_id));
        params.insert("anonymous_flag".to_string(), Value::from(self.flag.clone()));
        params.insert("duration".to_string(), Value::from(self.duration.as_secs()));
        params
    }
}

/// Parameters of a `set_group_whole_ban` request.
#[derive(Debug, Clone, Default)]
pub struct GroupWholeBan {
    pub group_id: i64,
    pub enable: bool,
}

impl Payload for GroupWholeBan {
    fn action(&self) -> &'static str {
        "set_group_whole_ban"
    }

    fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("group_id".to_string(), Value::from(self.group_id));
        params.insert("enable".to_string(), Value::from(self.enable));
        params
    }
}

/// Parameters of a `set_group_admin` request.
#[derive(Debug, Clone, Default)]
pub struct GroupAdmin {
    pub group_id: i64,
    pub user_id: i64,
    pub enable: bool,
}

impl Payload for GroupAdmin {
    fn action(&self) -> &'static str {
        "set_group_admin"
    }

    fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("group_id".to_string(), Value::from(self.group_id));
        params.insert("user_id".to_string(), Value::from(self.user_id));
        params.insert("enable".to_string(), Value::from(self.enable));
        params
    }
}

/// Parameters of a `set_group_anonymous` request.
#[derive(Debug, Clone, Default)]
pub struct GroupAnonymous {
    pub group_id: i64,
    pub enable: bool,
}

impl Payload for GroupAnonymous {
    fn action(&self) -> &'static str {
        "set_group_anonymous"
    }

    fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("group_id".to_string(), Value::from(self.group_id));
        params.insert("enable".to_string(), Value::from(self.enable));
        params
    }
}

/// Parameters of a `set_group_card` request.
#[derive(Debug, Clone, Default)]
pub struct GroupCard {
    pub group_id: i64,
    pub user_id: i64,
    /// Empty clears the card.
    pub card: String,
}

impl Payload for GroupCard {
    fn action(&self) -> &'static str {
        "set_group_card"
    }

    fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("group_id".to_string(), Value::from(self.group_id));
        params.insert("user_id".to_string(), Value::from(self.user_id));
        params.insert("card".to_string(), Value::from(self.card.clone()));
        params
    }
}

/// Parameters of a `set_group_special_title` request.
#[derive(Debug, Clone, Default)]
pub struct GroupSpecialTitle {
    pub group_id: i64,
    pub user_id: i64,
    pub special_title: String,
    pub duration: Duration,
}

impl Payload for GroupSpecialTitle {
    fn action(&self) -> &'static str {
        "set_group_special_title"
    }

    fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("group_id".to_string(), Value::from(self.group_id));
        params.insert("user_id".to_string(), Value::from(self.user_id));
        params.insert(
            "special_title".to_string(),
            Value::from(self.special_title.clone()),
        );
        params.insert("duration".to_string(), Value::from(self.duration.as_secs()));
        params
    }
}

/// Parameters of a `set_group_leave` request.
#[derive(Debug, Clone, Default)]
pub struct GroupLeave {
    pub group_id: i64,
    /// Dissolve the group instead of leaving (owner only).
    pub is_dismiss: bool,
}

impl Payload for GroupLeave {
    fn action(&self) -> &'static str {
        "set_group_leave"
    }

    fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("group_id".to_string(), Value::from(self.group_id));
        params.insert("is_dismiss".to_string(), Value::from(self.is_dismiss));
        params
    }
}

/// Parameters of a `set_discuss_leave` request.
#[derive(Debug, Clone, Default)]
pub struct DiscussLeave {
    pub discuss_id: i64,
}

impl Payload for DiscussLeave {
    fn action(&self) -> &'static str {
        "set_discuss_leave"
    }

    fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("discuss_id".to_string(), Value::from(self.discuss_id));
        params
    }
}

/// Parameters of a `set_friend_add_request` request.
#[derive(Debug, Clone, Default)]
pub struct FriendAddRequest {
    /// Flag carried by the request update.
    pub flag: String,
    pub approve: bool,
    /// Remark name for the new friend, when approving.
    pub remark: String,
}

impl Payload for FriendAddRequest {
    fn action(&self) -> &'static str {
        "set_friend_add_request"
    }

    fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("flag".to_string(), Value::from(self.flag.clone()));
        params.insert("approve".to_string(), Value::from(self.approve));
        params.insert("remark".to_string(), Value::from(self.remark.clone()));
        params
    }
}

/// Parameters of a `set_group_add_request` request.
#[derive(Debug, Clone, Default)]
pub struct GroupAddRequest {
    /// Flag carried by the request update.
    pub flag: String,
    /// `"add"` or `"invite"`, the sub type of the request update.
    pub sub_type: String,
    pub approve: bool,
    /// Reason shown to the requester when rejecting.
    pub reason: String,
}

impl Payload for GroupAddRequest {
    fn action(&self) -> &'static str {
        "set_group_add_request"
    }

    fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        params.insert("flag".to_string(), Value::from(self.flag.clone()));
        params.insert("sub_type".to_string(), Value::from(self.sub_type.clone()));
        params.insert("approve".to_string(), Value::from(self.approve));
        params.insert("reason".to_string(), Value::from(self.reason.clone()));
        params
    }
}

/// Parameters of a `get_updates` long poll.
#[derive(Debug, Clone, Default)]
pub struct UpdatesRequest {
    /// Set to one past the last seen update to skip stale items.
    pub offset: i64,
    pub limit: i64,
    /// Long-poll hold time in seconds.
    pub timeout: i64,
    /// Resolve full sender info for updates lacking a `sender` field.
    pub preload_user_info: bool,
}

impl Payload for UpdatesRequest {
    fn action(&self) -> &'static str {
        "get_updates"
    }

    fn params(&self) -> Map<String, Value> {
        let mut params = Map::new();
        if self.offset != 0 {
            params.insert("offset".to_string(), Value::from(self.offset));
        }
        if self.limit > 0 {
            params.insert("limit".to_string(), Value::from(self.limit));
        }
        if self.timeout > 0 {
            params.insert("timeout".to_string(), Value::from(self.timeout));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_params() {
        let payload = SendMessage::new(10000, "group", braze_cqcode::Message::new().text("hi"));
        assert_eq!(payload.action(), "send_msg");

        let params = payload.params();
        assert_eq!(params.get("message_type"), Some(&Value::from("group")));
        // All three id aliases carry the chat id.
        assert_eq!(params.get("user_id"), Some(&Value::from(10000)));
        assert_eq!(params.get("group_id"), Some(&Value::from(10000)));
        assert_eq!(params.get("discuss_id"), Some(&Value::from(10000)));
        assert_eq!(params.get("auto_escape"), Some(&Value::from(false)));
        // The message travels as a segment array.
        assert!(params.get("message").is_some_and(Value::is_array));
    }

    #[test]
    fn test_group_ban_duration_seconds() {
        let payload = GroupBan {
            group_id: 1,
            user_id: 2,
            duration: Duration::from_secs(1800),
        };
        let params = payload.params();
        assert_eq!(params.get("duration"), Some(&Value::from(1800)));
    }

    #[test]
    fn test_updates_request_omits_zero_fields() {
        let params = UpdatesRequest::default().params();
        assert!(params.is_empty());

        let params = UpdatesRequest {
            offset: 5,
            limit: 10,
            timeout: 60,
            preload_user_info: true,
        }
        .params();
        assert_eq!(params.len(), 3);
        assert_eq!(params.get("offset"), Some(&Value::from(5)));
    }
}
