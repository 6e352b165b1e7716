//! The typed API client.
//!
//! [`BotApi`] speaks either transport the gateway offers:
//!
//! | Endpoint scheme | Strategy |
//! |-----------------|----------|
//! | `http` / `https` | Synchronous POST per call — `{endpoint}/{action}?access_token=...` with a JSON body; the HTTP response body is the API response. Updates arrive over `get_updates` long polling. |
//! | `ws` / `wss` | Two sockets, `/api/` and `/event/`. API calls are echo-correlated: the request carries a numeric echo, a reader task routes the matching response to the waiting future. Updates stream in on the event socket. |
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use braze_api::{BotApi, UpdatesRequest};
//!
//! let bot = Arc::new(BotApi::connect("ws://127.0.0.1:6700", "token").await?);
//! let mut updates = bot.clone().updates_channel(UpdatesRequest::default());
//! while let Some(update) = updates.recv().await {
//!     println!("{}", update.text);
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message as WsMessage;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::request::{
    DeleteMessage, DiscussLeave, FriendAddRequest, GroupAddRequest, GroupAdmin, GroupAnonymous,
    GroupAnonymousBan, GroupBan, GroupCard, GroupKick, GroupLeave, GroupSpecialTitle,
    GroupWholeBan, Payload, SendLike, SendMessage, UpdatesRequest,
};
use crate::types::{ApiResponse, Chat, Group, Message, Update, User};
use braze_cqcode::{Media, Message as CqMessage};

/// Buffered channel of incoming updates.
pub type UpdatesChannel = mpsc::Receiver<Update>;

/// How long a WebSocket API call waits for its echoed response.
const WS_API_TIMEOUT: Duration = Duration::from_secs(10);

/// Default capacity of update channels.
const DEFAULT_BUFFER: usize = 100;

// =============================================================================
// Transports
// =============================================================================

pub(crate) enum Transport {
    Http {
        client: reqwest::Client,
        endpoint: String,
    },
    Ws(WsTransport),
}

pub(crate) struct WsTransport {
    /// Write channel into the `/api/` socket loop.
    api_tx: mpsc::Sender<String>,
    /// Pending call map: echo id → response channel.
    pending: Arc<Mutex<HashMap<u64, oneshot::Sender<ApiResponse>>>>,
    /// Monotonically increasing echo counter.
    echo: AtomicU64,
    /// Buffered updates read off the `/event/` socket.
    events: Mutex<mpsc::Receiver<Update>>,
}

impl WsTransport {
    async fn connect(endpoint: &str, token: &str, buffer: usize) -> ApiResult<WsTransport> {
        let base = endpoint.trim_end_matches('/');
        let (api_stream, _) =
            connect_async(authorized_request(&format!("{base}/api/"), token)?).await?;
        let (mut event_stream, _) =
            connect_async(authorized_request(&format!("{base}/event/"), token)?).await?;
        debug!(endpoint = %base, "gateway sockets connected");

        let (api_tx, mut api_rx) = mpsc::channel::<String>(buffer);
        let pending: Arc<Mutex<HashMap<u64, oneshot::Sender<ApiResponse>>>> = Arc::default();

        let (mut api_write, mut api_read) = api_stream.split();

        // Writer: drains queued requests into the api socket.
        tokio::spawn(async move {
            while let Some(text) = api_rx.recv().await {
                if let Err(err) = api_write.send(WsMessage::text(text)).await {
                    warn!(error = %err, "api socket write failed");
                    break;
                }
            }
        });

        // Router: delivers echoed responses to their waiting callers.
        let router_pending = pending.clone();
        tokio::spawn(async move {
            while let Some(frame) = api_read.next().await {
                let Ok(WsMessage::Text(text)) = frame else {
                    continue;
                };
                let Ok(response) = serde_json::from_str::<ApiResponse>(&text) else {
                    debug!("unreadable api frame");
                    continue;
                };
                let Some(echo) = response.echo.as_u64() else {
                    continue;
                };
                if let Some(tx) = router_pending.lock().await.remove(&echo) {
                    let _ = tx.send(response);
                } else {
                    // Probably a caller that already timed out.
                    warn!(echo = echo, "response for unknown echo");
                }
            }
            debug!("api socket closed");
        });

        // Event pump: buffers pushed updates for get_updates.
        let (event_tx, event_rx) = mpsc::channel(buffer);
        tokio::spawn(async move {
            while let Some(frame) = event_stream.next().await {
                let Ok(WsMessage::Text(text)) = frame else {
                    continue;
                };
                match serde_json::from_str::<Update>(&text) {
                    Ok(update) => {
                        if event_tx.send(update).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => debug!(error = %err, "unreadable event frame"),
                }
            }
            debug!("event socket closed");
        });

        Ok(WsTransport {
            api_tx,
            pending,
            echo: AtomicU64::new(1),
            events: Mutex::new(event_rx),
        })
    }

    async fn call(&self, action: &str, params: Map<String, Value>) -> ApiResult<ApiResponse> {
        let echo = self.echo.fetch_add(1, Ordering::SeqCst);

        // Register before sending so an early response is never missed.
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(echo, tx);

        let request = json!({
            "action": action,
            "params": params,
            "echo": echo,
        });
        debug!(action = %action, echo = echo, "calling api over websocket");

        if self.api_tx.send(request.to_string()).await.is_err() {
            self.pending.lock().await.remove(&echo);
            return Err(ApiError::NotConnected);
        }

        match timeout(WS_API_TIMEOUT, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(ApiError::NotConnected),
            Err(_) => {
                // Timed out - clear the pending entry so it doesn't dangle.
                self.pending.lock().await.remove(&echo);
                Err(ApiError::Timeout)
            }
        }
    }
}

fn authorized_request(
    url: &str,
    token: &str,
) -> ApiResult<tokio_tungstenite::tungstenite::handshake::client::Request> {
    let mut request = url.into_client_request()?;
    if !token.is_empty() {
        let value = HeaderValue::try_from(format!("Token {token}"))
            .map_err(|_| ApiError::InvalidToken)?;
        request.headers_mut().insert("Authorization", value);
    }
    Ok(request)
}

// =============================================================================
// BotApi
// =============================================================================

/// Client for a CQHTTP-style chat-bot gateway.
pub struct BotApi {
    pub(crate) token: String,
    pub(crate) transport: Transport,
    /// The authenticated account, fetched at connect time.
    pub self_info: User,
    /// Capacity of channels returned by [`BotApi::updates_channel`].
    pub buffer: usize,
}

impl BotApi {
    /// Connects to `endpoint` and validates the token with a
    /// `get_login_info` call.
    ///
    /// `http`/`https` endpoints use request/response over HTTP; `ws`/`wss`
    /// endpoints open the `/api/` and `/event/` sockets.
    pub async fn connect(endpoint: &str, token: &str) -> ApiResult<BotApi> {
        let url = url::Url::parse(endpoint)?;
        let transport = match url.scheme() {
            "http" | "https" => Transport::Http {
                client: reqwest::Client::new(),
                endpoint: endpoint.trim_end_matches('/').to_string(),
            },
            "ws" | "wss" => {
                Transport::Ws(WsTransport::connect(endpoint, token, DEFAULT_BUFFER).await?)
            }
            other => return Err(ApiError::BadScheme(other.to_string())),
        };

        let mut bot = BotApi {
            token: token.to_string(),
            transport,
            self_info: User::default(),
            buffer: DEFAULT_BUFFER,
        };
        bot.self_info = bot.get_login_info().await?;
        debug!(id = bot.self_info.id, "authenticated");
        Ok(bot)
    }

    /// Makes a raw API request.
    ///
    /// Non-`ok`/`async` statuses become [`ApiError::Api`].
    pub async fn raw_call(
        &self,
        action: &str,
        params: Map<String, Value>,
    ) -> ApiResult<ApiResponse> {
        let response = match &self.transport {
            Transport::Http { client, endpoint } => {
                let url = format!("{endpoint}/{action}?access_token={}", self.token);
                debug!(action = %action, "calling api over http");
                client
                    .post(url)
                    .json(&Value::Object(params))
                    .send()
                    .await?
                    .json::<ApiResponse>()
                    .await?
            }
            Transport::Ws(ws) => ws.call(action, params).await?,
        };

        if response.status != "ok" && response.status != "async" {
            return Err(ApiError::Api {
                status: response.status.clone(),
                retcode: response.retcode,
            });
        }
        Ok(response)
    }

    async fn call_data<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Map<String, Value>,
    ) -> ApiResult<T> {
        let response = self.raw_call(action, params).await?;
        Ok(serde_json::from_value(response.data)?)
    }

    /// Submits any payload and decodes the response as a sent [`Message`]
    /// (usually just a `message_id`).
    pub async fn send(&self, payload: &impl Payload) -> ApiResult<Message> {
        let response = self.raw_call(payload.action(), payload.params()).await?;
        // Send responses carry only a subset of the message fields.
        Ok(serde_json::from_value(response.data).unwrap_or_default())
    }

    /// Submits any payload and returns the raw response envelope.
    pub async fn execute(&self, payload: &impl Payload) -> ApiResult<ApiResponse> {
        self.raw_call(payload.action(), payload.params()).await
    }

    /// True when the message mentions the authenticated account.
    pub fn is_message_to_me(&self, message: &Message) -> bool {
        let id = self.self_info.id.to_string();
        message
            .message
            .iter()
            .any(|media| matches!(media, Media::At(at) if at.qq == id))
    }
}

// =============================================================================
// Typed API wrappers
// =============================================================================

impl BotApi {
    /// Fetches the authenticated account.
    pub async fn get_login_info(&self) -> ApiResult<User> {
        self.call_data("get_login_info", Map::new()).await
    }

    /// Fetches user info for an arbitrary account.
    pub async fn get_stranger_info(&self, user_id: i64) -> ApiResult<User> {
        let mut params = Map::new();
        params.insert("user_id".to_string(), Value::from(user_id));
        self.call_data("get_stranger_info", params).await
    }

    /// Fetches a group member's user info.
    ///
    /// With `no_cache` the gateway refreshes its member cache first, at
    /// the cost of a slower response.
    pub async fn get_group_member_info(
        &self,
        group_id: i64,
        user_id: i64,
        no_cache: bool,
    ) -> ApiResult<User> {
        let mut params = Map::new();
        params.insert("group_id".to_string(), Value::from(group_id));
        params.insert("user_id".to_string(), Value::from(user_id));
        params.insert("no_cache".to_string(), Value::from(no_cache));
        self.call_data("get_group_member_info", params).await
    }

    /// Fetches all members of a group.
    pub async fn get_group_member_list(&self, group_id: i64) -> ApiResult<Vec<User>> {
        let mut params = Map::new();
        params.insert("group_id".to_string(), Value::from(group_id));
        self.call_data("get_group_member_list", params).await
    }

    /// Fetches all groups the bot is in.
    pub async fn get_group_list(&self) -> ApiResult<Vec<Group>> {
        self.call_data("get_group_list", Map::new()).await
    }

    /// Sends a message to a chat.
    pub async fn send_message(
        &self,
        chat_id: i64,
        chat_type: &str,
        message: impl Into<CqMessage>,
    ) -> ApiResult<Message> {
        self.send(&SendMessage::new(chat_id, chat_type, message)).await
    }

    /// Recalls a message.
    pub async fn delete_message(&self, message_id: i64) -> ApiResult<ApiResponse> {
        self.execute(&DeleteMessage { message_id }).await
    }

    /// Sends profile-page likes to a user.
    pub async fn send_like(&self, user_id: i64, times: i64) -> ApiResult<ApiResponse> {
        self.execute(&SendLike { user_id, times }).await
    }

    /// Kicks a group member.
    pub async fn set_group_kick(
        &self,
        group_id: i64,
        user_id: i64,
        reject_add_request: bool,
    ) -> ApiResult<ApiResponse> {
        self.execute(&GroupKick {
            group_id,
            user_id,
            reject_add_request,
        })
        .await
    }

    /// Bans a group member from sending messages.
    pub async fn set_group_ban(
        &self,
        group_id: i64,
        user_id: i64,
        duration: Duration,
    ) -> ApiResult<ApiResponse> {
        self.execute(&GroupBan {
            group_id,
            user_id,
            duration,
        })
        .await
    }

    /// Bans an anonymous member, identified by the flag on their message.
    pub async fn set_group_anonymous_ban(
        &self,
        group_id: i64,
        flag: impl Into<String>,
        duration: Duration,
    ) -> ApiResult<ApiResponse> {
        self.execute(&GroupAnonymousBan {
            group_id,
            flag: flag.into(),
            duration,
        })
        .await
    }

    /// Restricts the whole group to administrators.
    pub async fn set_group_whole_ban(&self, group_id: i64, enable: bool) -> ApiResult<ApiResponse> {
        self.execute(&GroupWholeBan { group_id, enable }).await
    }

    /// Grants or revokes administrator rights.
    pub async fn set_group_admin(
        &self,
        group_id: i64,
        user_id: i64,
        enable: bool,
    ) -> ApiResult<ApiResponse> {
        self.execute(&GroupAdmin {
            group_id,
            user_id,
            enable,
        })
        .await
    }

    /// Enables or disables anonymous chat in a group.
    pub async fn set_group_anonymous(&self, group_id: i64, enable: bool) -> ApiResult<ApiResponse> {
        self.execute(&GroupAnonymous { group_id, enable }).await
    }

    /// Sets a member's group name card.
    pub async fn set_group_card(
        &self,
        group_id: i64,
        user_id: i64,
        card: impl Into<String>,
    ) -> ApiResult<ApiResponse> {
        self.execute(&GroupCard {
            group_id,
            user_id,
            card: card.into(),
        })
        .await
    }

    /// Sets a member's special title.
    pub async fn set_group_special_title(
        &self,
        group_id: i64,
        user_id: i64,
        special_title: impl Into<String>,
        duration: Duration,
    ) -> ApiResult<ApiResponse> {
        self.execute(&GroupSpecialTitle {
            group_id,
            user_id,
            special_title: special_title.into(),
            duration,
        })
        .await
    }

    /// Leaves (or dissolves) a group.
    pub async fn set_group_leave(&self, group_id: i64, is_dismiss: bool) -> ApiResult<ApiResponse> {
        self.execute(&GroupLeave {
            group_id,
            is_dismiss,
        })
        .await
    }

    /// Leaves a discussion.
    pub async fn set_discuss_leave(&self, discuss_id: i64) -> ApiResult<ApiResponse> {
        self.execute(&DiscussLeave { discuss_id }).await
    }

    /// Handles a friend request.
    pub async fn set_friend_add_request(
        &self,
        flag: impl Into<String>,
        approve: bool,
        remark: impl Into<String>,
    ) -> ApiResult<ApiResponse> {
        self.execute(&FriendAddRequest {
            flag: flag.into(),
            approve,
            remark: remark.into(),
        })
        .await
    }

    /// Handles a group join or invite request.
    pub async fn set_group_add_request(
        &self,
        flag: impl Into<String>,
        sub_type: impl Into<String>,
        approve: bool,
        reason: impl Into<String>,
    ) -> ApiResult<ApiResponse> {
        self.execute(&GroupAddRequest {
            flag: flag.into(),
            sub_type: sub_type.into(),
            approve,
            reason: reason.into(),
        })
        .await
    }
}

// =============================================================================
// Updates
// =============================================================================

impl BotApi {
    /// Fetches the next batch of updates.
    ///
    /// HTTP transports long-poll `get_updates`; WebSocket transports
    /// yield one buffered event from the event socket.
    pub async fn get_updates(&self, request: &UpdatesRequest) -> ApiResult<Vec<Update>> {
        match &self.transport {
            Transport::Http { .. } => {
                let response = self.raw_call(request.action(), request.params()).await?;
                let mut updates: Vec<Update> = serde_json::from_value(response.data)?;
                for update in &mut updates {
                    update.parse_raw_message();
                    if request.preload_user_info && update.sender.is_none() {
                        self.preload_user_info(update).await;
                    }
                }
                Ok(updates)
            }
            Transport::Ws(ws) => {
                let update = {
                    let mut events = ws.events.lock().await;
                    events.recv().await
                };
                let Some(mut update) = update else {
                    return Err(ApiError::NotConnected);
                };
                update.parse_raw_message();
                if request.preload_user_info && update.sender.is_none() {
                    self.preload_user_info(&mut update).await;
                }
                Ok(vec![update])
            }
        }
    }

    /// Fills in full sender info on a parsed update.
    ///
    /// Anonymous senders are left alone; lookup failures are logged and
    /// ignored.
    pub async fn preload_user_info(&self, update: &mut Update) {
        let from_group = match &update.message {
            Some(message) if !message.is_anonymous() => {
                message.chat.as_ref().is_some_and(Chat::is_group)
            }
            _ => return,
        };
        let user = if from_group {
            self.get_group_member_info(update.group_id, update.user_id, false)
                .await
        } else {
            self.get_stranger_info(update.user_id).await
        };
        match user {
            Ok(user) => {
                if let Some(message) = &mut update.message {
                    message.from = Some(user);
                }
            }
            Err(err) => debug!(error = %err, "failed to preload user info"),
        }
    }

    /// Starts a long-running task feeding updates into a buffered channel.
    ///
    /// Failed fetches are retried after three seconds. The task stops when
    /// the receiver is dropped.
    pub fn updates_channel(self: Arc<Self>, request: UpdatesRequest) -> UpdatesChannel {
        let (tx, rx) = mpsc::channel(self.buffer);
        let bot = self;
        tokio::spawn(async move {
            loop {
                let updates = match bot.get_updates(&request).await {
                    Ok(updates) => updates,
                    Err(err) => {
                        warn!(error = %err, "failed to get updates, retrying in 3 seconds");
                        tokio::time::sleep(Duration::from_secs(3)).await;
                        continue;
                    }
                };
                for update in updates {
                    if tx.send(update).await.is_err() {
                        return;
                    }
                }
            }
        });
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_bot() -> BotApi {
        BotApi {
            token: String::new(),
            transport: Transport::Http {
                client: reqwest::Client::new(),
                endpoint: "http://127.0.0.1:1".to_string(),
            },
            self_info: User {
                id: 10001000,
                nickname: "bot".to_string(),
                ..Default::default()
            },
            buffer: DEFAULT_BUFFER,
        }
    }

    #[test]
    fn test_is_message_to_me() {
        let bot = stub_bot();

        let mentioned = Message {
            message: CqMessage::new().text("hey ").at("10001000"),
            ..Default::default()
        };
        assert!(bot.is_message_to_me(&mentioned));

        let other = Message {
            message: CqMessage::new().text("hey ").at("42"),
            ..Default::default()
        };
        assert!(!bot.is_message_to_me(&other));
    }

    #[tokio::test]
    async fn test_http_call_failure_is_reported() {
        // Nothing listens on the stub endpoint; the transport error must
        // surface instead of panicking.
        let bot = stub_bot();
        let err = bot.get_login_info().await.unwrap_err();
        assert!(matches!(err, ApiError::Http(_)));
    }

    #[test]
    fn test_authorized_request_header() {
        let request = authorized_request("ws://127.0.0.1:6700/api/", "secret-token").unwrap();
        assert_eq!(
            request.headers().get("Authorization").unwrap(),
            "Token secret-token"
        );

        let request = authorized_request("ws://127.0.0.1:6700/api/", "").unwrap();
        assert!(request.headers().get("Authorization").is_none());
    }
}
