//! # braze-api
//!
//! Typed client for CQHTTP-style chat-bot gateways, built on the
//! [`braze_cqcode`] message codec.
//!
//! ## Overview
//!
//! - [`BotApi`] — the client: HTTP or WebSocket, chosen by the endpoint
//!   scheme, with typed wrappers for the gateway's actions.
//! - [`types`] — wire types mirroring the remote JSON (updates, users,
//!   chats, messages).
//! - [`request`] — one payload struct per gateway action.
//! - [`Sender`] — chainable message building bound to a chat.
//! - [`EventBus`] — hierarchical-key fan-out over an updates channel.
//! - [`webhook`] — push delivery with HMAC-SHA1 signature verification.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use braze_api::{BotApi, UpdatesRequest};
//! use braze_cqcode::CommandConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let bot = Arc::new(BotApi::connect("ws://127.0.0.1:6700", "token").await?);
//!     let config = CommandConfig::strict();
//!
//!     let mut updates = bot.clone().updates_channel(UpdatesRequest::default());
//!     while let Some(update) = updates.recv().await {
//!         let Some(message) = &update.message else { continue };
//!         if message.is_command(&config) {
//!             let (cmd, args) = message.command(&config);
//!             println!("{cmd}: {args:?}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod error;
pub mod event;
pub mod request;
pub mod sender;
pub mod types;
pub mod webhook;

pub use bot::{BotApi, UpdatesChannel};
pub use error::{ApiError, ApiResult};
pub use event::{EventBus, Subscription};
pub use request::{
    DeleteMessage, DiscussLeave, FriendAddRequest, GroupAddRequest, GroupAdmin, GroupAnonymous,
    GroupAnonymousBan, GroupBan, GroupCard, GroupKick, GroupLeave, GroupSpecialTitle,
    GroupWholeBan, Payload, SendLike, SendMessage, UpdatesRequest,
};
pub use sender::Sender;
pub use types::{Anonymous, ApiResponse, Chat, Group, Message, Update, User};
pub use webhook::{WebhookConfig, listen_for_webhook};
