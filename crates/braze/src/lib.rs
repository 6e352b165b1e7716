//! # Braze
//!
//! A client library for CQHTTP-style chat-bot gateways: a typed CQ-code
//! message codec plus an HTTP/WebSocket API client.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   updates    ┌────────────┐   Media/Message   ┌─────────────┐
//! │  Gateway   │─────────────▶│   BotApi   │──────────────────▶│ braze-cqcode│
//! │ (HTTP/WS)  │◀─────────────│ (braze-api)│◀──────────────────│   (codec)   │
//! └────────────┘  api calls   └────────────┘  CQ string/array  └─────────────┘
//! ```
//!
//! - **[`cqcode`]**: the pure message model and codec — elements, marker
//!   grammar, segment pivot, command extraction.
//! - **[`api`]**: the network client — typed request/response calls,
//!   update polling, webhook listening, the chainable sender and the
//!   event bus.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use braze::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let bot = Arc::new(BotApi::connect("ws://127.0.0.1:6700", "token").await?);
//!     bot.clone()
//!         .message(10000, "group")
//!         .text("hello ")
//!         .face_by_name("微笑")
//!         .send()
//!         .await?;
//!     Ok(())
//! }
//! ```

pub use braze_api as api;
pub use braze_cqcode as cqcode;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use braze::prelude::*;
/// ```
pub mod prelude {
    // Client - main entry point
    pub use braze_api::{ApiError, ApiResult, BotApi, UpdatesChannel, UpdatesRequest};

    // Push delivery and dispatch
    pub use braze_api::{EventBus, WebhookConfig, listen_for_webhook};

    // Wire types seen by handlers
    pub use braze_api::{Update, User};

    // Message building
    pub use braze_api::Sender;
    pub use braze_cqcode::{Media, Message, Segment};

    // Command extraction
    pub use braze_cqcode::CommandConfig;
}
