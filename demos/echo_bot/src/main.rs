//! Minimal echo bot: replies to `/echo ...` with the joined arguments.
//!
//! ```sh
//! BRAZE_ENDPOINT=ws://127.0.0.1:6700 BRAZE_TOKEN=secret cargo run -p echo_bot
//! ```

use std::sync::Arc;

use braze::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let endpoint =
        std::env::var("BRAZE_ENDPOINT").unwrap_or_else(|_| "ws://127.0.0.1:6700".to_string());
    let token = std::env::var("BRAZE_TOKEN").unwrap_or_default();

    let bot = Arc::new(BotApi::connect(&endpoint, &token).await?);
    tracing::info!(id = bot.self_info.id, "connected");

    let config = CommandConfig::strict();
    let mut updates = bot.clone().updates_channel(UpdatesRequest::default());
    while let Some(update) = updates.recv().await {
        let Some(message) = &update.message else {
            continue;
        };
        let Some(chat) = &message.chat else {
            continue;
        };
        if !message.is_command(&config) {
            continue;
        }
        let (cmd, args) = message.command(&config);
        if cmd == "echo" {
            let reply = bot
                .clone()
                .message(chat.id, chat.kind.as_str())
                .text(args.join(" "));
            if let Err(err) = reply.send().await {
                tracing::warn!(error = %err, "failed to reply");
            }
        }
    }
    Ok(())
}
