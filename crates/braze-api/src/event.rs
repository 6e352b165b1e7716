//! Hierarchical event dispatch over an updates channel.
//!
//! Every update emits on up to three keys, most specific first:
//! `post_type.detailed_type.sub_type`, `post_type.detailed_type`, and
//! `post_type` — e.g. a normal group message fires
//! `message.group.normal`, `message.group`, `message`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::bot::UpdatesChannel;
use crate::types::Update;

type Handler = Arc<dyn Fn(&Update) + Send + Sync>;

/// Fan-out dispatcher keyed by hierarchical event names.
///
/// Cloning is cheap and shares the subscriber registry.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

#[derive(Default)]
struct BusInner {
    subscribers: HashMap<String, Vec<(u64, Handler)>>,
    next_id: u64,
}

/// Handle returned by [`EventBus::on`]; detaches the handler when used.
pub struct Subscription {
    bus: EventBus,
    event: String,
    id: u64,
}

impl Subscription {
    /// Removes the handler from the bus.
    pub fn unsubscribe(self) {
        self.bus.off(&self.event, self.id);
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for `event`.
    pub fn on(
        &self,
        event: impl Into<String>,
        handler: impl Fn(&Update) + Send + Sync + 'static,
    ) -> Subscription {
        let event = event.into();
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        inner
            .subscribers
            .entry(event.clone())
            .or_default()
            .push((id, Arc::new(handler)));
        Subscription {
            bus: self.clone(),
            event,
            id,
        }
    }

    fn off(&self, event: &str, id: u64) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(handlers) = inner.subscribers.get_mut(event) {
            handlers.retain(|(handler_id, _)| *handler_id != id);
        }
    }

    /// Emits `update` to the handlers of one event key.
    ///
    /// Handlers run outside the registry lock, so they may subscribe or
    /// unsubscribe freely.
    pub fn emit(&self, event: &str, update: &Update) {
        let handlers: Vec<Handler> = {
            let inner = self.inner.lock().unwrap();
            inner
                .subscribers
                .get(event)
                .map(|handlers| handlers.iter().map(|(_, h)| h.clone()).collect())
                .unwrap_or_default()
        };
        for handler in handlers {
            handler(update);
        }
    }

    /// Derives the emit keys for an update, most specific first.
    fn keys(update: &Update) -> Vec<String> {
        let detailed = match update.post_type.as_str() {
            "message" => update.message_type.as_str(),
            "notice" | "event" => update.notice_type.as_str(),
            "request" => update.request_type.as_str(),
            _ => "",
        };
        let mut keys = Vec::new();
        if !detailed.is_empty() {
            if !update.sub_type.is_empty() {
                keys.push(format!("{}.{}.{}", update.post_type, detailed, update.sub_type));
            }
            keys.push(format!("{}.{}", update.post_type, detailed));
        }
        keys.push(update.post_type.clone());
        keys
    }

    /// Consumes an updates channel, emitting every update on its
    /// hierarchical keys until the channel closes.
    pub fn attach(&self, mut updates: UpdatesChannel) {
        let bus = self.clone();
        tokio::spawn(async move {
            while let Some(update) = updates.recv().await {
                for key in EventBus::keys(&update) {
                    bus.emit(&key, &update);
                }
            }
            debug!("updates channel closed, event bus detached");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn group_message() -> Update {
        serde_json::from_value(json!({
            "post_type": "message",
            "message_type": "group",
            "sub_type": "normal",
            "group_id": 1000,
            "user_id": 42,
            "message": "hi",
        }))
        .unwrap()
    }

    #[test]
    fn test_keys_most_specific_first() {
        assert_eq!(
            EventBus::keys(&group_message()),
            vec!["message.group.normal", "message.group", "message"]
        );

        let notice: Update = serde_json::from_value(json!({
            "post_type": "notice",
            "notice_type": "group_upload",
        }))
        .unwrap();
        assert_eq!(EventBus::keys(&notice), vec!["notice.group_upload", "notice"]);

        let bare: Update = serde_json::from_value(json!({"post_type": "meta"})).unwrap();
        assert_eq!(EventBus::keys(&bare), vec!["meta"]);
    }

    #[test]
    fn test_emit_and_unsubscribe() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let recorder = {
            let seen = seen.clone();
            bus.on("message.group", move |update: &Update| {
                seen.lock().unwrap().push(update.group_id);
            })
        };

        bus.emit("message.group", &group_message());
        assert_eq!(*seen.lock().unwrap(), vec![1000]);

        recorder.unsubscribe();
        bus.emit("message.group", &group_message());
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_attach_fans_out() {
        let bus = EventBus::new();
        let (fired_tx, mut fired_rx) = tokio::sync::mpsc::channel(8);

        let _sub = bus.on("message", move |update: &Update| {
            let _ = fired_tx.try_send(update.user_id);
        });

        let (tx, rx) = tokio::sync::mpsc::channel(8);
        bus.attach(rx);
        tx.send(group_message()).await.unwrap();

        assert_eq!(fired_rx.recv().await, Some(42));
    }
}
