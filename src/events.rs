//! Push events from the backend and the in-process [EventBus] that fans them out to subscribers.

// System libraries.
use std::collections::HashMap;
use std::sync::Arc;

// Third party libraries.
use log::{debug, warn};
use parking_lot::Mutex;
use serde_json::Value;

// Project libraries.
use crate::error::CacheError;
use crate::source::{EventHandler, PushEventSource, Subscription};
use crate::types::PriceUpdate;
use crate::utils::{parse_price_update, parse_price_updates};

pub const PRICE_UPDATED: &str = "market-price-updated";
pub const PRICES_UPDATED: &str = "market-prices-updated";
pub const BUNDLE_CHANGE_START: &str = "bundle-change-start";
pub const BUNDLE_CHANGE_FINISHED: &str = "bundle-change-finished";
pub const BUNDLES_CHANGED: &str = "bundles-changed";

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Topic {
    PriceUpdate,
    BundleLifecycle,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PushEvent {
    PriceUpdated(PriceUpdate),
    /// Several quotes in one payload, applied in payload order.
    PricesUpdated(Vec<PriceUpdate>),
    BundleChangeStarted { server_id: String },
    /// The active bundle is now a different dataset. Every cached key is void.
    BundleChangeFinished,
    /// The list of installed bundles changed, the active one did not.
    BundlesChanged,
}

impl PushEvent {
    pub fn topic(&self) -> Topic {
        match self {
            PushEvent::PriceUpdated(_) | PushEvent::PricesUpdated(_) => Topic::PriceUpdate,
            PushEvent::BundleChangeStarted { .. }
            | PushEvent::BundleChangeFinished
            | PushEvent::BundlesChanged => Topic::BundleLifecycle,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PushEvent::PriceUpdated(_) => PRICE_UPDATED,
            PushEvent::PricesUpdated(_) => PRICES_UPDATED,
            PushEvent::BundleChangeStarted { .. } => BUNDLE_CHANGE_START,
            PushEvent::BundleChangeFinished => BUNDLE_CHANGE_FINISHED,
            PushEvent::BundlesChanged => BUNDLES_CHANGED,
        }
    }

    /// Parse a backend event. `Ok(None)` means the event exists but is none of our business (import progress and
    /// the like).
    pub fn from_wire(name: &str, payload: &Value) -> Result<Option<Self>, CacheError> {
        let event = match name {
            PRICE_UPDATED => PushEvent::PriceUpdated(parse_price_update(payload)?),
            PRICES_UPDATED => match payload {
                Value::Array(arr) => PushEvent::PricesUpdated(parse_price_updates(arr)),
                _ => {
                    return Err(CacheError::MalformedEvent {
                        event: name.to_string(),
                        message: "payload is not an array".to_string(),
                    });
                }
            },
            BUNDLE_CHANGE_START => match payload.get("serverId").and_then(Value::as_str) {
                Some(server_id) => PushEvent::BundleChangeStarted {
                    server_id: server_id.to_string(),
                },
                None => {
                    return Err(CacheError::MalformedEvent {
                        event: name.to_string(),
                        message: "missing serverId".to_string(),
                    });
                }
            },
            BUNDLE_CHANGE_FINISHED => PushEvent::BundleChangeFinished,
            BUNDLES_CHANGED => PushEvent::BundlesChanged,
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    handlers: HashMap<Topic, Vec<(u64, EventHandler)>>,
}

/// Synchronous, in-process [PushEventSource]. Handlers of a topic run in subscription order, on the emitting thread,
/// with the bus unlocked so they may emit or unsubscribe themselves.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&self, event: &PushEvent) {
        let handlers: Vec<EventHandler> = {
            let inner = self.inner.lock();
            inner
                .handlers
                .get(&event.topic())
                .map(|handlers| handlers.iter().map(|(_, handler)| handler.clone()).collect())
                .unwrap_or_default()
        };
        debug!("Delivering {} to {} handler(s)", event.name(), handlers.len());
        for handler in handlers {
            handler(event);
        }
    }

    /// Parse and deliver a raw backend event. Malformed payloads are reported and dropped.
    pub fn emit_wire(&self, name: &str, payload: &Value) -> Result<(), CacheError> {
        match PushEvent::from_wire(name, payload) {
            Ok(Some(event)) => {
                self.emit(&event);
                Ok(())
            }
            Ok(None) => {
                debug!("Ignoring event {name}");
                Ok(())
            }
            Err(e) => {
                warn!("Dropping event {name}: {e}");
                Err(e)
            }
        }
    }

    pub fn handler_count(&self, topic: Topic) -> usize {
        self.inner
            .lock()
            .handlers
            .get(&topic)
            .map_or(0, |handlers| handlers.len())
    }
}

impl PushEventSource for EventBus {
    fn subscribe(&self, topic: Topic, handler: EventHandler) -> Result<Subscription, CacheError> {
        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.handlers.entry(topic).or_default().push((id, handler));
            id
        };
        debug!("Subscribed handler {id} to {topic:?}");

        let bus = Arc::downgrade(&self.inner);
        Ok(Subscription::new(move || {
            if let Some(bus) = bus.upgrade() {
                if let Some(handlers) = bus.lock().handlers.get_mut(&topic) {
                    handlers.retain(|(handler_id, _)| *handler_id != id);
                }
                debug!("Released handler {id} from {topic:?}");
            }
        }))
    }
}
