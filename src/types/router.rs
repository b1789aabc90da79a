// System libraries.
use std::sync::Arc;

// Third party libraries.
use log::debug;

// Project libraries.
use crate::events::PushEvent;
use crate::source::EventHandler;
use crate::types::{EventRouter, MarketPriceCache};

impl EventRouter {
    pub fn new(cache: &MarketPriceCache) -> Self {
        Self {
            cache: Arc::downgrade(&cache.inner),
        }
    }

    /// Write the price payload of `event` into the cache, in payload order. Returns the number of records written.
    pub fn route(&self, event: &PushEvent) -> usize {
        let Some(cache) = self.cache.upgrade() else {
            debug!("Dropping {}, market cache is gone", event.name());
            return 0;
        };
        match event {
            PushEvent::PriceUpdated(update) => {
                cache.ingest(*update);
                1
            }
            PushEvent::PricesUpdated(updates) => {
                for update in updates {
                    cache.ingest(*update);
                }
                updates.len()
            }
            _ => 0,
        }
    }

    pub fn handler(&self) -> EventHandler {
        let router = self.clone();
        Arc::new(move |event: &PushEvent| {
            router.route(event);
        })
    }
}
