//! [MarketPriceCache] behaviour. Requests never return a price: they only mark an instrument outstanding and ask the
//! backend to compute one. The price shows up later as a push event, which is the only way a record gets written.
//!
//! Per instrument the state machine is `absent -> outstanding -> present`, `present -> present` on every further
//! event, and `outstanding -> absent` when the request could not be issued.

// System libraries.
use std::sync::Arc;
use std::time::Duration;

// Third party libraries.
use log::{debug, info, warn};
use parking_lot::Mutex;

// Project libraries.
use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::events::{PushEvent, Topic};
use crate::query::TypeId;
use crate::source::{EventHandler, PriceRequester, PushEventSource};
use crate::types::{
    EventRouter, Freshness, MarketCacheInner, MarketPriceCache, MarketPriceRecord, MarketState,
    PriceLookup, PriceUpdate,
};
use crate::utils::now_epoch_secs;

impl MarketPriceRecord {
    /// `now` and `last_update` are epoch seconds.
    pub fn freshness(&self, now: i64, stale_after: Duration) -> Freshness {
        if now.saturating_sub(self.last_update) < stale_after.as_secs() as i64 {
            Freshness::Fresh
        } else {
            Freshness::Outdated
        }
    }
}

impl From<PriceUpdate> for MarketPriceRecord {
    fn from(update: PriceUpdate) -> Self {
        Self {
            type_id: update.type_id,
            sell_min: update.sell_min,
            buy_max: update.buy_max,
            last_update: update.updated_at,
        }
    }
}

impl MarketPriceCache {
    pub fn new(requester: Arc<dyn PriceRequester>, config: &CacheConfig) -> Self {
        Self {
            inner: Arc::new(MarketCacheInner {
                requester,
                state: Mutex::new(MarketState::default()),
                stale_after: config.price_stale_after(),
                batch_size: config.price_batch_size.max(1),
                subscriptions: Mutex::new(Vec::new()),
            }),
        }
    }

    /// The cached record, possibly stale, or [PriceLookup::Pending] after making sure exactly one request for
    /// `type_id` is in flight.
    pub fn get_record(&self, type_id: TypeId) -> PriceLookup {
        let generation = {
            let mut state = self.inner.state.lock();
            if let Some(record) = state.records.get(&type_id) {
                return PriceLookup::Ready(*record);
            }
            match state.pending.mark(type_id) {
                Some(generation) => generation,
                None => return PriceLookup::Pending,
            }
        };
        self.issue(&[(type_id, generation)]);
        PriceLookup::Pending
    }

    /// Warm up the cache. Every id that is neither cached nor outstanding is marked before the first request goes
    /// out, then requests are issued in batches. Returns how many ids were marked.
    pub fn prefetch(&self, type_ids: &[TypeId]) -> usize {
        let marked = {
            let mut state = self.inner.state.lock();
            let MarketState { records, pending } = &mut *state;
            pending.mark_all(type_ids, |type_id| records.contains_key(&type_id))
        };
        debug!("Prefetching {} of {} price(s)", marked.len(), type_ids.len());
        for batch in marked.chunks(self.inner.batch_size) {
            self.issue(batch);
        }
        marked.len()
    }

    /// Ask for a newer quote of a cached instrument. Nothing happens while a request for it is outstanding, or while
    /// its record is still fresh unless `force` is set. The current record stays readable until the answer arrives.
    pub fn refresh(&self, type_id: TypeId, force: bool) -> bool {
        let now = now_epoch_secs();
        let generation = {
            let mut state = self.inner.state.lock();
            if state.pending.is_outstanding(type_id) {
                return false;
            }
            let fresh = state
                .records
                .get(&type_id)
                .is_some_and(|record| record.freshness(now, self.inner.stale_after) == Freshness::Fresh);
            if fresh && !force {
                return false;
            }
            match state.pending.mark(type_id) {
                Some(generation) => generation,
                None => return false,
            }
        };
        self.issue(&[(type_id, generation)])
    }

    /// Freshness of the cached record, if there is one.
    pub fn freshness(&self, type_id: TypeId) -> Option<Freshness> {
        let now = now_epoch_secs();
        self.inner
            .state
            .lock()
            .records
            .get(&type_id)
            .map(|record| record.freshness(now, self.inner.stale_after))
    }

    /// Apply one push event. Last write wins in arrival order, `updated_at` is not compared.
    pub fn ingest(&self, update: PriceUpdate) {
        self.inner.ingest(update);
    }

    pub fn clear(&self) {
        self.inner.clear();
    }

    pub fn clear_one(&self, type_id: TypeId) {
        let mut state = self.inner.state.lock();
        state.records.remove(&type_id);
        state.pending.settle(type_id);
    }

    pub fn is_outstanding(&self, type_id: TypeId) -> bool {
        self.inner.state.lock().pending.is_outstanding(type_id)
    }

    pub fn outstanding_count(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Number of cached records.
    pub fn len(&self) -> usize {
        self.inner.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().records.is_empty()
    }

    /// Subscribe to price updates and bundle switches. Calling this again is a no-op. Both subscriptions are released
    /// when the last handle to the cache is dropped.
    pub fn attach(&self, events: &dyn PushEventSource) -> Result<(), CacheError> {
        let mut subscriptions = self.inner.subscriptions.lock();
        if !subscriptions.is_empty() {
            debug!("Market cache already attached");
            return Ok(());
        }

        let router = EventRouter::new(self);
        let prices = events.subscribe(Topic::PriceUpdate, router.handler())?;

        let cache = Arc::downgrade(&self.inner);
        let on_bundle: EventHandler = Arc::new(move |event: &PushEvent| {
            if !matches!(event, PushEvent::BundleChangeFinished) {
                return;
            }
            if let Some(inner) = cache.upgrade() {
                inner.clear();
            }
        });
        let bundles = events.subscribe(Topic::BundleLifecycle, on_bundle)?;

        subscriptions.push(prices);
        subscriptions.push(bundles);
        Ok(())
    }

    /// Issue requests for ids that are already marked outstanding. On failure the markers this call set are rolled
    /// back so a later call can retry; no error record is cached.
    fn issue(&self, marked: &[(TypeId, u64)]) -> bool {
        let type_ids: Vec<TypeId> = marked.iter().map(|(type_id, _)| *type_id).collect();
        let result = match type_ids.as_slice() {
            [type_id] => self.inner.requester.request_price(*type_id),
            _ => self.inner.requester.request_prices(&type_ids),
        };
        match result {
            Ok(()) => {
                debug!("Requested price(s) for {type_ids:?}");
                true
            }
            Err(e) => {
                warn!("Rolling back {} outstanding price request(s): {e}", type_ids.len());
                let mut state = self.inner.state.lock();
                for (type_id, generation) in marked {
                    if !state.pending.rollback(*type_id, *generation) {
                        debug!("Keeping newer outstanding marker for {type_id}");
                    }
                }
                false
            }
        }
    }
}

impl MarketCacheInner {
    pub(crate) fn ingest(&self, update: PriceUpdate) {
        let mut state = self.state.lock();
        if let Some(previous) = state.records.insert(update.type_id, update.into()) {
            if previous.last_update > update.updated_at {
                debug!(
                    "Price for {} moved back from {} to {}, applying in arrival order",
                    update.type_id, previous.last_update, update.updated_at
                );
            }
        }
        state.pending.settle(update.type_id);
    }

    pub(crate) fn clear(&self) {
        let mut state = self.state.lock();
        let dropped = state.records.len();
        let outstanding = state.pending.len();
        state.records.clear();
        state.pending.clear();
        info!("Cleared market cache, {dropped} record(s) and {outstanding} outstanding request(s) dropped");
    }
}
