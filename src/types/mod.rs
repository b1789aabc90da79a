//! Data structure definitions. There are two independent caches sitting between the UI and the native data layer:
//!
//! 1. [KeyedQueryCache] memoizes read-only reference data forever. Each distinct [Query] has at most one entry, and a
//!    pending entry carries the single in-flight call every concurrent caller awaits.
//! 2. [MarketPriceCache] keeps the latest known quote per instrument. Requests are fire-and-forget, answers arrive
//!    later as push events, so the only thing tracked on the request side is the outstanding set.
//!
//! Both keep their maps behind a [Mutex] that is never held across an `.await` or an outbound call, so "is there an
//! entry" and "record a new pending entry" always happen in one critical section.

pub mod market_cache;
pub mod pending;
pub mod query_cache;
pub mod router;

// System libraries.
use std::collections::HashMap;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Weak};
use std::time::Duration;

// Third party libraries.
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Project libraries.
use crate::error::CacheError;
use crate::query::{Query, TypeId};
use crate::source::{PriceRequester, RemoteDataSource, Subscription};

/// Resolved values are shared, every caller of a key gets a handle to the same JSON document.
pub type QueryValue = Arc<Value>;
pub type QueryResult = Result<QueryValue, CacheError>;

pub(crate) type InFlight = Shared<BoxFuture<'static, QueryResult>>;

/// Failures are never stored: a failed call removes its entry, so there is no failed variant here.
pub(crate) enum QueryEntry {
    /// `ticket` is unique per entry, a settlement only lands if the entry it was issued for is still there.
    Pending { ticket: u64, in_flight: InFlight },
    Resolved(QueryValue),
}

/// Snapshot of a key as seen by a caller that does not want to trigger a call.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryState {
    Absent,
    Pending,
    Resolved(QueryValue),
}

/// Request-deduplicating, infinite-TTL cache over a [RemoteDataSource]. Cloning is cheap and every clone shares the
/// same entries.
#[derive(Clone)]
pub struct KeyedQueryCache {
    pub(crate) inner: Arc<QueryCacheInner>,
}

pub(crate) struct QueryCacheInner {
    pub(crate) source: Arc<dyn RemoteDataSource>,
    pub(crate) entries: Mutex<HashMap<Query, QueryEntry>>,
    pub(crate) next_ticket: AtomicU64,
    pub(crate) subscription: Mutex<Option<Subscription>>,
}

/// Best known sell/buy quote of one instrument. `last_update` is epoch seconds as stamped by the backend.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct MarketPriceRecord {
    pub type_id: TypeId,
    pub sell_min: Option<f64>,
    pub buy_max: Option<f64>,
    pub last_update: i64,
}

/// Payload of a `market-price-updated` push event.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct PriceUpdate {
    pub type_id: TypeId,
    pub sell_min: Option<f64>,
    pub buy_max: Option<f64>,
    pub updated_at: i64,
}

/// What [MarketPriceCache::get_record] hands out. `Pending` is "no data yet", never an error.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PriceLookup {
    Ready(MarketPriceRecord),
    Pending,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Freshness {
    Fresh,
    Outdated,
}

/// Instruments with a price request in flight and no answer seen yet. Each marker carries a generation so a failed
/// issue only rolls back the marker it set.
#[derive(Clone, Debug, Default)]
pub struct PendingRequestRegistry {
    pub(crate) outstanding: HashMap<TypeId, u64>,
    pub(crate) next_generation: u64,
}

#[derive(Debug, Default)]
pub(crate) struct MarketState {
    pub(crate) records: HashMap<TypeId, MarketPriceRecord>,
    pub(crate) pending: PendingRequestRegistry,
}

/// Push-invalidated price cache. Cloning is cheap and every clone shares the same records.
#[derive(Clone)]
pub struct MarketPriceCache {
    pub(crate) inner: Arc<MarketCacheInner>,
}

pub(crate) struct MarketCacheInner {
    pub(crate) requester: Arc<dyn PriceRequester>,
    pub(crate) state: Mutex<MarketState>,
    pub(crate) stale_after: Duration,
    pub(crate) batch_size: usize,
    pub(crate) subscriptions: Mutex<Vec<Subscription>>,
}

/// Turns incoming price events into cache writes. Holds the cache weakly so a live subscription never keeps a torn
/// down cache alive.
#[derive(Clone)]
pub struct EventRouter {
    pub(crate) cache: Weak<MarketCacheInner>,
}
