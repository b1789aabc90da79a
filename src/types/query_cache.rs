//! [KeyedQueryCache] behaviour. The whole single-flight guarantee rests on [KeyedQueryCache::request] doing its
//! lookup and its pending-entry insert under one lock, with no `.await` in between.
//!
//! Failed calls are not cached. The entry is dropped on failure, every waiter that joined before the failure gets
//! the same error, and the next request for that key starts a fresh call.

// System libraries.
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

// Third party libraries.
use futures::FutureExt;
use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;

// Project libraries.
use crate::error::CacheError;
use crate::events::{PushEvent, Topic};
use crate::query::Query;
use crate::source::{EventHandler, PushEventSource, RemoteDataSource};
use crate::types::{InFlight, KeyedQueryCache, QueryCacheInner, QueryEntry, QueryResult, QueryState};

impl KeyedQueryCache {
    pub fn new(source: Arc<dyn RemoteDataSource>) -> Self {
        Self {
            inner: Arc::new(QueryCacheInner {
                source,
                entries: Mutex::new(HashMap::new()),
                next_ticket: AtomicU64::new(0),
                subscription: Mutex::new(None),
            }),
        }
    }

    /// Resolve `query`, calling the source at most once per key for the lifetime of the entry. Must be called from
    /// within a tokio runtime: the remote call runs on its own task, so dropping this future does not cancel it and
    /// its result is still cached for later callers.
    pub async fn request(&self, query: Query) -> QueryResult {
        let in_flight = {
            let mut entries = self.inner.entries.lock();
            match entries.get(&query) {
                Some(QueryEntry::Resolved(value)) => return Ok(value.clone()),
                Some(QueryEntry::Pending { in_flight, .. }) => {
                    debug!("Joining in-flight call {query}");
                    in_flight.clone()
                }
                None => {
                    let ticket = self.inner.next_ticket.fetch_add(1, Ordering::Relaxed);
                    let in_flight = self.spawn_call(query.clone(), ticket);
                    entries.insert(
                        query,
                        QueryEntry::Pending {
                            ticket,
                            in_flight: in_flight.clone(),
                        },
                    );
                    in_flight
                }
            }
        };
        in_flight.await
    }

    /// [KeyedQueryCache::request] followed by decoding the shared value into `T`. A decode failure is the caller's
    /// problem only, the cached value is untouched.
    pub async fn request_as<T: DeserializeOwned>(&self, query: Query) -> Result<T, CacheError> {
        let command = query.command();
        let value = self.request(query).await?;
        T::deserialize(value.as_ref()).map_err(|e| CacheError::Decode {
            command,
            message: e.to_string(),
        })
    }

    /// Look at a key without triggering a call.
    pub fn peek(&self, query: &Query) -> QueryState {
        match self.inner.entries.lock().get(query) {
            None => QueryState::Absent,
            Some(QueryEntry::Pending { .. }) => QueryState::Pending,
            Some(QueryEntry::Resolved(value)) => QueryState::Resolved(value.clone()),
        }
    }

    /// Drop one entry. A call still in flight for it keeps running and answers its waiters, but its result is not
    /// written back.
    pub fn invalidate(&self, query: &Query) -> bool {
        let removed = self.inner.entries.lock().remove(query).is_some();
        if removed {
            debug!("Invalidated {query}");
        }
        removed
    }

    /// Drop every entry. Keys are not scoped by bundle, so a bundle switch can only be handled this way.
    pub fn clear(&self) -> usize {
        let dropped = {
            let mut entries = self.inner.entries.lock();
            let dropped = entries.len();
            entries.clear();
            dropped
        };
        info!("Cleared query cache, {dropped} entries dropped");
        dropped
    }

    /// Number of entries, pending and resolved.
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.lock().is_empty()
    }

    /// Clear the cache whenever the active bundle changes. Calling this again is a no-op. The subscription lives as
    /// long as the cache does.
    pub fn attach(&self, events: &dyn PushEventSource) -> Result<(), CacheError> {
        let mut subscription = self.inner.subscription.lock();
        if subscription.is_some() {
            debug!("Query cache already attached to bundle events");
            return Ok(());
        }

        let cache = Arc::downgrade(&self.inner);
        let handler: EventHandler = Arc::new(move |event: &PushEvent| {
            if !matches!(event, PushEvent::BundleChangeFinished) {
                return;
            }
            if let Some(inner) = cache.upgrade() {
                KeyedQueryCache { inner }.clear();
            }
        });
        *subscription = Some(events.subscribe(Topic::BundleLifecycle, handler)?);
        Ok(())
    }

    fn spawn_call(&self, query: Query, ticket: u64) -> InFlight {
        let command = query.command();
        debug!("Issuing {query}");

        let inner = self.inner.clone();
        let call_query = query.clone();
        let handle = tokio::spawn(async move {
            let result = inner
                .source
                .invoke(&call_query)
                .await
                .map(Arc::new)
                .map_err(|e| CacheError::from_remote(command, e));
            inner.settle(&call_query, ticket, &result);
            result
        });

        // The in-flight future lives inside the entries map, so it must not hold the cache strongly.
        let cache = Arc::downgrade(&self.inner);
        handle
            .map(move |joined| match joined {
                Ok(result) => result,
                Err(e) => {
                    warn!("Call {query} aborted: {e}");
                    if let Some(inner) = cache.upgrade() {
                        inner.forget(&query, ticket);
                    }
                    Err(CacheError::Aborted {
                        command,
                        message: e.to_string(),
                    })
                }
            })
            .boxed()
            .shared()
    }
}

impl QueryCacheInner {
    /// Record the outcome of call `ticket`, unless its entry was invalidated or replaced meanwhile.
    fn settle(&self, query: &Query, ticket: u64, result: &QueryResult) {
        let mut entries = self.entries.lock();
        let current = matches!(
            entries.get(query),
            Some(QueryEntry::Pending { ticket: pending, .. }) if *pending == ticket
        );

        match result {
            Ok(value) if current => {
                debug!("Resolved {query}");
                entries.insert(query.clone(), QueryEntry::Resolved(value.clone()));
            }
            Ok(_) => debug!("Discarding result of {query}, entry was invalidated"),
            Err(e) => {
                warn!("Call {query} failed, next request will retry: {e}");
                if current {
                    entries.remove(query);
                }
            }
        }
    }

    fn forget(&self, query: &Query, ticket: u64) {
        let mut entries = self.entries.lock();
        if matches!(
            entries.get(query),
            Some(QueryEntry::Pending { ticket: pending, .. }) if *pending == ticket
        ) {
            entries.remove(query);
        }
    }
}
