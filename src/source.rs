//! Capabilities the caches consume. The application wires them to the native bridge; tests wire them to fakes.

// System libraries.
use std::fmt;
use std::sync::Arc;

// Third party libraries.
use async_trait::async_trait;
use serde_json::Value;

// Project libraries.
use crate::error::CacheError;
use crate::events::{PushEvent, Topic};
use crate::query::{Query, TypeId};

/// Read-only, parameterized remote data. A source may return a [CacheError] wrapped in the [anyhow::Error] (for
/// example [CacheError::UnknownOperation]); the cache hands it to callers as is.
#[async_trait]
pub trait RemoteDataSource: Send + Sync {
    async fn invoke(&self, query: &Query) -> anyhow::Result<Value>;
}

/// Fire-and-forget price requests. `Ok` only means the request left, the answer comes back as a push event.
pub trait PriceRequester: Send + Sync {
    fn request_price(&self, type_id: TypeId) -> Result<(), CacheError>;

    /// Issue a batch. Stops at the first failure; the caller then treats the whole batch as not issued.
    fn request_prices(&self, type_ids: &[TypeId]) -> Result<(), CacheError> {
        for type_id in type_ids {
            self.request_price(*type_id)?;
        }
        Ok(())
    }
}

pub type EventHandler = Arc<dyn Fn(&PushEvent) + Send + Sync>;

pub trait PushEventSource: Send + Sync {
    fn subscribe(&self, topic: Topic, handler: EventHandler) -> Result<Subscription, CacheError>;
}

/// A live listener registration. Dropping it unsubscribes.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}
