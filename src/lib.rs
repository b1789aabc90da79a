//! Client-side caches in front of a native reference-data layer: a single-flight memo for static game data and a
//! push-updated market price cache, both invalidated when the active data bundle changes.

pub mod config;
pub mod error;
pub mod events;
pub mod fixture;
pub mod query;
pub mod source;
pub mod types;
pub mod utils;

pub use config::CacheConfig;
pub use error::CacheError;
pub use events::{EventBus, PushEvent, Topic};
pub use fixture::JsonFileSource;
pub use query::{GraphicType, Language, Operation, Query, Security, TypeId};
pub use source::{EventHandler, PriceRequester, PushEventSource, RemoteDataSource, Subscription};
pub use types::{
    EventRouter, Freshness, KeyedQueryCache, MarketPriceCache, MarketPriceRecord, PendingRequestRegistry,
    PriceLookup, PriceUpdate, QueryResult, QueryState, QueryValue,
};
