// System libraries.
use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::Duration;

// Third party libraries.
use futures::future::join_all;
use log::{info, warn};
use serde_json::Value;
use tokio::runtime::Handle;

// Project libraries.
use reference_cache::events::BUNDLE_CHANGE_FINISHED;
use reference_cache::fixture::{price_quotes, read_json};
use reference_cache::utils::now_epoch_secs;
use reference_cache::{
    CacheConfig, CacheError, EventBus, JsonFileSource, KeyedQueryCache, Language, MarketPriceCache, PriceRequester,
    PriceUpdate, PushEvent, Query, TypeId,
};

/// Answers price requests from the fixture's `prices` section, a little later and through the bus, the way the native
/// layer does.
struct FixturePriceRequester {
    bus: EventBus,
    handle: Handle,
    quotes: HashMap<TypeId, PriceUpdate>,
    delay: Duration,
}

impl FixturePriceRequester {
    fn quote(&self, type_id: TypeId) -> PriceUpdate {
        self.quotes.get(&type_id).copied().unwrap_or(PriceUpdate {
            type_id,
            sell_min: None,
            buy_max: None,
            updated_at: now_epoch_secs(),
        })
    }
}

impl PriceRequester for FixturePriceRequester {
    fn request_price(&self, type_id: TypeId) -> Result<(), CacheError> {
        let event = PushEvent::PriceUpdated(self.quote(type_id));
        let bus = self.bus.clone();
        let delay = self.delay;
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            bus.emit(&event);
        });
        Ok(())
    }

    fn request_prices(&self, type_ids: &[TypeId]) -> Result<(), CacheError> {
        let event = PushEvent::PricesUpdated(type_ids.iter().map(|type_id| self.quote(*type_id)).collect());
        let bus = self.bus.clone();
        let delay = self.delay;
        self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            bus.emit(&event);
        });
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let data_path = args.get(1).map_or("./reference_data.json", String::as_str);
    let config = match args.get(2) {
        Some(path) => CacheConfig::from_file(path)?,
        None => CacheConfig::default(),
    };

    env_logger::builder()
        .filter_level(config.log_level_filter())
        .init();
    info!("Logging system initialized");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads)
        .enable_all()
        .build()?;
    info!("Runtime started with {} worker threads", config.worker_threads);

    let data = match read_json(data_path) {
        Ok(data) => data,
        Err(e) => {
            warn!("Running without reference data: {e:#}");
            Value::Null
        }
    };
    runtime.block_on(run(config, data))
}

async fn run(config: CacheConfig, data: Value) -> anyhow::Result<()> {
    let bus = EventBus::new();

    let queries = KeyedQueryCache::new(Arc::new(JsonFileSource::from_value(&data)));
    queries.attach(&bus)?;

    let requester = FixturePriceRequester {
        bus: bus.clone(),
        handle: Handle::current(),
        quotes: price_quotes(&data)
            .into_iter()
            .map(|quote| (quote.type_id, quote))
            .collect(),
        delay: Duration::from_millis(20),
    };
    let prices = MarketPriceCache::new(Arc::new(requester), &config);
    prices.attach(&bus)?;

    // Three callers, one remote call.
    let tritanium = Query::GetType { type_id: 34 };
    let results = join_all((0..3).map(|_| queries.request(tritanium.clone()))).await;
    for result in &results {
        dbg!(result);
    }
    dbg!(queries.len());

    let hits: Vec<TypeId> = queries
        .request_as(Query::SearchTypeByName {
            name: "trit".to_string(),
            language: Language::En,
            limit: 20,
        })
        .await
        .unwrap_or_else(|e| {
            warn!("Search failed: {e}");
            Vec::new()
        });
    dbg!(&hits);

    let issued = prices.prefetch(&[34, 35, 36]);
    info!("Prefetch issued {issued} price request(s)");
    dbg!(prices.get_record(34));
    tokio::time::sleep(Duration::from_millis(100)).await;
    for type_id in [34, 35, 36] {
        dbg!(prices.get_record(type_id));
        dbg!(prices.freshness(type_id));
    }

    bus.emit_wire(BUNDLE_CHANGE_FINISHED, &Value::Null)?;
    dbg!(queries.len());
    dbg!(prices.len());
    Ok(())
}
