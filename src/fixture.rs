//! A [RemoteDataSource] backed by a JSON file, for the demo binary and for running the caches without the native
//! layer. The file looks like:
//!
//! ```json
//! {
//!   "entries": [
//!     { "command": "get_type", "args": { "typeId": 34 }, "result": { "name": "Tritanium" } }
//!   ],
//!   "prices": [
//!     { "type_id": 34, "sell_min": 4.1, "buy_max": 3.9, "updated_at": 1700000000 }
//!   ]
//! }
//! ```

// System libraries.
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// Third party libraries.
use anyhow::Context;
use async_trait::async_trait;
use log::{info, warn};
use serde_json::{Map, Value};

// Project libraries.
use crate::query::Query;
use crate::source::RemoteDataSource;
use crate::types::PriceUpdate;
use crate::utils::parse_price_updates;

pub struct JsonFileSource {
    records: HashMap<Query, Value>,
}

impl JsonFileSource {
    pub fn with_file(file_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let json = read_json(file_path)?;
        Ok(Self::from_value(&json))
    }

    /// Build from an already parsed document. Entries that cannot be turned into a query are skipped with a warning,
    /// a later duplicate replaces an earlier one.
    pub fn from_value(json: &Value) -> Self {
        let entries = match json.get("entries") {
            Some(Value::Array(arr)) => arr.as_slice(),
            _ => {
                warn!("No entries array in reference data");
                &[]
            }
        };
        let mut records = HashMap::new();

        for (i, entry) in entries.iter().enumerate() {
            let command = match entry.get("command") {
                Some(Value::String(command)) => command,
                _ => {
                    warn!("Skipping entry {i} due to missing command");
                    continue;
                }
            };

            let args = entry
                .get("args")
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));
            let query = match Query::from_wire(command, args) {
                Ok(query) => query,
                Err(e) => {
                    warn!("Skipping entry {i}: {e}");
                    continue;
                }
            };

            // An explicit null is a valid "not found" answer, a missing result is not.
            let result = match entry.get("result") {
                Some(result) => result.clone(),
                None => {
                    warn!("Skipping entry {i} due to missing result");
                    continue;
                }
            };

            if records.insert(query, result).is_some() {
                warn!("Entry {i} replaces an earlier entry for the same query");
            }
        }

        info!(
            "Finished reading reference data, {} raw entries are identified and {} are valid",
            entries.len(),
            records.len()
        );
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl RemoteDataSource for JsonFileSource {
    /// Unknown keys answer `null`, the way the native layer reports "not found".
    async fn invoke(&self, query: &Query) -> anyhow::Result<Value> {
        Ok(self.records.get(query).cloned().unwrap_or(Value::Null))
    }
}

pub fn read_json(file_path: impl AsRef<Path>) -> anyhow::Result<Value> {
    let file_path = file_path.as_ref();
    info!("Reading json file {}", file_path.display());
    let file = File::open(file_path).with_context(|| format!("failed to open {}", file_path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", file_path.display()))
}

/// Quotes listed under `prices`, invalid ones skipped.
pub fn price_quotes(json: &Value) -> Vec<PriceUpdate> {
    match json.get("prices") {
        Some(Value::Array(arr)) => parse_price_updates(arr),
        _ => Vec::new(),
    }
}
