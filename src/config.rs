//! Runtime knobs. Every field has a default, so an empty `{}` file is a valid configuration.

// System libraries.
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

// Third party libraries.
use anyhow::{Context, ensure};
use log::{LevelFilter, info};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// A price record older than this is reported as outdated and may be refreshed.
    pub price_stale_after_secs: u64,
    /// Largest number of ids handed to the requester in one prefetch batch.
    pub price_batch_size: usize,
    pub log_level: String,
    pub worker_threads: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            price_stale_after_secs: 5 * 60,
            price_batch_size: 50,
            log_level: "info".to_string(),
            worker_threads: num_cpus::get(),
        }
    }
}

impl CacheConfig {
    pub fn from_file(file_path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let file_path = file_path.as_ref();
        info!("Reading config file {}", file_path.display());
        let file = File::open(file_path)
            .with_context(|| format!("failed to open config {}", file_path.display()))?;
        let config: Self = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse config {}", file_path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.price_batch_size > 0, "price_batch_size must be positive");
        ensure!(self.worker_threads > 0, "worker_threads must be positive");
        ensure!(
            self.log_level.parse::<LevelFilter>().is_ok(),
            "invalid log_level {:?}",
            self.log_level
        );
        Ok(())
    }

    pub fn price_stale_after(&self) -> Duration {
        Duration::from_secs(self.price_stale_after_secs)
    }

    pub fn log_level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}
