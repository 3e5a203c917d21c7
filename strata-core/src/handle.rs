use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};

/// One fully built configuration, numbered from 0.
#[derive(Debug)]
pub struct Generation {
    number: u64,
    config: Arc<Config>,
}

impl Generation {
    pub fn number(&self) -> u64 {
        self.number
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }
}

/// Shares the current configuration generation across threads and swaps in rebuilt ones.
///
/// Readers never block and always see a complete generation. Refreshes are serialized.
#[derive(Debug)]
pub struct ConfigHandle {
    current: ArcSwap<Generation>,
    refresh_lock: Mutex<()>,
}

impl ConfigHandle {
    pub fn new(config: Config) -> Self {
        Self {
            current: ArcSwap::new(Arc::new(Generation {
                number: 0,
                config: Arc::new(config),
            })),
            refresh_lock: Mutex::new(()),
        }
    }

    pub fn current(&self) -> Arc<Config> {
        Arc::clone(&self.current.load().config)
    }

    pub fn generation(&self) -> Arc<Generation> {
        self.current.load_full()
    }

    /// Builds a new generation with `build` and publishes it. On failure the current
    /// generation stays in place and the error is returned.
    pub fn refresh<F>(&self, build: F) -> Result<u64>
    where
        F: FnOnce() -> Result<Config>,
    {
        let _guard = self
            .refresh_lock
            .lock()
            .map_err(|_| Error::Config("refresh lock poisoned".to_owned()))?;

        let previous = self.current.load().number;
        match build() {
            Ok(config) => {
                let number = previous + 1;
                self.current.store(Arc::new(Generation {
                    number,
                    config: Arc::new(config),
                }));
                info!(generation = number, "configuration refreshed");
                Ok(number)
            }
            Err(err) => {
                warn!(generation = previous, error = %err, "configuration refresh failed; keeping current generation");
                Err(err)
            }
        }
    }
}
