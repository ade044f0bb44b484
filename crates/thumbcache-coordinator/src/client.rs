//! Connection handling for the coordinator store.

use redis::aio::MultiplexedConnection;

use crate::error::{CoordinatorError, CoordinatorResult};

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub host: String,
    pub port: u16,
}

impl CoordinatorConfig {
    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}", self.host, self.port)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 32774,
        }
    }
}

/// Typed client over the shared coordinator store.
///
/// `redis::Client` is cheap to clone and internally pools connections, so
/// every accessor below grabs a fresh multiplexed connection per call rather
/// than holding one open; that keeps the struct `Send + Sync + Clone`
/// without a mutex.
#[derive(Clone)]
pub struct CoordinatorStore {
    client: redis::Client,
}

impl CoordinatorStore {
    pub fn new(config: &CoordinatorConfig) -> CoordinatorResult<Self> {
        let client = redis::Client::open(config.redis_url())
            .map_err(|e| CoordinatorError::connection_failed(e.to_string()))?;
        Ok(Self { client })
    }

    pub(crate) async fn connection(&self) -> CoordinatorResult<MultiplexedConnection> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }

    pub(crate) fn raw_client(&self) -> &redis::Client {
        &self.client
    }
}
