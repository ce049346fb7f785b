use async_trait::async_trait;
use redis::{AsyncCommands, AsyncIter, aio::MultiplexedConnection};
use tokio::sync::OnceCell;
use tracing::{debug, error, warn};

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::declare_object_cache_plugin;

declare_object_cache_plugin!("redis", RedisObjectCache);

/// Redis 后端，多个实例共享花名册和用户缓存
pub struct RedisObjectCache {
    client: redis::Client,
    conn: OnceCell<MultiplexedConnection>,
    key_prefix: String,
    default_ttl: u64,
}

impl RedisObjectCache {
    pub fn new() -> Result<Self, String> {
        let config = AppConfig::get();
        let redis_config = &config.cache.redis;

        let client = redis::Client::open(redis_config.url.as_str())
            .map_err(|e| format!("Invalid Redis URL '{}': {e}", redis_config.url))?;

        // 启动时同步探活，失败则由启动流程回退到内存缓存
        let mut probe = client.get_connection().map_err(|e| {
            error!(url = %redis_config.url, "Redis unreachable: {}", e);
            format!("Redis connection failed: {e}")
        })?;
        let pong: String = redis::cmd("PING").query(&mut probe).map_err(|e| {
            error!(url = %redis_config.url, "Redis PING failed: {}", e);
            format!("Redis ping failed: {e}")
        })?;
        debug!(
            prefix = %redis_config.key_prefix,
            default_ttl = config.cache.default_ttl,
            "Redis cache ready ({})",
            pong
        );

        Ok(Self {
            client,
            conn: OnceCell::new(),
            key_prefix: redis_config.key_prefix.clone(),
            default_ttl: config.cache.default_ttl,
        })
    }

    /// 复用同一条多路复用连接
    async fn connection(&self) -> Option<MultiplexedConnection> {
        let conn = self
            .conn
            .get_or_try_init(|| self.client.get_multiplexed_async_connection())
            .await;
        match conn {
            Ok(conn) => Some(conn.clone()),
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                None
            }
        }
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl ObjectCache for RedisObjectCache {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        let Some(mut conn) = self.connection().await else {
            return CacheResult::ExistsButNoValue;
        };

        match conn.get::<_, Option<String>>(self.make_key(key)).await {
            Ok(Some(data)) => CacheResult::Found(data),
            Ok(None) => CacheResult::NotFound,
            Err(e) => {
                error!("Failed to get key '{}': {}", key, e);
                CacheResult::ExistsButNoValue
            }
        }
    }

    async fn insert_raw(&self, key: String, value: String, ttl: u64) {
        let Some(mut conn) = self.connection().await else {
            return;
        };

        let ttl = if ttl == 0 { self.default_ttl } else { ttl };
        if let Err(e) = conn
            .set_ex::<_, _, ()>(self.make_key(&key), value, ttl)
            .await
        {
            error!("Failed to insert key '{}' into cache: {}", key, e);
        }
    }

    async fn remove(&self, key: &str) {
        let Some(mut conn) = self.connection().await else {
            return;
        };

        match conn.del::<_, i32>(self.make_key(key)).await {
            Ok(0) => debug!("Key not present for removal: {}", key),
            Ok(_) => debug!("Removed key from cache: {}", key),
            Err(e) => error!("Failed to remove key '{}': {}", key, e),
        }
    }

    async fn invalidate_all(&self) {
        let Some(mut conn) = self.connection().await else {
            return;
        };

        // SCAN 而非 KEYS，避免阻塞共享实例
        let pattern = format!("{}*", self.key_prefix);
        let keys: Vec<String> = {
            let mut scan_conn = conn.clone();
            let iter: redis::RedisResult<AsyncIter<String>> =
                scan_conn.scan_match(&pattern).await;
            match iter {
                Ok(mut iter) => {
                    let mut keys = Vec::new();
                    while let Some(item) = iter.next_item().await {
                        match item {
                            Ok(key) => keys.push(key),
                            Err(e) => {
                                warn!("Aborted scan for pattern '{}': {}", pattern, e);
                                return;
                            }
                        }
                    }
                    keys
                }
                Err(e) => {
                    warn!("Failed to scan keys for pattern '{}': {}", pattern, e);
                    return;
                }
            }
        };

        if keys.is_empty() {
            return;
        }
        if let Err(e) = conn.del::<_, i32>(keys).await {
            error!("Failed to invalidate keys with prefix '{}': {}", self.key_prefix, e);
        }
    }
}
