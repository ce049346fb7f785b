//! 对象缓存后端注册表
//!
//! 后端通过 `declare_object_cache_plugin!` 在进程启动前注册，
//! 启动阶段按 `cache.type` 取出构造器。

use crate::cache::traits::ObjectCache;
use crate::errors::Result;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

pub type BoxedObjectCacheFuture =
    Pin<Box<dyn Future<Output = Result<Box<dyn ObjectCache>>> + Send>>;
pub type ObjectCacheConstructor = Arc<dyn Fn() -> BoxedObjectCacheFuture + Send + Sync>;

static BACKENDS: Lazy<RwLock<BTreeMap<&'static str, ObjectCacheConstructor>>> =
    Lazy::new(|| RwLock::new(BTreeMap::new()));

pub fn register_object_cache_plugin(name: &'static str, constructor: ObjectCacheConstructor) {
    // 注册发生在 main 之前，锁中毒时仍写入
    let mut backends = BACKENDS.write().unwrap_or_else(|e| e.into_inner());
    if backends.insert(name, constructor).is_some() {
        tracing::warn!("Cache backend '{}' registered twice, keeping the last one", name);
    }
}

pub fn get_object_cache_plugin(name: &str) -> Option<ObjectCacheConstructor> {
    BACKENDS
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .get(name)
        .cloned()
}

/// 已注册的后端名称，按字典序
pub fn registered_backends() -> Vec<&'static str> {
    BACKENDS
        .read()
        .unwrap_or_else(|e| e.into_inner())
        .keys()
        .copied()
        .collect()
}

pub fn debug_object_cache_registry() {
    let names = registered_backends();
    if names.is_empty() {
        tracing::debug!("No object cache backends registered");
    } else {
        tracing::debug!(backends = ?names, "Registered object cache backends");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_backends_are_registered() {
        let names = registered_backends();
        assert!(names.contains(&"moka"));
        assert!(names.contains(&"redis"));
        assert!(get_object_cache_plugin("memcached").is_none());
    }
}
