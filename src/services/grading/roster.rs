//! 花名册解析

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::traits::{get_json, insert_json};
use crate::cache::{CacheResult, ObjectCache};
use crate::errors::Result;
use crate::models::class_users::entities::RosterMember;
use crate::storage::Storage;

/// 班级 → 权威成员列表
#[async_trait]
pub trait RosterResolver: Send + Sync {
    async fn roster(&self, class_id: i64) -> Result<Vec<RosterMember>>;

    /// 需要提交作业的活跃学生
    async fn active_students(&self, class_id: i64) -> Result<Vec<RosterMember>> {
        Ok(self
            .roster(class_id)
            .await?
            .into_iter()
            .filter(RosterMember::is_active_student)
            .collect())
    }
}

/// 直接读取班级成员表
pub struct StorageRosterResolver {
    storage: Arc<dyn Storage>,
}

impl StorageRosterResolver {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl RosterResolver for StorageRosterResolver {
    async fn roster(&self, class_id: i64) -> Result<Vec<RosterMember>> {
        self.storage.list_class_roster(class_id).await
    }
}

/// 带对象缓存的花名册，键为 `roster:{class_id}`
pub struct CachedRosterResolver {
    inner: Arc<dyn RosterResolver>,
    cache: Arc<dyn ObjectCache>,
    ttl: u64,
}

impl CachedRosterResolver {
    pub fn new(inner: Arc<dyn RosterResolver>, cache: Arc<dyn ObjectCache>, ttl: u64) -> Self {
        Self { inner, cache, ttl }
    }

    fn key(class_id: i64) -> String {
        format!("roster:{class_id}")
    }

    pub async fn invalidate(&self, class_id: i64) {
        self.cache.remove(&Self::key(class_id)).await;
    }
}

#[async_trait]
impl RosterResolver for CachedRosterResolver {
    async fn roster(&self, class_id: i64) -> Result<Vec<RosterMember>> {
        let key = Self::key(class_id);
        if let CacheResult::Found(members) =
            get_json::<Vec<RosterMember>>(self.cache.as_ref(), &key).await
        {
            debug!("Roster cache hit for class {}", class_id);
            return Ok(members);
        }

        let members = self.inner.roster(class_id).await?;
        insert_json(self.cache.as_ref(), key, &members, self.ttl).await;
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::object_cache::moka::MokaCacheWrapper;
    use crate::models::class_users::entities::ClassUserRole;
    use crate::models::users::entities::UserStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingResolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RosterResolver for CountingResolver {
        async fn roster(&self, _class_id: i64) -> Result<Vec<RosterMember>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                RosterMember {
                    user_id: 1,
                    username: "alice".to_string(),
                    email: "alice@example.com".to_string(),
                    display_name: None,
                    role: ClassUserRole::Student,
                    status: UserStatus::Active,
                },
                RosterMember {
                    user_id: 2,
                    username: "bob".to_string(),
                    email: "bob@example.com".to_string(),
                    display_name: None,
                    role: ClassUserRole::Student,
                    status: UserStatus::Suspended,
                },
                RosterMember {
                    user_id: 3,
                    username: "carol".to_string(),
                    email: "carol@example.com".to_string(),
                    display_name: Some("Ms. Carol".to_string()),
                    role: ClassUserRole::Teacher,
                    status: UserStatus::Active,
                },
            ])
        }
    }

    #[tokio::test]
    async fn test_cached_roster_hits_inner_once() {
        let inner = Arc::new(CountingResolver {
            calls: AtomicUsize::new(0),
        });
        let cache: Arc<dyn ObjectCache> = Arc::new(MokaCacheWrapper::with_capacity(100, 60));
        let resolver = CachedRosterResolver::new(inner.clone(), cache, 60);

        assert_eq!(resolver.roster(7).await.unwrap().len(), 3);
        assert_eq!(resolver.roster(7).await.unwrap().len(), 3);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        resolver.invalidate(7).await;
        resolver.roster(7).await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_active_students_filters_role_and_status() {
        let resolver = CountingResolver {
            calls: AtomicUsize::new(0),
        };
        let students = resolver.active_students(1).await.unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].user_id, 1);
    }
}
