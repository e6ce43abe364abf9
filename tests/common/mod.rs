use async_trait::async_trait;
use devhub_cache::{CacheAccessor, KeyValueStore, MemoryStore, StoreError};
use fake::{Dummy, Fake, Faker};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Policy TTL for list and detail payloads.
#[allow(dead_code)]
pub const HOUR: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Dummy)]
pub struct Review {
    pub user_name: String,
    #[dummy(faker = "1..6")]
    pub rating: u8,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Dummy)]
pub struct StoreItem {
    pub id: String,
    pub name: String,
    pub category: String,
    #[dummy(faker = "0..10000")]
    pub views: u32,
    #[dummy(faker = "(Faker, 0..4)")]
    pub reviews: Vec<Review>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreListing {
    pub items: Vec<StoreItem>,
    pub pagination: Pagination,
}

/// A page of `count` generated items.
#[allow(dead_code)]
pub fn fake_listing(page: u32, limit: u32, count: usize) -> StoreListing {
    let items: Vec<StoreItem> = (0..count).map(|_| Faker.fake()).collect();
    let total = count as u64;
    StoreListing {
        items,
        pagination: Pagination {
            page,
            limit,
            total,
            pages: total.div_ceil(u64::from(limit)),
        },
    }
}

#[allow(dead_code)]
pub fn fake_item(id: &str) -> StoreItem {
    let mut item: StoreItem = Faker.fake();
    item.id = id.to_string();
    item
}

/// Accessor over a fresh in-memory store, with the store handle for inspection.
#[allow(dead_code)]
pub fn memory_cache() -> (Arc<MemoryStore>, CacheAccessor) {
    let store = Arc::new(MemoryStore::new());
    let cache = CacheAccessor::new(store.clone(), Duration::from_secs(3600));
    (store, cache)
}

/// Store whose every round trip times out.
#[allow(dead_code)]
#[derive(Debug, Default)]
pub struct TimingOutStore;

#[async_trait]
impl KeyValueStore for TimingOutStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Timeout(Duration::from_millis(500)))
    }

    async fn set_ex(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), StoreError> {
        Err(StoreError::Timeout(Duration::from_millis(500)))
    }

    async fn delete(&self, _key: &str) -> Result<bool, StoreError> {
        Err(StoreError::Timeout(Duration::from_millis(500)))
    }

    async fn delete_matching(&self, _pattern: &str) -> Result<u64, StoreError> {
        Err(StoreError::Timeout(Duration::from_millis(500)))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Timeout(Duration::from_millis(500)))
    }

    fn backend(&self) -> &'static str {
        "timing-out"
    }
}
