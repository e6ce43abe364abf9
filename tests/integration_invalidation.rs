mod common;

use common::{HOUR, StoreItem, StoreListing, fake_item, fake_listing, memory_cache};
use devhub_cache::invalidate::{self, Mutation};
use devhub_cache::keys::{news, store};
use devhub_cache::{CacheAccessor, NewsMutation, StoreMutation};

/// Caches two store pages, one store detail, a news page and a news detail.
async fn warm(cache: &CacheAccessor) {
    let first_page = store::ListQuery::default();
    let plugins = store::ListQuery {
        category: Some("plugins".into()),
        ..Default::default()
    };

    cache.set(&store::list(&first_page), &fake_listing(1, 12, 3), HOUR).await;
    cache.set(&store::list(&plugins), &fake_listing(1, 12, 1), HOUR).await;
    cache.set(&store::item("a1"), &fake_item("a1"), HOUR).await;
    cache.set(&news::list(None, None), &vec!["n1", "n2"], HOUR).await;
    cache.set(&news::item("n1"), &"article", HOUR).await;
}

#[tokio::test]
async fn test_store_item_created_clears_every_store_key() {
    let (store_handle, cache) = memory_cache();
    warm(&cache).await;

    let removed = invalidate::apply(&cache, &StoreMutation::Created).await;

    assert_eq!(removed, 3);
    assert_eq!(
        store_handle.keys().await,
        vec!["news:all:1:10".to_string(), "news:n1".to_string()]
    );
}

#[tokio::test]
async fn test_store_review_drops_detail_and_lists() {
    let (_, cache) = memory_cache();
    warm(&cache).await;

    invalidate::apply(&cache, &StoreMutation::ReviewAdded { id: "a1" }).await;

    assert_eq!(cache.get::<StoreItem>(&store::item("a1")).await, None);
    assert_eq!(
        cache
            .get::<StoreListing>(&store::list(&store::ListQuery::default()))
            .await,
        None
    );
    assert!(cache.get::<String>(&news::item("n1")).await.is_some());
}

#[tokio::test]
async fn test_store_delete_counts_item_once() {
    let (store_handle, cache) = memory_cache();
    warm(&cache).await;

    // The item key goes first, so the collection clear only finds the lists.
    let removed = invalidate::apply(&cache, &StoreMutation::Deleted { id: "a1" }).await;

    assert_eq!(removed, 3);
    assert_eq!(store_handle.len().await, 2);
}

#[tokio::test]
async fn test_view_count_leaves_cached_detail_alone() {
    let (store_handle, cache) = memory_cache();
    warm(&cache).await;
    let cached_before = cache.get::<StoreItem>(&store::item("a1")).await;

    let removed = invalidate::apply(&cache, &StoreMutation::ViewRecorded { id: "a1" }).await;
    invalidate::apply(&cache, &NewsMutation::ViewRecorded { id: "n1" }).await;

    assert_eq!(removed, 0);
    assert_eq!(store_handle.len().await, 5);
    assert_eq!(cache.get::<StoreItem>(&store::item("a1")).await, cached_before);
}

#[tokio::test]
async fn test_news_created_clears_whole_news_family() {
    let (store_handle, cache) = memory_cache();
    warm(&cache).await;

    assert_eq!(invalidate::apply(&cache, &NewsMutation::Created).await, 2);

    let remaining = store_handle.keys().await;
    assert_eq!(remaining.len(), 3);
    assert!(remaining.iter().all(|key| key.starts_with("store:")));
}

#[tokio::test]
async fn test_news_interactions_drop_detail_and_lists_only() {
    for mutation in [
        NewsMutation::Updated { id: "n1" },
        NewsMutation::Deleted { id: "n1" },
        NewsMutation::LikeToggled { id: "n1" },
        NewsMutation::CommentAdded { id: "n1" },
    ] {
        let (store_handle, cache) = memory_cache();
        warm(&cache).await;
        cache.set(&news::item("n2"), &"other article", HOUR).await;

        let removed = invalidate::apply(&cache, &mutation).await;

        assert_eq!(removed, 2, "{mutation:?}");
        assert!(cache.get::<String>(&news::item("n2")).await.is_some());
        assert_eq!(store_handle.len().await, 4, "{mutation:?}");
    }
}

#[tokio::test]
async fn test_invalidation_is_fail_open() {
    let (store_handle, cache) = memory_cache();
    warm(&cache).await;
    store_handle.set_available(false);

    let mutation = StoreMutation::Deleted { id: "a1" };
    assert!(!mutation.plan().is_empty());
    assert_eq!(invalidate::apply(&cache, &mutation).await, 0);

    store_handle.set_available(true);
    assert_eq!(store_handle.len().await, 5);
}
