//! Cache invalidation after writes.
//!
//! Each mutation of an underlying record maps to an [`InvalidationPlan`]: the
//! exact keys to drop plus the patterns to clear. Lists may embed summaries of
//! any item, so item-level mutations also clear the list keys of the resource.
//! View-count increments are the exception: a cached detail is allowed to show
//! a stale counter until its TTL runs out.

use std::fmt;
use tracing::debug;

use crate::accessor::CacheAccessor;
use crate::keys::{news, store};

/// Keys and patterns to remove after a mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationPlan {
    pub keys: Vec<String>,
    pub patterns: Vec<String>,
}

impl InvalidationPlan {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.patterns.is_empty()
    }

    fn key(mut self, key: String) -> Self {
        self.keys.push(key);
        self
    }

    fn pattern(mut self, pattern: String) -> Self {
        self.patterns.push(pattern);
        self
    }
}

/// A write that may leave cached data stale.
pub trait Mutation: fmt::Debug + Sync {
    fn plan(&self) -> InvalidationPlan;
}

/// Writes to marketplace items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMutation<'a> {
    Created,
    Updated { id: &'a str },
    ReviewAdded { id: &'a str },
    Deleted { id: &'a str },
    ViewRecorded { id: &'a str },
}

impl Mutation for StoreMutation<'_> {
    fn plan(&self) -> InvalidationPlan {
        let plan = InvalidationPlan::none();
        match *self {
            StoreMutation::Created => plan.pattern(store::collection_pattern()),
            StoreMutation::Updated { id }
            | StoreMutation::ReviewAdded { id }
            | StoreMutation::Deleted { id } => plan
                .key(store::item(id))
                .pattern(store::collection_pattern()),
            StoreMutation::ViewRecorded { .. } => plan,
        }
    }
}

/// Writes to news articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsMutation<'a> {
    Created,
    Updated { id: &'a str },
    Deleted { id: &'a str },
    LikeToggled { id: &'a str },
    CommentAdded { id: &'a str },
    ViewRecorded { id: &'a str },
}

impl Mutation for NewsMutation<'_> {
    fn plan(&self) -> InvalidationPlan {
        let plan = InvalidationPlan::none();
        match *self {
            // A new article shifts every page.
            NewsMutation::Created => plan.pattern(news::family_pattern()),
            NewsMutation::Updated { id }
            | NewsMutation::Deleted { id }
            | NewsMutation::LikeToggled { id }
            | NewsMutation::CommentAdded { id } => {
                plan.key(news::item(id)).pattern(news::list_pattern())
            }
            NewsMutation::ViewRecorded { .. } => plan,
        }
    }
}

/// Runs the invalidation plan for `mutation`.
///
/// Fail-open like every accessor call: returns the number of keys removed,
/// counting nothing for steps that could not reach the store.
pub async fn apply(cache: &CacheAccessor, mutation: &dyn Mutation) -> u64 {
    let plan = mutation.plan();
    if plan.is_empty() {
        debug!(?mutation, "Mutation leaves cache untouched");
        return 0;
    }

    let mut removed = 0;
    for key in &plan.keys {
        if cache.delete(key).await {
            removed += 1;
        }
    }
    for pattern in &plan.patterns {
        removed += cache.clear(pattern).await;
    }

    debug!(?mutation, cache.removed = removed, "Applied invalidation plan");
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_created_clears_collection_only() {
        let plan = StoreMutation::Created.plan();
        assert!(plan.keys.is_empty());
        assert_eq!(plan.patterns, vec!["store:*".to_string()]);
    }

    #[test]
    fn test_store_item_mutations_drop_item_and_lists() {
        for mutation in [
            StoreMutation::Updated { id: "42" },
            StoreMutation::ReviewAdded { id: "42" },
            StoreMutation::Deleted { id: "42" },
        ] {
            let plan = mutation.plan();
            assert_eq!(plan.keys, vec!["store:item:42".to_string()]);
            assert_eq!(plan.patterns, vec!["store:*".to_string()]);
        }
    }

    #[test]
    fn test_view_counts_do_not_invalidate() {
        assert!(StoreMutation::ViewRecorded { id: "42" }.plan().is_empty());
        assert!(NewsMutation::ViewRecorded { id: "7" }.plan().is_empty());
    }

    #[test]
    fn test_news_plans() {
        assert_eq!(
            NewsMutation::Created.plan().patterns,
            vec!["news:*".to_string()]
        );

        for mutation in [
            NewsMutation::Updated { id: "7" },
            NewsMutation::Deleted { id: "7" },
            NewsMutation::LikeToggled { id: "7" },
            NewsMutation::CommentAdded { id: "7" },
        ] {
            let plan = mutation.plan();
            assert_eq!(plan.keys, vec!["news:7".to_string()]);
            assert_eq!(plan.patterns, vec!["news:all:*".to_string()]);
        }
    }
}
