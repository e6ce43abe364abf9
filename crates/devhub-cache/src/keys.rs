//! Cache key naming.
//!
//! Keys are `:`-separated and always start with the resource name, so one glob
//! (`<resource>:*`) reaches every cached variant of a resource without the
//! application having to remember which pages or filters were ever cached.

use std::fmt::Display;

use crate::pattern;

/// Key builder for one resource family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceKeys {
    resource: &'static str,
}

impl ResourceKeys {
    pub const fn new(resource: &'static str) -> Self {
        Self { resource }
    }

    pub fn resource(&self) -> &'static str {
        self.resource
    }

    /// `<resource>:<part>:<part>...`
    pub fn key(&self, parts: &[&str]) -> String {
        let mut key = String::from(self.resource);
        for part in parts {
            key.push(':');
            key.push_str(part);
        }
        key
    }

    /// `<resource>:item:<id>`
    pub fn item(&self, id: impl Display) -> String {
        format!("{}:item:{}", self.resource, id)
    }

    /// Pattern covering every key of the resource.
    pub fn all_pattern(&self) -> String {
        pattern::prefix(&format!("{}:", self.resource))
    }

    /// Pattern covering every key under `<resource>:<scope>:`.
    pub fn scoped_pattern(&self, scope: &str) -> String {
        pattern::prefix(&format!("{}:{}:", self.resource, scope))
    }
}

/// Marketplace items.
///
/// Lists are keyed `store:<page>:<limit>:<category>:<status>`, details
/// `store:item:<id>`.
pub mod store {
    use super::*;

    pub const KEYS: ResourceKeys = ResourceKeys::new("store");

    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_LIMIT: u32 = 12;
    pub const ALL_CATEGORIES: &str = "all";
    pub const DEFAULT_STATUS: &str = "approved";

    /// Parameters of a store listing, as they arrive on the query string.
    ///
    /// Missing or zero values take the listing defaults, so two requests that
    /// render the same page share one cache entry.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct ListQuery {
        pub page: Option<u32>,
        pub limit: Option<u32>,
        pub category: Option<String>,
        pub status: Option<String>,
    }

    impl ListQuery {
        pub fn page(&self) -> u32 {
            self.page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE)
        }

        pub fn limit(&self) -> u32 {
            self.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT)
        }

        pub fn category(&self) -> &str {
            self.category
                .as_deref()
                .filter(|c| !c.is_empty())
                .unwrap_or(ALL_CATEGORIES)
        }

        pub fn status(&self) -> &str {
            self.status
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or(DEFAULT_STATUS)
        }
    }

    pub fn list(query: &ListQuery) -> String {
        let page = query.page().to_string();
        let limit = query.limit().to_string();
        KEYS.key(&[page.as_str(), limit.as_str(), query.category(), query.status()])
    }

    pub fn item(id: impl Display) -> String {
        KEYS.item(id)
    }

    /// Every store key: all list variants and all item details.
    pub fn collection_pattern() -> String {
        KEYS.all_pattern()
    }
}

/// News articles.
///
/// Lists are keyed `news:all:<page>:<limit>`, details `news:<id>`.
pub mod news {
    use super::*;

    pub const KEYS: ResourceKeys = ResourceKeys::new("news");

    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_LIMIT: u32 = 10;

    const LIST_SCOPE: &str = "all";

    pub fn list(page: Option<u32>, limit: Option<u32>) -> String {
        let page = page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE);
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT);
        let (page, limit) = (page.to_string(), limit.to_string());
        KEYS.key(&[LIST_SCOPE, page.as_str(), limit.as_str()])
    }

    pub fn item(id: impl Display) -> String {
        let id = id.to_string();
        KEYS.key(&[id.as_str()])
    }

    /// Every paginated list, but no article details.
    pub fn list_pattern() -> String {
        KEYS.scoped_pattern(LIST_SCOPE)
    }

    /// Every news key.
    pub fn family_pattern() -> String {
        KEYS.all_pattern()
    }
}
