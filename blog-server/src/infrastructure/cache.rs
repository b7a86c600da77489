use crate::domain::article::ArticlesPage;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Cache key for one page of the public listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingKey {
    pub page: i64,
    pub per_page: i64,
    pub category_id: Option<i64>,
}

struct Entry {
    page: ArticlesPage,
    stored_at: Instant,
}

/// TTL cache for public article listings, keyed by page/per_page/category.
/// Constructed once in `main` and injected into the article service; every
/// article mutation calls `invalidate_all`. Staleness within the TTL is
/// tolerated for entries the server never learns went stale.
pub struct ListingCache {
    entries: Mutex<HashMap<ListingKey, Entry>>,
    ttl: Duration,
}

impl ListingCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    pub fn get(&self, key: &ListingKey) -> Option<ArticlesPage> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.page.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: ListingKey, page: ArticlesPage) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key,
            Entry {
                page,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn invalidate_all(&self) {
        self.entries.lock().unwrap().clear();
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::article::PaginationMeta;

    fn page(total: i64) -> ArticlesPage {
        ArticlesPage {
            data: vec![],
            meta: PaginationMeta {
                current_page: 1,
                per_page: 6,
                total_pages: 1,
                total,
            },
        }
    }

    fn key(page: i64) -> ListingKey {
        ListingKey {
            page,
            per_page: 6,
            category_id: None,
        }
    }

    #[test]
    fn hit_within_ttl() {
        let cache = ListingCache::new(Duration::from_secs(60));
        cache.put(key(1), page(8));

        let hit = cache.get(&key(1)).unwrap();
        assert_eq!(hit.meta.total, 8);
    }

    #[test]
    fn expired_entries_are_dropped() {
        let cache = ListingCache::new(Duration::ZERO);
        cache.put(key(1), page(8));

        assert!(cache.get(&key(1)).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn keys_distinguish_category_and_page() {
        let cache = ListingCache::new(Duration::from_secs(60));
        cache.put(key(1), page(8));

        assert!(cache.get(&key(2)).is_none());
        assert!(cache
            .get(&ListingKey {
                page: 1,
                per_page: 6,
                category_id: Some(3),
            })
            .is_none());
    }

    #[test]
    fn invalidate_all_clears_every_entry() {
        let cache = ListingCache::new(Duration::from_secs(60));
        cache.put(key(1), page(8));
        cache.put(key(2), page(8));

        cache.invalidate_all();
        assert!(cache.get(&key(1)).is_none());
        assert!(cache.get(&key(2)).is_none());
    }
}
