//! Client-side page cache and pagination cursor. Pages are keyed by
//! (page, per_page, category); a hit restores the cursor without touching
//! the network. Deletes and publish-toggles patch cached pages in place
//! instead of refetching wholesale.

use crate::models::{Article, ArticlesPage};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub page: i64,
    pub per_page: i64,
    pub category_id: Option<i64>,
}

impl PageKey {
    /// Same listing family: all pages sharing page size and category filter.
    fn same_family(&self, other: &PageKey) -> bool {
        self.per_page == other.per_page && self.category_id == other.category_id
    }
}

/// Mirror of the server's pagination metadata, recomputed from every
/// response (or restored from cache) to drive the pager UI.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCursor {
    pub current_page: i64,
    pub total_pages: i64,
    pub total: i64,
    pub per_page: i64,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 1,
            total: 0,
            per_page: 6,
        }
    }
}

#[derive(Debug, Default)]
pub struct PageCache {
    pages: HashMap<PageKey, ArticlesPage>,
    cursor: PageCursor,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> &PageCursor {
        &self.cursor
    }

    fn set_cursor_from(&mut self, page: &ArticlesPage) {
        self.cursor = PageCursor {
            current_page: page.meta.current_page,
            total_pages: page.meta.total_pages,
            total: page.meta.total,
            per_page: page.meta.per_page,
        };
    }

    /// Cache hit also restores the pagination cursor from the cached entry.
    pub fn get(&mut self, key: &PageKey) -> Option<ArticlesPage> {
        let page = self.pages.get(key).cloned()?;
        self.set_cursor_from(&page);
        Some(page)
    }

    pub fn insert(&mut self, key: PageKey, page: ArticlesPage) {
        self.set_cursor_from(&page);
        self.pages.insert(key, page);
    }

    pub fn invalidate(&mut self, key: &PageKey) {
        self.pages.remove(key);
    }

    pub fn clear(&mut self) {
        self.pages.clear();
        self.cursor = PageCursor::default();
    }

    /// Rewrites the article in place wherever it is cached.
    pub fn patch_article(&mut self, article: &Article) {
        for page in self.pages.values_mut() {
            for cached in page.data.iter_mut() {
                if cached.id == article.id {
                    *cached = article.clone();
                }
            }
        }
    }

    /// Drops the article from cached pages, adjusting the listing totals of
    /// its page-size/category family.
    pub fn remove_article(&mut self, id: i64) {
        let affected: Vec<PageKey> = self
            .pages
            .iter()
            .filter(|(_, page)| page.data.iter().any(|a| a.id == id))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &affected {
            if let Some(page) = self.pages.get_mut(key) {
                page.data.retain(|a| a.id != id);
            }
        }

        for key in &affected {
            let family: Vec<PageKey> = self
                .pages
                .keys()
                .filter(|k| k.same_family(key))
                .cloned()
                .collect();
            for member in family {
                if let Some(page) = self.pages.get_mut(&member) {
                    page.meta.total = (page.meta.total - 1).max(0);
                    page.meta.total_pages =
                        (page.meta.total + page.meta.per_page - 1) / page.meta.per_page;
                }
            }
        }

        if self.cursor.total > 0 && !affected.is_empty() {
            self.cursor.total -= 1;
            self.cursor.total_pages =
                (self.cursor.total + self.cursor.per_page - 1) / self.cursor.per_page;
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.pages.len()
    }
}
