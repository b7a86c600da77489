use crate::data::ArticleRepository;
use crate::domain::article::{
    Article, ArticleDraft, ArticlePatch, ArticlesPage, NewArticle, PaginationMeta,
};
use crate::domain::DomainError;
use crate::infrastructure::cache::{ListingCache, ListingKey};
use crate::infrastructure::storage::ImageStore;
use std::sync::Arc;

fn total_pages(total: i64, per_page: i64) -> i64 {
    (total + per_page - 1) / per_page
}

pub struct ArticleService {
    article_repo: Arc<dyn ArticleRepository>,
    image_store: Arc<dyn ImageStore>,
    cache: Arc<ListingCache>,
}

impl ArticleService {
    pub fn new(
        article_repo: Arc<dyn ArticleRepository>,
        image_store: Arc<dyn ImageStore>,
        cache: Arc<ListingCache>,
    ) -> Self {
        Self {
            article_repo,
            image_store,
            cache,
        }
    }

    fn validate_paging(page: i64, per_page: i64) -> Result<(), DomainError> {
        if page < 1 {
            return Err(DomainError::ValidationError(
                "Page must be at least 1".to_string(),
            ));
        }
        if !(1..=100).contains(&per_page) {
            return Err(DomainError::ValidationError(
                "Page size must be between 1 and 100".to_string(),
            ));
        }
        Ok(())
    }

    /// Published articles, newest first. A page past the end yields an empty
    /// slice with unchanged metadata, mirroring the offset/limit query.
    pub async fn list_page(
        &self,
        page: i64,
        per_page: i64,
        category_id: Option<i64>,
    ) -> Result<ArticlesPage, DomainError> {
        Self::validate_paging(page, per_page)?;

        let key = ListingKey {
            page,
            per_page,
            category_id,
        };
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!("Listing cache hit: page={}, per_page={}", page, per_page);
            return Ok(hit);
        }

        let offset = (page - 1) * per_page;
        let data = self
            .article_repo
            .list_published(per_page, offset, category_id)
            .await?;
        let total = self.article_repo.count_published(category_id).await?;

        let result = ArticlesPage {
            data,
            meta: PaginationMeta {
                current_page: page,
                per_page,
                total_pages: total_pages(total, per_page),
                total,
            },
        };

        self.cache.put(key, result.clone());
        Ok(result)
    }

    /// Admin variant: includes unpublished articles and bypasses the cache.
    pub async fn list_page_admin(
        &self,
        page: i64,
        per_page: i64,
        category_id: Option<i64>,
    ) -> Result<ArticlesPage, DomainError> {
        Self::validate_paging(page, per_page)?;

        let offset = (page - 1) * per_page;
        let data = self
            .article_repo
            .list_all(per_page, offset, category_id)
            .await?;
        let total = self.article_repo.count_all(category_id).await?;

        Ok(ArticlesPage {
            data,
            meta: PaginationMeta {
                current_page: page,
                per_page,
                total_pages: total_pages(total, per_page),
                total,
            },
        })
    }

    pub async fn get(&self, id: i64) -> Result<Article, DomainError> {
        self.article_repo.find_published(id).await
    }

    pub async fn get_admin(&self, id: i64) -> Result<Article, DomainError> {
        self.article_repo.find_any(id).await
    }

    /// Which page of the public listing contains the given article.
    pub async fn page_of(&self, id: i64, per_page: i64) -> Result<i64, DomainError> {
        if !(1..=100).contains(&per_page) {
            return Err(DomainError::ValidationError(
                "Page size must be between 1 and 100".to_string(),
            ));
        }
        let rank = self.article_repo.published_rank(id).await?;
        Ok(rank / per_page + 1)
    }

    pub async fn create(
        &self,
        author_id: i64,
        draft: ArticleDraft,
    ) -> Result<Article, DomainError> {
        if draft.title.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Title cannot be empty".to_string(),
            ));
        }
        if draft.content.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Content cannot be empty".to_string(),
            ));
        }
        let image_url = match draft.image_url {
            Some(url) if !url.trim().is_empty() => url,
            _ => {
                return Err(DomainError::ValidationError(
                    "An image upload or image_url is required".to_string(),
                ))
            }
        };

        let article = self
            .article_repo
            .create(
                author_id,
                NewArticle {
                    title: draft.title,
                    content: draft.content,
                    image_url,
                    is_published: draft.is_published.unwrap_or(true),
                    category_id: draft.category_id,
                },
            )
            .await?;

        tracing::info!("Article created: id={}, author_id={}", article.id, author_id);
        self.cache.invalidate_all();

        Ok(article)
    }

    /// Author-only field merge. An uploaded file is stored only after the
    /// ownership check passes; a superseded image file is removed from
    /// storage best-effort, and only when a new image actually replaced it.
    pub async fn update(
        &self,
        id: i64,
        user_id: i64,
        mut patch: ArticlePatch,
        upload: Option<(String, Vec<u8>)>,
    ) -> Result<Article, DomainError> {
        let existing = self.article_repo.find_any(id).await?;
        if existing.author_id != user_id {
            tracing::warn!(
                "User {} attempted to update article {} owned by {}",
                user_id,
                id,
                existing.author_id
            );
            return Err(DomainError::Forbidden);
        }

        // A fresh upload wins over an externally supplied URL.
        if let Some((filename, data)) = upload {
            patch.image_url = Some(self.image_store.save(&filename, &data).await?);
        }

        let replaced_image = match (&patch.image_url, &existing.image_url) {
            (Some(new), Some(old)) if new != old => Some(old.clone()),
            _ => None,
        };

        let article = self.article_repo.update(id, patch).await?;

        if let Some(old) = replaced_image {
            self.image_store.remove(&old).await;
        }

        tracing::info!("Article updated: id={}, author_id={}", id, user_id);
        self.cache.invalidate_all();

        Ok(article)
    }

    pub async fn delete(&self, id: i64, user_id: i64) -> Result<(), DomainError> {
        let existing = self.article_repo.find_any(id).await?;
        if existing.author_id != user_id {
            tracing::warn!(
                "User {} attempted to delete article {} owned by {}",
                user_id,
                id,
                existing.author_id
            );
            return Err(DomainError::Forbidden);
        }

        self.article_repo.delete(id).await?;

        if let Some(image) = existing.image_url {
            self.image_store.remove(&image).await;
        }

        tracing::info!("Article deleted: id={}, author_id={}", id, user_id);
        self.cache.invalidate_all();

        Ok(())
    }

    pub async fn toggle_publish(&self, id: i64) -> Result<Article, DomainError> {
        let existing = self.article_repo.find_any(id).await?;
        let article = self
            .article_repo
            .set_published(id, !existing.is_published)
            .await?;

        tracing::info!(
            "Article {} publication toggled to {}",
            id,
            article.is_published
        );
        self.cache.invalidate_all();

        Ok(article)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct InMemoryArticles {
        articles: Mutex<Vec<Article>>,
        list_calls: AtomicUsize,
    }

    impl InMemoryArticles {
        fn published_sorted(&self, category_id: Option<i64>) -> Vec<Article> {
            let mut items: Vec<Article> = self
                .articles
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.is_published)
                .filter(|a| category_id.is_none() || a.category_id == category_id)
                .cloned()
                .collect();
            items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            items
        }
    }

    #[async_trait]
    impl ArticleRepository for InMemoryArticles {
        async fn create(
            &self,
            author_id: i64,
            article: NewArticle,
        ) -> Result<Article, DomainError> {
            let mut articles = self.articles.lock().unwrap();
            let id = articles.len() as i64 + 1;
            let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
            let created = Article {
                id,
                title: article.title,
                content: article.content,
                author_id,
                image_url: Some(article.image_url),
                category_id: article.category_id,
                is_published: article.is_published,
                created_at: base + ChronoDuration::seconds(id),
                updated_at: None,
                author_name: None,
                category_name: None,
                category_slug: None,
            };
            articles.push(created.clone());
            Ok(created)
        }

        async fn find_published(&self, id: i64) -> Result<Article, DomainError> {
            self.articles
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.id == id && a.is_published)
                .cloned()
                .ok_or(DomainError::ArticleNotFound)
        }

        async fn find_any(&self, id: i64) -> Result<Article, DomainError> {
            self.articles
                .lock()
                .unwrap()
                .iter()
                .find(|a| a.id == id)
                .cloned()
                .ok_or(DomainError::ArticleNotFound)
        }

        async fn list_published(
            &self,
            limit: i64,
            offset: i64,
            category_id: Option<i64>,
        ) -> Result<Vec<Article>, DomainError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .published_sorted(category_id)
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect())
        }

        async fn list_all(
            &self,
            limit: i64,
            offset: i64,
            category_id: Option<i64>,
        ) -> Result<Vec<Article>, DomainError> {
            let mut items: Vec<Article> = self
                .articles
                .lock()
                .unwrap()
                .iter()
                .filter(|a| category_id.is_none() || a.category_id == category_id)
                .cloned()
                .collect();
            items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(items
                .into_iter()
                .skip(offset as usize)
                .take(limit as usize)
                .collect())
        }

        async fn count_published(&self, category_id: Option<i64>) -> Result<i64, DomainError> {
            Ok(self.published_sorted(category_id).len() as i64)
        }

        async fn count_all(&self, category_id: Option<i64>) -> Result<i64, DomainError> {
            Ok(self
                .articles
                .lock()
                .unwrap()
                .iter()
                .filter(|a| category_id.is_none() || a.category_id == category_id)
                .count() as i64)
        }

        async fn published_rank(&self, id: i64) -> Result<i64, DomainError> {
            self.published_sorted(None)
                .iter()
                .position(|a| a.id == id)
                .map(|p| p as i64)
                .ok_or(DomainError::ArticleNotFound)
        }

        async fn update(&self, id: i64, patch: ArticlePatch) -> Result<Article, DomainError> {
            let mut articles = self.articles.lock().unwrap();
            let article = articles
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or(DomainError::ArticleNotFound)?;
            if let Some(title) = patch.title {
                article.title = title;
            }
            if let Some(content) = patch.content {
                article.content = content;
            }
            if let Some(image_url) = patch.image_url {
                article.image_url = Some(image_url);
            }
            if let Some(category_id) = patch.category_id {
                article.category_id = Some(category_id);
            }
            if let Some(is_published) = patch.is_published {
                article.is_published = is_published;
            }
            article.updated_at = Some(Utc::now());
            Ok(article.clone())
        }

        async fn set_published(&self, id: i64, published: bool) -> Result<Article, DomainError> {
            let mut articles = self.articles.lock().unwrap();
            let article = articles
                .iter_mut()
                .find(|a| a.id == id)
                .ok_or(DomainError::ArticleNotFound)?;
            article.is_published = published;
            Ok(article.clone())
        }

        async fn delete(&self, id: i64) -> Result<(), DomainError> {
            let mut articles = self.articles.lock().unwrap();
            let before = articles.len();
            articles.retain(|a| a.id != id);
            if articles.len() == before {
                Err(DomainError::ArticleNotFound)
            } else {
                Ok(())
            }
        }
    }

    struct NullImageStore {
        saved: Mutex<Vec<String>>,
        removed: Mutex<Vec<String>>,
    }

    impl NullImageStore {
        fn new() -> Self {
            Self {
                saved: Mutex::new(Vec::new()),
                removed: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ImageStore for NullImageStore {
        async fn save(&self, original_filename: &str, _data: &[u8]) -> Result<String, DomainError> {
            self.saved.lock().unwrap().push(original_filename.to_string());
            Ok(format!("/images/{}", original_filename))
        }

        async fn remove(&self, public_path: &str) {
            self.removed.lock().unwrap().push(public_path.to_string());
        }
    }

    fn draft(title: &str) -> ArticleDraft {
        ArticleDraft {
            title: title.to_string(),
            content: format!("content of {}", title),
            image_url: Some(format!("/images/{}.png", title)),
            is_published: None,
            category_id: None,
        }
    }

    struct Harness {
        service: ArticleService,
        repo: Arc<InMemoryArticles>,
        store: Arc<NullImageStore>,
    }

    fn harness() -> Harness {
        let repo = Arc::new(InMemoryArticles::default());
        let store = Arc::new(NullImageStore::new());
        let cache = Arc::new(ListingCache::new(Duration::from_secs(300)));
        Harness {
            service: ArticleService::new(repo.clone(), store.clone(), cache),
            repo,
            store,
        }
    }

    async fn seed(h: &Harness, count: usize) {
        for i in 0..count {
            h.service.create(1, draft(&format!("a{}", i))).await.unwrap();
        }
    }

    #[tokio::test]
    async fn eight_articles_split_into_two_pages_of_six() {
        let h = harness();
        seed(&h, 8).await;

        let page1 = h.service.list_page(1, 6, None).await.unwrap();
        assert_eq!(page1.data.len(), 6);
        assert_eq!(page1.meta.total, 8);
        assert_eq!(page1.meta.total_pages, 2);

        let page2 = h.service.list_page(2, 6, None).await.unwrap();
        assert_eq!(page2.data.len(), 2);

        let page3 = h.service.list_page(3, 6, None).await.unwrap();
        assert!(page3.data.is_empty());
        assert_eq!(page3.meta.total_pages, 2);
    }

    #[tokio::test]
    async fn total_pages_is_ceiling_of_total_over_per_page() {
        let h = harness();
        seed(&h, 7).await;

        for per_page in [1i64, 2, 3, 6, 10] {
            let page = h.service.list_page(1, per_page, None).await.unwrap();
            let expected = (7 + per_page - 1) / per_page;
            assert_eq!(page.meta.total_pages, expected, "per_page={}", per_page);
            assert!(page.data.len() as i64 <= per_page);
        }
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let h = harness();
        seed(&h, 3).await;

        let page = h.service.list_page(1, 6, None).await.unwrap();
        let ids: Vec<i64> = page.data.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[tokio::test]
    async fn invalid_paging_is_rejected() {
        let h = harness();
        assert!(h.service.list_page(0, 6, None).await.is_err());
        assert!(h.service.list_page(1, 0, None).await.is_err());
        assert!(h.service.list_page(1, 101, None).await.is_err());
    }

    #[tokio::test]
    async fn second_read_of_same_page_is_served_from_cache() {
        let h = harness();
        seed(&h, 2).await;

        h.service.list_page(1, 6, None).await.unwrap();
        h.service.list_page(1, 6, None).await.unwrap();
        assert_eq!(h.repo.list_calls.load(Ordering::SeqCst), 1);

        // A mutation invalidates, so the next read goes back to the store.
        h.service.toggle_publish(1).await.unwrap();
        h.service.list_page(1, 6, None).await.unwrap();
        assert_eq!(h.repo.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn category_filter_applies_to_slice_and_total() {
        let h = harness();
        let mut with_category = draft("tagged");
        with_category.category_id = Some(5);
        h.service.create(1, with_category).await.unwrap();
        seed(&h, 2).await;

        let page = h.service.list_page(1, 6, Some(5)).await.unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.meta.total, 1);
        assert_eq!(page.meta.total_pages, 1);
    }

    #[tokio::test]
    async fn create_requires_title_content_and_image() {
        let h = harness();

        let mut missing_title = draft("x");
        missing_title.title = "  ".to_string();
        assert!(matches!(
            h.service.create(1, missing_title).await.unwrap_err(),
            DomainError::ValidationError(_)
        ));

        let mut missing_content = draft("x");
        missing_content.content = String::new();
        assert!(matches!(
            h.service.create(1, missing_content).await.unwrap_err(),
            DomainError::ValidationError(_)
        ));

        let mut missing_image = draft("x");
        missing_image.image_url = None;
        assert!(matches!(
            h.service.create(1, missing_image).await.unwrap_err(),
            DomainError::ValidationError(_)
        ));

        let created = h.service.create(1, draft("ok")).await.unwrap();
        assert!(created.is_published, "publication defaults to true");
    }

    #[tokio::test]
    async fn update_by_non_author_is_forbidden() {
        let h = harness();
        seed(&h, 1).await;

        let err = h
            .service
            .update(1, 2, ArticlePatch::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden));
    }

    #[tokio::test]
    async fn rejected_update_stores_no_upload() {
        let h = harness();
        seed(&h, 1).await;

        let err = h
            .service
            .update(
                1,
                2,
                ArticlePatch::default(),
                Some(("sneaky.png".to_string(), vec![1, 2, 3])),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::Forbidden));
        assert!(h.store.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn upload_overrides_image_url_and_removes_old_file() {
        let h = harness();
        seed(&h, 1).await;

        let updated = h
            .service
            .update(
                1,
                1,
                ArticlePatch {
                    image_url: Some("/images/ignored.png".to_string()),
                    ..Default::default()
                },
                Some(("fresh.png".to_string(), vec![1, 2, 3])),
            )
            .await
            .unwrap();

        assert_eq!(updated.image_url.as_deref(), Some("/images/fresh.png"));
        assert_eq!(
            h.store.removed.lock().unwrap().as_slice(),
            ["/images/a0.png"]
        );
    }

    #[tokio::test]
    async fn update_merges_only_supplied_fields() {
        let h = harness();
        seed(&h, 1).await;

        let updated = h
            .service
            .update(
                1,
                1,
                ArticlePatch {
                    title: Some("renamed".to_string()),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.content, "content of a0");
        assert_eq!(updated.image_url.as_deref(), Some("/images/a0.png"));
        assert!(h.store.removed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn replacing_the_image_removes_the_old_file() {
        let h = harness();
        seed(&h, 1).await;

        h.service
            .update(
                1,
                1,
                ArticlePatch {
                    image_url: Some("/images/new.png".to_string()),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(
            h.store.removed.lock().unwrap().as_slice(),
            ["/images/a0.png"]
        );
    }

    #[tokio::test]
    async fn delete_checks_ownership_and_removes_image() {
        let h = harness();
        seed(&h, 1).await;

        assert!(matches!(
            h.service.delete(1, 99).await.unwrap_err(),
            DomainError::Forbidden
        ));

        h.service.delete(1, 1).await.unwrap();
        assert_eq!(
            h.store.removed.lock().unwrap().as_slice(),
            ["/images/a0.png"]
        );
        assert!(matches!(
            h.service.get_admin(1).await.unwrap_err(),
            DomainError::ArticleNotFound
        ));
    }

    #[tokio::test]
    async fn toggle_flips_publication_and_hides_from_public_listing() {
        let h = harness();
        seed(&h, 2).await;

        let toggled = h.service.toggle_publish(1).await.unwrap();
        assert!(!toggled.is_published);

        let public = h.service.list_page(1, 6, None).await.unwrap();
        assert_eq!(public.meta.total, 1);

        let admin = h.service.list_page_admin(1, 6, None).await.unwrap();
        assert_eq!(admin.meta.total, 2);
    }

    #[tokio::test]
    async fn page_of_locates_article_in_public_ordering() {
        let h = harness();
        seed(&h, 8).await;

        // Newest first: id 8 ranks 0 (page 1), id 1 ranks 7 (page 2).
        assert_eq!(h.service.page_of(8, 6).await.unwrap(), 1);
        assert_eq!(h.service.page_of(1, 6).await.unwrap(), 2);

        // Unpublished articles have no public rank.
        h.service.toggle_publish(4).await.unwrap();
        assert!(matches!(
            h.service.page_of(4, 6).await.unwrap_err(),
            DomainError::ArticleNotFound
        ));
    }
}
