pub mod cache;
pub mod error;
pub mod http_client;
pub mod models;
pub mod validate;

use cache::{PageCache, PageCursor, PageKey};
use error::BlogClientError;
use models::{
    Article, ArticleForm, ArticlesPage, AuthResponse, Category, CreateCategoryRequest,
    LoginRequest, RegisterRequest, UpdateCategoryRequest, User,
};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Blog API client with a page cache in front of the article listing.
/// Mutating calls patch or drop cached pages instead of refetching.
#[derive(Debug, Clone)]
pub struct BlogClient {
    http: Arc<Mutex<http_client::HttpClient>>,
    cache: Arc<Mutex<PageCache>>,
    token: Arc<Mutex<Option<String>>>,
}

impl BlogClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Arc::new(Mutex::new(http_client::HttpClient::new(base_url))),
            cache: Arc::new(Mutex::new(PageCache::new())),
            token: Arc::new(Mutex::new(None)),
        }
    }

    /// Set the JWT token for authenticated requests
    pub async fn set_token(&self, token: String) {
        let mut token_lock = self.token.lock().await;
        *token_lock = Some(token.clone());

        let mut http = self.http.lock().await;
        http.set_token(token);
    }

    /// Get the current JWT token
    pub async fn get_token(&self) -> Option<String> {
        self.token.lock().await.clone()
    }

    /// Clear the current JWT token (logout)
    pub async fn clear_token(&self) {
        let mut token_lock = self.token.lock().await;
        *token_lock = None;

        let mut http = self.http.lock().await;
        http.clear_token();
    }

    /// Current pagination state, restored from the last listing fetched or
    /// the last cache hit.
    pub async fn cursor(&self) -> PageCursor {
        self.cache.lock().await.cursor().clone()
    }

    // ==================== Аутентификация ====================

    /// Register a new user. Credentials are validated locally first.
    pub async fn register(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
        recaptcha: impl Into<String>,
    ) -> Result<User, BlogClientError> {
        let username = username.into();
        let password = password.into();

        validate::validate_credentials(&username, &password)?;

        tracing::debug!("Register called for username: {}", username);

        let http = self.http.lock().await;
        http.register(RegisterRequest {
            username,
            password,
            recaptcha: recaptcha.into(),
        })
        .await
    }

    /// Login and remember the issued token for later requests.
    pub async fn login(
        &self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<AuthResponse, BlogClientError> {
        let username = username.into();
        let password = password.into();

        tracing::debug!("Login called for username: {}", username);

        let auth = {
            let mut http = self.http.lock().await;
            http.login(LoginRequest { username, password }).await?
        };

        let mut token_lock = self.token.lock().await;
        *token_lock = Some(auth.token.clone());

        Ok(auth)
    }

    pub async fn check_username(&self, username: &str) -> Result<bool, BlogClientError> {
        let http = self.http.lock().await;
        http.check_username(username).await
    }

    pub async fn me(&self) -> Result<User, BlogClientError> {
        let http = self.http.lock().await;
        http.me().await
    }

    // ==================== Статьи ====================

    /// Load a listing page, serving from the cache when the page was
    /// fetched before.
    pub async fn load_articles(
        &self,
        page: i64,
        per_page: i64,
        category_id: Option<i64>,
    ) -> Result<ArticlesPage, BlogClientError> {
        let key = PageKey {
            page,
            per_page,
            category_id,
        };

        {
            let mut cache = self.cache.lock().await;
            if let Some(hit) = cache.get(&key) {
                tracing::debug!("Page cache hit: page={} per_page={}", page, per_page);
                return Ok(hit);
            }
        }

        let fetched = {
            let http = self.http.lock().await;
            http.list_articles(Some(page), Some(per_page), category_id)
                .await?
        };

        let mut cache = self.cache.lock().await;
        cache.insert(key, fetched.clone());
        Ok(fetched)
    }

    /// Force a network fetch for one page and refresh its cache entry.
    pub async fn refresh_articles(
        &self,
        page: i64,
        per_page: i64,
        category_id: Option<i64>,
    ) -> Result<ArticlesPage, BlogClientError> {
        let fetched = {
            let http = self.http.lock().await;
            http.list_articles(Some(page), Some(per_page), category_id)
                .await?
        };

        let key = PageKey {
            page,
            per_page,
            category_id,
        };
        let mut cache = self.cache.lock().await;
        cache.insert(key, fetched.clone());
        Ok(fetched)
    }

    /// Admin listing includes drafts and never touches the page cache.
    pub async fn load_articles_admin(
        &self,
        page: i64,
        per_page: i64,
        category_id: Option<i64>,
    ) -> Result<ArticlesPage, BlogClientError> {
        let http = self.http.lock().await;
        http.list_articles_admin(Some(page), Some(per_page), category_id)
            .await
    }

    pub async fn get_article(&self, id: i64) -> Result<Article, BlogClientError> {
        let http = self.http.lock().await;
        http.get_article(id).await
    }

    pub async fn get_article_admin(&self, id: i64) -> Result<Article, BlogClientError> {
        let http = self.http.lock().await;
        http.get_article_admin(id).await
    }

    pub async fn page_of_article(
        &self,
        id: i64,
        per_page: Option<i64>,
    ) -> Result<i64, BlogClientError> {
        let http = self.http.lock().await;
        http.page_of_article(id, per_page).await
    }

    /// Create an article. A new article shifts every listing page, so the
    /// whole cache is dropped.
    pub async fn create_article(&self, form: ArticleForm) -> Result<Article, BlogClientError> {
        validate::validate_new_article(&form)?;

        let created = {
            let http = self.http.lock().await;
            http.create_article(form).await?
        };

        let mut cache = self.cache.lock().await;
        cache.clear();
        Ok(created)
    }

    /// Update an article, rewriting it in place in any cached page.
    pub async fn update_article(
        &self,
        id: i64,
        form: ArticleForm,
    ) -> Result<Article, BlogClientError> {
        let updated = {
            let http = self.http.lock().await;
            http.update_article(id, form).await?
        };

        let mut cache = self.cache.lock().await;
        cache.patch_article(&updated);
        Ok(updated)
    }

    pub async fn delete_article(&self, id: i64) -> Result<(), BlogClientError> {
        {
            let http = self.http.lock().await;
            http.delete_article(id).await?;
        }

        let mut cache = self.cache.lock().await;
        cache.remove_article(id);
        Ok(())
    }

    /// Flip the published flag. An unpublished article leaves the public
    /// listing entirely, so the cache is dropped rather than patched.
    pub async fn toggle_publish(&self, id: i64) -> Result<Article, BlogClientError> {
        let toggled = {
            let http = self.http.lock().await;
            http.toggle_publish(id).await?
        };

        let mut cache = self.cache.lock().await;
        if toggled.is_published {
            cache.clear();
        } else {
            cache.remove_article(id);
        }
        Ok(toggled)
    }

    // ==================== Категории ====================

    pub async fn list_categories(&self) -> Result<Vec<Category>, BlogClientError> {
        let http = self.http.lock().await;
        http.list_categories().await
    }

    pub async fn get_category(&self, id: i64) -> Result<Category, BlogClientError> {
        let http = self.http.lock().await;
        http.get_category(id).await
    }

    pub async fn get_category_by_slug(&self, slug: &str) -> Result<Category, BlogClientError> {
        let http = self.http.lock().await;
        http.get_category_by_slug(slug).await
    }

    pub async fn create_category(
        &self,
        req: CreateCategoryRequest,
    ) -> Result<Category, BlogClientError> {
        let http = self.http.lock().await;
        http.create_category(req).await
    }

    /// Category renames change the names joined into cached listings.
    pub async fn update_category(
        &self,
        id: i64,
        req: UpdateCategoryRequest,
    ) -> Result<Category, BlogClientError> {
        let updated = {
            let http = self.http.lock().await;
            http.update_category(id, req).await?
        };

        let mut cache = self.cache.lock().await;
        cache.clear();
        Ok(updated)
    }

    pub async fn delete_category(&self, id: i64) -> Result<(), BlogClientError> {
        let http = self.http.lock().await;
        http.delete_category(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_round_trip() {
        let client = BlogClient::new("http://localhost:3000");
        assert!(client.get_token().await.is_none());

        client.set_token("jwt".to_string()).await;
        assert_eq!(client.get_token().await.as_deref(), Some("jwt"));

        client.clear_token().await;
        assert!(client.get_token().await.is_none());
    }

    #[tokio::test]
    async fn fresh_client_starts_on_page_one() {
        let client = BlogClient::new("http://localhost:3000");
        let cursor = client.cursor().await;
        assert_eq!(cursor.current_page, 1);
        assert_eq!(cursor.total, 0);
    }

    #[tokio::test]
    async fn invalid_credentials_fail_before_any_request() {
        // Unroutable base URL: an error other than Validation would mean
        // the client tried the network.
        let client = BlogClient::new("http://127.0.0.1:1");
        let err = client.register("ab", "secret", "tok").await.unwrap_err();
        assert!(err.is_validation());
    }
}
