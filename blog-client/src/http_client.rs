use crate::error::BlogClientError;
use crate::models::{
    Article, ArticleForm, ArticlesPage, AuthResponse, Category, CreateCategoryRequest,
    ErrorResponse, LoginRequest, RegisterRequest, UpdateCategoryRequest, User,
};
use reqwest::multipart;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct ExistsResponse {
    exists: bool,
}

#[derive(Debug, Deserialize)]
struct PageOfResponse {
    page: i64,
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
            token: None,
        }
    }

    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn get_token(&self) -> Option<&String> {
        self.token.as_ref()
    }

    fn add_auth_header(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        request
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    // Тело ошибки сервера: {"error": "..."}
    async fn error_text(response: reqwest::Response) -> Result<String, BlogClientError> {
        let text = response.text().await?;
        match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(body) => Ok(body.error),
            Err(_) => Ok(text),
        }
    }

    async fn error_for_status(
        status: StatusCode,
        response: reqwest::Response,
    ) -> BlogClientError {
        match status {
            StatusCode::NOT_FOUND => BlogClientError::NotFound,
            StatusCode::UNAUTHORIZED => match Self::error_text(response).await {
                Ok(text) => BlogClientError::Unauthorized(text),
                Err(err) => err,
            },
            StatusCode::FORBIDDEN => match Self::error_text(response).await {
                Ok(text) => BlogClientError::Forbidden(text),
                Err(err) => err,
            },
            StatusCode::BAD_REQUEST => match Self::error_text(response).await {
                Ok(text) => BlogClientError::InvalidRequest(text),
                Err(err) => err,
            },
            StatusCode::CONFLICT => match Self::error_text(response).await {
                Ok(text) => BlogClientError::Conflict(text),
                Err(err) => err,
            },
            _ => match Self::error_text(response).await {
                Ok(text) => {
                    BlogClientError::TransportError(format!("HTTP {}: {}", status, text))
                }
                Err(err) => err,
            },
        }
    }

    async fn handle_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BlogClientError> {
        let status = response.status();
        match status {
            StatusCode::OK | StatusCode::CREATED => Ok(response.json::<T>().await?),
            _ => Err(Self::error_for_status(status, response).await),
        }
    }

    // ==================== Аутентификация ====================

    pub async fn register(&self, req: RegisterRequest) -> Result<User, BlogClientError> {
        let url = self.url("/api/auth/register");
        let response = self.client.post(&url).json(&req).send().await?;
        Self::handle_json(response).await
    }

    pub async fn login(&mut self, req: LoginRequest) -> Result<AuthResponse, BlogClientError> {
        let url = self.url("/api/auth/login");
        let response = self.client.post(&url).json(&req).send().await?;

        let auth: AuthResponse = Self::handle_json(response).await?;
        self.set_token(auth.token.clone());
        Ok(auth)
    }

    pub async fn check_username(&self, username: &str) -> Result<bool, BlogClientError> {
        let url = self.url("/api/auth/check-username");
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "username": username }))
            .send()
            .await?;

        let body: ExistsResponse = Self::handle_json(response).await?;
        Ok(body.exists)
    }

    pub async fn me(&self) -> Result<User, BlogClientError> {
        let url = self.url("/api/auth/me");
        let response = self.add_auth_header(self.client.get(&url)).send().await?;
        Self::handle_json(response).await
    }

    // ==================== Статьи ====================

    pub async fn list_articles(
        &self,
        page: Option<i64>,
        per_page: Option<i64>,
        category_id: Option<i64>,
    ) -> Result<ArticlesPage, BlogClientError> {
        let url = self.list_url("/api/articles", page, per_page, category_id);
        let response = self.client.get(&url).send().await?;
        Self::handle_json(response).await
    }

    pub async fn list_articles_admin(
        &self,
        page: Option<i64>,
        per_page: Option<i64>,
        category_id: Option<i64>,
    ) -> Result<ArticlesPage, BlogClientError> {
        let url = self.list_url("/api/admin/articles", page, per_page, category_id);
        let response = self.add_auth_header(self.client.get(&url)).send().await?;
        Self::handle_json(response).await
    }

    fn list_url(
        &self,
        path: &str,
        page: Option<i64>,
        per_page: Option<i64>,
        category_id: Option<i64>,
    ) -> String {
        let mut url = self.url(path);
        let mut params = vec![];

        if let Some(p) = page {
            params.push(format!("page={}", p));
        }
        if let Some(pp) = per_page {
            params.push(format!("per_page={}", pp));
        }
        if let Some(c) = category_id {
            params.push(format!("category_id={}", c));
        }

        if !params.is_empty() {
            url = format!("{}?{}", url, params.join("&"));
        }
        url
    }

    pub async fn get_article(&self, id: i64) -> Result<Article, BlogClientError> {
        let url = self.url(&format!("/api/articles/{}", id));
        let response = self.client.get(&url).send().await?;
        Self::handle_json(response).await
    }

    pub async fn get_article_admin(&self, id: i64) -> Result<Article, BlogClientError> {
        let url = self.url(&format!("/api/admin/articles/{}", id));
        let response = self.add_auth_header(self.client.get(&url)).send().await?;
        Self::handle_json(response).await
    }

    /// Which listing page the published article lands on for a given
    /// page size, so the UI can deep-link back into the pager.
    pub async fn page_of_article(
        &self,
        id: i64,
        per_page: Option<i64>,
    ) -> Result<i64, BlogClientError> {
        let mut url = self.url(&format!("/api/articles/page-of/{}", id));
        if let Some(pp) = per_page {
            url = format!("{}?per_page={}", url, pp);
        }

        let response = self.client.get(&url).send().await?;
        let body: PageOfResponse = Self::handle_json(response).await?;
        Ok(body.page)
    }

    fn article_form_parts(form: ArticleForm) -> multipart::Form {
        let mut parts = multipart::Form::new();

        if let Some(title) = form.title {
            parts = parts.text("title", title);
        }
        if let Some(content) = form.content {
            parts = parts.text("content", content);
        }
        if let Some((filename, bytes)) = form.image {
            parts = parts.part("image", multipart::Part::bytes(bytes).file_name(filename));
        }
        if let Some(image_url) = form.image_url {
            parts = parts.text("image_url", image_url);
        }
        if let Some(is_published) = form.is_published {
            parts = parts.text("is_published", is_published.to_string());
        }
        if let Some(category_id) = form.category_id {
            parts = parts.text("category_id", category_id.to_string());
        }

        parts
    }

    pub async fn create_article(&self, form: ArticleForm) -> Result<Article, BlogClientError> {
        let url = self.url("/api/articles");
        let response = self
            .add_auth_header(self.client.post(&url))
            .multipart(Self::article_form_parts(form))
            .send()
            .await?;

        Self::handle_json(response).await
    }

    pub async fn update_article(
        &self,
        id: i64,
        form: ArticleForm,
    ) -> Result<Article, BlogClientError> {
        let url = self.url(&format!("/api/articles/{}", id));
        let response = self
            .add_auth_header(self.client.put(&url))
            .multipart(Self::article_form_parts(form))
            .send()
            .await?;

        Self::handle_json(response).await
    }

    pub async fn delete_article(&self, id: i64) -> Result<(), BlogClientError> {
        let url = self.url(&format!("/api/articles/{}", id));
        let response = self
            .add_auth_header(self.client.delete(&url))
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::NO_CONTENT | StatusCode::OK => Ok(()),
            _ => Err(Self::error_for_status(status, response).await),
        }
    }

    pub async fn toggle_publish(&self, id: i64) -> Result<Article, BlogClientError> {
        let url = self.url(&format!("/api/articles/{}/toggle-publish", id));
        let response = self.add_auth_header(self.client.post(&url)).send().await?;
        Self::handle_json(response).await
    }

    // ==================== Категории ====================

    pub async fn list_categories(&self) -> Result<Vec<Category>, BlogClientError> {
        let url = self.url("/api/categories");
        let response = self.client.get(&url).send().await?;
        Self::handle_json(response).await
    }

    pub async fn get_category(&self, id: i64) -> Result<Category, BlogClientError> {
        let url = self.url(&format!("/api/categories/{}", id));
        let response = self.client.get(&url).send().await?;
        Self::handle_json(response).await
    }

    pub async fn get_category_by_slug(&self, slug: &str) -> Result<Category, BlogClientError> {
        let url = self.url(&format!("/api/categories/{}", slug));
        let response = self.client.get(&url).send().await?;
        Self::handle_json(response).await
    }

    pub async fn create_category(
        &self,
        req: CreateCategoryRequest,
    ) -> Result<Category, BlogClientError> {
        let url = self.url("/api/categories");
        let response = self
            .add_auth_header(self.client.post(&url))
            .json(&req)
            .send()
            .await?;

        Self::handle_json(response).await
    }

    pub async fn update_category(
        &self,
        id: i64,
        req: UpdateCategoryRequest,
    ) -> Result<Category, BlogClientError> {
        let url = self.url(&format!("/api/categories/{}", id));
        let response = self
            .add_auth_header(self.client.put(&url))
            .json(&req)
            .send()
            .await?;

        Self::handle_json(response).await
    }

    pub async fn delete_category(&self, id: i64) -> Result<(), BlogClientError> {
        let url = self.url(&format!("/api/categories/{}", id));
        let response = self
            .add_auth_header(self.client.delete(&url))
            .send()
            .await?;

        let status = response.status();
        match status {
            StatusCode::NO_CONTENT | StatusCode::OK => Ok(()),
            _ => Err(Self::error_for_status(status, response).await),
        }
    }
}
