use crate::application::{ArticleService, AuthService, CategoryService};
use crate::domain::article::{ArticleDraft, ArticlePatch};
use crate::domain::category::{CreateCategoryRequest, UpdateCategoryRequest};
use crate::domain::user::{AuthUser, CheckUsernameRequest, LoginRequest, RegisterRequest, UserResponse};
use crate::domain::DomainError;
use crate::infrastructure::jwt::JwtService;
use crate::infrastructure::storage::ImageStore;
use crate::presentation::forms::read_article_form;
use actix_multipart::Multipart;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, Responder};
use std::sync::Arc;

#[derive(serde::Serialize)]
struct AuthResponse {
    token: String,
    user: UserResponse,
}

#[derive(serde::Deserialize)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub category_id: Option<i64>,
}

#[derive(serde::Deserialize)]
pub struct PageOfQuery {
    pub per_page: Option<i64>,
}

const DEFAULT_PER_PAGE: i64 = 6;

// Authenticated identity: either the scope middleware already verified the
// token, or the handler guards itself and reads the header directly.
fn auth_user_from_request(
    req: &HttpRequest,
    jwt: &JwtService,
) -> Result<AuthUser, DomainError> {
    if let Some(user) = req.extensions().get::<AuthUser>() {
        return Ok(user.clone());
    }

    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| DomainError::Unauthorized("Missing bearer token".to_string()))?;

    jwt.verify_token(token)
}

fn require_admin(req: &HttpRequest, jwt: &JwtService) -> Result<AuthUser, DomainError> {
    let user = auth_user_from_request(req, jwt)?;
    if !user.is_admin {
        return Err(DomainError::Forbidden);
    }
    Ok(user)
}

fn error_to_response(err: DomainError) -> HttpResponse {
    let status_code = err.to_status_code();
    let message = err.to_string();

    match status_code {
        400 => HttpResponse::BadRequest().json(serde_json::json!({ "error": message })),
        401 => HttpResponse::Unauthorized().json(serde_json::json!({ "error": message })),
        403 => HttpResponse::Forbidden().json(serde_json::json!({ "error": message })),
        404 => HttpResponse::NotFound().json(serde_json::json!({ "error": message })),
        409 => HttpResponse::Conflict().json(serde_json::json!({ "error": message })),
        _ => HttpResponse::InternalServerError()
            .json(serde_json::json!({ "error": "Internal server error" })),
    }
}

// ============== Auth handlers ==============

pub async fn register(
    auth_service: web::Data<Arc<AuthService>>,
    req: web::Json<RegisterRequest>,
) -> impl Responder {
    match auth_service.register(req.into_inner()).await {
        Ok(user) => HttpResponse::Created().json(user),
        Err(err) => error_to_response(err),
    }
}

pub async fn login(
    auth_service: web::Data<Arc<AuthService>>,
    req: web::Json<LoginRequest>,
) -> impl Responder {
    match auth_service.login(req.into_inner()).await {
        Ok((token, user)) => HttpResponse::Ok().json(AuthResponse { token, user }),
        Err(err) => error_to_response(err),
    }
}

pub async fn check_username(
    auth_service: web::Data<Arc<AuthService>>,
    req: web::Json<CheckUsernameRequest>,
) -> impl Responder {
    match auth_service.username_exists(&req.username).await {
        Ok(exists) => HttpResponse::Ok().json(serde_json::json!({ "exists": exists })),
        Err(err) => error_to_response(err),
    }
}

pub async fn me(
    req: HttpRequest,
    auth_service: web::Data<Arc<AuthService>>,
    jwt_service: web::Data<Arc<JwtService>>,
) -> impl Responder {
    let user = match auth_user_from_request(&req, &jwt_service) {
        Ok(user) => user,
        Err(err) => return error_to_response(err),
    };

    match auth_service.current_user(user.id).await {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(err) => error_to_response(err),
    }
}

// ============== Public article handlers ==============

pub async fn list_articles(
    article_service: web::Data<Arc<ArticleService>>,
    query: web::Query<ListQuery>,
) -> impl Responder {
    let page = query.page.unwrap_or(1);
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE);

    tracing::debug!(
        "Listing articles: page={}, per_page={}, category={:?}",
        page,
        per_page,
        query.category_id
    );

    match article_service
        .list_page(page, per_page, query.category_id)
        .await
    {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(err) => error_to_response(err),
    }
}

pub async fn get_article(
    article_service: web::Data<Arc<ArticleService>>,
    path: web::Path<i64>,
) -> impl Responder {
    match article_service.get(path.into_inner()).await {
        Ok(article) => HttpResponse::Ok().json(article),
        Err(err) => error_to_response(err),
    }
}

pub async fn page_of_article(
    article_service: web::Data<Arc<ArticleService>>,
    path: web::Path<i64>,
    query: web::Query<PageOfQuery>,
) -> impl Responder {
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE);

    match article_service.page_of(path.into_inner(), per_page).await {
        Ok(page) => HttpResponse::Ok().json(serde_json::json!({ "page": page })),
        Err(err) => error_to_response(err),
    }
}

// ============== Admin article handlers ==============

pub async fn admin_list_articles(
    req: HttpRequest,
    article_service: web::Data<Arc<ArticleService>>,
    jwt_service: web::Data<Arc<JwtService>>,
    query: web::Query<ListQuery>,
) -> impl Responder {
    if let Err(err) = require_admin(&req, &jwt_service) {
        return error_to_response(err);
    }

    let page = query.page.unwrap_or(1);
    let per_page = query.per_page.unwrap_or(DEFAULT_PER_PAGE);

    match article_service
        .list_page_admin(page, per_page, query.category_id)
        .await
    {
        Ok(result) => HttpResponse::Ok().json(result),
        Err(err) => error_to_response(err),
    }
}

pub async fn admin_get_article(
    req: HttpRequest,
    article_service: web::Data<Arc<ArticleService>>,
    jwt_service: web::Data<Arc<JwtService>>,
    path: web::Path<i64>,
) -> impl Responder {
    if let Err(err) = require_admin(&req, &jwt_service) {
        return error_to_response(err);
    }

    match article_service.get_admin(path.into_inner()).await {
        Ok(article) => HttpResponse::Ok().json(article),
        Err(err) => error_to_response(err),
    }
}

pub async fn create_article(
    req: HttpRequest,
    article_service: web::Data<Arc<ArticleService>>,
    jwt_service: web::Data<Arc<JwtService>>,
    image_store: web::Data<Arc<dyn ImageStore>>,
    payload: Multipart,
) -> impl Responder {
    let user = match require_admin(&req, &jwt_service) {
        Ok(user) => user,
        Err(err) => return error_to_response(err),
    };

    let form = match read_article_form(payload).await {
        Ok(form) => form,
        Err(err) => return error_to_response(err),
    };

    // A fresh upload wins over an externally supplied URL.
    let image_url = match &form.image {
        Some((filename, data)) => match image_store.save(filename, data).await {
            Ok(url) => Some(url),
            Err(err) => return error_to_response(err),
        },
        None => form.image_url.clone(),
    };

    let draft = ArticleDraft {
        title: form.title.unwrap_or_default(),
        content: form.content.unwrap_or_default(),
        image_url,
        is_published: form.is_published,
        category_id: form.category_id,
    };

    match article_service.create(user.id, draft).await {
        Ok(article) => HttpResponse::Created().json(article),
        Err(err) => error_to_response(err),
    }
}

pub async fn update_article(
    req: HttpRequest,
    article_service: web::Data<Arc<ArticleService>>,
    jwt_service: web::Data<Arc<JwtService>>,
    path: web::Path<i64>,
    payload: Multipart,
) -> impl Responder {
    let user = match require_admin(&req, &jwt_service) {
        Ok(user) => user,
        Err(err) => return error_to_response(err),
    };

    let form = match read_article_form(payload).await {
        Ok(form) => form,
        Err(err) => return error_to_response(err),
    };

    let patch = ArticlePatch {
        title: form.title,
        content: form.content,
        image_url: form.image_url,
        category_id: form.category_id,
        is_published: form.is_published,
    };

    // The service stores the upload only once ownership is confirmed.
    match article_service
        .update(path.into_inner(), user.id, patch, form.image)
        .await
    {
        Ok(article) => HttpResponse::Ok().json(article),
        Err(err) => error_to_response(err),
    }
}

pub async fn delete_article(
    req: HttpRequest,
    article_service: web::Data<Arc<ArticleService>>,
    jwt_service: web::Data<Arc<JwtService>>,
    path: web::Path<i64>,
) -> impl Responder {
    let user = match require_admin(&req, &jwt_service) {
        Ok(user) => user,
        Err(err) => return error_to_response(err),
    };

    match article_service.delete(path.into_inner(), user.id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_to_response(err),
    }
}

pub async fn toggle_publish(
    req: HttpRequest,
    article_service: web::Data<Arc<ArticleService>>,
    jwt_service: web::Data<Arc<JwtService>>,
    path: web::Path<i64>,
) -> impl Responder {
    if let Err(err) = require_admin(&req, &jwt_service) {
        return error_to_response(err);
    }

    match article_service.toggle_publish(path.into_inner()).await {
        Ok(article) => HttpResponse::Ok().json(article),
        Err(err) => error_to_response(err),
    }
}

// ============== Category handlers ==============

pub async fn list_categories(
    category_service: web::Data<Arc<CategoryService>>,
) -> impl Responder {
    match category_service.list().await {
        Ok(categories) => HttpResponse::Ok().json(categories),
        Err(err) => error_to_response(err),
    }
}

// A numeric segment is an id, anything else a slug.
pub async fn get_category(
    category_service: web::Data<Arc<CategoryService>>,
    path: web::Path<String>,
) -> impl Responder {
    let key = path.into_inner();
    let result = match key.parse::<i64>() {
        Ok(id) => category_service.get(id).await,
        Err(_) => category_service.get_by_slug(&key).await,
    };

    match result {
        Ok(category) => HttpResponse::Ok().json(category),
        Err(err) => error_to_response(err),
    }
}

pub async fn create_category(
    req: HttpRequest,
    category_service: web::Data<Arc<CategoryService>>,
    jwt_service: web::Data<Arc<JwtService>>,
    body: web::Json<CreateCategoryRequest>,
) -> impl Responder {
    if let Err(err) = require_admin(&req, &jwt_service) {
        return error_to_response(err);
    }

    match category_service.create(body.into_inner()).await {
        Ok(category) => HttpResponse::Created().json(category),
        Err(err) => error_to_response(err),
    }
}

pub async fn update_category(
    req: HttpRequest,
    category_service: web::Data<Arc<CategoryService>>,
    jwt_service: web::Data<Arc<JwtService>>,
    path: web::Path<i64>,
    body: web::Json<UpdateCategoryRequest>,
) -> impl Responder {
    if let Err(err) = require_admin(&req, &jwt_service) {
        return error_to_response(err);
    }

    match category_service
        .update(path.into_inner(), body.into_inner())
        .await
    {
        Ok(category) => HttpResponse::Ok().json(category),
        Err(err) => error_to_response(err),
    }
}

pub async fn delete_category(
    req: HttpRequest,
    category_service: web::Data<Arc<CategoryService>>,
    jwt_service: web::Data<Arc<JwtService>>,
    path: web::Path<i64>,
) -> impl Responder {
    if let Err(err) = require_admin(&req, &jwt_service) {
        return error_to_response(err);
    }

    match category_service.delete(path.into_inner()).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(err) => error_to_response(err),
    }
}
