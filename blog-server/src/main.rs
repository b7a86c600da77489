use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;

use application::{ArticleService, AuthService, CategoryService};
use data::{
    ArticleRepository, CategoryRepository, PostgresArticleRepository,
    PostgresCategoryRepository, PostgresUserRepository, UserRepository,
};
use infrastructure::{
    cache::ListingCache,
    captcha::{CaptchaVerifier, RecaptchaVerifier},
    database::{create_pool, run_migrations},
    jwt::JwtService,
    logging::init_logging,
    storage::{ImageStore, LocalImageStore},
};
use presentation::{http_handlers, middleware::jwt_middleware};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let jwt_secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    let recaptcha_secret =
        std::env::var("RECAPTCHA_SECRET_KEY").expect("RECAPTCHA_SECRET_KEY must be set");
    let http_port = std::env::var("HTTP_PORT").unwrap_or_else(|_| "3000".to_string());
    let images_dir =
        std::env::var("IMAGES_DIR").unwrap_or_else(|_| "public/images".to_string());
    let cache_ttl_secs = std::env::var("LIST_CACHE_TTL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(300);
    let db_max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(5);

    let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:8000,http://127.0.0.1:8000".to_string());

    let http_addr = format!("0.0.0.0:{}", http_port);

    tracing::info!("Starting blog server...");
    tracing::info!("HTTP server will listen on {}", http_addr);

    tracing::info!("Connecting to database...");
    let pool = create_pool(&database_url, db_max_connections).await?;

    tracing::info!("Running database migrations...");
    run_migrations(&pool).await?;

    tracing::info!("Initializing services...");

    let jwt_service = Arc::new(JwtService::new(&jwt_secret)?);
    let image_store: Arc<dyn ImageStore> = Arc::new(LocalImageStore::new(images_dir));
    let captcha: Arc<dyn CaptchaVerifier> = Arc::new(RecaptchaVerifier::new(recaptcha_secret));
    let listing_cache = Arc::new(ListingCache::new(Duration::from_secs(cache_ttl_secs)));

    let user_repo: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(pool.clone()));
    let article_repo: Arc<dyn ArticleRepository> =
        Arc::new(PostgresArticleRepository::new(pool.clone()));
    let category_repo: Arc<dyn CategoryRepository> =
        Arc::new(PostgresCategoryRepository::new(pool.clone()));

    let auth_service = Arc::new(AuthService::new(
        user_repo.clone(),
        jwt_service.clone(),
        captcha,
    ));
    let article_service = Arc::new(ArticleService::new(
        article_repo,
        image_store.clone(),
        listing_cache,
    ));
    let category_service = Arc::new(CategoryService::new(category_repo));

    tracing::info!("Services initialized successfully");

    run_http_server(
        http_addr,
        auth_service,
        article_service,
        category_service,
        jwt_service,
        image_store,
        cors_allowed_origins,
    )
    .await?;

    tracing::info!("Shutting down...");
    Ok(())
}

/// Configure CORS for the HTTP server with allowed origins from .env
fn configure_cors(allowed_origins: &str) -> actix_cors::Cors {
    use actix_cors::Cors;
    use actix_web::http::header;

    let origins: Vec<&str> = allowed_origins.split(',').map(|s| s.trim()).collect();

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
        ])
        .expose_headers(vec![header::AUTHORIZATION])
        .max_age(3600);

    for origin in origins {
        if !origin.is_empty() {
            cors = cors.allowed_origin(origin);
            tracing::debug!("Added allowed CORS origin: {}", origin);
        }
    }

    cors
}

#[allow(clippy::too_many_arguments)]
async fn run_http_server(
    addr: String,
    auth_service: Arc<AuthService>,
    article_service: Arc<ArticleService>,
    category_service: Arc<CategoryService>,
    jwt_service: Arc<JwtService>,
    image_store: Arc<dyn ImageStore>,
    cors_allowed_origins: String,
) -> anyhow::Result<()> {
    use actix_web::{middleware::Logger, web, App, HttpServer};
    use actix_web_httpauth::middleware::HttpAuthentication;

    tracing::info!("Configuring HTTP server...");

    let auth_middleware = HttpAuthentication::bearer(jwt_middleware);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(configure_cors(&cors_allowed_origins))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(article_service.clone()))
            .app_data(web::Data::new(category_service.clone()))
            .app_data(web::Data::new(jwt_service.clone()))
            .app_data(web::Data::new(image_store.clone()))
            // Authentication
            .service(
                web::scope("/api/auth")
                    .route("/register", web::post().to(http_handlers::register))
                    .route("/login", web::post().to(http_handlers::login))
                    .route(
                        "/check-username",
                        web::post().to(http_handlers::check_username),
                    )
                    .route("/me", web::get().to(http_handlers::me)),
            )
            // Articles: public reads, admin-guarded writes
            .service(
                web::scope("/api/articles")
                    .route("", web::get().to(http_handlers::list_articles))
                    .route("", web::post().to(http_handlers::create_article))
                    .route(
                        "/page-of/{id}",
                        web::get().to(http_handlers::page_of_article),
                    )
                    .route(
                        "/{id}/toggle-publish",
                        web::post().to(http_handlers::toggle_publish),
                    )
                    .route("/{id}", web::get().to(http_handlers::get_article))
                    .route("/{id}", web::put().to(http_handlers::update_article))
                    .route("/{id}", web::delete().to(http_handlers::delete_article)),
            )
            // Admin listing, including unpublished articles
            .service(
                web::scope("/api/admin/articles")
                    .wrap(auth_middleware.clone())
                    .route("", web::get().to(http_handlers::admin_list_articles))
                    .route("/{id}", web::get().to(http_handlers::admin_get_article)),
            )
            // Categories: public reads, admin-guarded writes
            .service(
                web::scope("/api/categories")
                    .route("", web::get().to(http_handlers::list_categories))
                    .route("", web::post().to(http_handlers::create_category))
                    .route("/{id_or_slug}", web::get().to(http_handlers::get_category))
                    .route("/{id}", web::put().to(http_handlers::update_category))
                    .route("/{id}", web::delete().to(http_handlers::delete_category)),
            )
    })
    .bind(&addr)?
    .run();

    tracing::info!("HTTP server running on {}", addr);

    server.await?;

    Ok(())
}
