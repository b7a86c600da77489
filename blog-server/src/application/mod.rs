pub mod article_service;
pub mod auth_service;
pub mod category_service;

pub use article_service::ArticleService;
pub use auth_service::AuthService;
pub use category_service::CategoryService;
