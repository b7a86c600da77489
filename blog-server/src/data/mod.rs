pub mod article_repository;
pub mod category_repository;
pub mod user_repository;

pub use article_repository::{ArticleRepository, PostgresArticleRepository};
pub use category_repository::{CategoryRepository, PostgresCategoryRepository};
pub use user_repository::{PostgresUserRepository, UserRepository};
