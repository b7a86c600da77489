pub mod article;
pub mod category;
pub mod error;
pub mod user;

pub use article::Article;
pub use category::Category;
pub use error::DomainError;
pub use user::User;
