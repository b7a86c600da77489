//! Form validation mirroring the server-side rules, so obviously bad input
//! never leaves the client.

use crate::error::BlogClientError;
use crate::models::ArticleForm;

/// 3 to 15 characters, Latin or Cyrillic letters only.
pub fn is_valid_username(username: &str) -> bool {
    let len = username.chars().count();
    (3..=15).contains(&len)
        && username.chars().all(|c| {
            c.is_ascii_alphabetic()
                || ('а'..='я').contains(&c)
                || ('А'..='Я').contains(&c)
                || c == 'ё'
                || c == 'Ё'
        })
}

pub fn validate_credentials(username: &str, password: &str) -> Result<(), BlogClientError> {
    if !is_valid_username(username) {
        return Err(BlogClientError::Validation(
            "Username must be 3-15 Latin or Cyrillic letters".to_string(),
        ));
    }
    if password.is_empty() {
        return Err(BlogClientError::Validation(
            "Password cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// The create form must carry a title, content and some image reference.
pub fn validate_new_article(form: &ArticleForm) -> Result<(), BlogClientError> {
    if form.title.as_deref().unwrap_or("").trim().is_empty() {
        return Err(BlogClientError::Validation(
            "Title cannot be empty".to_string(),
        ));
    }
    if form.content.as_deref().unwrap_or("").trim().is_empty() {
        return Err(BlogClientError::Validation(
            "Content cannot be empty".to_string(),
        ));
    }
    if form.image.is_none() && form.image_url.as_deref().unwrap_or("").trim().is_empty() {
        return Err(BlogClientError::Validation(
            "An image upload or image_url is required".to_string(),
        ));
    }
    Ok(())
}
