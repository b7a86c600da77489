use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlogClientError {
    // HTTP ошибки
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    // Бизнес-логика ошибки
    #[error("Resource not found")]
    NotFound,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Клиентская валидация форм до любого сетевого вызова
    #[error("Validation failed: {0}")]
    Validation(String),

    // Транспортные ошибки
    #[error("Transport error: {0}")]
    TransportError(String),
}

impl BlogClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlogClientError::NotFound)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BlogClientError::Unauthorized(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, BlogClientError::Validation(_))
    }
}
