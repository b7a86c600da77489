use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    // Joined columns, present on read paths
    pub author_name: Option<String>,
    pub category_name: Option<String>,
    pub category_slug: Option<String>,
}

/// Validated input for article creation. The image reference is mandatory
/// at this point: the handler either stored an upload or took an explicit URL.
#[derive(Debug)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub is_published: bool,
    pub category_id: Option<i64>,
}

/// Unvalidated article fields as they arrive from the create form. The
/// service checks the required-field invariants before anything is written.
#[derive(Debug, Default)]
pub struct ArticleDraft {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub is_published: Option<bool>,
    pub category_id: Option<i64>,
}

/// Field-level merge for updates: `None` leaves the stored value unchanged.
#[derive(Debug, Default)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub category_id: Option<i64>,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub current_page: i64,
    pub per_page: i64,
    pub total_pages: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArticlesPage {
    pub data: Vec<Article>,
    pub meta: PaginationMeta,
}
