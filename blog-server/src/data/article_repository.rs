use crate::domain::article::{ArticlePatch, NewArticle};
use crate::domain::{Article, DomainError};
use async_trait::async_trait;
use sqlx::{PgPool, Row};

const ARTICLE_COLUMNS: &str = r#"
    a.id, a.title, a.content, a.author_id, a.image_url, a.category_id,
    a.is_published, a.created_at, a.updated_at,
    u.username AS author_name, c.name AS category_name, c.slug AS category_slug
"#;

#[async_trait]
pub trait ArticleRepository: Send + Sync {
    async fn create(&self, author_id: i64, article: NewArticle) -> Result<Article, DomainError>;
    /// Published article with joined author/category columns, or not-found.
    async fn find_published(&self, id: i64) -> Result<Article, DomainError>;
    /// Any article regardless of publication state (admin reads, ownership checks).
    async fn find_any(&self, id: i64) -> Result<Article, DomainError>;
    async fn list_published(
        &self,
        limit: i64,
        offset: i64,
        category_id: Option<i64>,
    ) -> Result<Vec<Article>, DomainError>;
    async fn list_all(
        &self,
        limit: i64,
        offset: i64,
        category_id: Option<i64>,
    ) -> Result<Vec<Article>, DomainError>;
    async fn count_published(&self, category_id: Option<i64>) -> Result<i64, DomainError>;
    async fn count_all(&self, category_id: Option<i64>) -> Result<i64, DomainError>;
    /// Zero-based rank of a published article within the newest-first ordering.
    async fn published_rank(&self, id: i64) -> Result<i64, DomainError>;
    async fn update(&self, id: i64, patch: ArticlePatch) -> Result<Article, DomainError>;
    async fn set_published(&self, id: i64, published: bool) -> Result<Article, DomainError>;
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
}

pub struct PostgresArticleRepository {
    pool: PgPool,
}

impl PostgresArticleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_article(row: sqlx::postgres::PgRow) -> Result<Article, DomainError> {
    Ok(Article {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        author_id: row.try_get("author_id")?,
        image_url: row.try_get("image_url")?,
        category_id: row.try_get("category_id")?,
        is_published: row.try_get("is_published")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        author_name: row.try_get("author_name").ok(),
        category_name: row.try_get("category_name").ok(),
        category_slug: row.try_get("category_slug").ok(),
    })
}

#[async_trait]
impl ArticleRepository for PostgresArticleRepository {
    async fn create(&self, author_id: i64, article: NewArticle) -> Result<Article, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO articles (title, content, author_id, image_url, is_published, category_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            RETURNING id, title, content, author_id, image_url, category_id,
                      is_published, created_at, updated_at
            "#,
        )
        .bind(&article.title)
        .bind(&article.content)
        .bind(author_id)
        .bind(&article.image_url)
        .bind(article.is_published)
        .bind(article.category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create article: {}", e);
            DomainError::DatabaseError(e.to_string())
        })?;

        row_to_article(row)
    }

    async fn find_published(&self, id: i64) -> Result<Article, DomainError> {
        let query = format!(
            r#"
            SELECT {ARTICLE_COLUMNS}
            FROM articles a
            JOIN users u ON a.author_id = u.id
            LEFT JOIN categories c ON a.category_id = c.id
            WHERE a.id = $1 AND a.is_published = true
            "#
        );

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => row_to_article(row),
            None => Err(DomainError::ArticleNotFound),
        }
    }

    async fn find_any(&self, id: i64) -> Result<Article, DomainError> {
        let query = format!(
            r#"
            SELECT {ARTICLE_COLUMNS}
            FROM articles a
            JOIN users u ON a.author_id = u.id
            LEFT JOIN categories c ON a.category_id = c.id
            WHERE a.id = $1
            "#
        );

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => row_to_article(row),
            None => Err(DomainError::ArticleNotFound),
        }
    }

    async fn list_published(
        &self,
        limit: i64,
        offset: i64,
        category_id: Option<i64>,
    ) -> Result<Vec<Article>, DomainError> {
        let query = format!(
            r#"
            SELECT {ARTICLE_COLUMNS}
            FROM articles a
            JOIN users u ON a.author_id = u.id
            LEFT JOIN categories c ON a.category_id = c.id
            WHERE a.is_published = true
              AND ($3::bigint IS NULL OR a.category_id = $3)
            ORDER BY a.created_at DESC
            LIMIT $1 OFFSET $2
            "#
        );

        let rows = sqlx::query(&query)
            .bind(limit)
            .bind(offset)
            .bind(category_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(row_to_article).collect()
    }

    async fn list_all(
        &self,
        limit: i64,
        offset: i64,
        category_id: Option<i64>,
    ) -> Result<Vec<Article>, DomainError> {
        let query = format!(
            r#"
            SELECT {ARTICLE_COLUMNS}
            FROM articles a
            JOIN users u ON a.author_id = u.id
            LEFT JOIN categories c ON a.category_id = c.id
            WHERE ($3::bigint IS NULL OR a.category_id = $3)
            ORDER BY a.created_at DESC
            LIMIT $1 OFFSET $2
            "#
        );

        let rows = sqlx::query(&query)
            .bind(limit)
            .bind(offset)
            .bind(category_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(row_to_article).collect()
    }

    async fn count_published(&self, category_id: Option<i64>) -> Result<i64, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total FROM articles
            WHERE is_published = true
              AND ($1::bigint IS NULL OR category_id = $1)
            "#,
        )
        .bind(category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        Ok(row.try_get("total")?)
    }

    async fn count_all(&self, category_id: Option<i64>) -> Result<i64, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total FROM articles
            WHERE ($1::bigint IS NULL OR category_id = $1)
            "#,
        )
        .bind(category_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        Ok(row.try_get("total")?)
    }

    async fn published_rank(&self, id: i64) -> Result<i64, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT row_number - 1 AS rank
            FROM (
                SELECT id, ROW_NUMBER() OVER (ORDER BY created_at DESC) AS row_number
                FROM articles
                WHERE is_published = true
            ) ranked
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => Ok(row.try_get("rank")?),
            None => Err(DomainError::ArticleNotFound),
        }
    }

    async fn update(&self, id: i64, patch: ArticlePatch) -> Result<Article, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE articles
            SET
                title = COALESCE($1, title),
                content = COALESCE($2, content),
                image_url = COALESCE($3, image_url),
                category_id = COALESCE($4, category_id),
                is_published = COALESCE($5, is_published),
                updated_at = NOW()
            WHERE id = $6
            RETURNING id, title, content, author_id, image_url, category_id,
                      is_published, created_at, updated_at
            "#,
        )
        .bind(patch.title)
        .bind(patch.content)
        .bind(patch.image_url)
        .bind(patch.category_id)
        .bind(patch.is_published)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => row_to_article(row),
            None => Err(DomainError::ArticleNotFound),
        }
    }

    async fn set_published(&self, id: i64, published: bool) -> Result<Article, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE articles
            SET is_published = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, title, content, author_id, image_url, category_id,
                      is_published, created_at, updated_at
            "#,
        )
        .bind(published)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => row_to_article(row),
            None => Err(DomainError::ArticleNotFound),
        }
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            Err(DomainError::ArticleNotFound)
        } else {
            Ok(())
        }
    }
}
