use crate::domain::{Category, DomainError};
use async_trait::async_trait;
use sqlx::{PgPool, Row};

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Categories ordered by name, each with its article count.
    async fn list(&self) -> Result<Vec<Category>, DomainError>;
    async fn find_by_id(&self, id: i64) -> Result<Category, DomainError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Category, DomainError>;
    async fn create(
        &self,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Category, DomainError>;
    async fn update(
        &self,
        id: i64,
        name: Option<&str>,
        slug: Option<&str>,
        description: Option<&str>,
    ) -> Result<Category, DomainError>;
    async fn article_count(&self, id: i64) -> Result<i64, DomainError>;
    async fn delete(&self, id: i64) -> Result<(), DomainError>;
}

pub struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_category(row: sqlx::postgres::PgRow) -> Result<Category, DomainError> {
    Ok(Category {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
        articles_count: row.try_get("articles_count").ok(),
    })
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn list(&self) -> Result<Vec<Category>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.name, c.slug, c.description,
                   COUNT(a.id) AS articles_count
            FROM categories c
            LEFT JOIN articles a ON c.id = a.category_id
            GROUP BY c.id
            ORDER BY c.name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(row_to_category).collect()
    }

    async fn find_by_id(&self, id: i64) -> Result<Category, DomainError> {
        let row = sqlx::query(
            "SELECT id, name, slug, description FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => row_to_category(row),
            None => Err(DomainError::CategoryNotFound),
        }
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Category, DomainError> {
        let row = sqlx::query(
            "SELECT id, name, slug, description FROM categories WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        match row {
            Some(row) => row_to_category(row),
            None => Err(DomainError::CategoryNotFound),
        }
    }

    async fn create(
        &self,
        name: &str,
        slug: &str,
        description: Option<&str>,
    ) -> Result<Category, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO categories (name, slug, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug, description
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create category: {}", e);
            if e.to_string().contains("duplicate key") {
                DomainError::CategoryAlreadyExists
            } else {
                DomainError::DatabaseError(e.to_string())
            }
        })?;

        row_to_category(row)
    }

    async fn update(
        &self,
        id: i64,
        name: Option<&str>,
        slug: Option<&str>,
        description: Option<&str>,
    ) -> Result<Category, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE categories
            SET
                name = COALESCE($1, name),
                slug = COALESCE($2, slug),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $4
            RETURNING id, name, slug, description
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if e.to_string().contains("duplicate key") {
                DomainError::CategoryAlreadyExists
            } else {
                DomainError::DatabaseError(e.to_string())
            }
        })?;

        match row {
            Some(row) => row_to_category(row),
            None => Err(DomainError::CategoryNotFound),
        }
    }

    async fn article_count(&self, id: i64) -> Result<i64, DomainError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM articles WHERE category_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        Ok(row.try_get("total")?)
    }

    async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            Err(DomainError::CategoryNotFound)
        } else {
            Ok(())
        }
    }
}
