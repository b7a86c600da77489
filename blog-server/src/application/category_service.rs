use crate::data::CategoryRepository;
use crate::domain::category::{slugify, CreateCategoryRequest, UpdateCategoryRequest};
use crate::domain::{Category, DomainError};
use std::sync::Arc;

const MAX_NAME_LEN: usize = 255;

pub struct CategoryService {
    category_repo: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(category_repo: Arc<dyn CategoryRepository>) -> Self {
        Self { category_repo }
    }

    fn validate_name(name: &str) -> Result<(), DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "Category name cannot be empty".to_string(),
            ));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::ValidationError(format!(
                "Category name cannot exceed {} characters",
                MAX_NAME_LEN
            )));
        }
        Ok(())
    }

    pub async fn list(&self) -> Result<Vec<Category>, DomainError> {
        self.category_repo.list().await
    }

    pub async fn get(&self, id: i64) -> Result<Category, DomainError> {
        self.category_repo.find_by_id(id).await
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Category, DomainError> {
        self.category_repo.find_by_slug(slug).await
    }

    pub async fn create(&self, req: CreateCategoryRequest) -> Result<Category, DomainError> {
        Self::validate_name(&req.name)?;

        let slug = match req.slug {
            Some(slug) if !slug.trim().is_empty() => slug,
            _ => slugify(&req.name),
        };

        let category = self
            .category_repo
            .create(&req.name, &slug, req.description.as_deref())
            .await?;

        tracing::info!("Category created: id={}, slug={}", category.id, category.slug);
        Ok(category)
    }

    pub async fn update(
        &self,
        id: i64,
        req: UpdateCategoryRequest,
    ) -> Result<Category, DomainError> {
        if let Some(name) = &req.name {
            Self::validate_name(name)?;
        }

        // Renaming without an explicit slug re-derives it from the new name.
        let slug = match (&req.slug, &req.name) {
            (Some(slug), _) if !slug.trim().is_empty() => Some(slug.clone()),
            (_, Some(name)) => Some(slugify(name)),
            _ => None,
        };

        let category = self
            .category_repo
            .update(id, req.name.as_deref(), slug.as_deref(), req.description.as_deref())
            .await?;

        tracing::info!("Category updated: id={}", id);
        Ok(category)
    }

    /// Refused while any article still references the category.
    pub async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let in_use = self.category_repo.article_count(id).await?;
        if in_use > 0 {
            tracing::warn!("Refusing to delete category {}: {} articles", id, in_use);
            return Err(DomainError::CategoryInUse);
        }

        self.category_repo.delete(id).await?;
        tracing::info!("Category deleted: id={}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryCategories {
        categories: Mutex<Vec<Category>>,
        // category id -> number of referencing articles
        article_counts: Mutex<Vec<(i64, i64)>>,
    }

    #[async_trait]
    impl CategoryRepository for InMemoryCategories {
        async fn list(&self) -> Result<Vec<Category>, DomainError> {
            let mut items = self.categories.lock().unwrap().clone();
            items.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(items)
        }

        async fn find_by_id(&self, id: i64) -> Result<Category, DomainError> {
            self.categories
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.id == id)
                .cloned()
                .ok_or(DomainError::CategoryNotFound)
        }

        async fn find_by_slug(&self, slug: &str) -> Result<Category, DomainError> {
            self.categories
                .lock()
                .unwrap()
                .iter()
                .find(|c| c.slug == slug)
                .cloned()
                .ok_or(DomainError::CategoryNotFound)
        }

        async fn create(
            &self,
            name: &str,
            slug: &str,
            description: Option<&str>,
        ) -> Result<Category, DomainError> {
            let mut categories = self.categories.lock().unwrap();
            if categories.iter().any(|c| c.name == name) {
                return Err(DomainError::CategoryAlreadyExists);
            }
            let category = Category {
                id: categories.len() as i64 + 1,
                name: name.to_string(),
                slug: slug.to_string(),
                description: description.map(String::from),
                articles_count: None,
            };
            categories.push(category.clone());
            Ok(category)
        }

        async fn update(
            &self,
            id: i64,
            name: Option<&str>,
            slug: Option<&str>,
            description: Option<&str>,
        ) -> Result<Category, DomainError> {
            let mut categories = self.categories.lock().unwrap();
            let category = categories
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or(DomainError::CategoryNotFound)?;
            if let Some(name) = name {
                category.name = name.to_string();
            }
            if let Some(slug) = slug {
                category.slug = slug.to_string();
            }
            if let Some(description) = description {
                category.description = Some(description.to_string());
            }
            Ok(category.clone())
        }

        async fn article_count(&self, id: i64) -> Result<i64, DomainError> {
            Ok(self
                .article_counts
                .lock()
                .unwrap()
                .iter()
                .find(|(cid, _)| *cid == id)
                .map(|(_, n)| *n)
                .unwrap_or(0))
        }

        async fn delete(&self, id: i64) -> Result<(), DomainError> {
            let mut categories = self.categories.lock().unwrap();
            let before = categories.len();
            categories.retain(|c| c.id != id);
            if categories.len() == before {
                Err(DomainError::CategoryNotFound)
            } else {
                Ok(())
            }
        }
    }

    fn service() -> (CategoryService, Arc<InMemoryCategories>) {
        let repo = Arc::new(InMemoryCategories::default());
        (CategoryService::new(repo.clone()), repo)
    }

    fn create_req(name: &str) -> CreateCategoryRequest {
        CreateCategoryRequest {
            name: name.to_string(),
            slug: None,
            description: None,
        }
    }

    #[tokio::test]
    async fn create_derives_slug_when_absent() {
        let (svc, _) = service();
        let category = svc.create(create_req("Новости Москвы")).await.unwrap();
        assert_eq!(category.slug, "новости-москвы");
    }

    #[tokio::test]
    async fn create_keeps_explicit_slug() {
        let (svc, _) = service();
        let category = svc
            .create(CreateCategoryRequest {
                name: "News".to_string(),
                slug: Some("custom-slug".to_string()),
                description: None,
            })
            .await
            .unwrap();
        assert_eq!(category.slug, "custom-slug");
    }

    #[tokio::test]
    async fn empty_or_oversized_names_are_rejected() {
        let (svc, _) = service();

        assert!(matches!(
            svc.create(create_req("   ")).await.unwrap_err(),
            DomainError::ValidationError(_)
        ));
        assert!(matches!(
            svc.create(create_req(&"x".repeat(256))).await.unwrap_err(),
            DomainError::ValidationError(_)
        ));
    }

    #[tokio::test]
    async fn duplicate_names_conflict() {
        let (svc, _) = service();
        svc.create(create_req("News")).await.unwrap();
        assert!(matches!(
            svc.create(create_req("News")).await.unwrap_err(),
            DomainError::CategoryAlreadyExists
        ));
    }

    #[tokio::test]
    async fn delete_refused_while_articles_reference_it() {
        let (svc, repo) = service();
        svc.create(create_req("News")).await.unwrap();
        repo.article_counts.lock().unwrap().push((1, 2));

        assert!(matches!(
            svc.delete(1).await.unwrap_err(),
            DomainError::CategoryInUse
        ));

        repo.article_counts.lock().unwrap().clear();
        svc.delete(1).await.unwrap();
        assert!(svc.get(1).await.is_err());
    }

    #[tokio::test]
    async fn lookup_by_id() {
        let (svc, _) = service();
        let created = svc.create(create_req("News")).await.unwrap();

        let found = svc.get(created.id).await.unwrap();
        assert_eq!(found.slug, "news");
        assert!(matches!(
            svc.get(999).await.unwrap_err(),
            DomainError::CategoryNotFound
        ));
    }

    #[tokio::test]
    async fn lookup_by_slug() {
        let (svc, _) = service();
        svc.create(create_req("Новости Москвы")).await.unwrap();

        let found = svc.get_by_slug("новости-москвы").await.unwrap();
        assert_eq!(found.name, "Новости Москвы");
        assert!(matches!(
            svc.get_by_slug("missing").await.unwrap_err(),
            DomainError::CategoryNotFound
        ));
    }

    #[tokio::test]
    async fn rename_rederives_slug() {
        let (svc, _) = service();
        svc.create(create_req("Old Name")).await.unwrap();

        let updated = svc
            .update(
                1,
                UpdateCategoryRequest {
                    name: Some("New Name".to_string()),
                    slug: None,
                    description: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.slug, "new-name");
    }
}
