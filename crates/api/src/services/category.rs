use common::{CategoryId, Page, PageRequest};
use domain::{Category, NewCategory};
use store::{CategoryRepository, Store, UnitOfWork};

use super::{Result, ServiceError};

/// Service for managing catalog categories.
#[derive(Clone)]
pub struct CategoryService<S: Store> {
    store: S,
}

impl<S: Store> CategoryService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    #[tracing::instrument(skip(self))]
    pub async fn insert(&self, category: NewCategory) -> Result<Category> {
        let mut uow = self.store.begin().await?;
        let category = uow.insert_category(&category).await?;
        uow.commit().await?;

        metrics::counter!("categories_created_total").increment(1);
        tracing::info!(category_id = %category.id, "category created");
        Ok(category)
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_page(&self, page: PageRequest) -> Result<Page<Category>> {
        let mut uow = self.store.begin().await?;
        let categories = uow.list_categories(page).await?;
        uow.commit().await?;
        Ok(categories)
    }

    #[tracing::instrument(skip(self))]
    pub async fn find_by_id(&self, id: CategoryId) -> Result<Category> {
        let mut uow = self.store.begin().await?;
        let category = uow
            .find_category(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id))?;
        uow.commit().await?;
        Ok(category)
    }

    /// Renames the category.
    #[tracing::instrument(skip(self))]
    pub async fn update(&self, id: CategoryId, changes: NewCategory) -> Result<Category> {
        let mut uow = self.store.begin().await?;
        let mut category = uow
            .find_category(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id))?;
        category.apply(changes);
        uow.update_category(&category).await?;
        uow.commit().await?;

        tracing::info!(category_id = %id, "category updated");
        Ok(category)
    }

    /// Fails with a conflict while products are still filed under the
    /// category.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: CategoryId) -> Result<()> {
        let mut uow = self.store.begin().await?;
        uow.delete_category(id).await?;
        uow.commit().await?;

        tracing::info!(category_id = %id, "category deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use store::{InMemoryStore, StoreError};

    use super::*;

    fn service() -> CategoryService<InMemoryStore> {
        CategoryService::new(InMemoryStore::new())
    }

    #[tokio::test]
    async fn insert_then_find() {
        let service = service();
        let created = service
            .insert(NewCategory::new("Informática"))
            .await
            .unwrap();

        let found = service.find_by_id(created.id).await.unwrap();
        assert_eq!(found.name, "Informática");
    }

    #[tokio::test]
    async fn missing_category_is_not_found() {
        let result = service().find_by_id(CategoryId::new(9)).await;
        assert!(matches!(
            result,
            Err(ServiceError::NotFound {
                entity: "Category",
                id: 9
            })
        ));
    }

    #[tokio::test]
    async fn update_renames() {
        let service = service();
        let created = service.insert(NewCategory::new("Escritorio")).await.unwrap();

        service
            .update(created.id, NewCategory::new("Escritório"))
            .await
            .unwrap();

        let found = service.find_by_id(created.id).await.unwrap();
        assert_eq!(found.name, "Escritório");
    }

    #[tokio::test]
    async fn delete_of_missing_category_is_not_found() {
        let result = service().delete(CategoryId::new(3)).await;
        assert!(matches!(result, Err(ServiceError::NotFound { .. })));
    }

    #[tokio::test]
    async fn delete_of_referenced_category_conflicts() {
        let store = InMemoryStore::new();
        store::seed_reference_data(&store).await.unwrap();
        let service = CategoryService::new(store);

        let result = service.delete(CategoryId::new(1)).await;
        assert!(matches!(
            result,
            Err(ServiceError::Store(StoreError::Conflict(_)))
        ));
        assert!(service.find_by_id(CategoryId::new(1)).await.is_ok());
    }
}
