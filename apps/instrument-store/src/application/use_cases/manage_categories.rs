//! Manage Categories Use Case

use std::sync::Arc;

use tracing::info;

use crate::application::dto::{CategoryDto, CategoryRequestDto};
use crate::application::ports::{Store, StoreTx};
use crate::domain::catalog::Category;
use crate::domain::shared::CategoryId;
use crate::error::ServiceError;

fn category_not_found(id: &CategoryId) -> ServiceError {
    ServiceError::not_found(format!("Category not found: {id}"))
}

/// Use case for instrument categories. Names are unique.
pub struct ManageCategoriesUseCase<S>
where
    S: Store,
{
    store: Arc<S>,
}

impl<S> ManageCategoriesUseCase<S>
where
    S: Store,
{
    /// Create a new `ManageCategoriesUseCase`.
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// All categories ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `Internal` on store failure.
    pub async fn list(&self) -> Result<Vec<CategoryDto>, ServiceError> {
        let mut tx = self.store.read().await?;
        Ok(tx.categories().await?.iter().map(CategoryDto::from).collect())
    }

    /// One category.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown category.
    pub async fn get(&self, id: &CategoryId) -> Result<CategoryDto, ServiceError> {
        let mut tx = self.store.read().await?;
        tx.category(id)
            .await?
            .map(|category| CategoryDto::from(&category))
            .ok_or_else(|| category_not_found(id))
    }

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a blank or taken name.
    pub async fn create(&self, request: CategoryRequestDto) -> Result<CategoryDto, ServiceError> {
        let category = Category::create(CategoryId::generate(), &request.name)?;

        let mut tx = self.store.begin().await?;
        ensure_name_free(&mut tx, category.name(), None).await?;
        tx.insert_category(&category).await?;
        tx.commit().await?;

        info!(category_id = %category.id(), name = category.name(), "Category created");
        Ok(CategoryDto::from(&category))
    }

    /// Rename a category.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown category
    /// - `Validation` for a blank name or one used by another category
    pub async fn rename(
        &self,
        id: &CategoryId,
        request: CategoryRequestDto,
    ) -> Result<CategoryDto, ServiceError> {
        let mut tx = self.store.begin().await?;
        let mut category = tx
            .category(id)
            .await?
            .ok_or_else(|| category_not_found(id))?;
        category.rename(&request.name)?;
        ensure_name_free(&mut tx, category.name(), Some(id)).await?;
        tx.update_category(&category).await?;
        tx.commit().await?;

        info!(category_id = %id, name = category.name(), "Category renamed");
        Ok(CategoryDto::from(&category))
    }

    /// Delete a category that no instrument belongs to.
    ///
    /// # Errors
    ///
    /// - `NotFound` for an unknown category
    /// - `Validation` while instruments still reference it
    pub async fn delete(&self, id: &CategoryId) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        if tx.category(id).await?.is_none() {
            return Err(category_not_found(id));
        }
        if tx.category_in_use(id).await? {
            return Err(ServiceError::validation(
                "Category has instruments and cannot be deleted",
            ));
        }
        tx.delete_category(id).await?;
        tx.commit().await?;

        info!(category_id = %id, "Category deleted");
        Ok(())
    }
}

async fn ensure_name_free<T: StoreTx>(
    tx: &mut T,
    name: &str,
    owner: Option<&CategoryId>,
) -> Result<(), ServiceError> {
    match tx.category_by_name(name).await? {
        Some(existing) if Some(existing.id()) != owner => Err(ServiceError::validation(format!(
            "Category already exists: {name}"
        ))),
        _ => Ok(()),
    }
}
