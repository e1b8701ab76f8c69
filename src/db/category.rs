use color_eyre::Result;

use super::models::Category;
use super::{new_id, Db, StoreError, Tx};

impl Db {
    pub async fn create_category(&self, name: &str) -> Result<Category> {
        if name.trim().is_empty() {
            return Err(StoreError::Invalid("category name cannot be empty".to_string()).into());
        }

        let category = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name) VALUES (?, ?) RETURNING id, name",
        )
        .bind(new_id())
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!("category created: id={}, name={name}", category.id);
        Ok(category)
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name FROM categories ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        Ok(categories)
    }

    pub async fn category(&self, category_id: &str) -> Result<Category> {
        sqlx::query_as::<_, Category>("SELECT id, name FROM categories WHERE id = ?")
            .bind(category_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::not_found("category", category_id).into())
    }

    pub(super) async fn ensure_category_tx(tx: &mut Tx<'_>, category_id: &str) -> Result<()> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?)")
            .bind(category_id)
            .fetch_one(&mut **tx)
            .await?;

        if !exists {
            return Err(StoreError::not_found("category", category_id).into());
        }
        Ok(())
    }
}
