//! Product catalog: admin creation and public search.

use common::{NewProduct, Product, ProductId};
use store::ProductStore;

use crate::error::DomainError;

/// Service for the product catalog.
pub struct CatalogService<S> {
    store: S,
}

impl<S: ProductStore> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Validates and inserts a new, active product.
    #[tracing::instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create_product(&self, mut product: NewProduct) -> Result<Product, DomainError> {
        product.name = product.name.trim().to_string();
        if product.name.is_empty() {
            return Err(DomainError::InvalidInput(
                "product name must not be empty".to_string(),
            ));
        }
        if !product.price.is_positive() {
            return Err(DomainError::InvalidInput(
                "product price must be greater than 0".to_string(),
            ));
        }

        let product = self.store.create_product(product).await?;
        tracing::info!(product_id = %product.id, inventory = product.inventory, "product created");
        Ok(product)
    }

    /// Lists active products. A blank query lists everything.
    #[tracing::instrument(skip(self))]
    pub async fn list_products(&self, query: Option<&str>) -> Result<Vec<Product>, DomainError> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        Ok(self.store.list_products(query).await?)
    }

    /// Loads a product, inactive ones included.
    pub async fn get_product(&self, product_id: ProductId) -> Result<Option<Product>, DomainError> {
        Ok(self.store.find_product(product_id).await?)
    }
}
