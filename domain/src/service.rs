use tracing::info;

use crate::validate::{validate_name, validate_price};
use crate::{
    CoreError, EventPublisher, NewProduct, Product, ProductEvent, ProductId, ProductIdGenerator,
    ProductRepository,
};

/// Application service orchestrating the product lifecycle.
///
/// Generic over repository, id generator, and event publisher. Validation and
/// existence checks live here; the repository itself stays a plain overwrite
/// store. The existence checks are read-then-write and not atomic, so two
/// concurrent creates of the same custom id can both succeed.
pub struct ProductService<R: ProductRepository, G: ProductIdGenerator, P: EventPublisher> {
    repo: R,
    ids: G,
    publisher: P,
}

impl<R: ProductRepository, G: ProductIdGenerator, P: EventPublisher> ProductService<R, G, P> {
    pub fn new(repo: R, ids: G, publisher: P) -> Self {
        Self {
            repo,
            ids,
            publisher,
        }
    }

    /// Fetch a product by id.
    pub fn get(&self, product_id: &ProductId) -> Result<Option<Product>, CoreError> {
        self.repo.get(product_id)
    }

    /// Create a new product.
    pub fn create(&self, input: NewProduct) -> Result<Product, CoreError> {
        validate_name(&input.name)?;
        validate_price(input.price)?;

        let product_id = match input.product_id {
            Some(custom) => {
                if self.repo.get(&custom)?.is_some() {
                    return Err(CoreError::AlreadyExists);
                }
                custom
            }
            None => self.ids.next_id()?,
        };

        let product = Product {
            product_id,
            name: input.name,
            price: input.price,
            price_brackets: input.price_brackets,
        };
        let product = self.repo.create(product)?;
        info!(product_id = %product.product_id, "product created");
        self.publisher.publish(&ProductEvent::Created(product.clone()))?;
        Ok(product)
    }

    /// Replace an existing product. Fails with `NotFound` when nothing is stored
    /// under the product's id.
    pub fn update(&self, product: Product) -> Result<Product, CoreError> {
        validate_name(&product.name)?;
        validate_price(product.price)?;
        if self.repo.get(&product.product_id)?.is_none() {
            return Err(CoreError::NotFound);
        }

        let product = self.repo.update(product)?;
        info!(product_id = %product.product_id, "product updated");
        self.publisher.publish(&ProductEvent::Updated(product.clone()))?;
        Ok(product)
    }

    /// Delete a product. Deleting an unknown id still succeeds.
    pub fn delete(&self, product_id: &ProductId) -> Result<bool, CoreError> {
        let deleted = self.repo.delete(product_id)?;
        info!(product_id = %product_id, "product deleted");
        self.publisher.publish(&ProductEvent::Deleted {
            product_id: product_id.clone(),
        })?;
        Ok(deleted)
    }
}
