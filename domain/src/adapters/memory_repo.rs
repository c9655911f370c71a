use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::{CoreError, Product, ProductId, ProductRepository};

/// Simple in-memory repository for tests. Not thread-safe for high concurrency
/// beyond the internal mutex guarding the map.
///
/// Mirrors the DynamoDB adapter: `create` and `update` overwrite, `delete`
/// succeeds whether or not the key was present.
pub struct InMemoryProductRepo {
    inner: Mutex<BTreeMap<String, Product>>,
}

impl InMemoryProductRepo {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(BTreeMap::new()),
        }
    }

    /// Number of stored products.
    pub fn len(&self) -> usize {
        self.inner.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(id: &ProductId) -> String {
        id.as_str().to_string()
    }

    fn put(&self, product: Product) -> Result<Product, CoreError> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        map.insert(Self::key(&product.product_id), product.clone());
        Ok(product)
    }
}

impl Default for InMemoryProductRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductRepository for InMemoryProductRepo {
    fn get(&self, product_id: &ProductId) -> Result<Option<Product>, CoreError> {
        let map = self
            .inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        Ok(map.get(&Self::key(product_id)).cloned())
    }

    fn create(&self, product: Product) -> Result<Product, CoreError> {
        self.put(product)
    }

    fn update(&self, product: Product) -> Result<Product, CoreError> {
        self.put(product)
    }

    fn delete(&self, product_id: &ProductId) -> Result<bool, CoreError> {
        let mut map = self
            .inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))?;
        map.remove(&Self::key(product_id));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, name: &str, price: f64) -> Product {
        Product::new(ProductId::new(id).unwrap(), name, price)
    }

    #[test]
    fn create_then_get() {
        let repo = InMemoryProductRepo::new();
        let p = product("p1", "Widget", 9.5);
        repo.create(p.clone()).unwrap();
        assert_eq!(repo.get(&p.product_id).unwrap(), Some(p));
    }

    #[test]
    fn create_overwrites_existing_key() {
        let repo = InMemoryProductRepo::new();
        repo.create(product("p1", "First", 1.0)).unwrap();
        repo.create(product("p1", "Second", 2.0)).unwrap();

        let got = repo.get(&ProductId::new("p1").unwrap()).unwrap().unwrap();
        assert_eq!(got.name, "Second");
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn update_of_missing_key_inserts() {
        let repo = InMemoryProductRepo::new();
        repo.update(product("p2", "Gadget", 3.0)).unwrap();
        assert!(repo.get(&ProductId::new("p2").unwrap()).unwrap().is_some());
    }

    #[test]
    fn delete_is_absence_tolerant() {
        let repo = InMemoryProductRepo::new();
        let id = ProductId::new("missing").unwrap();
        assert!(repo.delete(&id).unwrap());

        repo.create(product("p3", "Thing", 4.0)).unwrap();
        let id = ProductId::new("p3").unwrap();
        assert!(repo.delete(&id).unwrap());
        assert!(repo.get(&id).unwrap().is_none());
        assert!(repo.is_empty());
    }
}
