//! DynamoDB adapter implementing the `ProductRepository` port.
//!
//! - Stores products in a single table with string partition key `PK`; see
//!   [`mapping`] for the item layout.
//! - Every repository call is exactly one `GetItem`, `PutItem` or `DeleteItem`.
//!   `create` and `update` are unconditional puts; `delete` succeeds whether or
//!   not the item existed. Nothing is retried.
//! - The table name is explicit configuration ([`DynamoConfig`]); `from_env()`
//!   wiring reads `TABLE_NAME`.
//!
//! Notes:
//! - The domain `ProductRepository` trait is synchronous. We bridge to the async
//!   store client using an internal `tokio::runtime::Runtime` and `block_on`,
//!   or `block_in_place` when already inside a multi-thread runtime.

pub mod mapping;
pub mod store;

use std::sync::Arc;

use aws_sdk_dynamodb::Client;
use domain::{CoreError, Product, ProductId, ProductRepository};
use tokio::runtime::RuntimeFlavor;
use tracing::{debug, warn};

use crate::mapping::{item_to_product, key_for, product_to_item};
pub use crate::store::{Item, ItemStore, StoreError};

/// Environment variable holding the product table name.
pub const TABLE_NAME_VAR: &str = "TABLE_NAME";

/// Configuration for the product table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DynamoConfig {
    pub table_name: String,
}

impl DynamoConfig {
    /// Create with an explicit table name.
    pub fn new(table_name: impl Into<String>) -> Result<Self, CoreError> {
        let table_name = table_name.into();
        if table_name.trim().is_empty() {
            return Err(CoreError::Repository(format!("missing {TABLE_NAME_VAR}")));
        }
        Ok(Self { table_name })
    }

    /// Build from the `TABLE_NAME` environment variable.
    pub fn from_env() -> Result<Self, CoreError> {
        let table_name = std::env::var(TABLE_NAME_VAR)
            .map_err(|_| CoreError::Repository(format!("missing {TABLE_NAME_VAR}")))?;
        Self::new(table_name)
    }
}

/// Product repository backed by AWS DynamoDB, or any other [`ItemStore`].
///
/// Supports both standalone mode (creates its own Tokio runtime) and embedded
/// mode (reuses the caller's multi-thread runtime via `Handle::current()`).
#[derive(Clone)]
pub struct DynamoProductRepo<S: ItemStore = Client> {
    table: String,
    store: S,
    // Optional runtime - None when constructed inside an existing runtime
    rt: Option<Arc<tokio::runtime::Runtime>>,
}

impl DynamoProductRepo<Client> {
    /// Construct with a default AWS SDK client using the standard provider chain.
    pub fn new(config: DynamoConfig) -> Result<Self, CoreError> {
        let rt = maybe_create_runtime()?;
        let conf = block_on_with_rt(
            &rt,
            aws_config::load_defaults(aws_config::BehaviorVersion::latest()),
        );
        let client = Client::new(&conf);
        Ok(Self {
            table: config.table_name,
            store: client,
            rt,
        })
    }

    /// Construct from `TABLE_NAME` and the default AWS SDK client.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::new(DynamoConfig::from_env()?)
    }
}

impl<S: ItemStore> DynamoProductRepo<S> {
    /// Create a repo over an explicit store client.
    pub fn with_store(config: DynamoConfig, store: S) -> Result<Self, CoreError> {
        let rt = maybe_create_runtime()?;
        Ok(Self {
            table: config.table_name,
            store,
            rt,
        })
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Run an async future, using either our owned runtime or the current runtime.
    fn block_on<F: std::future::Future>(&self, fut: F) -> F::Output {
        block_on_with_rt(&self.rt, fut)
    }

    fn put(&self, product: Product) -> Result<Product, CoreError> {
        let item = product_to_item(&product)?;
        debug!(table = %self.table, product_id = %product.product_id, "put_item");
        let fut = async { self.store.put_record(&self.table, item).await };
        self.block_on(fut).map_err(|e| map_store_err(&self.table, e))?;
        Ok(product)
    }
}

impl<S: ItemStore> ProductRepository for DynamoProductRepo<S> {
    fn get(&self, product_id: &ProductId) -> Result<Option<Product>, CoreError> {
        debug!(table = %self.table, product_id = %product_id, "get_item");
        let fut = async { self.store.get_record(&self.table, key_for(product_id)).await };
        let out = self.block_on(fut).map_err(|e| map_store_err(&self.table, e))?;
        match out {
            Some(item) => item_to_product(&item).map(Some).inspect_err(|e| {
                warn!(table = %self.table, product_id = %product_id, error = %e, "unreadable product item");
            }),
            None => Ok(None),
        }
    }

    fn create(&self, product: Product) -> Result<Product, CoreError> {
        self.put(product)
    }

    fn update(&self, product: Product) -> Result<Product, CoreError> {
        self.put(product)
    }

    fn delete(&self, product_id: &ProductId) -> Result<bool, CoreError> {
        debug!(table = %self.table, product_id = %product_id, "delete_item");
        let fut = async { self.store.delete_record(&self.table, key_for(product_id)).await };
        self.block_on(fut).map_err(|e| map_store_err(&self.table, e))?;
        Ok(true)
    }
}

/// Check if we're inside a Tokio runtime. If yes, return None (reuse existing).
/// If no, create a new runtime.
///
/// A current-thread runtime cannot host `block_in_place`, so construction
/// inside one is refused instead of panicking on the first call.
fn maybe_create_runtime() -> Result<Option<Arc<tokio::runtime::Runtime>>, CoreError> {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        if handle.runtime_flavor() == RuntimeFlavor::CurrentThread {
            return Err(CoreError::Repository(
                "current-thread tokio runtime is not supported; use a multi-thread runtime".into(),
            ));
        }
        Ok(None)
    } else {
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .map_err(|e| CoreError::Repository(format!("tokio runtime init: {e}")))?;
        Ok(Some(Arc::new(rt)))
    }
}

fn block_on_with_rt<F: std::future::Future>(
    rt: &Option<Arc<tokio::runtime::Runtime>>,
    fut: F,
) -> F::Output {
    match rt {
        Some(rt) => rt.block_on(fut),
        // Only reachable on a multi-thread runtime; see maybe_create_runtime.
        None => tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(fut)),
    }
}

fn map_store_err(table: &str, e: StoreError) -> CoreError {
    if e.code() == Some("ResourceNotFoundException") {
        return CoreError::Repository(format!("missing table {table}"));
    }
    CoreError::Repository(format!("dynamo error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{ATTR_NAME, ATTR_PRICE};
    use crate::store::memory::MemoryItemStore;
    use aws_sdk_dynamodb::types::AttributeValue;
    use domain::PriceBrackets;

    const TABLE: &str = "Products";

    fn repo() -> DynamoProductRepo<MemoryItemStore> {
        DynamoProductRepo::with_store(
            DynamoConfig::new(TABLE).unwrap(),
            MemoryItemStore::with_table(TABLE),
        )
        .unwrap()
    }

    fn id(s: &str) -> ProductId {
        ProductId::new(s).unwrap()
    }

    fn widget() -> Product {
        let brackets: PriceBrackets = [("10", 8.0)].into_iter().collect();
        Product::new(id("p1"), "Widget", 9.5).with_price_brackets(brackets)
    }

    #[test]
    fn create_then_get_returns_same_product() {
        let repo = repo();
        let created = repo.create(widget()).unwrap();
        assert_eq!(created, widget());

        let got = repo.get(&id("p1")).unwrap().expect("stored");
        assert_eq!(got.product_id.as_str(), "p1");
        assert_eq!(got.name, "Widget");
        assert_eq!(got.price, 9.5);
        assert_eq!(got.price_brackets.get("10"), Some(8.0));
        assert_eq!(got, widget());
    }

    #[test]
    fn get_missing_is_none() {
        let repo = repo();
        assert!(repo.get(&id("nope")).unwrap().is_none());
    }

    #[test]
    fn update_fully_replaces_record() {
        let repo = repo();
        repo.create(widget()).unwrap();

        let replacement = Product::new(id("p1"), "Widget Pro", 12.25);
        repo.update(replacement.clone()).unwrap();

        let got = repo.get(&id("p1")).unwrap().unwrap();
        assert_eq!(got, replacement);
        assert!(got.price_brackets.is_empty());
    }

    #[test]
    fn create_overwrites_existing_record() {
        let repo = repo();
        repo.create(widget()).unwrap();
        repo.create(Product::new(id("p1"), "Other", 1.0)).unwrap();
        assert_eq!(repo.get(&id("p1")).unwrap().unwrap().name, "Other");
    }

    #[test]
    fn delete_then_get_is_none_and_missing_delete_succeeds() {
        let repo = repo();
        repo.create(widget()).unwrap();
        assert!(repo.delete(&id("p1")).unwrap());
        assert!(repo.get(&id("p1")).unwrap().is_none());
        assert!(repo.delete(&id("never-existed")).unwrap());
    }

    #[test]
    fn price_is_stored_with_two_decimals() {
        let repo = repo();
        repo.create(Product::new(id("p2"), "Rounded", 19.999)).unwrap();

        let raw = repo.store.raw(TABLE, "p2").unwrap();
        assert_eq!(raw[ATTR_PRICE], AttributeValue::N("20.00".into()));
        assert_eq!(repo.get(&id("p2")).unwrap().unwrap().price, 20.0);

        repo.create(Product::new(id("p3"), "Midpoint", 1.125)).unwrap();
        let raw = repo.store.raw(TABLE, "p3").unwrap();
        assert_eq!(raw[ATTR_PRICE], AttributeValue::N("1.13".into()));
        assert_eq!(repo.get(&id("p3")).unwrap().unwrap().price, 1.13);
    }

    #[test]
    fn each_operation_is_one_store_call() {
        let repo = repo();
        repo.create(widget()).unwrap();
        assert_eq!(repo.store.calls(), 1);
        repo.get(&id("p1")).unwrap();
        assert_eq!(repo.store.calls(), 2);
        repo.update(widget()).unwrap();
        assert_eq!(repo.store.calls(), 3);
        repo.delete(&id("p1")).unwrap();
        assert_eq!(repo.store.calls(), 4);
    }

    #[test]
    fn corrupt_item_surfaces_as_error() {
        let repo = repo();
        let mut item = product_to_item(&widget()).unwrap();
        item.remove(ATTR_NAME);
        repo.store.insert_raw(TABLE, "p1", item);

        assert!(matches!(repo.get(&id("p1")), Err(CoreError::CorruptRecord(_))));
    }

    #[test]
    fn missing_table_fails_every_operation() {
        let repo = DynamoProductRepo::with_store(
            DynamoConfig::new("Absent").unwrap(),
            MemoryItemStore::with_table(TABLE),
        )
        .unwrap();

        let is_missing_table =
            |r: Result<(), CoreError>| matches!(r, Err(CoreError::Repository(ref m)) if m == "missing table Absent");
        assert!(is_missing_table(repo.get(&id("p1")).map(|_| ())));
        assert!(is_missing_table(repo.create(widget()).map(|_| ())));
        assert!(is_missing_table(repo.update(widget()).map(|_| ())));
        assert!(is_missing_table(repo.delete(&id("p1")).map(|_| ())));
    }

    #[test]
    fn other_store_errors_keep_code_and_message() {
        let err = map_store_err(
            TABLE,
            StoreError::Service {
                code: "AccessDeniedException".into(),
                message: "not allowed".into(),
            },
        );
        assert_eq!(
            err.to_string(),
            "repository error: dynamo error: AccessDeniedException: not allowed"
        );
    }

    #[test]
    fn config_rejects_blank_table_name() {
        assert!(DynamoConfig::new("").is_err());
        assert!(DynamoConfig::new("  ").is_err());
        assert_eq!(DynamoConfig::new("Products").unwrap().table_name, "Products");
    }

    #[tokio::test]
    async fn refuses_current_thread_runtime() {
        let built = DynamoProductRepo::with_store(
            DynamoConfig::new(TABLE).unwrap(),
            MemoryItemStore::with_table(TABLE),
        );
        assert!(matches!(built, Err(CoreError::Repository(ref m)) if m.contains("current-thread")));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn works_inside_existing_runtime() {
        let repo = repo();
        repo.create(widget()).unwrap();
        assert_eq!(repo.get(&id("p1")).unwrap(), Some(widget()));
    }
}
