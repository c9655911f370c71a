//! Domain library for the product store.
//!
//! Holds the product types, ports (traits), and error definitions. Keep
//! adapters and IO concerns out of this crate; the only dependencies are
//! `serde`/`serde_json` for the wire shape of products and `tracing` for
//! service logs.

use std::error::Error;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier of a product; doubles as the storage primary key.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductId(String);

impl ProductId {
    pub fn new<S: Into<String>>(s: S) -> Result<Self, CoreError> {
        let val = s.into();
        if val.trim().is_empty() {
            return Err(CoreError::InvalidProductId("empty".into()));
        }
        Ok(Self(val))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProductId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tiered pricing rules, kept as the client wrote them.
///
/// The usual shape is an object keyed by minimum quantity (`{"10": 8.0}`), but
/// storage treats the value as an opaque JSON blob: arrays of bracket objects
/// and integer prices round-trip untouched. The helpers below only read or
/// write the keyed shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceBrackets(Value);

impl Default for PriceBrackets {
    fn default() -> Self {
        Self(Value::Object(Map::new()))
    }
}

impl PriceBrackets {
    /// An empty keyed collection, `{}`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the price for a quantity. Any non-object value is replaced by an
    /// object first.
    pub fn insert<K: Into<String>>(&mut self, quantity: K, price: f64) {
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }
        if let Value::Object(map) = &mut self.0 {
            map.insert(quantity.into(), Value::from(price));
        }
    }

    /// Price for a quantity key, if the brackets are keyed and the entry is numeric.
    pub fn get(&self, quantity: &str) -> Option<f64> {
        self.0.get(quantity).and_then(Value::as_f64)
    }

    /// True for `{}`, `[]` and `null`.
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Value> for PriceBrackets {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for PriceBrackets {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self(Value::Object(
            iter.into_iter()
                .map(|(k, v)| (k.into(), Value::from(v)))
                .collect(),
        ))
    }
}

/// A stored product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: ProductId,
    pub name: String,
    /// Unit price. Persisted with two fractional digits.
    pub price: f64,
    #[serde(default)]
    pub price_brackets: PriceBrackets,
}

impl Product {
    /// Create a product without any price brackets.
    pub fn new(product_id: ProductId, name: impl Into<String>, price: f64) -> Self {
        Self {
            product_id,
            name: name.into(),
            price,
            price_brackets: PriceBrackets::new(),
        }
    }

    pub fn with_price_brackets(mut self, price_brackets: PriceBrackets) -> Self {
        self.price_brackets = price_brackets;
        self
    }
}

/// Input data for creating a new product.
#[derive(Clone, Debug, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub price: f64,
    pub price_brackets: PriceBrackets,
    /// Caller-chosen id; generated when absent.
    pub product_id: Option<ProductId>,
}

/// Notification emitted after a successful mutation.
#[derive(Clone, Debug, PartialEq)]
pub enum ProductEvent {
    Created(Product),
    Updated(Product),
    Deleted { product_id: ProductId },
}

impl ProductEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ProductEvent::Created(_) => "product_created",
            ProductEvent::Updated(_) => "product_updated",
            ProductEvent::Deleted { .. } => "product_deleted",
        }
    }

    pub fn product_id(&self) -> &ProductId {
        match self {
            ProductEvent::Created(p) | ProductEvent::Updated(p) => &p.product_id,
            ProductEvent::Deleted { product_id } => product_id,
        }
    }
}

/// Id generator interface for products created without a caller-chosen id.
pub trait ProductIdGenerator: Send + Sync {
    fn next_id(&self) -> Result<ProductId, CoreError>;
}

/// Repository port for persisting and loading products.
///
/// `create` and `update` are both full overwrites of the record at
/// `product.product_id`; neither checks for prior existence.
pub trait ProductRepository: Send + Sync {
    /// Point lookup. A missing record is `Ok(None)`, not an error.
    fn get(&self, product_id: &ProductId) -> Result<Option<Product>, CoreError>;
    fn create(&self, product: Product) -> Result<Product, CoreError>;
    fn update(&self, product: Product) -> Result<Product, CoreError>;
    /// Remove the record. Reports `true` even if nothing was stored.
    fn delete(&self, product_id: &ProductId) -> Result<bool, CoreError>;
}

/// Port for announcing product changes to interested parties.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: &ProductEvent) -> Result<(), CoreError>;
}

impl<P: EventPublisher + ?Sized> EventPublisher for &P {
    fn publish(&self, event: &ProductEvent) -> Result<(), CoreError> {
        (**self).publish(event)
    }
}

/// Core domain errors.
#[derive(Debug)]
pub enum CoreError {
    InvalidProductId(String),
    InvalidName,
    InvalidPrice(String),
    AlreadyExists,
    NotFound,
    /// A stored record is missing an attribute or holds an unparsable value.
    CorruptRecord(String),
    Repository(String),
    Publish(String),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::InvalidProductId(msg) => write!(f, "invalid product id: {}", msg),
            CoreError::InvalidName => write!(f, "invalid product name"),
            CoreError::InvalidPrice(msg) => write!(f, "invalid price: {}", msg),
            CoreError::AlreadyExists => write!(f, "resource already exists"),
            CoreError::NotFound => write!(f, "not found"),
            CoreError::CorruptRecord(msg) => write!(f, "corrupt record: {}", msg),
            CoreError::Repository(msg) => write!(f, "repository error: {}", msg),
            CoreError::Publish(msg) => write!(f, "publish error: {}", msg),
        }
    }
}

impl Error for CoreError {}

pub mod adapters;
pub mod service;
pub mod validate;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_id_accepts_simple_values() {
        let id = ProductId::new("p1").expect("valid id");
        assert_eq!(id.as_str(), "p1");
        assert_eq!(id.to_string(), "p1");
    }

    #[test]
    fn product_id_rejects_blank() {
        assert!(matches!(ProductId::new(""), Err(CoreError::InvalidProductId(_))));
        assert!(matches!(ProductId::new("   "), Err(CoreError::InvalidProductId(_))));
    }

    #[test]
    fn product_serializes_with_camel_case_keys() {
        let mut brackets = PriceBrackets::new();
        brackets.insert("10", 8.0);
        let product = Product::new(ProductId::new("p1").unwrap(), "Widget", 9.5)
            .with_price_brackets(brackets);

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "productId": "p1",
                "name": "Widget",
                "price": 9.5,
                "priceBrackets": {"10": 8.0}
            })
        );
    }

    #[test]
    fn product_deserialize_rejects_empty_id() {
        let err = serde_json::from_str::<Product>(r#"{"productId":"","name":"x","price":1.0}"#);
        assert!(err.is_err());
    }

    #[test]
    fn price_brackets_keep_insertion_order() {
        let brackets: PriceBrackets = [("50", 6.0), ("10", 8.0)].into_iter().collect();
        assert_eq!(serde_json::to_string(&brackets).unwrap(), r#"{"50":6.0,"10":8.0}"#);
        assert_eq!(brackets.get("50"), Some(6.0));
        assert!(!brackets.is_empty());
        assert!(PriceBrackets::new().is_empty());
    }

    #[test]
    fn price_brackets_keep_any_json_shape() {
        let raw = r#"[{"quantity":10,"price":8}]"#;
        let brackets: PriceBrackets = serde_json::from_str(raw).unwrap();
        assert_eq!(brackets.get("10"), None);
        assert!(!brackets.is_empty());
        assert_eq!(serde_json::to_string(&brackets).unwrap(), raw);

        let mut brackets = brackets;
        brackets.insert("10", 8.0);
        assert_eq!(brackets.as_value(), &serde_json::json!({"10": 8.0}));
    }

    #[test]
    fn event_accessors() {
        let id = ProductId::new("p9").unwrap();
        let ev = ProductEvent::Deleted { product_id: id.clone() };
        assert_eq!(ev.kind(), "product_deleted");
        assert_eq!(ev.product_id(), &id);
    }
}
