//! Field-by-field marshalling between `Product` and its DynamoDB item.
//!
//! | Attribute       | Type | Value                              |
//! |-----------------|------|------------------------------------|
//! | `PK`            | S    | product id                         |
//! | `Type`          | S    | always `"Product"`                 |
//! | `Name`          | S    | product name                       |
//! | `Price`         | N    | price with exactly two decimals    |
//! | `ProductId`     | S    | product id (copy of `PK`)          |
//! | `PriceBrackets` | S    | JSON encoding of the price brackets|

use aws_sdk_dynamodb::types::AttributeValue;
use domain::{CoreError, PriceBrackets, Product, ProductId};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::store::Item;

pub const ATTR_PK: &str = "PK";
pub const ATTR_TYPE: &str = "Type";
pub const ATTR_NAME: &str = "Name";
pub const ATTR_PRICE: &str = "Price";
pub const ATTR_PRODUCT_ID: &str = "ProductId";
pub const ATTR_PRICE_BRACKETS: &str = "PriceBrackets";

/// Record kind tag written on every product item.
pub const RECORD_TYPE: &str = "Product";

/// Render a price the way it is stored: two fractional digits.
///
/// Rounds the exact binary value of `price`; an exact midpoint goes away from
/// zero (1.125 -> "1.13"), while 1.005, which is stored just below the
/// midpoint, gives "1.00". Values outside the decimal range fall back to the
/// float formatter.
pub fn format_price(price: f64) -> String {
    match Decimal::from_f64_retain(price) {
        Some(exact) => {
            let mut rounded =
                exact.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
            rounded.rescale(2);
            rounded.to_string()
        }
        None => format!("{:.2}", price),
    }
}

pub(crate) fn key_for(product_id: &ProductId) -> Item {
    let mut key = Item::new();
    key.insert(ATTR_PK.into(), AttributeValue::S(product_id.as_str().to_string()));
    key
}

pub(crate) fn product_to_item(product: &Product) -> Result<Item, CoreError> {
    let brackets = serde_json::to_string(&product.price_brackets)
        .map_err(|e| CoreError::Repository(format!("encode price brackets: {e}")))?;

    let mut m = key_for(&product.product_id);
    m.insert(ATTR_TYPE.into(), AttributeValue::S(RECORD_TYPE.into()));
    m.insert(ATTR_NAME.into(), AttributeValue::S(product.name.clone()));
    m.insert(ATTR_PRICE.into(), AttributeValue::N(format_price(product.price)));
    m.insert(
        ATTR_PRODUCT_ID.into(),
        AttributeValue::S(product.product_id.as_str().to_string()),
    );
    m.insert(ATTR_PRICE_BRACKETS.into(), AttributeValue::S(brackets));
    Ok(m)
}

pub(crate) fn item_to_product(item: &Item) -> Result<Product, CoreError> {
    let name = string_attr(item, ATTR_NAME)?.to_string();
    let price = number_attr(item, ATTR_PRICE)?;
    let price = price
        .parse::<f64>()
        .map_err(|e| CoreError::CorruptRecord(format!("bad {ATTR_PRICE} {price:?}: {e}")))?;
    let product_id = ProductId::new(string_attr(item, ATTR_PRODUCT_ID)?)
        .map_err(|e| CoreError::CorruptRecord(format!("bad {ATTR_PRODUCT_ID}: {e}")))?;
    let price_brackets: PriceBrackets = serde_json::from_str(string_attr(item, ATTR_PRICE_BRACKETS)?)
        .map_err(|e| CoreError::CorruptRecord(format!("bad {ATTR_PRICE_BRACKETS}: {e}")))?;

    Ok(Product {
        product_id,
        name,
        price,
        price_brackets,
    })
}

fn string_attr<'a>(item: &'a Item, name: &str) -> Result<&'a str, CoreError> {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .map(String::as_str)
        .ok_or_else(|| CoreError::CorruptRecord(format!("item missing {name}")))
}

fn number_attr<'a>(item: &'a Item, name: &str) -> Result<&'a str, CoreError> {
    item.get(name)
        .and_then(|v| v.as_n().ok())
        .map(String::as_str)
        .ok_or_else(|| CoreError::CorruptRecord(format!("item missing {name}")))
}
