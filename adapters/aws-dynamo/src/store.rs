//! The request/response contract the product repository needs from a
//! DynamoDB-shaped store, plus its implementation for the AWS SDK client.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::{types::AttributeValue, Client};
use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use thiserror::Error;

/// A single stored item: attribute name to typed value.
pub type Item = HashMap<String, AttributeValue>;

/// Failure reported by the store client.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The service answered with an error code (throttling, permissions, missing table, ...).
    #[error("{code}: {message}")]
    Service { code: String, message: String },
    /// The request never got a service answer (network, credentials, timeouts).
    #[error("transport: {0}")]
    Transport(String),
}

impl StoreError {
    pub fn code(&self) -> Option<&str> {
        match self {
            StoreError::Service { code, .. } => Some(code),
            StoreError::Transport(_) => None,
        }
    }

    fn from_sdk<E: ProvideErrorMetadata + std::fmt::Display>(e: E) -> Self {
        match e.code() {
            Some(code) => StoreError::Service {
                code: code.to_string(),
                message: e.message().unwrap_or_default().to_string(),
            },
            None => StoreError::Transport(e.to_string()),
        }
    }
}

/// Keyed single-item operations against one table.
///
/// Each method is exactly one round trip to the store.
#[async_trait]
pub trait ItemStore: Send + Sync {
    async fn get_record(&self, table: &str, key: Item) -> Result<Option<Item>, StoreError>;
    async fn put_record(&self, table: &str, item: Item) -> Result<(), StoreError>;
    async fn delete_record(&self, table: &str, key: Item) -> Result<(), StoreError>;
}

#[async_trait]
impl ItemStore for Client {
    async fn get_record(&self, table: &str, key: Item) -> Result<Option<Item>, StoreError> {
        let out = self
            .get_item()
            .table_name(table)
            .set_key(Some(key))
            .send()
            .await
            .map_err(StoreError::from_sdk)?;
        Ok(out.item().cloned())
    }

    async fn put_record(&self, table: &str, item: Item) -> Result<(), StoreError> {
        self.put_item()
            .table_name(table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(StoreError::from_sdk)?;
        Ok(())
    }

    async fn delete_record(&self, table: &str, key: Item) -> Result<(), StoreError> {
        self.delete_item()
            .table_name(table)
            .set_key(Some(key))
            .send()
            .await
            .map_err(StoreError::from_sdk)?;
        Ok(())
    }
}
