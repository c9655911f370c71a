//! product-cli — operator CLI for the product table.
//!
//! Runs get/create/update/delete through `ProductService` against either the
//! DynamoDB adapter (default) or the in-memory repository. Products are printed
//! to stdout as JSON; logs go to stderr.
//!
//! Run:
//! ```bash
//! TABLE_NAME=Products cargo run -p product-cli -- create --name Widget --price 9.5 --bracket 10=8
//! TABLE_NAME=Products cargo run -p product-cli -- get <product-id>
//!
//! # no AWS access; data only lives for the duration of one command
//! STORAGE_PROVIDER=memory cargo run -p product-cli -- create --name Widget --price 9.5
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.

mod config;

use std::error::Error;
use std::process;

use clap::{Parser, Subcommand};
use domain::adapters::memory_repo::InMemoryProductRepo;
use domain::service::ProductService;
use domain::{
    CoreError, EventPublisher, NewProduct, PriceBrackets, Product, ProductEvent, ProductId,
    ProductIdGenerator, ProductRepository,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Config, LogFormat, StorageProvider};

#[derive(Parser, Debug)]
#[command(name = "product-cli", version, about = "Manage records in the product table")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a product as JSON
    Get { product_id: String },
    /// Create a product; the id is generated unless --id is given
    Create {
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: f64,
        /// Price bracket as QUANTITY=PRICE; repeatable
        #[arg(long = "bracket", value_parser = parse_bracket)]
        brackets: Vec<(String, f64)>,
    },
    /// Replace an existing product
    Update {
        product_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: f64,
        /// Price bracket as QUANTITY=PRICE; repeatable
        #[arg(long = "bracket", value_parser = parse_bracket)]
        brackets: Vec<(String, f64)>,
    },
    /// Delete a product (succeeds for unknown ids)
    Delete { product_id: String },
}

fn parse_bracket(s: &str) -> Result<(String, f64), String> {
    let (quantity, price) = s
        .split_once('=')
        .ok_or_else(|| format!("expected QUANTITY=PRICE, got '{s}'"))?;
    let quantity = quantity.trim();
    if quantity.is_empty() {
        return Err("bracket quantity must not be empty".into());
    }
    let price = price
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid bracket price '{price}': {e}"))?;
    Ok((quantity.to_string(), price))
}

/// Random v4 UUIDs for products created without `--id`.
struct UuidIds;
impl ProductIdGenerator for UuidIds {
    fn next_id(&self) -> Result<ProductId, CoreError> {
        ProductId::new(uuid::Uuid::new_v4().to_string())
    }
}

/// Publishes product events to the log.
struct LogPublisher;
impl EventPublisher for LogPublisher {
    fn publish(&self, event: &ProductEvent) -> Result<(), CoreError> {
        info!(event = event.kind(), product_id = %event.product_id(), "product event");
        Ok(())
    }
}

fn main() {
    let cli = Cli::parse();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    init_tracing(&cfg);
    cfg.warn_if_ephemeral();

    if let Err(e) = dispatch(&cfg, cli.command) {
        tracing::error!(error = %e, "command failed");
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn init_tracing(cfg: &Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        LogFormat::Pretty => {
            registry
                .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
                .init();
        }
    }
}

fn dispatch(cfg: &Config, command: Command) -> Result<(), Box<dyn Error>> {
    let output = match cfg.storage_provider {
        StorageProvider::Memory => execute(&service(InMemoryProductRepo::new()), command)?,
        StorageProvider::Dynamo => dynamo_execute(cfg, command)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(feature = "dynamo")]
fn dynamo_execute(cfg: &Config, command: Command) -> Result<serde_json::Value, Box<dyn Error>> {
    use aws_dynamo::{DynamoConfig, DynamoProductRepo};

    let table = cfg.table_name.clone().unwrap_or_default();
    let repo = DynamoProductRepo::new(DynamoConfig::new(table)?)?;
    info!(table = repo.table_name(), "using dynamo storage");
    execute(&service(repo), command)
}

#[cfg(not(feature = "dynamo"))]
fn dynamo_execute(_cfg: &Config, _command: Command) -> Result<serde_json::Value, Box<dyn Error>> {
    Err("STORAGE_PROVIDER=dynamo requires building with the `dynamo` feature".into())
}

fn service<R: ProductRepository>(repo: R) -> ProductService<R, UuidIds, LogPublisher> {
    ProductService::new(repo, UuidIds, LogPublisher)
}

fn execute<R, G, P>(
    svc: &ProductService<R, G, P>,
    command: Command,
) -> Result<serde_json::Value, Box<dyn Error>>
where
    R: ProductRepository,
    G: ProductIdGenerator,
    P: EventPublisher,
{
    let value = match command {
        Command::Get { product_id } => {
            let id = ProductId::new(product_id)?;
            let product = svc.get(&id)?.ok_or(CoreError::NotFound)?;
            serde_json::to_value(product)?
        }
        Command::Create {
            id,
            name,
            price,
            brackets,
        } => {
            let product_id = id.map(ProductId::new).transpose()?;
            let created = svc.create(NewProduct {
                name,
                price,
                price_brackets: brackets.into_iter().collect(),
                product_id,
            })?;
            serde_json::to_value(created)?
        }
        Command::Update {
            product_id,
            name,
            price,
            brackets,
        } => {
            let product = Product {
                product_id: ProductId::new(product_id)?,
                name,
                price,
                price_brackets: brackets.into_iter().collect::<PriceBrackets>(),
            };
            serde_json::to_value(svc.update(product)?)?
        }
        Command::Delete { product_id } => {
            let id = ProductId::new(product_id)?;
            let deleted = svc.delete(&id)?;
            serde_json::json!({ "productId": id, "deleted": deleted })
        }
    };
    Ok(value)
}
