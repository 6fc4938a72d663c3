// src/domain/catalog.rs
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::errors::{AppError, AppResult};

/// Longest product name that still fits a Telegram callback payload (64 bytes)
/// once prefixed with `add:`.
const MAX_NAME_BYTES: usize = 60;

/// A menu item. Prices are in the minor currency unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub price: u64,
}

impl Product {
    pub fn new(name: &str, price: u64) -> Self {
        Self {
            name: name.to_string(),
            price,
        }
    }
}

/// Static price list, in menu order. Never mutated after startup.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> AppResult<Self> {
        if products.is_empty() {
            return Err(AppError::Config("Catalog has no products".to_string()));
        }

        let mut seen = HashSet::new();
        for product in &products {
            let name = product.name.trim();
            if name.is_empty() || name != product.name {
                return Err(AppError::Config(format!(
                    "Invalid product name: {:?}",
                    product.name
                )));
            }
            if product.name.len() > MAX_NAME_BYTES {
                return Err(AppError::Config(format!(
                    "Product name too long: {}",
                    product.name
                )));
            }
            if product.price == 0 {
                return Err(AppError::Config(format!(
                    "Product {} must have a positive price",
                    product.name
                )));
            }
            if !seen.insert(product.name.to_lowercase()) {
                return Err(AppError::Config(format!(
                    "Duplicate product: {}",
                    product.name
                )));
            }
        }

        Ok(Self { products })
    }

    /// Exact lookup, used for menu buttons.
    pub fn get(&self, name: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.name == name)
    }

    /// Lenient lookup for typed product names.
    pub fn find(&self, text: &str) -> Option<&Product> {
        let wanted = text.trim().to_lowercase();
        self.products
            .iter()
            .find(|p| p.name.to_lowercase() == wanted)
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            products: vec![
                Product::new("Burger", 25000),
                Product::new("Cheeseburger", 30000),
                Product::new("Lavash", 28000),
                Product::new("Hot Dog", 15000),
                Product::new("Fries", 12000),
                Product::new("Cola", 10000),
            ],
        }
    }
}
