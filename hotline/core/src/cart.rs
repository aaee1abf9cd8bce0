//! Shopping Cart
//!
//! In-memory cart for the shop screen. Lines keep insertion order.

use serde::{Deserialize, Serialize};

use crate::api::Product;

/// One cart line
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    /// The product
    pub product: Product,
    /// Quantity, always at least 1
    pub quantity: u32,
}

impl CartItem {
    /// Price times quantity
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.product.price * f64::from(self.quantity)
    }
}

/// Shopping cart
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Empty cart
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit, merging into an existing line for the same product
    pub fn add(&mut self, product: &Product) {
        if let Some(item) = self.items.iter_mut().find(|i| i.product.id == product.id) {
            item.quantity += 1;
        } else {
            self.items.push(CartItem {
                product: product.clone(),
                quantity: 1,
            });
        }
        tracing::debug!(product_id = %product.id, "Added to cart");
    }

    /// Remove one unit; the line is dropped when it reaches zero
    ///
    /// Unknown ids are ignored.
    pub fn remove(&mut self, product_id: &str) {
        let Some(index) = self.items.iter().position(|i| i.product.id == product_id) else {
            return;
        };
        if self.items[index].quantity > 1 {
            self.items[index].quantity -= 1;
        } else {
            self.items.remove(index);
        }
    }

    /// Empty the cart
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of all line subtotals
    #[must_use]
    pub fn total(&self) -> f64 {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    /// Total number of units
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Cart lines
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
