use std::borrow::Cow;
use serde::{Deserialize, Serialize};
use crate::engine::CollectionStore;
use crate::models::Product;
use crate::{Error, FieldValue, Record, Result};

/// Orders with a subtotal above this ship free.
pub const FREE_SHIPPING_THRESHOLD: f64 = 50.0;
pub const FLAT_SHIPPING: f64 = 5.99;
pub const TAX_RATE: f64 = 0.08;

/// One product in the cart with its quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: u64,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

impl From<&Product> for CartLine {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            price: product.price,
            quantity: 1,
        }
    }
}

impl Record for CartLine {
    type Id = u64;

    fn id(&self) -> &u64 {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match name {
            "id" => FieldValue::Number(self.id as f64),
            "name" => FieldValue::Text(Cow::Borrowed(&self.name)),
            "price" => FieldValue::Number(self.price),
            "quantity" => FieldValue::Number(f64::from(self.quantity)),
            "total" => FieldValue::Number(self.line_total()),
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CartTotals {
    pub subtotal: f64,
    pub shipping: f64,
    pub tax: f64,
    pub total: f64,
}

impl CartTotals {
    /// An empty cart costs nothing, shipping included. The storefront page
    /// charged flat shipping on any subtotal up to the threshold, zero too.
    pub fn for_subtotal(subtotal: f64) -> Self {
        let shipping = if subtotal <= 0.0 || subtotal > FREE_SHIPPING_THRESHOLD {
            0.0
        } else {
            FLAT_SHIPPING
        };
        let tax = subtotal * TAX_RATE;
        Self {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }
}

impl CollectionStore<CartLine> {
    /// Adds one unit of `product`, creating the line if needed.
    pub fn add_product(&mut self, product: &Product) -> Result<&CartLine> {
        if self.contains(&product.id) {
            return self.update(&product.id, |line| line.quantity = line.quantity.saturating_add(1));
        }
        self.add(CartLine::from(product))
    }

    /// Sets the quantity of a line. Zero or less removes it and returns `None`.
    pub fn set_quantity(&mut self, id: u64, quantity: i64) -> Result<Option<&CartLine>> {
        if !self.contains(&id) {
            return Err(Error::NotFound(id.to_string()));
        }
        if quantity <= 0 {
            self.remove(&id);
            return Ok(None);
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        self.update(&id, |line| line.quantity = quantity).map(Some)
    }

    /// Adjusts a quantity by `delta`, as the +/- buttons do.
    pub fn change_quantity(&mut self, id: u64, delta: i64) -> Result<Option<&CartLine>> {
        let current = self.get(&id).ok_or_else(|| Error::NotFound(id.to_string()))?.quantity;
        self.set_quantity(id, i64::from(current) + delta)
    }

    /// Total number of units, for the cart badge.
    pub fn item_count(&self) -> u64 {
        self.items().iter().map(|line| u64::from(line.quantity)).sum()
    }

    pub fn totals(&self) -> CartTotals {
        CartTotals::for_subtotal(self.sum_by(CartLine::line_total))
    }
}
