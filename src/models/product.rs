use std::borrow::Cow;
use serde::{Deserialize, Serialize};
use crate::{FieldValue, Record};

/// Text fields the product search box looks at.
pub const SEARCH_FIELDS: [&str; 2] = ["name", "description"];

/// Products shown per page in the listing.
pub const PAGE_SIZE: usize = 12;

/// A catalog entry in the product listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub price: f64,
    pub rating: f64,
    #[serde(default)]
    pub reviews: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default = "in_stock_default")]
    pub in_stock: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
}

fn in_stock_default() -> bool {
    true
}

impl Product {
    pub fn new(id: u64, name: &str, brand: &str, category: &str, price: f64, rating: f64) -> Self {
        Self {
            id,
            name: name.to_string(),
            brand: brand.to_string(),
            category: category.to_string(),
            price,
            rating,
            reviews: 0,
            description: String::new(),
            in_stock: true,
            badge: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_reviews(mut self, reviews: u32) -> Self {
        self.reviews = reviews;
        self
    }

    pub fn with_badge(mut self, badge: &str) -> Self {
        self.badge = Some(badge.to_string());
        self
    }

    pub fn out_of_stock(mut self) -> Self {
        self.in_stock = false;
        self
    }
}

impl Record for Product {
    type Id = u64;

    fn id(&self) -> &u64 {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        Some(match name {
            "id" => FieldValue::Number(self.id as f64),
            "name" => FieldValue::Text(Cow::Borrowed(&self.name)),
            "brand" => FieldValue::Text(Cow::Borrowed(&self.brand)),
            "category" => FieldValue::Text(Cow::Borrowed(&self.category)),
            "description" => FieldValue::Text(Cow::Borrowed(&self.description)),
            "badge" => FieldValue::Text(Cow::Borrowed(self.badge.as_deref()?)),
            "price" => FieldValue::Number(self.price),
            "rating" => FieldValue::Number(self.rating),
            "reviews" => FieldValue::Number(f64::from(self.reviews)),
            "inStock" => FieldValue::Bool(self.in_stock),
            _ => return None,
        })
    }
}

/// The twelve-product electronics catalog used to seed an empty listing.
pub fn sample_catalog() -> Vec<Product> {
    vec![
        Product::new(1, "MacBook Pro 13-inch", "Apple", "laptops", 1299.0, 4.8)
            .with_reviews(245)
            .with_description("Powerful laptop with M2 chip, perfect for professionals.")
            .with_badge("New"),
        Product::new(2, "iPhone 15 Pro", "Apple", "smartphones", 999.0, 4.9)
            .with_reviews(189)
            .with_description("Latest iPhone with advanced camera system and A17 Pro chip.")
            .with_badge("Popular"),
        Product::new(3, "Samsung Galaxy S24", "Samsung", "smartphones", 899.0, 4.7)
            .with_reviews(156)
            .with_description("Android flagship with AI features and excellent camera."),
        Product::new(4, "Dell XPS 15", "Dell", "laptops", 1499.0, 4.6)
            .with_reviews(98)
            .with_description("Premium Windows laptop with stunning display."),
        Product::new(5, "iPad Air", "Apple", "tablets", 599.0, 4.8)
            .with_reviews(203)
            .with_description("Versatile tablet perfect for work and entertainment."),
        Product::new(6, "Sony WH-1000XM5", "Sony", "accessories", 349.0, 4.9)
            .with_reviews(312)
            .with_description("Premium noise-canceling headphones with exceptional sound.")
            .with_badge("Best Seller"),
        Product::new(7, "PlayStation 5", "Sony", "gaming", 499.0, 4.7)
            .with_reviews(445)
            .with_description("Next-generation gaming console with stunning graphics.")
            .out_of_stock(),
        Product::new(8, "HP Spectre x360", "HP", "laptops", 1199.0, 4.5)
            .with_reviews(87)
            .with_description("Convertible laptop with 2-in-1 design."),
        Product::new(9, "Samsung Galaxy Tab S9", "Samsung", "tablets", 699.0, 4.6)
            .with_reviews(134)
            .with_description("Premium Android tablet with S Pen support."),
        Product::new(10, "Microsoft Surface Pro 9", "Microsoft", "tablets", 999.0, 4.4)
            .with_reviews(76)
            .with_description("Versatile 2-in-1 device perfect for productivity."),
        Product::new(11, "Lenovo ThinkPad X1", "Lenovo", "laptops", 1599.0, 4.8)
            .with_reviews(123)
            .with_description("Business laptop with exceptional build quality."),
        Product::new(12, "AirPods Pro", "Apple", "accessories", 249.0, 4.7)
            .with_reviews(567)
            .with_description("Wireless earbuds with active noise cancellation."),
    ]
}
