use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;

// --- Stored Records (Output Schemas) ---
//
// Every entity is a flat document identified by a server-generated UUID string.
// The `id` and timestamp fields are always stamped server-side; serde ignores
// any client-supplied values for them because the input payloads below simply
// do not carry those fields.

/// Category
///
/// A product category record from the `categories` collection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Product
///
/// A catalog item from the `products` collection. `category_id` is a soft
/// reference: it is never validated against existing Category rows.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub weight: String,
    pub price: f64,
    pub description: String,
    pub features: Vec<String>,
    pub category_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// OrderItem
///
/// A single line of an order. `price` is the per-unit price the client saw;
/// nothing here is cross-checked against the product catalog.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct OrderItem {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub price: f64,
}

/// Order
///
/// An order record from the `orders` collection. `user_id` and `user_email`
/// are stamped from the verified identity at creation time. `total_amount`
/// is caller-supplied and deliberately not recomputed from `items`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub user_email: String,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub payment_status: String,
    pub delivery_status: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Testimonial
///
/// A customer testimonial from the `testimonials` collection.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Testimonial {
    pub id: String,
    pub name: String,
    pub rating: i32,
    pub comment: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Content
///
/// A free-text page record from the `content` collection, keyed by page name.
/// Writes are upserts: PUT on an unknown page creates it. Each write stamps a
/// fresh `id` and `updated_at`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Content {
    pub id: String,
    pub page: String,
    pub content: String,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---
//
// PUT on Category/Product carries full-replace semantics: the whole input
// payload is serialized into the stored document, so absent optionals become
// null and defaulted fields reset. None of the input structs use
// `skip_serializing_if` for exactly this reason.

/// CategoryInput
///
/// Input payload for POST/PUT on categories.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CategoryInput {
    pub name: String,
    pub description: Option<String>,
}

impl CategoryInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::Validation("name must not be empty".to_string()));
        }
        Ok(())
    }

    /// Stamps id and created_at into a full Category record.
    pub fn into_record(self) -> Category {
        Category {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            description: self.description,
            created_at: Utc::now(),
        }
    }
}

/// ProductInput
///
/// Input payload for POST/PUT on products.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ProductInput {
    pub name: String,
    pub weight: String,
    pub price: f64,
    pub description: String,
    pub features: Vec<String>,
    pub category_id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub stock: i64,
}

impl ProductInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        if !(self.price.is_finite() && self.price > 0.0) {
            return Err(ApiError::Validation(
                "price must be a positive number".to_string(),
            ));
        }
        if self.stock < 0 {
            return Err(ApiError::Validation(
                "stock must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_record(self) -> Product {
        Product {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            weight: self.weight,
            price: self.price,
            description: self.description,
            features: self.features,
            category_id: self.category_id,
            tags: self.tags,
            image_url: self.image_url,
            stock: self.stock,
            created_at: Utc::now(),
        }
    }
}

fn default_payment_status() -> String {
    "Pending".to_string()
}

fn default_delivery_status() -> String {
    "Order Placed".to_string()
}

/// OrderInput
///
/// Input payload for POST /orders. Identity fields are intentionally absent:
/// the handler stamps `user_id`/`user_email` from the verified token, and any
/// client-supplied values for them are dropped by serde.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct OrderInput {
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    #[serde(default = "default_payment_status")]
    pub payment_status: String,
    #[serde(default = "default_delivery_status")]
    pub delivery_status: String,
}

impl OrderInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.items.is_empty() {
            return Err(ApiError::Validation("items must not be empty".to_string()));
        }
        Ok(())
    }

    /// Stamps server-side fields, binding the order to the verified identity.
    pub fn into_record(self, user_id: String, user_email: String) -> Order {
        Order {
            id: Uuid::new_v4().to_string(),
            user_id,
            user_email,
            items: self.items,
            total_amount: self.total_amount,
            payment_status: self.payment_status,
            delivery_status: self.delivery_status,
            created_at: Utc::now(),
        }
    }
}

/// TestimonialInput
///
/// Input payload for POST /testimonials.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TestimonialInput {
    pub name: String,
    pub rating: i32,
    pub comment: String,
}

impl TestimonialInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        if !(1..=5).contains(&self.rating) {
            return Err(ApiError::Validation(
                "rating must be between 1 and 5".to_string(),
            ));
        }
        Ok(())
    }

    pub fn into_record(self) -> Testimonial {
        Testimonial {
            id: Uuid::new_v4().to_string(),
            name: self.name,
            rating: self.rating,
            comment: self.comment,
            created_at: Utc::now(),
        }
    }
}

/// ContentInput
///
/// Input payload for PUT /content/{page}. The `page` field mirrors the path
/// parameter for client convenience; the path always wins.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ContentInput {
    pub page: String,
    pub content: String,
}

impl ContentInput {
    pub fn into_record(self, page: String) -> Content {
        Content {
            id: Uuid::new_v4().to_string(),
            page,
            content: self.content,
            updated_at: Utc::now(),
        }
    }
}

// --- Query Parameters ---

/// ProductFilter
///
/// Accepted query parameters for GET /products. The filter is an exact
/// equality match on `category_id`; absent, all products are returned.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ProductFilter {
    pub category_id: Option<String>,
}

/// OrderStatusUpdate
///
/// Query parameters for PUT /orders/{id}. Each field is patched independently
/// when present; absent fields are left untouched.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct OrderStatusUpdate {
    pub payment_status: Option<String>,
    pub delivery_status: Option<String>,
}

// --- Upload Schemas ---

/// UploadResponse
///
/// Output schema for POST /upload: the public URL of the stored object and
/// the object key it was stored under.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UploadResponse {
    pub url: String,
    pub key: String,
}
