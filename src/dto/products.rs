use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{models::Product, pricing::PriceInput};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: PriceInput,
    #[serde(default)]
    pub sale_price: Option<PriceInput>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub is_hot: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub on_sale: bool,
}

/// Omitted fields are left untouched. An empty `sale_price` clears it, and
/// `clear_category` detaches the product from its category.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<PriceInput>,
    pub sale_price: Option<PriceInput>,
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub clear_category: bool,
    pub image_urls: Option<Vec<String>>,
    pub is_hot: Option<bool>,
    pub is_new: Option<bool>,
    pub on_sale: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}
