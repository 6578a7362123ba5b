use serde::Deserialize;
use utoipa::ToSchema;

use crate::pricing::PriceInput;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSettingsRequest {
    pub currency_code: String,
    pub delivery_cost: PriceInput,
}
