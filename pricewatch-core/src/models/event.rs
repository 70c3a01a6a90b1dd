use serde::{Deserialize, Serialize};

use super::Platform;

/// One observed price change on one platform for one menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceUpdateEvent {
    pub item_id: String,
    pub platform: Platform,
    pub old_price: f64,
    pub new_price: f64,
    pub has_discount: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
}
