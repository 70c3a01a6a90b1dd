use serde::{Deserialize, Serialize};

use super::Platform;

/// Price of one menu item on one platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingOption {
    pub platform: Platform,
    pub price: f64,
    pub delivery_fee: f64,
    pub estimated_minutes: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub name: String,
    pub restaurant: String,
    #[serde(default)]
    pub cuisine: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub rating: f32,
    pub pricing: Vec<PricingOption>,
}

impl MenuItem {
    pub fn pricing_for(&self, platform: Platform) -> Option<&PricingOption> {
        self.pricing.iter().find(|o| o.platform == platform)
    }

    pub fn pricing_for_mut(&mut self, platform: Platform) -> Option<&mut PricingOption> {
        self.pricing.iter_mut().find(|o| o.platform == platform)
    }

    /// Cheapest pricing entry, if the item has any.
    pub fn best_option(&self) -> Option<&PricingOption> {
        self.pricing
            .iter()
            .min_by(|a, b| a.price.total_cmp(&b.price))
    }

    pub fn min_price(&self) -> Option<f64> {
        self.best_option().map(|o| o.price)
    }

    pub fn min_estimated_minutes(&self) -> Option<u32> {
        self.pricing.iter().map(|o| o.estimated_minutes).min()
    }

    pub fn offered_on_any(&self, platforms: &[Platform]) -> bool {
        self.pricing.iter().any(|o| platforms.contains(&o.platform))
    }
}
