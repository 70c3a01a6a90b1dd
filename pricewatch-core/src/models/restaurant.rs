use serde::{Deserialize, Serialize};

use super::Platform;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub cuisines: Vec<String>,
    pub rating: f32,
    pub delivery_minutes: u32,
    pub distance: String,
    pub platforms: Vec<Platform>,
}

impl Restaurant {
    pub fn listed_on_any(&self, platforms: &[Platform]) -> bool {
        self.platforms.iter().any(|p| platforms.contains(p))
    }
}
