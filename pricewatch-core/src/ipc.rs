use serde::{Deserialize, Serialize};

use crate::catalog::SortOrder;
use crate::models::Platform;

pub const PROTOCOL_VERSION: &str = "0.1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PriceRequest {
    Ping,
    Health,
    Items {
        #[serde(default)]
        query: Option<String>,
        #[serde(default)]
        sort: Option<SortOrder>,
        #[serde(default)]
        platforms: Option<Vec<Platform>>,
    },
    Restaurants {
        #[serde(default)]
        query: Option<String>,
        #[serde(default)]
        platforms: Option<Vec<Platform>>,
    },
    Updates,
    Session,
    Login {
        email: String,
        password: String,
        platform: String,
    },
    Logout,
    Connect {
        platform: String,
    },
    Disconnect {
        platform: String,
    },
    Tick,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PriceResponse {
    pub status: String,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub version: String,
}

impl PriceResponse {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            status: "ok".to_string(),
            data: Some(data),
            error: None,
            version: PROTOCOL_VERSION.to_string(),
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(msg.into()),
            version: PROTOCOL_VERSION.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
