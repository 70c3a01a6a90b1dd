use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Delivery platforms the demo compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Platform {
    Swiggy,
    Zomato,
    UberEats,
}

impl Platform {
    pub const ALL: [Platform; 3] = [Platform::Swiggy, Platform::Zomato, Platform::UberEats];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Swiggy => "Swiggy",
            Platform::Zomato => "Zomato",
            Platform::UberEats => "UberEats",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "swiggy" => Ok(Platform::Swiggy),
            "zomato" => Ok(Platform::Zomato),
            "ubereats" => Ok(Platform::UberEats),
            _ => Err(UnknownPlatform(s.to_string())),
        }
    }
}

impl TryFrom<String> for Platform {
    type Error = UnknownPlatform;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
