use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Platform;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub connected: bool,
    #[serde(default)]
    pub last_sync: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub logged_in: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub connections: BTreeMap<Platform, Connection>,
}

impl Session {
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            logged_in: true,
            created_at,
            email: None,
            connections: BTreeMap::new(),
        }
    }

    /// Strictly older than `ttl`; a session exactly `ttl` old is still valid.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created_at > ttl
    }

    pub fn is_connected(&self, platform: Platform) -> bool {
        self.connections
            .get(&platform)
            .map(|c| c.connected)
            .unwrap_or(false)
    }

    pub fn connected_platforms(&self) -> BTreeSet<Platform> {
        self.connections
            .iter()
            .filter(|(_, c)| c.connected)
            .map(|(p, _)| *p)
            .collect()
    }
}
