use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::OwnerId;

pub const PROJECT_CREATED: &str = "project_created";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub id: i64,
    pub event_type: String,
    pub owner_id: OwnerId,
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAnalyticsEvent {
    pub event_type: String,
    pub owner_id: OwnerId,
    pub metadata: Map<String, Value>,
}
