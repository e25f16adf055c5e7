//! Backend-agnostic health report

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Serialize, Serializer};

/// Overall health of a backing store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// Fully operational
    Healthy,
    /// Operational with reduced capacity or performance
    Degraded,
    /// Not operational
    Unhealthy,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }
}

/// Health check result. Backends fill in only what they can report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthInfo {
    pub status: HealthStatus,

    /// Whether the backend is reachable and responding
    pub available: bool,

    /// Time taken by the health check, serialized in milliseconds
    #[serde(serialize_with = "serialize_millis")]
    pub response_time: Duration,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_count: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_connections: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Backend-specific details
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, serde_json::Value>,
}

impl HealthInfo {
    /// A report for a backend that could not be reached
    pub fn unavailable(response_time: Duration, reason: impl Into<String>) -> Self {
        let mut details = BTreeMap::new();
        details.insert("error".to_string(), serde_json::Value::String(reason.into()));

        Self {
            status: HealthStatus::Unhealthy,
            available: false,
            response_time,
            node_count: None,
            active_connections: None,
            version: None,
            details,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64() * 1000.0)
}
