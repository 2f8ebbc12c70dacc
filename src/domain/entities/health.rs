use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub timestamp: String,
    pub uptime: String,
    pub version: String,
    pub database: String,
    pub storage: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_projects: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthCheckResponse {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
