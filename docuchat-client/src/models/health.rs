use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub month: Option<String>,
    pub requests_used: u64,
    pub requests_limit: u64,
    pub requests_remaining: u64,
}

/// Response to `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub rate_limit: Option<RateLimitStatus>,
    #[serde(default)]
    pub free_tier_protection: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
