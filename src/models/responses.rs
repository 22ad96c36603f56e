use serde::{Deserialize, Serialize};
use crate::models::domain::MatchCandidate;

/// Response for the today-probability endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbabilityResponse {
    pub id: String,
    pub probability: f64,
}

/// Response for the account total-intimacy endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TotalIntimacyResponse {
    pub id: String,
    #[serde(rename = "totalIntimacy")]
    pub total_intimacy: f64,
}

/// Response for the matches endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchesResponse {
    pub id: String,
    pub matches: Vec<MatchCandidate>,
    pub total_results: usize,
}

/// Response for the likes endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikesResponse {
    #[serde(rename = "friendID")]
    pub friend_ids: Vec<String>,
    #[serde(rename = "friendName")]
    pub friend_names: Vec<String>,
}

/// Response for the headline score endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarResponse {
    pub score: Option<f64>,
}

/// Response for the device-address lookup endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindAccountResponse {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "userName")]
    pub user_name: String,
}

/// Response for the single-relationship intimacy endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipIntimacyResponse {
    pub id: String,
    #[serde(rename = "friendId")]
    pub friend_id: String,
    pub intimacy: f64,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
