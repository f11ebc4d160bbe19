use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poll {
    pub id: i64,
    pub text: String,
    pub owner_id: i64,
    pub owner_username: String,
    pub pub_date: DateTime<Utc>,
    pub active: bool,
    pub vote_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub id: i64,
    pub poll_id: i64,
    pub choice_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub id: i64,
    pub user_id: i64,
    pub poll_id: i64,
    pub choice_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceResult {
    pub id: i64,
    pub choice_text: String,
    pub votes: i64,
    /// Share of the poll's votes, 0-100, two decimals.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResults {
    pub poll_id: i64,
    pub total_votes: i64,
    pub choices: Vec<ChoiceResult>,
}
