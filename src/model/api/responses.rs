//! Response bodies for the JSON API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    record::VotingRecord,
    store::{Accepted, Deleted},
    submission::SubmissionId,
    summary::Summary,
};

#[derive(Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    pub submission_id: SubmissionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<Accepted> for SubmitResponse {
    fn from(accepted: Accepted) -> Self {
        Self {
            success: true,
            message: "Nominations submitted successfully".to_string(),
            submission_id: accepted.id,
            warning: accepted.persistence.warning().map(String::from),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub success: bool,
    pub deleted_id: SubmissionId,
    pub remaining_submissions: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl From<Deleted> for DeleteResponse {
    fn from(deleted: Deleted) -> Self {
        Self {
            success: true,
            deleted_id: deleted.id,
            remaining_submissions: deleted.remaining,
            warning: deleted.persistence.warning().map(String::from),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryResponse {
    pub summary: Summary,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingRecords {
    pub success: bool,
    pub records: Vec<VotingRecord>,
    pub total_submissions: usize,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub success: bool,
    pub summary: Summary,
    pub total_submissions: usize,
}
