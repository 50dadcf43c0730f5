use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::submission::{Submission, SubmissionId};

/// One voter's ballot reduced to a single pick per position.
///
/// Only the first entry of each position is kept, so multi-select positions
/// are under-reported here; use the summary for full counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingRecord {
    pub id: SubmissionId,
    pub submitter_name: String,
    pub timestamp: DateTime<Utc>,
    pub submitted_at: DateTime<Utc>,
    pub votes: IndexMap<String, String>,
}

impl From<&Submission> for VotingRecord {
    fn from(submission: &Submission) -> Self {
        let votes = submission
            .nominations
            .iter()
            .filter_map(|(position, nominations)| {
                let first = nominations.first()?;
                Some((position.clone(), first.name.trim().to_string()))
            })
            .collect();
        Self {
            id: submission.id.clone(),
            submitter_name: submission.submitter_name.clone(),
            timestamp: submission.timestamp,
            submitted_at: submission.submitted_at,
            votes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::submission::Nomination;

    #[test]
    fn keeps_only_first_pick() {
        let submission = Submission::example(
            "Alice",
            &[
                (
                    "Philanthropy Chair",
                    vec![
                        Nomination::with_reason(" Bob ", "Ran the drive"),
                        Nomination::named("Carol"),
                    ],
                ),
                ("Consul", vec![]),
                ("Tribune", vec![Nomination::named("Dan")]),
            ],
        );
        let record = VotingRecord::from(&submission);
        assert_eq!(record.id, submission.id);
        assert_eq!(record.submitter_name, "Alice");
        assert_eq!(record.votes.len(), 2);
        assert_eq!(record.votes["Philanthropy Chair"], "Bob");
        assert_eq!(record.votes["Tribune"], "Dan");
        assert!(!record.votes.contains_key("Consul"));
    }
}
