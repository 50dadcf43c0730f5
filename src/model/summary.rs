use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::submission::Submission;

/// Tallied nominations for one candidate under one position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateTally {
    pub count: u32,
    /// The first non-empty reason seen, in submission order.
    #[serde(default)]
    pub reason: String,
}

/// Candidates for a single position, in order of first nomination.
pub type PositionTally = IndexMap<String, CandidateTally>;

/// Vote counts per position and candidate.
///
/// A summary is always derived from the complete list of submissions and is
/// never patched in place; see [`Summary::tally`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Summary(IndexMap<String, PositionTally>);

impl Summary {
    /// Count every nomination across `submissions`.
    ///
    /// Positions and candidates appear in order of first encounter. A position
    /// present on a ballot is recorded even if all of its entries are blank.
    pub fn tally<'a>(submissions: impl IntoIterator<Item = &'a Submission>) -> Self {
        let mut positions: IndexMap<String, PositionTally> = IndexMap::new();
        for submission in submissions {
            for (position, nominations) in &submission.nominations {
                let candidates = positions.entry(position.clone()).or_default();
                for nomination in nominations {
                    let Some(name) = nomination.candidate() else {
                        continue;
                    };
                    let tally = candidates.entry(name.to_string()).or_default();
                    tally.count += 1;
                    if tally.reason.is_empty() {
                        if let Some(reason) = nomination.reason() {
                            tally.reason = reason.to_string();
                        }
                    }
                }
            }
        }
        Self(positions)
    }

    pub fn position(&self, position: &str) -> Option<&PositionTally> {
        self.0.get(position)
    }

    pub fn get(&self, position: &str, candidate: &str) -> Option<&CandidateTally> {
        self.position(position)?.get(candidate)
    }

    pub fn positions(&self) -> impl Iterator<Item = (&String, &PositionTally)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flatten into `(position, candidate, tally)` rows sorted by position then candidate.
    pub fn sorted_rows(&self) -> Vec<(&str, &str, &CandidateTally)> {
        let mut rows: Vec<_> = self
            .0
            .iter()
            .flat_map(|(position, candidates)| {
                candidates
                    .iter()
                    .map(move |(candidate, tally)| (position.as_str(), candidate.as_str(), tally))
            })
            .collect();
        rows.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        rows
    }
}

impl FromIterator<(String, PositionTally)> for Summary {
    fn from_iter<I: IntoIterator<Item = (String, PositionTally)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use rocket::serde::json::{json, serde_json};

    use super::*;
    use crate::model::submission::Nomination;

    #[test]
    fn single_nomination() {
        let submissions = vec![Submission::example(
            "Alice",
            &[("Consul", vec![Nomination::named("Bob")])],
        )];
        let summary = Summary::tally(&submissions);
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({"Consul": {"Bob": {"count": 1, "reason": ""}}})
        );
    }

    #[test]
    fn counts_match_trimmed_names() {
        let submissions = vec![
            Submission::example(
                "Alice",
                &[("Consul", vec![Nomination::named("Bob "), Nomination::named("Carol")])],
            ),
            Submission::example("Dan", &[("Consul", vec![Nomination::named(" Bob")])]),
            Submission::example("Erin", &[("Tribune", vec![Nomination::named("Bob")])]),
        ];
        let summary = Summary::tally(&submissions);
        assert_eq!(summary.get("Consul", "Bob").unwrap().count, 2);
        assert_eq!(summary.get("Consul", "Carol").unwrap().count, 1);
        assert_eq!(summary.get("Tribune", "Bob").unwrap().count, 1);
        assert!(summary.get("Tribune", "Carol").is_none());
    }

    #[test]
    fn blank_names_are_skipped_but_position_is_kept() {
        let submissions = vec![Submission::example(
            "Alice",
            &[("Quaestor", vec![Nomination::named("   "), Nomination::default()])],
        )];
        let summary = Summary::tally(&submissions);
        assert!(summary.position("Quaestor").unwrap().is_empty());
    }

    #[test]
    fn first_non_empty_reason_wins() {
        let submissions = vec![
            Submission::example("A", &[("Consul", vec![Nomination::named("Bob")])]),
            Submission::example("B", &[("Consul", vec![Nomination::with_reason("Bob", "  ")])]),
            Submission::example(
                "C",
                &[("Consul", vec![Nomination::with_reason("Bob", " Steady hand ")])],
            ),
            Submission::example("D", &[("Consul", vec![Nomination::with_reason("Bob", "Later")])]),
        ];
        let tally = Summary::tally(&submissions).get("Consul", "Bob").cloned().unwrap();
        assert_eq!(tally.count, 4);
        assert_eq!(tally.reason, "Steady hand");

        // Dropping the ballot that supplied the reason promotes the next one.
        let remaining: Vec<_> = submissions.iter().filter(|s| s.submitter_name != "C").collect();
        let tally = Summary::tally(remaining).get("Consul", "Bob").cloned().unwrap();
        assert_eq!(tally.reason, "Later");
    }

    #[test]
    fn keys_keep_first_encounter_order() {
        let submissions = vec![
            Submission::example(
                "A",
                &[
                    ("Tribune", vec![Nomination::named("Zed")]),
                    ("Consul", vec![Nomination::named("Yan")]),
                ],
            ),
            Submission::example(
                "B",
                &[("Consul", vec![Nomination::named("Abe"), Nomination::named("Yan")])],
            ),
        ];
        let summary = Summary::tally(&submissions);
        let positions: Vec<&String> = summary.positions().map(|(p, _)| p).collect();
        assert_eq!(positions, ["Tribune", "Consul"]);
        let consul: Vec<&String> = summary.position("Consul").unwrap().keys().collect();
        assert_eq!(consul, ["Yan", "Abe"]);

        let rows: Vec<(&str, &str)> = summary.sorted_rows().into_iter().map(|(p, c, _)| (p, c)).collect();
        assert_eq!(rows, [("Consul", "Abe"), ("Consul", "Yan"), ("Tribune", "Zed")]);
    }
}
