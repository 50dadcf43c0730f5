use serde::{Deserialize, Serialize};

use super::summary::{PositionTally, Summary};

/// The candidates standing for one position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterPosition {
    pub position: String,
    #[serde(default)]
    pub candidates: Vec<String>,
}

/// The configured list of positions and their candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roster(Vec<RosterPosition>);

impl Roster {
    pub fn new(positions: Vec<RosterPosition>) -> Self {
        Self(positions)
    }

    pub fn positions(&self) -> &[RosterPosition] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build a summary containing every roster candidate, zero-filled, with the
    /// tallied values from `summary` laid over the top.
    ///
    /// Anything in `summary` that is not on the roster is dropped.
    pub fn complete(&self, summary: &Summary) -> Summary {
        self.0
            .iter()
            .map(|entry| {
                let tallied = summary.position(&entry.position);
                let candidates: PositionTally = entry
                    .candidates
                    .iter()
                    .map(|candidate| {
                        let tally = tallied
                            .and_then(|t| t.get(candidate))
                            .cloned()
                            .unwrap_or_default();
                        (candidate.clone(), tally)
                    })
                    .collect();
                (entry.position.clone(), candidates)
            })
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use rocket::serde::json::serde_json;

    use super::*;
    use crate::model::submission::{Nomination, Submission};

    #[test]
    fn every_roster_candidate_is_present() {
        let roster = Roster::example();
        let complete = roster.complete(&Summary::default());
        for entry in roster.positions() {
            for candidate in &entry.candidates {
                let tally = complete.get(&entry.position, candidate).unwrap();
                assert_eq!(tally.count, 0);
                assert_eq!(tally.reason, "");
            }
        }
    }

    #[test]
    fn tallies_overlay_and_strangers_are_dropped() {
        let submissions = vec![
            Submission::example(
                "A",
                &[
                    ("Consul", vec![Nomination::with_reason("Carol", "Reliable")]),
                    ("Kustos", vec![Nomination::named("Bob")]),
                ],
            ),
            Submission::example(
                "B",
                &[("Consul", vec![Nomination::named("Carol"), Nomination::named("Zoe")])],
            ),
        ];
        let summary = Summary::tally(&submissions);
        let complete = Roster::example().complete(&summary);

        let carol = complete.get("Consul", "Carol").unwrap();
        assert_eq!(carol.count, 2);
        assert_eq!(carol.reason, "Reliable");
        assert_eq!(complete.get("Consul", "Bob").unwrap().count, 0);
        assert!(complete.get("Consul", "Zoe").is_none());
        assert!(complete.position("Kustos").is_none());
        // Still visible in the plain summary.
        assert!(summary.get("Consul", "Zoe").is_some());
    }

    #[test]
    fn roster_order_is_preserved() {
        let complete = Roster::example().complete(&Summary::default());
        let positions: Vec<&String> = complete.positions().map(|(p, _)| p).collect();
        assert_eq!(positions, ["Consul", "Pro-Consul", "Tribune"]);
    }

    #[test]
    fn roster_file_format() {
        let raw = r#"[{"position": "Consul", "candidates": ["Bob", "Carol"]}, {"position": "Kustos"}]"#;
        let roster: Roster = serde_json::from_str(raw).unwrap();
        assert_eq!(roster.positions().len(), 2);
        assert!(roster.positions()[1].candidates.is_empty());
    }
}
