use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rocket::request::FromParam;
use serde::{Deserialize, Serialize};

use crate::config::Limits;
use crate::error::{Error, Result};

/// Name recorded for submissions that arrive without one.
pub const ANONYMOUS: &str = "Anonymous";

/// Nominations on a ballot, keyed by position in the order the client sent them.
pub type Nominations = IndexMap<String, Vec<Nomination>>;

/// A unique submission identifier: the millisecond timestamp of its creation.
/// Identifiers handed out by one process are strictly increasing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(String);

impl SubmissionId {
    /// Generate the next identifier. If the clock has not moved on since the last
    /// call, the previous value plus one is used instead.
    pub fn generate() -> Self {
        static LAST_ID: AtomicU64 = AtomicU64::new(0);
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        // The closure always returns `Some`, so this is always `Ok`.
        let previous = LAST_ID
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        Self(now.max(previous + 1).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SubmissionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SubmissionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'a> FromParam<'a> for SubmissionId {
    type Error = &'a str;

    fn from_param(param: &'a str) -> std::result::Result<Self, Self::Error> {
        if param.is_empty() {
            Err(param)
        } else {
            Ok(Self::from(param))
        }
    }
}

/// A single nomination of a candidate for a position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nomination {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Nomination {
    /// The trimmed candidate name, or `None` if blank.
    pub fn candidate(&self) -> Option<&str> {
        non_blank(&self.name)
    }

    /// The trimmed reason, or `None` if absent or blank.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref().and_then(non_blank)
    }
}

/// A stored ballot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub submitter_name: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub nominations: Nominations,
    #[serde(default)]
    pub signature: String,
    pub submitted_at: DateTime<Utc>,
}

impl Submission {
    /// The key under which this submitter must be unique.
    pub fn submitter_key(&self) -> Option<String> {
        submitter_key(&self.submitter_name)
    }
}

/// A ballot as received from the form, before it has been accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmission {
    #[serde(default)]
    pub submitter_name: Option<String>,
    #[serde(default)]
    pub nominations: Nominations,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl NewSubmission {
    /// The key used for duplicate detection, if a name was given.
    pub fn submitter_key(&self) -> Option<String> {
        self.submitter_name.as_deref().and_then(submitter_key)
    }

    /// Check the ballot against the configured size limits.
    pub fn validate(&self, limits: &Limits) -> Result<()> {
        if let Some(max) = limits.max_submitter_name_length {
            let length = self
                .submitter_name
                .as_deref()
                .map(|name| name.trim().chars().count())
                .unwrap_or(0);
            if length > max {
                return Err(Error::BadRequest(format!(
                    "Submitter name is {length} characters long; the limit is {max}"
                )));
            }
        }
        if let Some(max) = limits.max_nominations_per_position {
            if let Some((position, entries)) = self
                .nominations
                .iter()
                .find(|(_, entries)| entries.len() > max)
            {
                return Err(Error::BadRequest(format!(
                    "{} nominations for {position}; the limit is {max}",
                    entries.len()
                )));
            }
        }
        Ok(())
    }

    /// Accept this ballot, filling in the defaults for anything omitted.
    pub fn accept(self, id: SubmissionId, now: DateTime<Utc>) -> Submission {
        let submitter_name = self
            .submitter_name
            .as_deref()
            .and_then(non_blank)
            .unwrap_or(ANONYMOUS)
            .to_string();
        Submission {
            id,
            submitter_name,
            timestamp: now,
            nominations: self.nominations,
            signature: self.signature.unwrap_or_default(),
            submitted_at: self.submitted_at.unwrap_or(now),
        }
    }
}

/// Trimmed, lower-cased submitter name; `None` for blank names and for
/// [`ANONYMOUS`], which blank names are stored as.
pub fn submitter_key(name: &str) -> Option<String> {
    non_blank(name)
        .filter(|name| !name.eq_ignore_ascii_case(ANONYMOUS))
        .map(str::to_lowercase)
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}
