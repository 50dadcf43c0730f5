//! Storage for submissions.
//!
//! Every backend stores the same thing, a [`NominationsData`] document, and only
//! has to provide whole-document [`Store::load`] and [`Store::save`]. Intake and
//! deletion are built on top of those as read-modify-write cycles that recompute
//! the summary from scratch. There is no locking across the cycle, so two
//! concurrent writers can lose one another's change.

use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{
    submission::{NewSubmission, Submission, SubmissionId},
    summary::Summary,
};

mod file;
mod gist;
mod memory;
mod mongo;

pub use file::FileStore;
pub use gist::{GistSettings, GistStore};
pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// The store as placed in Rocket's managed state.
pub type DynStore = Box<dyn Store>;

/// All submissions plus the summary derived from them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NominationsData {
    #[serde(default)]
    pub nominations: Vec<Submission>,
    /// Always derived from `nominations`, so whatever was stored is ignored.
    #[serde(default, skip_deserializing)]
    pub summary: Summary,
}

impl NominationsData {
    pub fn new(nominations: Vec<Submission>) -> Self {
        let summary = Summary::tally(&nominations);
        Self {
            nominations,
            summary,
        }
    }

    /// Rebuild the summary from the current submissions.
    pub fn recompute(&mut self) {
        self.summary = Summary::tally(&self.nominations);
    }

    /// Find a stored submission whose submitter matches `key`.
    pub fn find_submitter(&self, key: &str) -> Option<&Submission> {
        self.nominations
            .iter()
            .find(|s| s.submitter_key().as_deref() == Some(key))
    }

    /// Fail with a conflict if the ballot's submitter has already voted.
    pub fn check_unique(&self, ballot: &NewSubmission) -> Result<()> {
        let Some(key) = ballot.submitter_key() else {
            return Ok(());
        };
        match self.find_submitter(&key) {
            Some(existing) => Err(Error::Conflict {
                submitter: key,
                existing_id: existing.id.clone(),
                existing_date: existing.timestamp,
            }),
            None => Ok(()),
        }
    }
}

/// How far a save got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persistence {
    /// Written to the backing medium.
    Durable,
    /// Only the in-process copy holds the change; the backing medium was unreachable.
    LocalOnly,
}

impl Persistence {
    /// A message for the client when the save was not durable.
    pub fn warning(self) -> Option<&'static str> {
        match self {
            Self::Durable => None,
            Self::LocalOnly => {
                Some("Saved locally only; remote storage is currently unavailable")
            }
        }
    }
}

/// Result of accepting a submission.
#[derive(Debug, Clone)]
pub struct Accepted {
    pub id: SubmissionId,
    pub persistence: Persistence,
}

/// Result of deleting a submission.
#[derive(Debug, Clone)]
pub struct Deleted {
    pub id: SubmissionId,
    pub remaining: usize,
    pub persistence: Persistence,
}

#[rocket::async_trait]
pub trait Store: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Read the full document.
    async fn load(&self) -> Result<NominationsData>;

    /// Replace the full document.
    async fn save(&self, data: &NominationsData) -> Result<Persistence>;

    /// Accept a new ballot, unless its submitter has already voted.
    async fn append(&self, ballot: NewSubmission) -> Result<Accepted> {
        let mut data = self.load().await?;
        data.check_unique(&ballot)?;

        let submission = ballot.accept(SubmissionId::generate(), Utc::now());
        let id = submission.id.clone();
        info!(
            "Accepting submission {id} from {} to {} store",
            submission.submitter_name,
            self.name()
        );
        data.nominations.push(submission);
        data.recompute();

        let persistence = self.save(&data).await?;
        if persistence == Persistence::LocalOnly {
            warn!("Submission {id} is only held locally");
        }
        Ok(Accepted { id, persistence })
    }

    /// Remove the submission with the given ID.
    async fn delete(&self, id: &SubmissionId) -> Result<Deleted> {
        let mut data = self.load().await?;

        let before = data.nominations.len();
        data.nominations.retain(|s| &s.id != id);
        if data.nominations.len() == before {
            return Err(Error::not_found(format!("Submission {id}")));
        }
        data.recompute();

        let persistence = self.save(&data).await?;
        info!("Deleted submission {id} from {} store", self.name());
        Ok(Deleted {
            id: id.clone(),
            remaining: data.nominations.len(),
            persistence,
        })
    }
}
