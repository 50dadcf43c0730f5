use chrono::{DateTime, Utc};
use log::{debug, info};
use mongodb::{
    bson::doc,
    options::{FindOptions, ReplaceOptions},
    Collection, Database,
};
use rocket::futures::TryStreamExt;
use serde::{Deserialize, Serialize};

use super::{Accepted, Deleted, NominationsData, Persistence, Store};
use crate::error::{Error, Result};
use crate::model::submission::{NewSubmission, Nominations, Submission, SubmissionId};

const SUBMISSIONS: &str = "submissions";

/// A submission as stored in MongoDB, keyed by its ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DbSubmission {
    #[serde(rename = "_id")]
    id: SubmissionId,
    submitter_name: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    nominations: Nominations,
    #[serde(default)]
    signature: String,
    submitted_at: DateTime<Utc>,
}

impl From<DbSubmission> for Submission {
    fn from(db: DbSubmission) -> Self {
        Self {
            id: db.id,
            submitter_name: db.submitter_name,
            timestamp: db.timestamp,
            nominations: db.nominations,
            signature: db.signature,
            submitted_at: db.submitted_at,
        }
    }
}

impl From<&Submission> for DbSubmission {
    fn from(submission: &Submission) -> Self {
        Self {
            id: submission.id.clone(),
            submitter_name: submission.submitter_name.clone(),
            timestamp: submission.timestamp,
            nominations: submission.nominations.clone(),
            signature: submission.signature.clone(),
            submitted_at: submission.submitted_at,
        }
    }
}

/// Keeps one document per submission in a MongoDB collection. The summary is
/// not stored; it is derived whenever the submissions are loaded.
///
/// Intake and deletion touch a single document each, so a failed write never
/// takes other submissions with it.
pub struct MongoStore {
    submissions: Collection<DbSubmission>,
}

impl MongoStore {
    pub fn new(db: &Database) -> Self {
        Self {
            submissions: db.collection(SUBMISSIONS),
        }
    }
}

#[rocket::async_trait]
impl Store for MongoStore {
    fn name(&self) -> &'static str {
        "mongodb"
    }

    async fn load(&self) -> Result<NominationsData> {
        // IDs are same-length timestamps, so sorting on them gives submission order.
        let options = FindOptions::builder().sort(doc! { "_id": 1 }).build();
        let submissions: Vec<Submission> = self
            .submissions
            .find(None, options)
            .await?
            .map_ok(Submission::from)
            .try_collect()
            .await?;
        Ok(NominationsData::new(submissions))
    }

    async fn save(&self, data: &NominationsData) -> Result<Persistence> {
        // Upsert everything first, then drop what is no longer present, so a
        // failure part way leaves extra documents rather than missing ones.
        let options = ReplaceOptions::builder().upsert(true).build();
        let mut ids = Vec::with_capacity(data.nominations.len());
        for submission in &data.nominations {
            let db_submission = DbSubmission::from(submission);
            self.submissions
                .replace_one(doc! { "_id": submission.id.as_str() }, &db_submission, options.clone())
                .await?;
            ids.push(submission.id.as_str());
        }
        self.submissions
            .delete_many(doc! { "_id": { "$nin": ids } }, None)
            .await?;
        debug!("Synced {} submissions to MongoDB", data.nominations.len());
        Ok(Persistence::Durable)
    }

    async fn append(&self, ballot: NewSubmission) -> Result<Accepted> {
        self.load().await?.check_unique(&ballot)?;

        let submission = ballot.accept(SubmissionId::generate(), Utc::now());
        self.submissions
            .insert_one(DbSubmission::from(&submission), None)
            .await?;
        info!(
            "Accepted submission {} from {} to mongodb store",
            submission.id, submission.submitter_name
        );
        Ok(Accepted {
            id: submission.id,
            persistence: Persistence::Durable,
        })
    }

    async fn delete(&self, id: &SubmissionId) -> Result<Deleted> {
        let result = self
            .submissions
            .delete_one(doc! { "_id": id.as_str() }, None)
            .await?;
        if result.deleted_count == 0 {
            return Err(Error::not_found(format!("Submission {id}")));
        }
        let remaining = self.submissions.count_documents(None, None).await?;
        info!("Deleted submission {id} from mongodb store");
        Ok(Deleted {
            id: id.clone(),
            remaining: usize::try_from(remaining).unwrap_or(usize::MAX),
            persistence: Persistence::Durable,
        })
    }
}

/// These need a MongoDB server at `db_uri` (default `mongodb://localhost:27017`).
/// Run them with `cargo test -- --ignored`.
#[cfg(test)]
mod tests {
    use mongodb::Client as MongoClient;

    use super::*;
    use crate::model::submission::Nomination;

    /// A store over a fresh database that no other test uses.
    async fn scratch_store() -> (MongoStore, Database) {
        let db_uri = rocket::Config::figment()
            .extract_inner::<String>("db_uri")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let client = MongoClient::with_uri_str(&db_uri).await.unwrap();
        let random: u32 = rand::random();
        let db = client.database(&format!("nominations-test{random}"));
        (MongoStore::new(&db), db)
    }

    fn ballot(submitter: &str, candidate: &str) -> NewSubmission {
        NewSubmission::example(submitter, &[("Consul", vec![Nomination::named(candidate)])])
    }

    #[rocket::async_test]
    #[ignore = "needs a MongoDB server"]
    async fn append_and_delete_single_documents() {
        let (store, db) = scratch_store().await;

        let first = store.append(ballot("Alice", "Bob")).await.unwrap();
        let second = store.append(ballot("Carol", "Bob")).await.unwrap();
        assert!(matches!(
            store.append(ballot("alice", "Dan")).await,
            Err(Error::Conflict { .. })
        ));

        let data = store.load().await.unwrap();
        assert_eq!(data.nominations.len(), 2);
        assert_eq!(data.nominations[0].id, first.id);
        assert_eq!(data.summary.get("Consul", "Bob").unwrap().count, 2);

        let deleted = store.delete(&first.id).await.unwrap();
        assert_eq!(deleted.remaining, 1);
        assert!(matches!(
            store.delete(&first.id).await,
            Err(Error::NotFound(_))
        ));

        let data = store.load().await.unwrap();
        assert_eq!(data.nominations[0].id, second.id);
        assert_eq!(data.summary.get("Consul", "Bob").unwrap().count, 1);

        db.drop(None).await.unwrap();
    }

    #[rocket::async_test]
    #[ignore = "needs a MongoDB server"]
    async fn save_keeps_and_prunes_documents() {
        let (store, db) = scratch_store().await;
        store.append(ballot("Alice", "Bob")).await.unwrap();
        let mut data = store.load().await.unwrap();

        let extra = Submission::example("Dan", &[("Tribune", vec![Nomination::named("Eve")])]);
        data.nominations.push(extra.clone());
        data.recompute();
        store.save(&data).await.unwrap();
        assert_eq!(store.load().await.unwrap(), data);

        data.nominations.remove(0);
        data.recompute();
        store.save(&data).await.unwrap();
        let reloaded = store.load().await.unwrap();
        assert_eq!(reloaded.nominations, vec![extra]);

        db.drop(None).await.unwrap();
    }
}
